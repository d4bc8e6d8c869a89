use std::sync::Arc;

use teloxide::{
    dispatching::UpdateHandler, error_handlers::LoggingErrorHandler, prelude::*,
    utils::command::BotCommands, RequestError,
};

use super::{
    api::StatsClient,
    handler::{action_button, action_command, invalid_state},
    processor::{CommandRouter, RouterError},
};

/* Dispatcher wires Telegram updates to the handlers.
 * Typed commands and button presses both end up in the CommandRouter.
 * Errors escaping a handler are logged by the dispatcher's error handler,
 * so one failing update never stops the bot.
 */

/* Types */
pub type StatsRouter = CommandRouter<StatsClient>;
pub type HandlerResult = Result<(), BotError>;

#[derive(thiserror::Error, Debug)]
pub enum BotError {
    #[error("Router error: {0}")]
    RouterError(RouterError),
    #[error("Request error: {0}")]
    RequestError(RequestError),
}

impl From<RouterError> for BotError {
    fn from(router_error: RouterError) -> BotError {
        BotError::RouterError(router_error)
    }
}

impl From<RequestError> for BotError {
    fn from(request_error: RequestError) -> BotError {
        BotError::RequestError(request_error)
    }
}

#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(
    rename_rule = "snake_case",
    description = "These commands are supported:"
)]
pub enum Command {
    #[command(description = "Current block height.")]
    Height,
    #[command(description = "Current network hashrate.")]
    Hashrate,
    #[command(description = "Total coin supply.")]
    Supply,
    #[command(description = "Reward of the last block.")]
    Reward,
    #[command(description = "Timestamp of the latest block.")]
    LastBlock,
    #[command(description = "Number of transactions in the latest block.")]
    TxNum,
    #[command(description = "All stats in one message.")]
    Overview,
    #[command(description = "Show a button menu.")]
    Menu,
    #[command(description = "Show the help message.")]
    Help,
}

impl Command {
    // Identifier looked up in the routing table.
    pub fn identifier(&self) -> &'static str {
        match self {
            Command::Height => "height",
            Command::Hashrate => "hashrate",
            Command::Supply => "supply",
            Command::Reward => "reward",
            Command::LastBlock => "last_block",
            Command::TxNum => "tx_num",
            Command::Overview => "overview",
            Command::Menu => "menu",
            Command::Help => "help",
        }
    }
}

/* Registers the command list with Telegram so clients can suggest it.
 * Failure is not fatal.
 */
pub async fn register_commands(bot: &Bot) {
    if let Err(err) = bot.set_my_commands(Command::bot_commands()).await {
        log::warn!("Unable to register bot commands: {}", err);
    }
}

fn schema() -> UpdateHandler<BotError> {
    let command_handler = teloxide::filter_command::<Command, _>().endpoint(action_command);

    let message_handler = Update::filter_message()
        .branch(command_handler)
        .branch(dptree::endpoint(invalid_state));

    let callback_query_handler = Update::filter_callback_query().endpoint(action_button);

    dptree::entry()
        .branch(message_handler)
        .branch(callback_query_handler)
}

/* Main Dispatch function */
pub async fn run_dispatcher(bot: Bot, router: StatsRouter) {
    let router = Arc::new(router);

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![router])
        .error_handler(LoggingErrorHandler::with_custom_text(
            "An error has occurred while handling an update",
        ))
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bot::processor::{resolve, Inbound, Route};

    #[test]
    fn test_parse_commands() {
        assert_eq!(
            Command::parse("/last_block", "moneroblocks_bot").unwrap(),
            Command::LastBlock
        );
        assert_eq!(
            Command::parse("/tx_num@moneroblocks_bot", "moneroblocks_bot").unwrap(),
            Command::TxNum
        );
        assert!(Command::parse("/price", "moneroblocks_bot").is_err());
    }

    #[test]
    fn test_every_command_is_routed() {
        let commands = [
            Command::Height,
            Command::Hashrate,
            Command::Supply,
            Command::Reward,
            Command::LastBlock,
            Command::TxNum,
            Command::Overview,
            Command::Menu,
            Command::Help,
        ];
        for command in commands {
            let route = resolve(&Inbound::Command(command.identifier().to_string()));
            assert!(route.is_ok(), "{:?} is not routed", command);
        }
        assert_eq!(
            resolve(&Inbound::Command(Command::Menu.identifier().to_string())),
            Ok(Route::Menu)
        );
    }

    #[test]
    fn test_registered_commands_match_identifiers() {
        let registered: Vec<String> = Command::bot_commands()
            .into_iter()
            .map(|c| c.command.trim_start_matches('/').to_string())
            .collect();
        assert_eq!(registered.len(), 9);
        assert!(registered.contains(&"last_block".to_string()));
        assert!(registered.contains(&"tx_num".to_string()));
    }
}
