use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::{
    dispatcher::{Command, HandlerResult, StatsRouter},
    processor::{Inbound, SessionRef},
};

use super::utils::{settle, TelegramDelivery};

/* Invalid state.
 * Invoked for any message that is not a known command.
 * Simply does not respond to anything. Reduces spam.
 */
pub async fn invalid_state(_bot: Bot, _msg: Message) -> HandlerResult {
    Ok(())
}

/* Typed command.
 * Replies to the chat with a new message.
 */
pub async fn action_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    router: Arc<StatsRouter>,
) -> HandlerResult {
    log::info!(
        "Command /{} received in chat {}",
        cmd.identifier(),
        msg.chat.id
    );

    let session = SessionRef {
        chat_id: msg.chat.id.0,
        message_id: None,
    };
    let delivery = TelegramDelivery::new(bot);
    let result = router
        .handle(
            Inbound::Command(cmd.identifier().to_string()),
            &session,
            &delivery,
        )
        .await;

    settle(result)
}

/* Menu button pressed.
 * Acknowledges the press, then replaces the menu message with the result.
 */
pub async fn action_button(
    bot: Bot,
    query: CallbackQuery,
    router: Arc<StatsRouter>,
) -> HandlerResult {
    bot.answer_callback_query(format!("{}", query.id)).await?;

    if let (Some(button), Some(Message { id, chat, .. })) = (&query.data, &query.message) {
        log::info!("Button {} pressed in chat {}", button, chat.id);

        let session = SessionRef {
            chat_id: chat.id.0,
            message_id: Some(id.0),
        };
        let delivery = TelegramDelivery::new(bot);
        let result = router
            .handle(Inbound::Button(button.clone()), &session, &delivery)
            .await;

        return settle(result);
    }

    Ok(())
}
