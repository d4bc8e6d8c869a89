use moneroblocks_bot::bot::{register_commands, run_dispatcher, BotConfig, CommandRouter, StatsClient};

#[tokio::main]
pub async fn main() {
    dotenv::dotenv().ok();
    pretty_env_logger::init();
    log::info!("Starting MoneroBlocks bot...");

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            log::error!("Unable to load configuration: {}", err);
            std::process::exit(1);
        }
    };

    let client = match StatsClient::new(&config.api_base_url, config.request_timeout) {
        Ok(client) => client,
        Err(err) => {
            log::error!("Unable to build the stats API client: {}", err);
            std::process::exit(1);
        }
    };

    let bot = teloxide::Bot::new(config.token);
    register_commands(&bot).await;

    log::info!(
        "MoneroBlocks bot started successfully, reading stats from {}",
        config.api_base_url
    );

    run_dispatcher(bot, CommandRouter::new(client)).await;

    log::info!("MoneroBlocks bot stopped.");
}
