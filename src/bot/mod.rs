// bot/mod.rs

// Exported functions
pub use self::dispatcher::{register_commands, run_dispatcher};

// Exported structs and types
pub use self::api::{BlockHeader, FetchError, NetworkSnapshot, StatsClient, StatsSource};
pub use self::config::{BotConfig, ConfigError};
pub use self::dispatcher::{BotError, Command, HandlerResult, StatsRouter};
pub use self::processor::{
    CommandRouter, Delivery, Inbound, LogMonitor, Monitor, RouterError, RoutingError, SessionRef,
};

// Declare submodules
pub mod formatter;

mod api;
mod config;
mod dispatcher;
mod handler;
mod processor;
