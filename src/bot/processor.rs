use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::RequestError;

use super::{
    api::{BlockHeader, FetchError, NetworkSnapshot, StatsSource},
    formatter::{
        format_hashrate, format_height, format_help, format_last_block, format_overview,
        format_reward, format_supply, format_tx_count, MENU_MESSAGE,
    },
};

/* Processor is the overall logic center of the bot.
 * It resolves a command identifier, typed or pressed, through a single routing table,
 * fetches what the matching metric needs from the StatsSource, renders it with the
 * Formatter and hands the result to a Delivery.
 * No state survives between invocations.
 */

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RoutingError {
    #[error("Unknown command identifier: {0}")]
    UnknownIdentifier(String),
}

#[derive(thiserror::Error, Debug)]
pub enum RouterError {
    #[error("{0}")]
    Routing(RoutingError),
    #[error("Fetching data for {command} failed: {source}")]
    Fetch {
        command: String,
        #[source]
        source: FetchError,
    },
    #[error("Delivering {command} to chat {chat_id} failed: {source}")]
    Delivery {
        command: String,
        chat_id: i64,
        #[source]
        source: RequestError,
    },
}

impl From<RoutingError> for RouterError {
    fn from(routing_error: RoutingError) -> RouterError {
        RouterError::Routing(routing_error)
    }
}

/* Types */

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Metric {
    Height,
    Hashrate,
    Supply,
    Reward,
    LastBlock,
    TxNum,
    Overview,
    Help,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Menu,
    Metric(Metric),
}

// How an identifier reached the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(String),
    Button(String),
}

impl Inbound {
    fn identifier(&self) -> &str {
        match self {
            Inbound::Command(id) | Inbound::Button(id) => id,
        }
    }
}

// Where a reply goes. `message_id` is the menu message a button belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionRef {
    pub chat_id: i64,
    pub message_id: Option<i32>,
}

// Rows of (label, callback identifier).
pub type MenuLayout = &'static [&'static [(&'static str, &'static str)]];

pub const MENU_LAYOUT: MenuLayout = &[
    &[("Overview", "overview")],
    &[("Timestamp", "timestamp"), ("Blockheight", "height")],
    &[("Supply", "supply"), ("Reward", "reward")],
    &[("Hashrate", "hashrate"), ("Transactions", "tx_num")],
    &[("Help", "help")],
];

struct RouteEntry {
    command: Option<&'static str>,
    button: Option<&'static str>,
    route: Route,
}

/* The routing table.
 * Both entry points resolve through it, so a typed command and its button
 * always share the same fetch plan and formatter.
 */
const ROUTING_TABLE: &[RouteEntry] = &[
    RouteEntry {
        command: Some("height"),
        button: Some("height"),
        route: Route::Metric(Metric::Height),
    },
    RouteEntry {
        command: Some("hashrate"),
        button: Some("hashrate"),
        route: Route::Metric(Metric::Hashrate),
    },
    RouteEntry {
        command: Some("supply"),
        button: Some("supply"),
        route: Route::Metric(Metric::Supply),
    },
    RouteEntry {
        command: Some("reward"),
        button: Some("reward"),
        route: Route::Metric(Metric::Reward),
    },
    RouteEntry {
        command: Some("last_block"),
        button: Some("timestamp"),
        route: Route::Metric(Metric::LastBlock),
    },
    RouteEntry {
        command: Some("tx_num"),
        button: Some("tx_num"),
        route: Route::Metric(Metric::TxNum),
    },
    RouteEntry {
        command: Some("overview"),
        button: Some("overview"),
        route: Route::Metric(Metric::Overview),
    },
    RouteEntry {
        command: Some("help"),
        button: Some("help"),
        route: Route::Metric(Metric::Help),
    },
    RouteEntry {
        command: Some("menu"),
        button: None,
        route: Route::Menu,
    },
];

pub fn resolve(inbound: &Inbound) -> Result<Route, RoutingError> {
    let found = match inbound {
        Inbound::Command(id) => ROUTING_TABLE
            .iter()
            .find(|entry| entry.command == Some(id.as_str())),
        Inbound::Button(id) => ROUTING_TABLE
            .iter()
            .find(|entry| entry.button == Some(id.as_str())),
    };

    found
        .map(|entry| entry.route)
        .ok_or_else(|| RoutingError::UnknownIdentifier(inbound.identifier().to_string()))
}

/* Collaborators */

// Outbound side of the chat transport.
#[async_trait]
pub trait Delivery: Send + Sync {
    async fn deliver(&self, session: &SessionRef, html: &str) -> Result<(), RequestError>;
    async fn deliver_menu(
        &self,
        session: &SessionRef,
        html: &str,
        layout: MenuLayout,
    ) -> Result<(), RequestError>;
    async fn edit_message(&self, session: &SessionRef, html: &str) -> Result<(), RequestError>;
}

pub trait Monitor: Send + Sync {
    fn log_warning(&self, context: &str, cause: &dyn std::error::Error);
}

pub struct LogMonitor;

impl Monitor for LogMonitor {
    fn log_warning(&self, context: &str, cause: &dyn std::error::Error) {
        log::warn!("{context}: {cause}");
    }
}

/* Router */

pub struct CommandRouter<S: StatsSource> {
    source: S,
    monitor: Arc<dyn Monitor>,
    clock: fn() -> DateTime<Utc>,
}

impl<S: StatsSource> CommandRouter<S> {
    pub fn new(source: S) -> CommandRouter<S> {
        CommandRouter {
            source,
            monitor: Arc::new(LogMonitor),
            clock: Utc::now,
        }
    }

    pub fn with_monitor(mut self, monitor: Arc<dyn Monitor>) -> CommandRouter<S> {
        self.monitor = monitor;
        self
    }

    pub fn with_clock(mut self, clock: fn() -> DateTime<Utc>) -> CommandRouter<S> {
        self.clock = clock;
        self
    }

    // Snapshot first, then the header at that snapshot's height.
    async fn fetch_with_header(&self) -> Result<(NetworkSnapshot, BlockHeader), FetchError> {
        let snapshot = self.source.fetch_snapshot().await?;
        let header = self.source.fetch_block_header(snapshot.height).await?;
        Ok((snapshot, header))
    }

    /* Fetches what the metric needs and renders it.
     * Each arm pairs a metric's fetches with its formatter.
     */
    pub async fn render(&self, metric: Metric) -> Result<String, FetchError> {
        let html = match metric {
            Metric::Help => format_help(),
            Metric::Height => format_height(&self.source.fetch_snapshot().await?),
            Metric::Hashrate => format_hashrate(&self.source.fetch_snapshot().await?),
            Metric::Supply => format_supply(&self.source.fetch_snapshot().await?),
            Metric::Reward => format_reward(&self.source.fetch_snapshot().await?),
            Metric::LastBlock => {
                let snapshot = self.source.fetch_snapshot().await?;
                format_last_block(&snapshot, (self.clock)())
            }
            Metric::TxNum => {
                let (snapshot, header) = self.fetch_with_header().await?;
                format_tx_count(&snapshot, &header)
            }
            Metric::Overview => {
                let (snapshot, header) = self.fetch_with_header().await?;
                format_overview(&snapshot, &header, (self.clock)())
            }
        };
        Ok(html)
    }

    /* Handles one inbound identifier end to end.
     * Typed commands reply with a new message, buttons edit their menu message.
     * Nothing is delivered when routing or fetching fails.
     */
    pub async fn handle<D: Delivery + ?Sized>(
        &self,
        inbound: Inbound,
        session: &SessionRef,
        delivery: &D,
    ) -> Result<(), RouterError> {
        let route = match resolve(&inbound) {
            Ok(route) => route,
            Err(err) => {
                self.monitor.log_warning(
                    &format!("Routing - chat {}", session.chat_id),
                    &err,
                );
                return Err(err.into());
            }
        };

        let delivery_failed = |source: RequestError| RouterError::Delivery {
            command: inbound.identifier().to_string(),
            chat_id: session.chat_id,
            source,
        };

        let metric = match route {
            Route::Menu => {
                return delivery
                    .deliver_menu(session, MENU_MESSAGE, MENU_LAYOUT)
                    .await
                    .map_err(delivery_failed);
            }
            Route::Metric(metric) => metric,
        };

        let html = match self.render(metric).await {
            Ok(html) => html,
            Err(err) => {
                self.monitor.log_warning(
                    &format!(
                        "Command {} - chat {}",
                        inbound.identifier(),
                        session.chat_id
                    ),
                    &err,
                );
                return Err(RouterError::Fetch {
                    command: inbound.identifier().to_string(),
                    source: err,
                });
            }
        };

        let sent = match inbound {
            Inbound::Command(_) => delivery.deliver(session, &html).await,
            Inbound::Button(_) => delivery.edit_message(session, &html).await,
        };

        sent.map_err(delivery_failed)
    }
}
