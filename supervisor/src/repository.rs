//! Ports the Account Supervisor depends on but does not implement
//! itself — concrete implementations live in `gridloop-remote`
//! ([`crate::remote_adapters`]), following the same "port lives with the
//! consumer" convention as `gridloop_engine::CycleRepository` and
//! `gridloop_strategy::{BotRepository, RemoteCyclePublisher}`.

use crate::error::SupervisorError;
use async_trait::async_trait;
use gridloop_markets::{Account, AccountSnapshot, Bot, Symbol};
use serde::Deserialize;

/// §4.8 item 1: pushes a changed account snapshot to the remote store,
/// returning the remote record id on first creation so the caller can
/// remember it for subsequent updates.
#[async_trait]
pub trait AccountMetricsPublisher: Send + Sync {
    async fn publish_snapshot(
        &self,
        account: &Account,
        snapshot: AccountSnapshot,
    ) -> Result<Option<String>, SupervisorError>;
}

/// §4.8 item 4: pushes one symbol's latest bid, returning the remote
/// record id on first creation (§4.3 "Created if missing on account
/// init").
#[async_trait]
pub trait SymbolPricePublisher: Send + Sync {
    async fn publish_symbol(&self, symbol: &Symbol) -> Result<Option<String>, SupervisorError>;
}

/// §4.8 item 3: refreshes the process-wide remote session token.
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    async fn refresh(&self) -> Result<(), SupervisorError>;
}

/// §4.8 item 2: fetches pending events for one account and deletes one
/// by id. The Account Supervisor deletes an event *before* dispatching
/// it (§4.8, §9 Open Question 5: "the source returns early if the delete
/// fails", preserved here — a failed delete aborts that event's
/// dispatch for this iteration rather than risking a duplicate).
#[async_trait]
pub trait EventFeed: Send + Sync {
    async fn list_events(&self, account_id: &str) -> Result<Vec<RemoteEvent>, SupervisorError>;
    async fn delete_event(&self, event_id: &str) -> Result<(), SupervisorError>;
}

/// Lists the bots configured for one account, and persists bot-lifecycle
/// mutations (`create_bot`/`update_bot`/`delete_bot`, §3 "Bot", §4.8
/// "Initialization") against the remote store.
#[async_trait]
pub trait BotDirectory: Send + Sync {
    async fn list_bots(&self, account_id: &str) -> Result<Vec<Bot>, SupervisorError>;
    async fn create_bot(&self, bot: &Bot) -> Result<(), SupervisorError>;
    async fn update_bot(&self, bot: &Bot) -> Result<(), SupervisorError>;
    async fn delete_bot(&self, bot_id: &str) -> Result<(), SupervisorError>;
}

/// One event record as delivered by the remote store's `events`
/// collection (§6 "Remote document store": `uuid`, `account`, `bot`,
/// `strategy`, `content`). `content` is decoded lazily by the caller
/// into either a [`gridloop_strategy::EventContent`] (bot-targeted
/// message) or a [`BotLifecycleContent`] (account-level bot mutation),
/// per §9 "Runtime-typed event payloads".
#[derive(Debug, Clone, Deserialize)]
pub struct RemoteEvent {
    pub id: String,
    pub account: String,
    #[serde(default)]
    pub bot: Option<String>,
    #[serde(default)]
    pub strategy: Option<String>,
    pub content: serde_json::Value,
}

/// Wire shape of a `create_bot`/`update_bot`/`delete_bot` event's
/// `content` document (§3 "Bot": "Mutated by user events
/// (`create_bot`/`update_bot`/`delete_bot`)"). Unlike the per-bot
/// [`gridloop_strategy::EventContent`], this targets the Account
/// Supervisor directly because `create_bot` has no existing bot/strategy
/// loop to dispatch to yet.
#[derive(Debug, Clone, Deserialize)]
pub struct BotLifecycleContent {
    pub message: String,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub strategy: Option<gridloop_markets::StrategyKind>,
    #[serde(default)]
    pub magic: Option<i64>,
    #[serde(default)]
    pub symbol: Option<String>,
    /// Strategy-specific config overrides, merged onto
    /// [`gridloop_markets::StrategyConfig::default`] (§7 "Configuration":
    /// a missing/non-coercible field falls back to its documented
    /// default with a one-line warning).
    #[serde(default)]
    pub config: Option<serde_json::Value>,
}

/// `true` iff `message` names one of the three bot-lifecycle kinds this
/// crate (rather than a bot's strategy loop) handles directly.
pub fn is_bot_lifecycle_message(message: &str) -> bool {
    matches!(message, "create_bot" | "update_bot" | "delete_bot")
}
