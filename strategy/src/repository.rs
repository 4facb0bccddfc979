//! Persistence/publishing ports the strategy loop depends on but does not
//! implement itself — concrete implementations live in `gridloop-store`
//! and `gridloop-remote`, following the same "port lives with the
//! consumer" convention as `gridloop_engine::CycleRepository`.

use crate::error::StrategyError;
use async_trait::async_trait;
use gridloop_markets::Bot;

/// Persistence port for [`Bot`] configuration/runtime state (§3 "Bot":
/// "Mutated by user events"). Only the `stopped` flag is mutated from the
/// strategy loop (`stop_bot`/`start_bot`, §4.6); `create_bot`/
/// `update_bot`/`delete_bot` are Account Supervisor concerns (§4.8).
#[async_trait]
pub trait BotRepository: Send + Sync {
    async fn by_id(&self, bot_id: &str) -> Result<Option<Bot>, StrategyError>;
    async fn save(&self, bot: &Bot) -> Result<(), StrategyError>;
}

/// Publishes a cycle's state to the remote document store after each
/// tick (§4.6 loop pseudocode: `cycle.persist_to_remote()`). Implemented
/// by `gridloop-remote`; failures here never block the local state
/// machine (§4.5.5 "Remote-store write failure").
#[async_trait]
pub trait RemoteCyclePublisher: Send + Sync {
    async fn publish_cycle(&self, cycle: &gridloop_engine::Cycle) -> Result<(), StrategyError>;
}
