use crate::cycle::Cycle;
use crate::error::EngineError;
use async_trait::async_trait;

/// Persistence port for [`Cycle`], implemented downstream by the local
/// store. Lives here rather than in the store crate so the engine never
/// depends on a storage engine.
#[async_trait]
pub trait CycleRepository: Send + Sync {
    async fn save(&self, cycle: &Cycle) -> Result<(), EngineError>;
    async fn by_id(&self, id: &str) -> Result<Option<Cycle>, EngineError>;
    async fn active_cycles(&self, bot_id: &str) -> Result<Vec<Cycle>, EngineError>;
}
