use crate::error::ExecutionError;
use crate::order::Order;
use async_trait::async_trait;

/// Persistence port for [`Order`], implemented downstream by the local
/// store. Lives here rather than in the store crate so this crate never
/// depends on a storage engine, and the store crate depends on this one
/// instead of the reverse.
#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn save(&self, order: &Order) -> Result<(), ExecutionError>;
    async fn by_ticket(&self, ticket: i64) -> Result<Option<Order>, ExecutionError>;
    async fn by_cycle(&self, cycle_id: &str) -> Result<Vec<Order>, ExecutionError>;
    async fn open_orders_only(&self, bot_id: &str) -> Result<Vec<Order>, ExecutionError>;
}
