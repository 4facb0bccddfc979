use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("broker gateway error")]
    Gateway(#[from] gridloop_gateway::GatewayError),
    #[error("order entity error")]
    Execution(#[from] gridloop_execution::ExecutionError),
    #[error("order {0} referenced by cycle but not found in the local store")]
    OrderMissing(i64),
    #[error("cycle repository error: {0}")]
    Repository(String),
}
