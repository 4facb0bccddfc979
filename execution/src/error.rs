use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionError {
    #[error("broker gateway error")]
    Gateway(#[from] gridloop_gateway::GatewayError),
    #[error("order repository error: {0}")]
    Repository(String),
}
