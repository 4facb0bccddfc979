use thiserror::Error;

/// Errors raised by the Account Supervisor and its four per-account
/// tasks (§4.8). Every long-lived task loop matches on this and logs
/// rather than propagating (§7 propagation policy).
#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("gateway error: {0}")]
    Gateway(#[from] gridloop_gateway::GatewayError),
    #[error("remote store error: {0}")]
    Remote(#[from] gridloop_remote::RemoteError),
    #[error("strategy loop error: {0}")]
    Strategy(#[from] gridloop_strategy::StrategyError),
    #[error("unknown bot: {0}")]
    UnknownBot(String),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
