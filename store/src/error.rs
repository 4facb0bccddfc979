use thiserror::Error;

/// Failures surfaced by the Local Store, folded into each caller's own
/// error type at the port boundary (`EngineError::Repository`,
/// `ExecutionError::Repository`, `StrategyError::BotRepository`) since
/// `gridloop-store` is a downstream implementation detail none of those
/// crates depend on.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}
