use thiserror::Error;

/// Cross-crate aggregate error, folding every component's own error type
/// into one enum at the process boundary — mirroring the teacher's
/// `ToucanError` over its per-crate errors. Nothing inside the
/// orchestrator itself needs this type; only `main.rs` (and any future
/// operator-facing tool built against this facade) does.
#[derive(Debug, Error)]
pub enum GridloopError {
    #[error("configuration error: {0}")]
    Config(#[from] gridloop_core::ConfigError),
    #[error("task join failed: {0}")]
    Join(#[from] gridloop_core::JoinError),
    #[error("broker gateway error: {0}")]
    Gateway(#[from] gridloop_gateway::GatewayError),
    #[error("order entity error: {0}")]
    Execution(#[from] gridloop_execution::ExecutionError),
    #[error("cycle engine error: {0}")]
    Engine(#[from] gridloop_engine::EngineError),
    #[error("strategy loop error: {0}")]
    Strategy(#[from] gridloop_strategy::StrategyError),
    #[error("reconciliation error: {0}")]
    Reconcile(#[from] gridloop_reconcile::ReconcileError),
    #[error("account supervisor error: {0}")]
    Supervisor(#[from] gridloop_supervisor::SupervisorError),
    #[error("remote store error: {0}")]
    Remote(#[from] gridloop_remote::RemoteError),
    #[error("local store error: {0}")]
    Store(#[from] gridloop_store::StoreError),
}
