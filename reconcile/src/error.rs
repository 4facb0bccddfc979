use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("gateway error: {0}")]
    Gateway(#[from] gridloop_gateway::GatewayError),

    #[error("execution error: {0}")]
    Execution(#[from] gridloop_execution::ExecutionError),

    #[error("engine error: {0}")]
    Engine(#[from] gridloop_engine::EngineError),
}
