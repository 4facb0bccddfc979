use thiserror::Error;

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("cycle engine error")]
    Engine(#[from] gridloop_engine::EngineError),
    #[error("broker gateway error")]
    Gateway(#[from] gridloop_gateway::GatewayError),
    #[error("order entity error")]
    Execution(#[from] gridloop_execution::ExecutionError),
    #[error("bot {0} has no strategy loop registered")]
    UnknownBot(String),
    #[error("ticket {0} is not tracked by any active cycle on this bot")]
    TicketNotOwned(i64),
    #[error("cycle {0} not found")]
    CycleNotFound(String),
    #[error("bot repository error: {0}")]
    BotRepository(String),
    #[error("remote publish error: {0}")]
    RemotePublish(String),
}
