use thiserror::Error;

/// Failures from the remote document-store client (§4.3). Folded into
/// `StrategyError::RemotePublish` at the `RemoteCyclePublisher` boundary
/// so a remote-store write failure never blocks the local state machine
/// (§4.5.5 "Remote-store write failure").
#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid remote url: {0}")]
    Url(#[from] url::ParseError),

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("not authenticated")]
    NotAuthenticated,
}
