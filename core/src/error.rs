//! Error types owned directly by `gridloop-core` (configuration parsing and
//! task-join failures). The cross-crate aggregate error that mirrors the
//! teacher's `ToucanError` pattern lives in the `gridloop` facade crate,
//! which is the one crate that depends on every other — see
//! `gridloop::error::GridloopError`.

use thiserror::Error;

/// Errors raised while assembling [`crate::system::Config`] from the
/// process environment (§6 Environment).
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Wraps a [`tokio::task::JoinError`] uniformly across the long-lived
/// tasks every component spawns (§5).
#[derive(Debug, Error)]
#[error("task join failed: {0:?}")]
pub struct JoinError(pub tokio::task::JoinError);

impl From<tokio::task::JoinError> for JoinError {
    fn from(value: tokio::task::JoinError) -> Self {
        Self(value)
    }
}
