//! Errors raised at the Broker Gateway boundary (§7 "Broker rejection" /
//! "Transient external").

use thiserror::Error;

/// The broker's "done" retcode, matching the terminal's native success
/// code (§6). Any other value is treated as "no order was created" (§7).
pub const RETCODE_DONE: i32 = 0;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("broker terminal not connected")]
    NotConnected,
    #[error("symbol unknown or unavailable: {0}")]
    SymbolUnknown(String),
    #[error("order rejected by broker, retcode={retcode}")]
    OrderRejected { retcode: i32 },
    #[error("ticket not found: {0}")]
    TicketNotFound(i64),
    #[error("broker terminal connection failed: {0}")]
    ConnectionFailed(String),
}
