//! Broker Gateway (§4.1): a typed async facade over the broker terminal,
//! giving every other crate one session/symbol/order/candle surface
//! regardless of which terminal backs it.
//!
//! Grounded on `gridloop-gateway-dll`'s real/mock split: a single trait,
//! one in-memory implementation always available, and a real one gated
//! behind a platform/feature flag (not yet wired here — see `real_dll`
//! in Cargo.toml).

pub mod error;
pub mod mock;
pub mod trait_def;
pub mod types;

pub use error::{GatewayError, RETCODE_DONE};
pub use mock::MockGateway;
pub use trait_def::BrokerGateway;
pub use types::{AccountInfo, PendingOrder, Position, MAX_COMMENT_LEN};
