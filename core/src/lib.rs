#![forbid(unsafe_code)]
#![warn(
    unused,
    clippy::cognitive_complexity,
    unused_crate_dependencies,
    unused_extern_crates,
    clippy::unused_self,
    clippy::useless_let_if_seq,
    missing_debug_implementations,
    rust_2018_idioms
)]
#![allow(clippy::type_complexity, clippy::too_many_arguments)]

//! # Core — ambient stack shared by every Gridloop crate
//!
//! Not a trading engine itself (that's [`gridloop-engine`](https://docs.rs/gridloop-engine)):
//! this crate holds the pieces every long-lived task in the orchestrator
//! needs regardless of which component it is — the aggregate
//! [`error::GridloopError`], [`logging`] initialisers, [`shutdown`]
//! traits, and the startup [`system::Config`].

pub mod error;
pub mod logging;
pub mod shutdown;
pub mod system;

pub use error::{ConfigError, JoinError};
pub use shutdown::{AsyncShutdown, Shutdown, SyncShutdown};
pub use system::Config;
