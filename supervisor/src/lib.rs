#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

//! # Account Supervisor
//!
//! Owns every bot on one account (§4.8, component C8): lists the
//! account's bots from the remote store and starts one
//! [`gridloop_strategy::StrategyLoop`] per bot, then runs four long-lived
//! per-account tasks — account metrics publisher, remote event
//! subscriber, session token refresher, and symbol price publisher —
//! alongside bot lifecycle mutation (`create_bot`/`update_bot`/
//! `delete_bot`).

pub mod account;
pub mod error;
pub mod remote_adapters;
pub mod repository;

pub use account::AccountSupervisor;
pub use error::SupervisorError;
pub use remote_adapters::RemoteTokenRefresher;
pub use repository::{
    is_bot_lifecycle_message, AccountMetricsPublisher, BotDirectory, BotLifecycleContent, EventFeed, RemoteEvent,
    SymbolPricePublisher, TokenRefresher,
};
