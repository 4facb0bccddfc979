#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]

//! # Gridloop
//!
//! Facade crate for the Gridloop trading orchestrator: re-exports the
//! ecosystem's crates under one namespace and hosts [`GridloopError`],
//! the cross-crate aggregate error every component's own error type
//! folds into at the process boundary — the same role the teacher's
//! `ToucanError` plays over its own per-crate errors.
//!
//! The `gridloop` binary (`src/main.rs`) is the one piece the teacher's
//! purely-a-library facade doesn't have: it wires a [`gridloop_core::system::Config`],
//! a broker connection, the Local Store and Remote Store clients, and
//! one [`gridloop_supervisor::AccountSupervisor`], then runs them to a
//! shutdown signal.

pub use gridloop_core as core;
pub use gridloop_engine as engine;
pub use gridloop_execution as execution;
pub use gridloop_gateway as gateway;
pub use gridloop_integration as integration;
pub use gridloop_markets as markets;
pub use gridloop_reconcile as reconcile;
pub use gridloop_remote as remote;
pub use gridloop_risk as risk;
pub use gridloop_store as store;
pub use gridloop_strategy as strategy;
pub use gridloop_supervisor as supervisor;

pub mod error;
pub use error::GridloopError;

/// Single-import convenience, mirroring the facade's per-module
/// re-exports for the symbols most callers reach for first.
pub mod prelude {
    pub use crate::core::system::Config;
    pub use crate::error::GridloopError;
    pub use crate::gateway::BrokerGateway;
    pub use crate::markets::{Account, Bot, StrategyKind};
    pub use crate::supervisor::AccountSupervisor;
}
