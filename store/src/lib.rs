#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]

//! # Local Store (§4.2, component C2)
//!
//! A SQLite-backed implementation of the repository ports defined
//! upstream (`gridloop_engine::CycleRepository`,
//! `gridloop_execution::OrderRepository`,
//! `gridloop_strategy::BotRepository`). The store depends on those
//! crates, never the reverse, so the engine/execution/strategy layers
//! stay free of any persistence engine choice.

pub mod error;
mod local;

pub use error::StoreError;
pub use local::LocalStore;
