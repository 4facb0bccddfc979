#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]

//! # Order entity
//!
//! Wraps one broker ticket: refreshes it from the broker gateway, and
//! carries the two-phase verification a ticket must pass before a
//! suspected closure is committed to the local store. The per-cycle
//! order sets higher up hold only ticket numbers; this is the type those
//! tickets get hydrated into for management and persistence.

pub mod error;
pub mod order;
pub mod repository;

pub use error::ExecutionError;
pub use order::{Order, RefreshOutcome};
pub use repository::OrderRepository;
