#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]

//! # Order Reconciliation (§4.7, component C7)
//!
//! A background task, one per broker session, diffing the broker's
//! active tickets against the Local Store's "open" orders: refreshing
//! the intersection, double-verifying the rest before committing a
//! closure, and reopening a cycle the broker still shows active
//! positions for.

pub mod error;
pub mod service;

pub use error::ReconcileError;
pub use service::{ReconciliationService, ReconcileSummary};
