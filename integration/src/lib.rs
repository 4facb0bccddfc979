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

//! # Integration — low-level plumbing shared across Gridloop crates
//!
//! Small, dependency-light building blocks used by the broker gateway, the
//! remote store client and the account supervisor: fast-hashing
//! [`collection`] aliases and the [`processed_events::ProcessedEvents`]
//! bounded dedup set that gives event delivery its at-most-once guarantee
//! (§5, §8 invariant 5).

pub mod collection;
pub mod processed_events;

pub use collection::{FnvIndexMap, FnvIndexSet};
pub use processed_events::ProcessedEvents;

/// Marker for event/message types that terminate a stream or loop —
/// mirrors the shutdown-signalling convention used across the supervisor
/// and strategy loop's event channels.
pub trait Terminal {
    fn is_terminal(&self) -> bool;
}
