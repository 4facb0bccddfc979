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

//! # Risk — autotrade gating, batch stop-loss and global loss tracking
//!
//! Everything a cycle or strategy loop consults before opening, closing,
//! or batch-stopping, but that isn't itself part of the cycle state
//! machine: the [`check`] gating predicates (§4.5.4, §4.5.2 item 5) and
//! the append-only [`GlobalLossTracker`] (§3).

pub mod check;
pub mod tracker;

pub use check::*;
pub use tracker::GlobalLossTracker;
