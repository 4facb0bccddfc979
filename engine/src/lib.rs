#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

//! # Cycle state engine
//!
//! The per-symbol grid-trading state machine several strategy families
//! instantiate with different parameters: zone tracking, grid
//! placement, reversal, hedging/recovery, batch stop-loss, take-profit,
//! and candle-close cycle creation.

pub mod candle;
pub mod cycle;
pub mod error;
pub mod repository;
pub mod tick;

pub use candle::open_candle_close_cycle;
pub use cycle::Cycle;
pub use error::EngineError;
pub use repository::CycleRepository;
pub use tick::TickOutcome;
