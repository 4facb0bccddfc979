#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]
#![allow(clippy::too_many_arguments)]

//! # Strategy Loop and Event Router
//!
//! The per-bot driver (§4.6): a 1s tick that manages every active cycle,
//! evaluates autotrade gating ([`gating`]), fires candle-close trading,
//! and a `handle_event` router over the tagged-union user events
//! ([`event::StrategyEvent`]).

pub mod error;
pub mod event;
pub mod gating;
pub mod loop_driver;
pub mod repository;

pub use error::StrategyError;
pub use event::{EventContent, EventMeta, StrategyEvent};
pub use gating::may_open_new_cycle;
pub use loop_driver::{StrategyLoop, TickSummary};
pub use repository::{BotRepository, RemoteCyclePublisher};
