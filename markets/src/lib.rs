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

//! # Markets — shared domain vocabulary
//!
//! The value types every other Gridloop crate builds on: order [`Side`],
//! the fieldless [`kind`] enums (strategy/cycle/sltp/order/timeframe), pip
//! and point [`price`] conversions, and the [`symbol::Symbol`] /
//! [`symbol::Candle`] snapshots the broker gateway returns.
//!
//! Kept deliberately small and dependency-light: every downstream crate
//! (gateway, execution, engine, strategy, store, remote) depends on this
//! one, never the other way around.

pub mod account;
pub mod bot;
pub mod kind;
pub mod price;
pub mod side;
pub mod symbol;

pub use account::{Account, AccountSnapshot, AccountStatus};
pub use bot::{Bot, BotRuntime, StrategyConfig};
pub use kind::{CandleDirection, CycleKind, CycleStatus, OpenedBy, OrderKind, SltpKind, StrategyKind, Timeframe};
pub use price::{stop_loss_price, take_profit_price, truncate_comment, SlTpUnit, SymbolInfo};
pub use side::Side;
pub use symbol::{Candle, Symbol};
