#![forbid(unsafe_code)]
#![warn(unused, rust_2018_idioms)]

//! # Remote Store Client (§4.3, component C3)
//!
//! Bearer-token REST access to the remote document store plus a
//! reconnecting realtime event feed, implementing
//! `gridloop_strategy::RemoteCyclePublisher` downstream.

pub mod auth;
pub mod client;
pub mod error;
pub mod events;
pub mod filter;
pub mod serialize;

pub use client::RemoteClient;
pub use error::RemoteError;
pub use events::EventSubscription;
pub use filter::{Clause, Filter};
pub use serialize::{to_remote_cycle_creation_json, to_remote_json};
