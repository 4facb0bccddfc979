//! # Shutdown Management
//!
//! Traits and types for cooperative shutdown of the orchestrator's
//! long-lived tasks (§5: "On process shutdown the Supervisor cancels its
//! children; children are expected to exit at their next suspension
//! point"). The Account Supervisor holds one [`Shutdown`]-sensitive
//! handle per child task (strategy loops, reconciliation, the four
//! per-account tasks of §4.8) and calls [`AsyncShutdown::shutdown`] on
//! each at teardown.
//!
//! ## Shutdown Patterns
//!
//! Components that can tear down without awaiting anything implement
//! [`SyncShutdown`]; components that need to flush state (e.g. a final
//! write to the Local Store) implement [`AsyncShutdown`].

use serde::{Deserialize, Serialize};
use std::future::Future;

/// Trait for components that can be shut down synchronously.
///
/// Implement this trait for components that can complete their shutdown
/// operations immediately without requiring async operations.
pub trait SyncShutdown {
    /// The result type returned by the shutdown operation
    type Result;
    /// Performs synchronous shutdown of the component
    fn shutdown(&mut self) -> Self::Result;
}

/// Trait for components that require asynchronous shutdown operations.
///
/// Implement this trait for components that need to perform async operations
/// during shutdown, such as flushing buffers, closing network connections,
/// or waiting for pending operations to complete.
pub trait AsyncShutdown {
    /// The result type returned by the shutdown operation
    type Result;
    /// Performs asynchronous shutdown of the component
    fn shutdown(&mut self) -> impl Future<Output = Self::Result>;
}

/// A shutdown signal, sent through a `tokio::sync::watch` or `broadcast`
/// channel to every long-lived task owned by the Account Supervisor.
#[derive(
    Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Deserialize, Serialize,
)]
pub struct Shutdown;
