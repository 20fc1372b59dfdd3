//! Time provider abstraction for settle waits.
//!
//! Scenarios model asynchronous ingestion lag with fixed waits. Routing those
//! waits through [`TimeProvider`] lets the harness run them on the wall clock
//! in a real deployment and on a virtual clock in tests.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during time operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimeError {
    /// The time provider has been shut down and is no longer accessible.
    #[error("time provider shut down")]
    Shutdown,
}

/// Provider trait for time operations.
///
/// Waits are plain fixed delays: they are not cancellable and they are never
/// derived from a completion signal.
///
/// ## Time Semantics
///
/// - `sleep()`: suspend the caller for `duration`. Real providers block the
///   task on the wall clock; virtual providers advance their own clock.
/// - `now()`: elapsed time since the provider was created. The retry loop
///   uses it to enforce its elapsed-time budget.
#[async_trait(?Send)]
pub trait TimeProvider {
    /// Sleep for the specified duration.
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError>;

    /// Get the elapsed time since the provider was created.
    fn now(&self) -> Duration;
}

/// Real time provider using Tokio's time facilities.
#[derive(Debug, Clone)]
pub struct TokioTimeProvider {
    /// Start time for calculating elapsed duration
    start_time: std::time::Instant,
}

impl TokioTimeProvider {
    /// Create a new Tokio time provider.
    pub fn new() -> Self {
        Self {
            start_time: std::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait(?Send)]
impl TimeProvider for TokioTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        tokio::time::sleep(duration).await;
        Ok(())
    }

    fn now(&self) -> Duration {
        self.start_time.elapsed()
    }
}
