//! Virtual time provider.

use async_trait::async_trait;
use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use sinkpool_core::{TimeError, TimeProvider};

#[derive(Debug, Default)]
struct VirtualClock {
    now: Duration,
    sleeps: Vec<Duration>,
}

/// Time provider whose clock only moves when something sleeps on it.
///
/// `sleep` returns immediately after advancing the clock by the requested
/// duration, and every requested wait is recorded. Clones share the same
/// clock, so a test can keep one handle and give another to the harness.
#[derive(Debug, Clone, Default)]
pub struct VirtualTimeProvider {
    clock: Rc<RefCell<VirtualClock>>,
}

impl VirtualTimeProvider {
    /// Create a virtual clock at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Move the clock forward without recording a sleep.
    pub fn advance(&self, duration: Duration) {
        self.clock.borrow_mut().now += duration;
    }

    /// Every duration passed to `sleep`, in call order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.clock.borrow().sleeps.clone()
    }

    /// Sum of all recorded sleeps.
    pub fn total_slept(&self) -> Duration {
        self.clock.borrow().sleeps.iter().sum()
    }
}

#[async_trait(?Send)]
impl TimeProvider for VirtualTimeProvider {
    async fn sleep(&self, duration: Duration) -> Result<(), TimeError> {
        let mut clock = self.clock.borrow_mut();
        clock.now += duration;
        clock.sleeps.push(duration);
        Ok(())
    }

    fn now(&self) -> Duration {
        self.clock.borrow().now
    }
}
