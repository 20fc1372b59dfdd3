//! # Harness Configuration
//!
//! Fixed waits and retry budgets for a resilience run.
//!
//! ## Settle Parameters
//!
//! | Parameter | Config Field | Default | Models |
//! |-----------|--------------|---------|--------|
//! | Send settle | `send_settle` | 2s | Back-pressure after dispatching one batch |
//! | Pressure sleep | `pressure_sleep` | 10s | In-flight lifecycle calls completing |
//! | Connector start | `connector_start` | 10s | Connector tasks starting after creation |
//!
//! ## Configuration Examples
//!
//! ### Real Deployment
//! ```rust
//! use sinkpool_sim::SettleConfig;
//!
//! let settle = SettleConfig::default();
//! assert_eq!(settle.pressure_sleep.as_secs(), 10);
//! ```
//!
//! ### Virtual Clock / In-Memory Driver
//! ```rust
//! use sinkpool_sim::SettleConfig;
//!
//! let settle = SettleConfig::instant();
//! assert!(settle.send_settle.is_zero());
//! ```
//!
//! ### From a JSON File
//! ```json
//! {
//!   "salt": "_nightly",
//!   "pressure_sleep_ms": 5000,
//!   "retry": { "max_attempts": 20, "initial_backoff_ms": 2000 }
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use sinkpool_core::{HarnessError, HarnessResult, NameSalt};

use crate::retry::RetryPlan;

/// Fixed settle waits used by the scenarios.
///
/// These are tunable constants, not values computed from any completion
/// signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettleConfig {
    /// Wait after each batch dispatch.
    pub send_settle: Duration,
    /// Wait after a lifecycle call applied under load.
    pub pressure_sleep: Duration,
    /// Wait after the runner creates a scenario's connector.
    pub connector_start: Duration,
}

impl Default for SettleConfig {
    fn default() -> Self {
        Self {
            send_settle: Duration::from_secs(2),
            pressure_sleep: Duration::from_secs(10),
            connector_start: Duration::from_secs(10),
        }
    }
}

impl SettleConfig {
    /// All waits zero. Used with the in-memory driver, where ingestion
    /// progresses per driver call rather than with time.
    pub fn instant() -> Self {
        Self {
            send_settle: Duration::ZERO,
            pressure_sleep: Duration::ZERO,
            connector_start: Duration::ZERO,
        }
    }
}

/// Retry section of [`HarnessConfig`]. Missing fields keep the
/// [`RetryPlan::default`] values.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RetryConfig {
    /// Maximum verification attempts per scenario.
    pub max_attempts: Option<usize>,
    /// First backoff, in milliseconds.
    pub initial_backoff_ms: Option<u64>,
    /// Backoff growth factor.
    pub multiplier: Option<f64>,
    /// Backoff cap, in milliseconds.
    pub max_backoff_ms: Option<u64>,
    /// Elapsed-time budget for one scenario's verification, in milliseconds.
    pub max_elapsed_ms: Option<u64>,
    /// Maximum attempt-budget resets per scenario.
    pub max_resets: Option<usize>,
}

/// File-level configuration of a suite run.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct HarnessConfig {
    /// Explicit name salt. A random salt is generated when absent.
    pub salt: Option<String>,
    /// Override for [`SettleConfig::send_settle`], in milliseconds.
    pub send_settle_ms: Option<u64>,
    /// Override for [`SettleConfig::pressure_sleep`], in milliseconds.
    pub pressure_sleep_ms: Option<u64>,
    /// Override for [`SettleConfig::connector_start`], in milliseconds.
    pub connector_start_ms: Option<u64>,
    /// Retry budget overrides.
    pub retry: RetryConfig,
    /// Only run scenarios whose base name contains one of these strings.
    pub scenarios: Vec<String>,
}

impl HarnessConfig {
    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> HarnessResult<Self> {
        serde_json::from_str(json).map_err(|e| HarnessError::Config(e.to_string()))
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> HarnessResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| HarnessError::Config(format!("{}: {e}", path.display())))?;
        Self::from_json_str(&raw)
    }

    /// Resolve the name salt, generating one when none is configured.
    pub fn name_salt(&self) -> NameSalt {
        match &self.salt {
            Some(salt) => NameSalt::new(salt.clone()),
            None => NameSalt::random(),
        }
    }

    /// Apply the configured overrides on top of `base`.
    pub fn settle(&self, base: SettleConfig) -> SettleConfig {
        SettleConfig {
            send_settle: self
                .send_settle_ms
                .map_or(base.send_settle, Duration::from_millis),
            pressure_sleep: self
                .pressure_sleep_ms
                .map_or(base.pressure_sleep, Duration::from_millis),
            connector_start: self
                .connector_start_ms
                .map_or(base.connector_start, Duration::from_millis),
        }
    }

    /// Build the retry plan, validating the overrides.
    pub fn retry_plan(&self) -> HarnessResult<RetryPlan> {
        let base = RetryPlan::default();
        let retry = &self.retry;
        let plan = RetryPlan {
            max_attempts: retry.max_attempts.unwrap_or(base.max_attempts),
            initial_backoff: retry
                .initial_backoff_ms
                .map_or(base.initial_backoff, Duration::from_millis),
            multiplier: retry.multiplier.unwrap_or(base.multiplier),
            max_backoff: retry
                .max_backoff_ms
                .map_or(base.max_backoff, Duration::from_millis),
            max_elapsed: retry
                .max_elapsed_ms
                .map(Duration::from_millis)
                .or(base.max_elapsed),
            max_resets: retry.max_resets.unwrap_or(base.max_resets),
        };
        plan.validate()?;
        Ok(plan)
    }

    /// Whether the scenario with `base_name` passes the scenario filter.
    pub fn selects(&self, base_name: &str) -> bool {
        self.scenarios.is_empty() || self.scenarios.iter().any(|f| base_name.contains(f))
    }
}
