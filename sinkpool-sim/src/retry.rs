//! Retry loop driving a scenario's verification to a verdict.
//!
//! Verification runs right after a fault was injected, so the first answers
//! are usually "not yet". [`verify_until_settled`] keeps polling with
//! exponential backoff while the scenario reports [`Verification::Retryable`],
//! and stops on the first success, on the first non-retryable verdict, or
//! when the [`RetryPlan`] budget runs out.
//!
//! ```text
//!   verify ──Success──────────────> Ok(stats)
//!     │  ──NonRetryable─────────────> Err(NonRetryable)      (no further attempts)
//!     │  ──ResetAndRetry──> round = 0, verify again        (no backoff)
//!     └──Retryable──> budget left? ──no──> Err(RetryBudgetExhausted)
//!                          │ yes
//!                          └── sleep(backoff(round)) ──> verify
//! ```

use std::time::Duration;

use sinkpool_core::{HarnessError, HarnessResult};

use crate::scenario::{Scenario, ScenarioContext, Verification};

/// Retry budget and backoff schedule for verification.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPlan {
    /// Maximum verification attempts between resets. At least 1.
    pub max_attempts: usize,
    /// Backoff after the first retryable attempt.
    pub initial_backoff: Duration,
    /// Growth factor applied per attempt. At least 1.0.
    pub multiplier: f64,
    /// Backoff cap.
    pub max_backoff: Duration,
    /// Elapsed-time budget measured on the time provider, if any.
    pub max_elapsed: Option<Duration>,
    /// Maximum number of [`Verification::ResetAndRetry`] per scenario.
    pub max_resets: usize,
}

impl Default for RetryPlan {
    fn default() -> Self {
        Self {
            max_attempts: 60,
            initial_backoff: Duration::from_secs(1),
            multiplier: 2.0,
            max_backoff: Duration::from_secs(30),
            max_elapsed: Some(Duration::from_secs(15 * 60)),
            max_resets: 32,
        }
    }
}

impl RetryPlan {
    /// `max_attempts` attempts with no backoff and no elapsed budget.
    pub fn immediate(max_attempts: usize) -> Self {
        Self {
            max_attempts,
            initial_backoff: Duration::ZERO,
            multiplier: 1.0,
            max_backoff: Duration::ZERO,
            max_elapsed: None,
            max_resets: RetryPlan::default().max_resets,
        }
    }

    /// Reject plans that could never attempt or never back off sanely.
    pub fn validate(&self) -> HarnessResult<()> {
        if self.max_attempts == 0 {
            return Err(HarnessError::Config("max_attempts must be at least 1".into()));
        }
        if !self.multiplier.is_finite() || self.multiplier < 1.0 {
            return Err(HarnessError::Config(format!(
                "multiplier must be a finite value >= 1.0, got {}",
                self.multiplier
            )));
        }
        if self.initial_backoff > self.max_backoff {
            return Err(HarnessError::Config(format!(
                "initial_backoff {:?} exceeds max_backoff {:?}",
                self.initial_backoff, self.max_backoff
            )));
        }
        Ok(())
    }

    /// Backoff to wait after the retryable attempt with index `round`.
    pub fn backoff(&self, round: usize) -> Duration {
        let exponent = i32::try_from(round).unwrap_or(i32::MAX);
        let scaled = self.initial_backoff.as_secs_f64() * self.multiplier.powi(exponent);
        if !scaled.is_finite() || scaled >= self.max_backoff.as_secs_f64() {
            self.max_backoff
        } else {
            Duration::from_secs_f64(scaled)
        }
    }

    /// [`backoff`](Self::backoff) for `round`, shortened so the wait never
    /// runs past `max_elapsed` once `elapsed` has already been spent.
    pub fn backoff_within(&self, round: usize, elapsed: Duration) -> Duration {
        let backoff = self.backoff(round);
        match self.max_elapsed {
            Some(max) => backoff.min(max.saturating_sub(elapsed)),
            None => backoff,
        }
    }
}

/// Statistics of a settled verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct VerifyStats {
    /// Total `verify` calls, across resets.
    pub attempts: usize,
    /// Resets requested by the scenario.
    pub resets: usize,
    /// Time spent, measured on the time provider.
    pub elapsed: Duration,
}

/// Call `scenario.verify` until it settles according to `plan`.
///
/// Driver and time errors raised by `verify` propagate unchanged.
pub async fn verify_until_settled(
    scenario: &mut dyn Scenario,
    ctx: &ScenarioContext,
    plan: &RetryPlan,
) -> HarnessResult<VerifyStats> {
    plan.validate()?;

    let started = ctx.time().now();
    let mut stats = VerifyStats::default();
    let mut round = 0;

    loop {
        tracing::debug!("Verifying {} (round {})", scenario.name(), round);
        let verification = scenario.verify(ctx, round).await?;
        stats.attempts += 1;
        stats.elapsed = ctx.time().now().saturating_sub(started);

        match verification {
            Verification::Success => {
                tracing::info!(
                    "{} verified after {} attempt(s)",
                    scenario.name(),
                    stats.attempts
                );
                return Ok(stats);
            }
            Verification::NonRetryable { reason } => {
                tracing::error!("{} failed non-retryably: {}", scenario.name(), reason);
                return Err(HarnessError::NonRetryable {
                    scenario: scenario.name().to_string(),
                    reason,
                });
            }
            Verification::ResetAndRetry => {
                stats.resets += 1;
                if stats.resets > plan.max_resets {
                    return Err(HarnessError::ResetBudgetExhausted {
                        scenario: scenario.name().to_string(),
                        resets: stats.resets,
                    });
                }
                tracing::debug!("{} requested a retry reset", scenario.name());
                round = 0;
            }
            Verification::Retryable { reason } => {
                round += 1;
                let out_of_time = plan.max_elapsed.is_some_and(|max| stats.elapsed >= max);
                if round >= plan.max_attempts || out_of_time {
                    tracing::error!(
                        "{} did not converge after {} attempt(s): {}",
                        scenario.name(),
                        round,
                        reason
                    );
                    return Err(HarnessError::RetryBudgetExhausted {
                        scenario: scenario.name().to_string(),
                        attempts: round,
                        reason,
                    });
                }
                let backoff = plan.backoff_within(round - 1, stats.elapsed);
                tracing::debug!(
                    "{} not settled ({}), retrying in {:?}",
                    scenario.name(),
                    reason,
                    backoff
                );
                ctx.wait(backoff).await?;
            }
        }
    }
}
