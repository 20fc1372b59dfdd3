//! Count verification under at-least-once delivery.
//!
//! A scenario compares the observed row count of its table with an inclusive
//! range of acceptable counts:
//!
//! ```text
//!   0 ........ lower ============ upper ........ ∞
//!   deficiency │     success      │  excess
//!   (retry)    │   (inclusive)    │  (abort)
//! ```
//!
//! A count below the range may still converge, because ingestion lags behind
//! the sends. A count above the range can never recover: more rows than
//! records sent means records were duplicated.

use std::fmt;

/// Inclusive range of acceptable row counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpectedRange {
    lower: u64,
    upper: u64,
}

impl ExpectedRange {
    /// Range for `expected_sends` batches of `records_per_batch` records when
    /// the batch sent under fault may or may not have landed:
    /// `records_per_batch * (expected_sends - 1) ..= records_per_batch * expected_sends`.
    ///
    /// Both bounds saturate at `u64::MAX`.
    pub fn for_sends(records_per_batch: u64, expected_sends: u64) -> Self {
        Self {
            lower: records_per_batch.saturating_mul(expected_sends.saturating_sub(1)),
            upper: records_per_batch.saturating_mul(expected_sends),
        }
    }

    /// Exactly `count` rows.
    pub fn exact(count: u64) -> Self {
        Self {
            lower: count,
            upper: count,
        }
    }

    /// Smallest acceptable count.
    pub fn lower(&self) -> u64 {
        self.lower
    }

    /// Largest acceptable count.
    pub fn upper(&self) -> u64 {
        self.upper
    }

    /// Classify an observed count against this range.
    pub fn classify(&self, observed: u64) -> CountOutcome {
        if observed < self.lower {
            CountOutcome::RetryableDeficiency
        } else if observed > self.upper {
            CountOutcome::NonRetryableExcess
        } else {
            CountOutcome::Success
        }
    }
}

impl fmt::Display for ExpectedRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.lower == self.upper {
            write!(f, "{}", self.lower)
        } else {
            write!(f, "{}..={}", self.lower, self.upper)
        }
    }
}

/// Result of comparing an observed count with an [`ExpectedRange`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountOutcome {
    /// Within the range, bounds included.
    Success,
    /// Below the range; ingestion may still be lagging.
    RetryableDeficiency,
    /// Above the range; records were duplicated.
    NonRetryableExcess,
}

/// Classify `observed` against the range for `expected_sends` batches.
pub fn classify_sends(observed: u64, records_per_batch: u64, expected_sends: u64) -> CountOutcome {
    ExpectedRange::for_sends(records_per_batch, expected_sends).classify(observed)
}

/// Tagged result of one verification attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verification {
    /// The scenario's expectations hold.
    Success,
    /// Not converged yet; the retry loop should poll again after a backoff.
    Retryable {
        /// What is missing.
        reason: String,
    },
    /// An invariant is violated; the run must abort.
    NonRetryable {
        /// What was violated.
        reason: String,
    },
    /// Progress was made; restart the attempt budget and verify again.
    ResetAndRetry,
}

impl Verification {
    /// Whether this is [`Verification::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Verification::Success)
    }
}

/// An observed table count together with the range it was checked against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountCheck {
    /// Table that was counted.
    pub table: String,
    /// Observed row count.
    pub observed: u64,
    /// Acceptable range.
    pub range: ExpectedRange,
}

impl CountCheck {
    /// Bundle an observation.
    pub fn new(table: impl Into<String>, observed: u64, range: ExpectedRange) -> Self {
        Self {
            table: table.into(),
            observed,
            range,
        }
    }

    /// Classification of this observation.
    pub fn outcome(&self) -> CountOutcome {
        self.range.classify(self.observed)
    }

    /// Turn the observation into a verification result, logging it.
    pub fn into_verification(self) -> Verification {
        match self.outcome() {
            CountOutcome::Success => {
                tracing::info!("Success - {}", self);
                Verification::Success
            }
            CountOutcome::RetryableDeficiency => {
                tracing::warn!("Less records than expected, will retry: {}", self);
                Verification::Retryable {
                    reason: format!("deficiency: {self}"),
                }
            }
            CountOutcome::NonRetryableExcess => {
                tracing::error!("Duplicates detected: {}", self);
                Verification::NonRetryable {
                    reason: format!(
                        "duplication detected: {self}; the table holds more records than were sent"
                    ),
                }
            }
        }
    }
}

impl fmt::Display for CountCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observed {} rows in {}, expected {}",
            self.observed, self.table, self.range
        )
    }
}
