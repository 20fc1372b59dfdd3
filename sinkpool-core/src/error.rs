//! Error types for the resilience harness.

use thiserror::Error;

use crate::driver::DriverError;
use crate::payload::CodecError;
use crate::time::TimeError;

/// Failure taxonomy shared by scenarios, the retry loop and the suite runner.
///
/// A deficient count that may still converge is not an error: scenarios
/// report it as a retryable verification, and it only becomes
/// [`HarnessError::RetryBudgetExhausted`] once the retry loop gives up.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HarnessError {
    /// Setup-time failure (topic or table creation). Never retried.
    #[error("provisioning of {resource} failed: {source}")]
    Provisioning {
        /// Resource being provisioned.
        resource: String,
        /// Driver failure.
        source: DriverError,
    },

    /// An invariant of the system under test was violated.
    #[error("scenario {scenario} failed non-retryably: {reason}")]
    NonRetryable {
        /// Scenario name.
        scenario: String,
        /// Description of the violation, including observed and expected counts.
        reason: String,
    },

    /// Verification kept reporting a deficiency until the retry budget ran out.
    #[error("scenario {scenario} did not converge after {attempts} attempt(s): {reason}")]
    RetryBudgetExhausted {
        /// Scenario name.
        scenario: String,
        /// Verification attempts made.
        attempts: usize,
        /// Last deficiency reported.
        reason: String,
    },

    /// The scenario asked for more attempt-budget resets than allowed.
    #[error("scenario {scenario} exceeded {resets} retry resets")]
    ResetBudgetExhausted {
        /// Scenario name.
        scenario: String,
        /// Resets performed.
        resets: usize,
    },

    /// A driver call failed outside provisioning.
    #[error("driver error: {0}")]
    Driver(#[from] DriverError),

    /// A settle wait failed.
    #[error("time error: {0}")]
    Time(#[from] TimeError),

    /// A record payload could not be encoded.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Harness configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The harness is in an invalid state.
    #[error("invalid harness state: {0}")]
    InvalidState(String),
}

/// A type alias for `Result<T, HarnessError>`.
pub type HarnessResult<T> = Result<T, HarnessError>;

impl HarnessError {
    /// Wrap a driver failure raised while provisioning `resource`.
    pub fn provisioning(resource: impl Into<String>, source: DriverError) -> Self {
        HarnessError::Provisioning {
            resource: resource.into(),
            source,
        }
    }

    /// Short name of the failure kind, used in reports.
    pub fn classification(&self) -> &'static str {
        match self {
            HarnessError::Provisioning { .. } => "provisioning",
            HarnessError::NonRetryable { .. } => "non-retryable",
            HarnessError::RetryBudgetExhausted { .. } => "retry-budget-exhausted",
            HarnessError::ResetBudgetExhausted { .. } => "reset-budget-exhausted",
            HarnessError::Driver(_) => "driver",
            HarnessError::Time(_) => "time",
            HarnessError::Codec(_) => "codec",
            HarnessError::Config(_) => "config",
            HarnessError::InvalidState(_) => "invalid-state",
        }
    }

    /// Whether this failure must abort the rest of the run.
    pub fn is_fatal_for_run(&self) -> bool {
        matches!(self, HarnessError::NonRetryable { .. })
    }
}
