//! Suite reporting.

use std::fmt;
use std::time::Duration;

use sinkpool_core::HarnessError;

use crate::retry::VerifyStats;

/// Final state of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub enum ScenarioOutcome {
    /// Verification settled on success.
    Passed(VerifyStats),
    /// A phase failed.
    Failed(HarnessError),
    /// Not run because an earlier scenario aborted the suite.
    Skipped,
}

/// Result of one scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioReport {
    /// Salted scenario name.
    pub name: String,
    /// How the scenario ended.
    pub outcome: ScenarioOutcome,
    /// Verification attempts made, when known.
    pub attempts: usize,
    /// Time spent on the scenario, measured on the time provider.
    pub wall_time: Duration,
}

impl ScenarioReport {
    /// Report for a scenario that never ran.
    pub fn skipped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            outcome: ScenarioOutcome::Skipped,
            attempts: 0,
            wall_time: Duration::ZERO,
        }
    }

    /// Whether the scenario passed.
    pub fn passed(&self) -> bool {
        matches!(self.outcome, ScenarioOutcome::Passed(_))
    }

    /// The failure, if the scenario failed.
    pub fn error(&self) -> Option<&HarnessError> {
        match &self.outcome {
            ScenarioOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Report generated after running a suite.
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteReport {
    /// Salt the suite ran with.
    pub salt: String,
    /// Per-scenario results, in run order.
    pub scenarios: Vec<ScenarioReport>,
    /// Total time, measured on the time provider.
    pub total_time: Duration,
}

impl SuiteReport {
    /// Number of passed scenarios.
    pub fn passed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.passed()).count()
    }

    /// Number of failed scenarios.
    pub fn failed(&self) -> usize {
        self.scenarios.iter().filter(|s| s.error().is_some()).count()
    }

    /// Number of skipped scenarios.
    pub fn skipped(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| s.outcome == ScenarioOutcome::Skipped)
            .count()
    }

    /// Whether every scenario passed.
    pub fn all_passed(&self) -> bool {
        self.passed() == self.scenarios.len()
    }

    /// Calculate the success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        let total = self.scenarios.len();
        if total == 0 {
            0.0
        } else {
            (self.passed() as f64 / total as f64) * 100.0
        }
    }

    /// Find a scenario by salted name.
    pub fn scenario(&self, name: &str) -> Option<&ScenarioReport> {
        self.scenarios.iter().find(|s| s.name == name)
    }
}

impl fmt::Display for SuiteReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Resilience Suite Report ===")?;
        writeln!(f, "Salt: {}", self.salt)?;
        writeln!(f, "Total Scenarios: {}", self.scenarios.len())?;
        writeln!(f, "Passed: {}", self.passed())?;
        writeln!(f, "Failed: {}", self.failed())?;
        writeln!(f, "Skipped: {}", self.skipped())?;
        writeln!(f, "Success Rate: {:.2}%", self.success_rate())?;
        writeln!(f, "Total Time: {:?}", self.total_time)?;
        writeln!(f)?;

        for scenario in &self.scenarios {
            match &scenario.outcome {
                ScenarioOutcome::Passed(stats) => writeln!(
                    f,
                    "✅ {}: PASSED ({} attempt(s), {} reset(s), {:?})",
                    scenario.name, stats.attempts, stats.resets, scenario.wall_time
                )?,
                ScenarioOutcome::Failed(e) => writeln!(
                    f,
                    "❌ {}: FAILED [{}] {}",
                    scenario.name,
                    e.classification(),
                    e
                )?,
                ScenarioOutcome::Skipped => writeln!(f, "⏭ {}: SKIPPED", scenario.name)?,
            }
        }

        Ok(())
    }
}
