//! Suite runner executing scenarios against a driver.
//!
//! Each scenario goes through the same sequence:
//!
//! ```text
//! setup → create_connector → wait(connector_start) → send → verify (retried)
//!                                                              │
//!                               delete_connector → clean  <────┘ (always)
//! ```
//!
//! The connector is deleted before cleaning so it cannot ingest a backlog
//! into the dropped table. Teardown runs whatever happened before it; its
//! own failures are logged and never replace the scenario's result. A
//! non-retryable failure aborts the suite and every remaining scenario is
//! reported as skipped.

use std::fmt;
use std::rc::Rc;

use sinkpool_core::{ConnectorDriver, HarnessError, HarnessResult, NameSalt, TimeProvider};

use crate::config::SettleConfig;
use crate::retry::{verify_until_settled, RetryPlan, VerifyStats};
use crate::scenario::{Scenario, ScenarioContext};

use super::report::{ScenarioOutcome, ScenarioReport, SuiteReport};

/// Builder and executor for a resilience suite.
///
/// Scenarios must be built with the same [`NameSalt`] that is given to the
/// runner, since the runner creates each connector from that salt.
pub struct SuiteRunner {
    driver: Rc<dyn ConnectorDriver>,
    time: Rc<dyn TimeProvider>,
    salt: NameSalt,
    settle: SettleConfig,
    plan: RetryPlan,
    scenarios: Vec<Box<dyn Scenario>>,
}

impl fmt::Debug for SuiteRunner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuiteRunner")
            .field("salt", &self.salt)
            .field("settle", &self.settle)
            .field("plan", &self.plan)
            .field(
                "scenarios",
                &self.scenarios.iter().map(|s| s.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SuiteRunner {
    /// Create a runner with a random salt, default settle waits and the
    /// default retry plan.
    pub fn new(driver: Rc<dyn ConnectorDriver>, time: Rc<dyn TimeProvider>) -> Self {
        Self {
            driver,
            time,
            salt: NameSalt::random(),
            settle: SettleConfig::default(),
            plan: RetryPlan::default(),
            scenarios: Vec::new(),
        }
    }

    /// Set the name salt.
    pub fn salt(mut self, salt: NameSalt) -> Self {
        self.salt = salt;
        self
    }

    /// Set the settle waits.
    pub fn settle(mut self, settle: SettleConfig) -> Self {
        self.settle = settle;
        self
    }

    /// Set the retry plan used for every scenario's verification.
    pub fn retry_plan(mut self, plan: RetryPlan) -> Self {
        self.plan = plan;
        self
    }

    /// Register a scenario.
    pub fn scenario<S: Scenario>(mut self, scenario: S) -> Self {
        self.scenarios.push(Box::new(scenario));
        self
    }

    /// Register several boxed scenarios.
    pub fn scenarios(mut self, scenarios: Vec<Box<dyn Scenario>>) -> Self {
        self.scenarios.extend(scenarios);
        self
    }

    /// Context the scenarios run with.
    pub fn context(&self) -> ScenarioContext {
        ScenarioContext::new(
            self.driver.clone(),
            self.time.clone(),
            self.salt.clone(),
            self.settle.clone(),
        )
    }

    /// Run every registered scenario in order.
    pub async fn run(self) -> SuiteReport {
        let ctx = self.context();
        let started = ctx.time().now();
        let mut reports = Vec::with_capacity(self.scenarios.len());
        let mut aborted = false;

        tracing::info!(
            "Running {} scenario(s) with salt {}",
            self.scenarios.len(),
            self.salt
        );

        for mut scenario in self.scenarios {
            if aborted {
                tracing::warn!("Skipping {}", scenario.name());
                reports.push(ScenarioReport::skipped(scenario.name()));
                continue;
            }

            let report = run_scenario(scenario.as_mut(), &ctx, &self.plan).await;
            if report.error().is_some_and(HarnessError::is_fatal_for_run) {
                tracing::error!("{} aborted the suite", report.name);
                aborted = true;
            }
            reports.push(report);
        }

        SuiteReport {
            salt: self.salt.to_string(),
            scenarios: reports,
            total_time: ctx.time().now().saturating_sub(started),
        }
    }
}

async fn run_scenario(
    scenario: &mut dyn Scenario,
    ctx: &ScenarioContext,
    plan: &RetryPlan,
) -> ScenarioReport {
    let started = ctx.time().now();
    tracing::info!("Starting scenario {}", scenario.name());

    let result = drive(scenario, ctx, plan).await;
    teardown(scenario, ctx).await;

    let (outcome, attempts) = match result {
        Ok(stats) => (ScenarioOutcome::Passed(stats), stats.attempts),
        Err(e) => {
            tracing::error!("Scenario {} failed: {}", scenario.name(), e);
            let attempts = match &e {
                HarnessError::RetryBudgetExhausted { attempts, .. } => *attempts,
                _ => 0,
            };
            (ScenarioOutcome::Failed(e), attempts)
        }
    };

    ScenarioReport {
        name: scenario.name().to_string(),
        outcome,
        attempts,
        wall_time: ctx.time().now().saturating_sub(started),
    }
}

async fn drive(
    scenario: &mut dyn Scenario,
    ctx: &ScenarioContext,
    plan: &RetryPlan,
) -> HarnessResult<VerifyStats> {
    if !scenario.name().ends_with(ctx.salt().as_str()) {
        return Err(HarnessError::InvalidState(format!(
            "scenario {} was not built with salt {}",
            scenario.name(),
            ctx.salt()
        )));
    }

    scenario.setup(ctx).await?;

    ctx.driver()
        .create_connector(&scenario.config_file_name(), ctx.salt().as_str())
        .await?;
    ctx.wait(ctx.settle().connector_start).await?;

    scenario.send(ctx).await?;
    verify_until_settled(scenario, ctx, plan).await
}

async fn teardown(scenario: &mut dyn Scenario, ctx: &ScenarioContext) {
    if let Err(e) = ctx.driver().delete_connector(scenario.name()).await {
        tracing::warn!("Deleting connector {} failed: {}", scenario.name(), e);
    }
    if let Err(e) = scenario.clean(ctx).await {
        tracing::warn!("Cleaning {} failed: {}", scenario.name(), e);
    }
}
