//! Cycle the connector through every lifecycle method.
//!
//! This scenario uses `verify` as its driver: each call runs one iteration,
//! which upserts the connector, sends a batch, applies one lifecycle method,
//! sends a second batch and checks the table grew by exactly the batches
//! that should have landed. A passing iteration answers
//! [`Verification::ResetAndRetry`] so the next one gets a fresh attempt
//! budget. Once every iteration passed, `verify` reports success.
//!
//! | Iteration | Method | Batches expected |
//! |-----------|--------|------------------|
//! | 1 | restart | 2 |
//! | 2 | pause, wait, resume | 2 |
//! | 3 | delete, wait, create | 2 |
//! | 4 | delete, wait, resume | 1 |
//! | 5 | pause, wait, create | 2 |
//! | 6 | recreate | 2 |
//! | 7 | none | 2 |

use async_trait::async_trait;
use sinkpool_core::{HarnessError, HarnessResult, NameSalt};

use crate::scenario::{
    CountCheck, ExpectedRange, ExpectedSends, Scenario, ScenarioContext, Verification,
};

/// Base identifier of the scenario.
pub const BASE_NAME: &str = "test_kc_resilience";

/// Lifecycle method applied between the two batches of an iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleMethod {
    /// Restart the connector.
    Restart,
    /// Pause, wait, resume.
    PauseResume,
    /// Delete, wait, create.
    DeleteCreate,
    /// Delete, wait, resume. Resume does not recreate, so the second batch
    /// stays in the topic.
    DeleteResume,
    /// Pause, wait, create.
    PauseCreate,
    /// Create over the running connector.
    Recreate,
    /// Leave the connector alone.
    NoOp,
}

impl LifecycleMethod {
    /// Method applied in 1-based `iteration` of a cycle of `total` iterations.
    pub fn for_iteration(iteration: usize, total: usize) -> Self {
        match iteration % total.max(1) {
            1 => LifecycleMethod::Restart,
            2 => LifecycleMethod::PauseResume,
            3 => LifecycleMethod::DeleteCreate,
            4 => LifecycleMethod::DeleteResume,
            5 => LifecycleMethod::PauseCreate,
            6 => LifecycleMethod::Recreate,
            _ => LifecycleMethod::NoOp,
        }
    }
}

/// Lifecycle-cycle scenario.
#[derive(Debug, Clone)]
pub struct LifecycleCycle {
    topic: String,
    record_num: u64,
    partition_num: u32,
    total_iterations: usize,
    iteration: usize,
    pending_goal: Option<u64>,
}

impl LifecycleCycle {
    /// Derive the topic and connector name for `salt`.
    pub fn new(salt: &NameSalt) -> Self {
        Self {
            topic: salt.apply(BASE_NAME),
            record_num: 1000,
            partition_num: 1,
            total_iterations: 7,
            iteration: 0,
            pending_goal: None,
        }
    }

    /// Derive names from the context's salt and provision the topic.
    pub async fn configure(ctx: &ScenarioContext) -> HarnessResult<Self> {
        let mut scenario = Self::new(ctx.salt());
        scenario.setup(ctx).await?;
        Ok(scenario)
    }

    /// Iterations started so far.
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    /// Iterations in a full cycle.
    pub fn total_iterations(&self) -> usize {
        self.total_iterations
    }

    async fn apply(
        &self,
        ctx: &ScenarioContext,
        method: LifecycleMethod,
        expected: &mut ExpectedSends,
    ) -> HarnessResult<()> {
        let driver = ctx.driver();
        let connector = self.topic.as_str();
        let config_file = self.config_file_name();
        let salt = ctx.salt().as_str();
        let pause = ctx.settle().pressure_sleep;

        tracing::info!("Applying {:?} to {}", method, connector);
        match method {
            LifecycleMethod::Restart => driver.restart_connector(connector).await?,
            LifecycleMethod::PauseResume => {
                driver.pause_connector(connector).await?;
                ctx.wait(pause).await?;
                driver.resume_connector(connector).await?;
            }
            LifecycleMethod::DeleteCreate => {
                driver.delete_connector(connector).await?;
                ctx.wait(pause).await?;
                driver.create_connector(&config_file, salt).await?;
            }
            LifecycleMethod::DeleteResume => {
                driver.delete_connector(connector).await?;
                ctx.wait(pause).await?;
                driver.resume_connector(connector).await?;
                expected.forfeit();
            }
            LifecycleMethod::PauseCreate => {
                driver.pause_connector(connector).await?;
                ctx.wait(pause).await?;
                driver.create_connector(&config_file, salt).await?;
            }
            LifecycleMethod::Recreate => driver.create_connector(&config_file, salt).await?,
            LifecycleMethod::NoOp => {}
        }
        Ok(())
    }

    /// Count the table against the pending goal.
    async fn check(&mut self, ctx: &ScenarioContext, goal: u64) -> HarnessResult<Verification> {
        let observed = ctx.count_rows(&self.topic).await?;
        let verification =
            CountCheck::new(&self.topic, observed, ExpectedRange::exact(goal)).into_verification();
        match verification {
            Verification::Success => {
                self.pending_goal = None;
                tracing::info!(
                    "Iteration {}/{} passed",
                    self.iteration,
                    self.total_iterations
                );
                Ok(Verification::ResetAndRetry)
            }
            other => Ok(other),
        }
    }
}

/// Rows expected after an iteration that started at `previous` rows and
/// landed `sends` batches of `record_num` records. Saturates at `u64::MAX`.
fn iteration_goal(previous: u64, record_num: u64, sends: u64) -> u64 {
    previous.saturating_add(record_num.saturating_mul(sends))
}

#[async_trait(?Send)]
impl Scenario for LifecycleCycle {
    fn name(&self) -> &str {
        &self.topic
    }

    fn config_file_name(&self) -> String {
        format!("{BASE_NAME}.json")
    }

    async fn setup(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.driver()
            .create_topics(&self.topic, self.partition_num, 1)
            .await
            .map_err(|e| HarnessError::provisioning(format!("topic {}", self.topic), e))
    }

    async fn send(&mut self, _ctx: &ScenarioContext) -> HarnessResult<()> {
        tracing::info!(
            "{} runs {} lifecycle iterations from verify",
            self.topic,
            self.total_iterations
        );
        for iteration in 1..=self.total_iterations {
            tracing::debug!(
                "iteration {}: {:?}",
                iteration,
                LifecycleMethod::for_iteration(iteration, self.total_iterations)
            );
        }
        Ok(())
    }

    async fn verify(
        &mut self,
        ctx: &ScenarioContext,
        _round: usize,
    ) -> HarnessResult<Verification> {
        if let Some(goal) = self.pending_goal {
            return self.check(ctx, goal).await;
        }
        if self.iteration >= self.total_iterations {
            return Ok(Verification::Success);
        }

        self.iteration += 1;
        tracing::info!(
            "{} iteration {}/{}",
            self.topic,
            self.iteration,
            self.total_iterations
        );

        ctx.driver()
            .create_connector(&self.config_file_name(), ctx.salt().as_str())
            .await?;
        ctx.wait(ctx.settle().connector_start).await?;

        let previous = ctx.count_rows(&self.topic).await?;
        let mut expected = ExpectedSends::new();

        ctx.send_records(&self.topic, self.record_num, 0).await?;
        expected.record_send();

        let method = LifecycleMethod::for_iteration(self.iteration, self.total_iterations);
        self.apply(ctx, method, &mut expected).await?;

        ctx.send_records(&self.topic, self.record_num, 0).await?;
        expected.record_send();
        ctx.wait(ctx.settle().pressure_sleep).await?;

        let goal = iteration_goal(previous, self.record_num, expected.get());
        self.pending_goal = Some(goal);
        self.check(ctx, goal).await
    }

    async fn clean(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.driver().clean_table_stage_pipe(&self.topic).await?;
        Ok(())
    }
}
