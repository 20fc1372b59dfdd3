//! Delete the connector under load, then resume it.
//!
//! Resuming a deleted connector does not recreate it, so the last batch is
//! never ingested. The batch sent while the connector was being deleted may
//! or may not land, which is why verification accepts a one-batch window.

use async_trait::async_trait;
use sinkpool_core::{HarnessError, HarnessResult, NameSalt};

use crate::scenario::{
    CountCheck, ExpectedRange, ExpectedSends, Scenario, ScenarioContext, Verification,
};

/// Base identifier of the scenario.
pub const BASE_NAME: &str = "test_kc_delete_resume_pressure";

/// Delete-resume-pressure scenario.
#[derive(Debug, Clone)]
pub struct DeleteResumePressure {
    topic: String,
    connector: String,
    record_num: u64,
    partition_num: u32,
    expected_sends: ExpectedSends,
}

impl DeleteResumePressure {
    /// Derive the topic and connector names for `salt`.
    pub fn new(salt: &NameSalt) -> Self {
        let name = salt.apply(BASE_NAME);
        Self {
            topic: name.clone(),
            connector: name,
            record_num: 1000,
            partition_num: 1,
            expected_sends: ExpectedSends::new(),
        }
    }

    /// Derive names from the context's salt and provision the topic.
    pub async fn configure(ctx: &ScenarioContext) -> HarnessResult<Self> {
        let mut scenario = Self::new(ctx.salt());
        scenario.setup(ctx).await?;
        Ok(scenario)
    }

    /// Topic, and table, the scenario writes to.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Records per batch.
    pub fn record_num(&self) -> u64 {
        self.record_num
    }

    /// Batches currently expected to be ingested.
    pub fn expected_sends(&self) -> u64 {
        self.expected_sends.get()
    }

    async fn send_batch(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.send_records(&self.topic, self.record_num, 0).await?;
        self.expected_sends.record_send();
        Ok(())
    }
}

#[async_trait(?Send)]
impl Scenario for DeleteResumePressure {
    fn name(&self) -> &str {
        &self.connector
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

    async fn send(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        self.send_batch(ctx).await?;

        tracing::info!("Deleting connector {}", self.connector);
        ctx.driver().delete_connector(&self.connector).await?;

        self.send_batch(ctx).await?;
        ctx.wait(ctx.settle().pressure_sleep).await?;

        tracing::info!("Resuming connector {}", self.connector);
        ctx.driver().resume_connector(&self.connector).await?;
        ctx.wait(ctx.settle().pressure_sleep).await?;

        self.send_batch(ctx).await?;
        // Resume does not recreate a deleted connector: the final batch is lost.
        self.expected_sends.forfeit();
        Ok(())
    }

    async fn verify(
        &mut self,
        ctx: &ScenarioContext,
        _round: usize,
    ) -> HarnessResult<Verification> {
        let observed = ctx.count_rows(&self.topic).await?;
        let range = ExpectedRange::for_sends(self.record_num, self.expected_sends.get());
        Ok(CountCheck::new(&self.topic, observed, range).into_verification())
    }

    async fn clean(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.driver().clean_table_stage_pipe(&self.topic).await?;
        Ok(())
    }
}
