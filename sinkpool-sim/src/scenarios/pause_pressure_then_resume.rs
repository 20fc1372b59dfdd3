//! Pause the connector, send to every partition, resume, send again.
//!
//! A paused connector keeps its offsets, so nothing may be lost or
//! duplicated: the table must end with exactly two batches per partition.

use async_trait::async_trait;
use sinkpool_core::{HarnessError, HarnessResult, NameSalt};

use crate::scenario::{CountCheck, ExpectedRange, Scenario, ScenarioContext, Verification};

/// Base identifier of the scenario.
pub const BASE_NAME: &str = "test_kc_pause_pressure_then_resume";

/// Pause-pressure-then-resume scenario.
#[derive(Debug, Clone)]
pub struct PausePressureThenResume {
    topic: String,
    record_num: u64,
    partition_num: u32,
}

impl PausePressureThenResume {
    /// Derive the topic and connector name for `salt`.
    pub fn new(salt: &NameSalt) -> Self {
        Self {
            topic: salt.apply(BASE_NAME),
            record_num: 1000,
            partition_num: 3,
        }
    }

    /// Derive names from the context's salt and provision the topic.
    pub async fn configure(ctx: &ScenarioContext) -> HarnessResult<Self> {
        let mut scenario = Self::new(ctx.salt());
        scenario.setup(ctx).await?;
        Ok(scenario)
    }

    /// Rows the table must hold once both rounds are ingested.
    pub fn goal(&self) -> u64 {
        self.record_num
            .saturating_mul(u64::from(self.partition_num))
            .saturating_mul(2)
    }

    async fn send_to_all_partitions(&self, ctx: &ScenarioContext) -> HarnessResult<()> {
        for partition in 0..self.partition_num {
            ctx.send_records(&self.topic, self.record_num, partition)
                .await?;
        }
        Ok(())
    }
}

#[async_trait(?Send)]
impl Scenario for PausePressureThenResume {
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

    async fn send(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        let description = ctx.driver().describe_topic(&self.topic).await?;
        tracing::info!(
            "Topic {} has {} partition(s)",
            description.name,
            description.partitions
        );

        ctx.driver().pause_connector(&self.topic).await?;
        ctx.wait(ctx.settle().pressure_sleep).await?;

        self.send_to_all_partitions(ctx).await?;

        ctx.driver().resume_connector(&self.topic).await?;
        ctx.wait(ctx.settle().pressure_sleep).await?;

        self.send_to_all_partitions(ctx).await
    }

    async fn verify(
        &mut self,
        ctx: &ScenarioContext,
        _round: usize,
    ) -> HarnessResult<Verification> {
        let observed = ctx.count_rows(&self.topic).await?;
        Ok(CountCheck::new(&self.topic, observed, ExpectedRange::exact(self.goal()))
            .into_verification())
    }

    async fn clean(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.driver().clean_table_stage_pipe(&self.topic).await?;
        Ok(())
    }
}
