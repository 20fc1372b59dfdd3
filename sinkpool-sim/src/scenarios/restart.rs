//! Restart the connector between two batches.

use async_trait::async_trait;
use sinkpool_core::{HarnessError, HarnessResult, NameSalt};

use crate::scenario::{CountCheck, ExpectedRange, Scenario, ScenarioContext, Verification};

/// Base identifier of the scenario.
pub const BASE_NAME: &str = "resilience_kc_restart";

/// Connector restart scenario.
///
/// Writes into a dedicated table, `<base><salt>_table`, created up front.
#[derive(Debug, Clone)]
pub struct Restart {
    connector: String,
    table: String,
    record_num: u64,
}

impl Restart {
    /// Derive the connector and table names for `salt`.
    pub fn new(salt: &NameSalt) -> Self {
        let connector = salt.apply(BASE_NAME);
        Self {
            table: format!("{connector}_table"),
            connector,
            record_num: 200,
        }
    }

    /// Derive names from the context's salt and create the table.
    pub async fn configure(ctx: &ScenarioContext) -> HarnessResult<Self> {
        let mut scenario = Self::new(ctx.salt());
        scenario.setup(ctx).await?;
        Ok(scenario)
    }

    /// Table the connector writes to.
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait(?Send)]
impl Scenario for Restart {
    fn name(&self) -> &str {
        &self.connector
    }

    fn config_file_name(&self) -> String {
        format!("{BASE_NAME}.json")
    }

    async fn setup(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.driver()
            .create_table(&self.table)
            .await
            .map_err(|e| HarnessError::provisioning(format!("table {}", self.table), e))
    }

    async fn send(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.send_records(&self.table, self.record_num, 0).await?;

        tracing::info!("Restarting connector {}", self.connector);
        ctx.driver().restart_connector(&self.connector).await?;

        ctx.send_records(&self.table, self.record_num, 0).await
    }

    async fn verify(
        &mut self,
        ctx: &ScenarioContext,
        _round: usize,
    ) -> HarnessResult<Verification> {
        let observed = ctx.count_rows(&self.table).await?;
        let range = ExpectedRange::exact(self.record_num * 2);
        Ok(CountCheck::new(&self.table, observed, range).into_verification())
    }

    async fn clean(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
        ctx.driver().clean_table_stage_pipe(&self.table).await?;
        Ok(())
    }
}
