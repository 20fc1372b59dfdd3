//! Context provided to scenarios.
//!
//! `ScenarioContext` wraps the driver, the time provider, the run's name salt
//! and the settle waits into a single handle that every scenario phase
//! receives.

use std::rc::Rc;
use std::time::Duration;

use sinkpool_core::{
    encode_batch, ConnectorDriver, HarnessError, HarnessResult, NameSalt, TimeProvider,
};

use crate::config::SettleConfig;

/// Context provided to each scenario phase.
#[derive(Clone)]
pub struct ScenarioContext {
    driver: Rc<dyn ConnectorDriver>,
    time: Rc<dyn TimeProvider>,
    salt: NameSalt,
    settle: SettleConfig,
}

impl ScenarioContext {
    /// Create a new scenario context.
    pub fn new(
        driver: Rc<dyn ConnectorDriver>,
        time: Rc<dyn TimeProvider>,
        salt: NameSalt,
        settle: SettleConfig,
    ) -> Self {
        Self {
            driver,
            time,
            salt,
            settle,
        }
    }

    /// Get the driver for the system under test.
    pub fn driver(&self) -> &dyn ConnectorDriver {
        self.driver.as_ref()
    }

    /// Get the time provider.
    pub fn time(&self) -> &dyn TimeProvider {
        self.time.as_ref()
    }

    /// Get the run's name salt.
    pub fn salt(&self) -> &NameSalt {
        &self.salt
    }

    /// Get the settle waits.
    pub fn settle(&self) -> &SettleConfig {
        &self.settle
    }

    /// Wait a fixed duration through the time provider.
    pub async fn wait(&self, duration: Duration) -> HarnessResult<()> {
        self.time.sleep(duration).await?;
        Ok(())
    }

    /// Encode `count` records, send them to `partition` of `topic`, then wait
    /// the send settle interval.
    pub async fn send_records(&self, topic: &str, count: u64, partition: u32) -> HarnessResult<()> {
        tracing::info!("Sending {} records to {}[{}]", count, topic, partition);
        let values = encode_batch(count)?;
        self.driver
            .send_bytes_data(topic, values, Vec::new(), partition)
            .await?;
        self.wait(self.settle.send_settle).await
    }

    /// Run `SELECT count(*)` against `table`.
    pub async fn count_rows(&self, table: &str) -> HarnessResult<u64> {
        let count = self
            .driver
            .execute_scalar_query(&format!("SELECT count(*) FROM {table}"))
            .await?;
        // A negative count can only come from a broken driver.
        u64::try_from(count).map_err(|_| {
            HarnessError::InvalidState(format!("negative row count {count} for table {table}"))
        })
    }
}
