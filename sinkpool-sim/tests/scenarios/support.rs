//! Shared fixtures for scenario tests.

use std::cell::Cell;
use std::rc::Rc;

use async_trait::async_trait;
use sinkpool_sim::{
    ConnectorDriver, DriverError, InMemoryDriver, NameSalt, ScenarioContext, SettleConfig,
    TopicDescription, VirtualTimeProvider,
};

pub const SALT: &str = "_t1";

/// Context over `driver` with default settle waits on a virtual clock.
pub fn context(driver: Rc<dyn ConnectorDriver>, time: &VirtualTimeProvider) -> ScenarioContext {
    ScenarioContext::new(
        driver,
        Rc::new(time.clone()),
        NameSalt::new(SALT),
        SettleConfig::default(),
    )
}

/// In-memory driver, a handle on it, and a context using it.
pub fn memory_context(
    driver: InMemoryDriver,
) -> (Rc<InMemoryDriver>, VirtualTimeProvider, ScenarioContext) {
    let driver = Rc::new(driver);
    let time = VirtualTimeProvider::new();
    let ctx = context(driver.clone(), &time);
    (driver, time, ctx)
}

/// Driver accepting every call whose count query answers a fixed value.
#[derive(Debug, Default)]
pub struct FixedCountDriver {
    pub count: Cell<i64>,
}

impl FixedCountDriver {
    pub fn new(count: i64) -> Self {
        Self {
            count: Cell::new(count),
        }
    }
}

#[async_trait(?Send)]
impl ConnectorDriver for FixedCountDriver {
    async fn create_topics(&self, _: &str, _: u32, _: u16) -> Result<(), DriverError> {
        Ok(())
    }

    async fn describe_topic(&self, topic: &str) -> Result<TopicDescription, DriverError> {
        Ok(TopicDescription {
            name: topic.to_string(),
            partitions: 1,
            replication_factor: 1,
        })
    }

    async fn send_bytes_data(
        &self,
        _: &str,
        _: Vec<Vec<u8>>,
        _: Vec<Vec<u8>>,
        _: u32,
    ) -> Result<(), DriverError> {
        Ok(())
    }

    async fn create_connector(&self, _: &str, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn delete_connector(&self, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn pause_connector(&self, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn resume_connector(&self, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn restart_connector(&self, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn create_table(&self, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn clean_table_stage_pipe(&self, _: &str) -> Result<(), DriverError> {
        Ok(())
    }

    async fn execute_scalar_query(&self, _: &str) -> Result<i64, DriverError> {
        Ok(self.count.get())
    }
}
