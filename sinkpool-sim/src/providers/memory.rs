//! In-memory model of a broker, a sink connector runtime and a database.
//!
//! `InMemoryDriver` implements [`ConnectorDriver`] without any external
//! system, so scenarios, the retry loop and the suite runner can be exercised
//! end to end.
//!
//! ## Model
//!
//! - Topics are partitioned logs. Only end offsets are kept; payloads are
//!   counted, not stored.
//! - A connector named `N` subscribes to the topics `N` and `N_table`, and
//!   writes each topic into a table of the same name. Runs whose salts share
//!   a prefix never consume each other's topics.
//! - Committed offsets are keyed by connector name and survive deletion, so a
//!   recreated connector resumes where the deleted one stopped.
//! - Ingestion progresses in **ticks**: every driver call first moves up to
//!   `ingest_per_tick` records from running connectors' topics into tables.
//!   Paused and deleted connectors do not ingest.
//! - `resume_connector` on a deleted connector is a no-op. It never recreates
//!   the connector.
//! - `restart_connector` and `resume_connector` rewind each partition by
//!   `redelivery_on_restart` records, modeling at-least-once redelivery.

use async_trait::async_trait;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};

use sinkpool_core::{ConnectorDriver, DriverError, TopicDescription};

/// Configuration of the in-memory model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryDriverConfig {
    /// Records ingested per tick across all connectors. `None` ingests
    /// every pending record on each tick.
    pub ingest_per_tick: Option<u64>,
    /// Records per partition re-delivered after a restart or resume.
    pub redelivery_on_restart: u64,
    /// Create a single-partition topic on first send to an unknown topic.
    pub auto_create_topics: bool,
}

impl Default for MemoryDriverConfig {
    fn default() -> Self {
        Self {
            ingest_per_tick: None,
            redelivery_on_restart: 0,
            auto_create_topics: true,
        }
    }
}

/// Lifecycle state of a connector that exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorStatus {
    /// Consuming and ingesting.
    Running,
    /// Registered but not consuming.
    Paused,
}

/// One recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// `create_topics`
    CreateTopics {
        /// Topic name.
        topic: String,
        /// Partition count.
        partitions: u32,
    },
    /// `describe_topic`
    DescribeTopic(String),
    /// `send_bytes_data`
    SendBytes {
        /// Topic name.
        topic: String,
        /// Partition.
        partition: u32,
        /// Records in the batch.
        records: usize,
    },
    /// `create_connector`, with the resolved connector name.
    CreateConnector(String),
    /// `delete_connector`
    DeleteConnector(String),
    /// `pause_connector`
    PauseConnector(String),
    /// `resume_connector`
    ResumeConnector(String),
    /// `restart_connector`
    RestartConnector(String),
    /// `create_table`
    CreateTable(String),
    /// `clean_table_stage_pipe`
    CleanTableStagePipe(String),
    /// `execute_scalar_query`
    Query(String),
}

/// Suffix of the dedicated-table topic a connector also consumes.
const TABLE_TOPIC_SUFFIX: &str = "_table";

#[derive(Debug)]
struct Topic {
    partitions: u32,
    end_offsets: Vec<u64>,
    replication_factor: u16,
}

impl Topic {
    fn new(partitions: u32, replication_factor: u16) -> Result<Self, DriverError> {
        let len = usize::try_from(partitions).map_err(|_| {
            DriverError::Unavailable(format!("{partitions} partitions exceed the address space"))
        })?;
        Ok(Self {
            partitions,
            end_offsets: vec![0; len],
            replication_factor,
        })
    }
}

/// Whether `connector` consumes `topic`.
fn subscribes(connector: &str, topic: &str) -> bool {
    topic == connector
        || topic
            .strip_prefix(connector)
            .is_some_and(|rest| rest == TABLE_TOPIC_SUFFIX)
}

#[derive(Debug, Default)]
struct MemoryState {
    topics: BTreeMap<String, Topic>,
    connectors: BTreeMap<String, ConnectorStatus>,
    committed: HashMap<(String, String, u32), u64>,
    tables: BTreeMap<String, u64>,
    calls: Vec<DriverCall>,
    unavailable: bool,
}

impl MemoryState {
    fn subscribed_topics(&self, connector: &str) -> Vec<String> {
        self.topics
            .keys()
            .filter(|topic| subscribes(connector, topic))
            .cloned()
            .collect()
    }

    /// Advance ingestion by one tick.
    fn tick(&mut self, ingest_per_tick: Option<u64>) {
        let mut budget = ingest_per_tick.unwrap_or(u64::MAX);
        let running: Vec<String> = self
            .connectors
            .iter()
            .filter(|(_, status)| **status == ConnectorStatus::Running)
            .map(|(name, _)| name.clone())
            .collect();

        for connector in running {
            for topic in self.subscribed_topics(&connector) {
                let end_offsets = match self.topics.get(&topic) {
                    Some(t) => t.end_offsets.clone(),
                    None => continue,
                };
                for (partition, end) in (0u32..).zip(end_offsets) {
                    if budget == 0 {
                        return;
                    }
                    let committed = self
                        .committed
                        .entry((connector.clone(), topic.clone(), partition))
                        .or_insert(0);
                    let take = end.saturating_sub(*committed).min(budget);
                    if take == 0 {
                        continue;
                    }
                    *committed += take;
                    budget -= take;
                    *self.tables.entry(topic.clone()).or_insert(0) += take;
                    tracing::debug!(
                        "{} ingested {} records from {}[{}]",
                        connector,
                        take,
                        topic,
                        partition
                    );
                }
            }
        }
    }

    fn rewind(&mut self, connector: &str, records: u64) {
        if records == 0 {
            return;
        }
        for ((name, _, _), committed) in self.committed.iter_mut() {
            if name == connector {
                *committed = committed.saturating_sub(records);
            }
        }
    }
}

/// In-memory [`ConnectorDriver`].
///
/// Share it as `Rc<InMemoryDriver>`: hand one clone to the harness and keep
/// another to inspect tables, connectors and the call log.
#[derive(Debug, Default)]
pub struct InMemoryDriver {
    config: MemoryDriverConfig,
    state: RefCell<MemoryState>,
}

impl InMemoryDriver {
    /// Create a driver with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a driver with an explicit configuration.
    pub fn with_config(config: MemoryDriverConfig) -> Self {
        Self {
            config,
            state: RefCell::new(MemoryState::default()),
        }
    }

    /// Make every subsequent call fail with [`DriverError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state.borrow_mut().unavailable = unavailable;
    }

    /// Rows currently in `table`.
    pub fn table_rows(&self, table: &str) -> Option<u64> {
        self.state.borrow().tables.get(table).copied()
    }

    /// Status of connector `name`, `None` if it does not exist.
    pub fn connector_status(&self, name: &str) -> Option<ConnectorStatus> {
        self.state.borrow().connectors.get(name).copied()
    }

    /// End offset of every partition of `topic`.
    pub fn end_offsets(&self, topic: &str) -> Option<Vec<u64>> {
        self.state
            .borrow()
            .topics
            .get(topic)
            .map(|t| t.end_offsets.clone())
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<DriverCall> {
        self.state.borrow().calls.clone()
    }

    /// Record `call`, fail if the driver is unavailable, then advance one tick.
    fn begin(&self, call: DriverCall) -> Result<std::cell::RefMut<'_, MemoryState>, DriverError> {
        let mut state = self.state.borrow_mut();
        if state.unavailable {
            return Err(DriverError::Unavailable(format!("{call:?}")));
        }
        state.calls.push(call);
        state.tick(self.config.ingest_per_tick);
        Ok(state)
    }
}

fn parse_count_query(sql: &str) -> Option<&str> {
    const PREFIX: &str = "select count(*) from ";
    let sql = sql.trim().trim_end_matches(';').trim_end();
    let head = sql.get(..PREFIX.len())?;
    if !head.eq_ignore_ascii_case(PREFIX) {
        return None;
    }
    let table = sql[PREFIX.len()..].trim();
    if table.is_empty() || table.contains(char::is_whitespace) {
        return None;
    }
    Some(table)
}

#[async_trait(?Send)]
impl ConnectorDriver for InMemoryDriver {
    async fn create_topics(
        &self,
        topic: &str,
        partitions: u32,
        replication_factor: u16,
    ) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::CreateTopics {
            topic: topic.to_string(),
            partitions,
        })?;
        if state.topics.contains_key(topic) {
            return Err(DriverError::TopicExists(topic.to_string()));
        }
        if partitions == 0 {
            return Err(DriverError::Unavailable(format!(
                "topic {topic} needs at least one partition"
            )));
        }
        let created = Topic::new(partitions, replication_factor)?;
        state.topics.insert(topic.to_string(), created);
        Ok(())
    }

    async fn describe_topic(&self, topic: &str) -> Result<TopicDescription, DriverError> {
        let state = self.begin(DriverCall::DescribeTopic(topic.to_string()))?;
        let t = state
            .topics
            .get(topic)
            .ok_or_else(|| DriverError::UnknownTopic(topic.to_string()))?;
        Ok(TopicDescription {
            name: topic.to_string(),
            partitions: t.partitions,
            replication_factor: t.replication_factor,
        })
    }

    async fn send_bytes_data(
        &self,
        topic: &str,
        values: Vec<Vec<u8>>,
        _keys: Vec<Vec<u8>>,
        partition: u32,
    ) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::SendBytes {
            topic: topic.to_string(),
            partition,
            records: values.len(),
        })?;
        if !state.topics.contains_key(topic) {
            if !self.config.auto_create_topics {
                return Err(DriverError::UnknownTopic(topic.to_string()));
            }
            tracing::debug!("Auto-creating topic {}", topic);
            state.topics.insert(topic.to_string(), Topic::new(1, 1)?);
        }
        let t = state
            .topics
            .get_mut(topic)
            .ok_or_else(|| DriverError::UnknownTopic(topic.to_string()))?;
        let partitions = t.partitions;
        let end = usize::try_from(partition)
            .ok()
            .and_then(|index| t.end_offsets.get_mut(index))
            .ok_or_else(|| DriverError::InvalidPartition {
                topic: topic.to_string(),
                partition,
                partitions,
            })?;
        let records = u64::try_from(values.len()).map_err(|_| {
            DriverError::Unavailable(format!("batch of {} records is too large", values.len()))
        })?;
        *end = end.saturating_add(records);
        Ok(())
    }

    async fn create_connector(&self, config_file: &str, salt: &str) -> Result<(), DriverError> {
        let base = config_file.strip_suffix(".json").unwrap_or(config_file);
        let name = format!("{base}{salt}");
        let mut state = self.begin(DriverCall::CreateConnector(name.clone()))?;
        state.connectors.insert(name.clone(), ConnectorStatus::Running);
        for topic in state.subscribed_topics(&name) {
            state.tables.entry(topic).or_insert(0);
        }
        tracing::debug!("Connector {} running", name);
        Ok(())
    }

    async fn delete_connector(&self, name: &str) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::DeleteConnector(name.to_string()))?;
        if state.connectors.remove(name).is_none() {
            tracing::warn!("Delete of unknown connector {} ignored", name);
        }
        Ok(())
    }

    async fn pause_connector(&self, name: &str) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::PauseConnector(name.to_string()))?;
        match state.connectors.get_mut(name) {
            Some(status) => *status = ConnectorStatus::Paused,
            None => tracing::warn!("Pause of unknown connector {} ignored", name),
        }
        Ok(())
    }

    async fn resume_connector(&self, name: &str) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::ResumeConnector(name.to_string()))?;
        match state.connectors.get_mut(name) {
            Some(status) => *status = ConnectorStatus::Running,
            None => {
                tracing::warn!("Resume of unknown connector {} ignored", name);
                return Ok(());
            }
        }
        state.rewind(name, self.config.redelivery_on_restart);
        Ok(())
    }

    async fn restart_connector(&self, name: &str) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::RestartConnector(name.to_string()))?;
        if !state.connectors.contains_key(name) {
            tracing::warn!("Restart of unknown connector {} ignored", name);
            return Ok(());
        }
        state.rewind(name, self.config.redelivery_on_restart);
        Ok(())
    }

    async fn create_table(&self, table: &str) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::CreateTable(table.to_string()))?;
        state.tables.insert(table.to_string(), 0);
        Ok(())
    }

    async fn clean_table_stage_pipe(&self, topic: &str) -> Result<(), DriverError> {
        let mut state = self.begin(DriverCall::CleanTableStagePipe(topic.to_string()))?;
        state.tables.remove(topic);
        Ok(())
    }

    async fn execute_scalar_query(&self, sql: &str) -> Result<i64, DriverError> {
        let state = self.begin(DriverCall::Query(sql.to_string()))?;
        let table =
            parse_count_query(sql).ok_or_else(|| DriverError::UnsupportedQuery(sql.to_string()))?;
        let rows = state
            .tables
            .get(table)
            .ok_or_else(|| DriverError::UnknownTable(table.to_string()))?;
        i64::try_from(*rows).map_err(|_| DriverError::Unavailable(format!("{table} overflow")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(n: usize) -> Vec<Vec<u8>> {
        vec![b"{}".to_vec(); n]
    }

    #[test]
    fn test_parse_count_query() {
        assert_eq!(parse_count_query("SELECT count(*) FROM t_1"), Some("t_1"));
        assert_eq!(parse_count_query("  select COUNT(*) from t;"), Some("t"));
        assert_eq!(parse_count_query("SELECT * FROM t"), None);
        assert_eq!(parse_count_query("SELECT count(*) FROM "), None);
    }

    #[tokio::test]
    async fn test_running_connector_ingests_on_next_call() {
        let driver = InMemoryDriver::new();
        driver.create_topics("orders_x", 1, 1).await.unwrap();
        driver.create_connector("orders.json", "_x").await.unwrap();

        driver.send_bytes_data("orders_x", batch(10), vec![], 0).await.unwrap();
        assert_eq!(driver.table_rows("orders_x"), Some(0));

        let count = driver
            .execute_scalar_query("SELECT count(*) FROM orders_x")
            .await
            .unwrap();
        assert_eq!(count, 10);
    }

    #[tokio::test]
    async fn test_ingest_budget_spreads_over_ticks() {
        let driver = InMemoryDriver::with_config(MemoryDriverConfig {
            ingest_per_tick: Some(4),
            ..MemoryDriverConfig::default()
        });
        driver.create_topics("t", 1, 1).await.unwrap();
        driver.create_connector("t.json", "").await.unwrap();
        driver.send_bytes_data("t", batch(10), vec![], 0).await.unwrap();

        let q = "SELECT count(*) FROM t";
        assert_eq!(driver.execute_scalar_query(q).await.unwrap(), 4);
        assert_eq!(driver.execute_scalar_query(q).await.unwrap(), 8);
        assert_eq!(driver.execute_scalar_query(q).await.unwrap(), 10);
        assert_eq!(driver.execute_scalar_query(q).await.unwrap(), 10);
    }

    #[tokio::test]
    async fn test_resume_does_not_recreate_deleted_connector() {
        let driver = InMemoryDriver::new();
        driver.create_topics("t_s", 1, 1).await.unwrap();
        driver.create_connector("t.json", "_s").await.unwrap();
        driver.delete_connector("t_s").await.unwrap();

        driver.resume_connector("t_s").await.unwrap();
        assert_eq!(driver.connector_status("t_s"), None);

        driver.send_bytes_data("t_s", batch(5), vec![], 0).await.unwrap();
        let count = driver
            .execute_scalar_query("SELECT count(*) FROM t_s")
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_recreated_connector_resumes_from_committed_offsets() {
        let driver = InMemoryDriver::new();
        driver.create_topics("t", 1, 1).await.unwrap();
        driver.create_connector("t.json", "").await.unwrap();
        driver.send_bytes_data("t", batch(3), vec![], 0).await.unwrap();
        driver.delete_connector("t").await.unwrap();
        driver.send_bytes_data("t", batch(2), vec![], 0).await.unwrap();
        driver.create_connector("t.json", "").await.unwrap();

        let count = driver
            .execute_scalar_query("SELECT count(*) FROM t")
            .await
            .unwrap();
        assert_eq!(count, 5);
    }

    #[tokio::test]
    async fn test_paused_connector_holds_backlog() {
        let driver = InMemoryDriver::new();
        driver.create_topics("t", 2, 1).await.unwrap();
        driver.create_connector("t.json", "").await.unwrap();
        driver.pause_connector("t").await.unwrap();
        assert_eq!(driver.connector_status("t"), Some(ConnectorStatus::Paused));

        driver.send_bytes_data("t", batch(3), vec![], 1).await.unwrap();
        assert_eq!(driver.table_rows("t"), Some(0));
        driver.resume_connector("t").await.unwrap();

        let count = driver
            .execute_scalar_query("SELECT count(*) FROM t")
            .await
            .unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn test_restart_redelivery_duplicates() {
        let driver = InMemoryDriver::with_config(MemoryDriverConfig {
            redelivery_on_restart: 2,
            ..MemoryDriverConfig::default()
        });
        driver.create_topics("t", 1, 1).await.unwrap();
        driver.create_connector("t.json", "").await.unwrap();
        driver.send_bytes_data("t", batch(5), vec![], 0).await.unwrap();
        driver.restart_connector("t").await.unwrap();

        let count = driver
            .execute_scalar_query("SELECT count(*) FROM t")
            .await
            .unwrap();
        assert_eq!(count, 7);
    }

    #[tokio::test]
    async fn test_topic_errors() {
        let driver = InMemoryDriver::with_config(MemoryDriverConfig {
            auto_create_topics: false,
            ..MemoryDriverConfig::default()
        });
        driver.create_topics("t", 1, 1).await.unwrap();

        assert_eq!(
            driver.create_topics("t", 1, 1).await,
            Err(DriverError::TopicExists("t".into()))
        );
        assert!(matches!(
            driver.send_bytes_data("t", batch(1), vec![], 3).await,
            Err(DriverError::InvalidPartition { partitions: 1, .. })
        ));
        assert_eq!(
            driver.send_bytes_data("u", batch(1), vec![], 0).await,
            Err(DriverError::UnknownTopic("u".into()))
        );
        assert_eq!(
            driver.describe_topic("t").await.unwrap().partitions,
            1
        );

        driver.create_topics("wide", 3, 1).await.unwrap();
        assert_eq!(driver.describe_topic("wide").await.unwrap().partitions, 3);
        driver.send_bytes_data("wide", batch(1), vec![], 2).await.unwrap();
        assert_eq!(
            driver.send_bytes_data("wide", batch(1), vec![], 3).await,
            Err(DriverError::InvalidPartition {
                topic: "wide".into(),
                partition: 3,
                partitions: 3,
            })
        );
        assert!(matches!(
            driver.send_bytes_data("wide", batch(1), vec![], u32::MAX).await,
            Err(DriverError::InvalidPartition { partitions: 3, .. })
        ));
    }

    #[tokio::test]
    async fn test_salts_sharing_a_prefix_stay_isolated() {
        let driver = InMemoryDriver::new();
        for topic in ["t_a", "t_a_table", "t_ab", "t_ab_table"] {
            driver.create_topics(topic, 1, 1).await.unwrap();
        }
        driver.create_connector("t.json", "_a").await.unwrap();

        driver.send_bytes_data("t_ab", batch(5), vec![], 0).await.unwrap();
        driver.send_bytes_data("t_ab_table", batch(2), vec![], 0).await.unwrap();
        driver.send_bytes_data("t_a", batch(3), vec![], 0).await.unwrap();
        driver.send_bytes_data("t_a_table", batch(4), vec![], 0).await.unwrap();

        let q = |table: &str| format!("SELECT count(*) FROM {table}");
        assert_eq!(driver.execute_scalar_query(&q("t_a")).await.unwrap(), 3);
        assert_eq!(driver.execute_scalar_query(&q("t_a_table")).await.unwrap(), 4);
        assert_eq!(driver.table_rows("t_ab"), None);
        assert_eq!(driver.table_rows("t_ab_table"), None);
    }

    #[tokio::test]
    async fn test_clean_is_idempotent_and_drops_table() {
        let driver = InMemoryDriver::new();
        driver.create_table("t").await.unwrap();
        driver.clean_table_stage_pipe("t").await.unwrap();
        driver.clean_table_stage_pipe("t").await.unwrap();

        assert_eq!(
            driver.execute_scalar_query("SELECT count(*) FROM t").await,
            Err(DriverError::UnknownTable("t".into()))
        );
    }

    #[tokio::test]
    async fn test_unavailable_driver_fails_every_call() {
        let driver = InMemoryDriver::new();
        driver.set_unavailable(true);
        assert!(matches!(
            driver.create_table("t").await,
            Err(DriverError::Unavailable(_))
        ));
        assert!(driver.calls().is_empty());

        driver.set_unavailable(false);
        assert!(driver.create_table("t").await.is_ok());
        assert_eq!(driver.calls(), vec![DriverCall::CreateTable("t".into())]);
    }
}
