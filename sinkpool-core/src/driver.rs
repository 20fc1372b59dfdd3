//! Driver contract for the connector under test.
//!
//! The harness never talks to the broker, the connector runtime or the
//! database directly. Every side effect and every observation goes through a
//! [`ConnectorDriver`], which makes the system under test an opaque
//! collaborator. Implementations exist for real deployments (outside this
//! workspace) and for the in-memory model in `sinkpool-sim`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by a [`ConnectorDriver`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriverError {
    /// A topic with this name already exists.
    #[error("topic already exists: {0}")]
    TopicExists(String),

    /// The topic does not exist.
    #[error("unknown topic: {0}")]
    UnknownTopic(String),

    /// The table does not exist.
    #[error("unknown table: {0}")]
    UnknownTable(String),

    /// The partition index is outside the topic's partition range.
    #[error("partition {partition} out of range for topic {topic} ({partitions} partitions)")]
    InvalidPartition {
        /// Topic that was addressed.
        topic: String,
        /// Requested partition.
        partition: u32,
        /// Number of partitions the topic has.
        partitions: u32,
    },

    /// The driver cannot evaluate this statement.
    #[error("unsupported query: {0}")]
    UnsupportedQuery(String),

    /// The backing system could not be reached or rejected the request.
    #[error("driver unavailable: {0}")]
    Unavailable(String),
}

/// Topic metadata returned by [`ConnectorDriver::describe_topic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicDescription {
    /// Topic name.
    pub name: String,
    /// Number of partitions.
    pub partitions: u32,
    /// Replication factor.
    pub replication_factor: u16,
}

/// Operations the harness needs from the system under test.
///
/// All methods take `&self`; implementations that keep local state use
/// interior mutability, matching the single-threaded `?Send` execution model
/// of the harness.
///
/// Connector lifecycle calls mirror a connector REST API: `resume_connector`
/// on a connector that was deleted does **not** recreate it, and lifecycle
/// calls against unknown connectors are not errors.
#[async_trait(?Send)]
pub trait ConnectorDriver {
    /// Create a topic with the given partition count and replication factor.
    async fn create_topics(
        &self,
        topic: &str,
        partitions: u32,
        replication_factor: u16,
    ) -> Result<(), DriverError>;

    /// Describe an existing topic.
    async fn describe_topic(&self, topic: &str) -> Result<TopicDescription, DriverError>;

    /// Send raw byte records to one partition of a topic.
    ///
    /// `keys` may be empty; when present it must be as long as `values`.
    async fn send_bytes_data(
        &self,
        topic: &str,
        values: Vec<Vec<u8>>,
        keys: Vec<Vec<u8>>,
        partition: u32,
    ) -> Result<(), DriverError>;

    /// Create (or update) the connector described by `config_file`, suffixed
    /// with `salt`.
    async fn create_connector(&self, config_file: &str, salt: &str) -> Result<(), DriverError>;

    /// Delete a connector.
    async fn delete_connector(&self, name: &str) -> Result<(), DriverError>;

    /// Pause a connector.
    async fn pause_connector(&self, name: &str) -> Result<(), DriverError>;

    /// Resume a paused connector. Never recreates a deleted connector.
    async fn resume_connector(&self, name: &str) -> Result<(), DriverError>;

    /// Restart a connector in place.
    async fn restart_connector(&self, name: &str) -> Result<(), DriverError>;

    /// Create or replace an empty table.
    async fn create_table(&self, table: &str) -> Result<(), DriverError>;

    /// Drop the table, stage and pipe associated with `topic`, if they exist.
    async fn clean_table_stage_pipe(&self, topic: &str) -> Result<(), DriverError>;

    /// Execute a query returning a single number.
    async fn execute_scalar_query(&self, sql: &str) -> Result<i64, DriverError>;
}
