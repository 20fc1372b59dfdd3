//! Provider implementations for running scenarios without external systems.
//!
//! - [`InMemoryDriver`]: broker, connector runtime and database in one model
//! - [`VirtualTimeProvider`]: clock that advances on sleep and returns at once

mod memory;
mod time;

pub use memory::{ConnectorStatus, DriverCall, InMemoryDriver, MemoryDriverConfig};
pub use time::VirtualTimeProvider;
