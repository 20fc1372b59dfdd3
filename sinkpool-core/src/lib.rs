//! # sinkpool-core
//!
//! Core abstractions for the sinkpool resilience harness.
//!
//! This crate provides the contracts that scenarios are written against, so the
//! same scenario code can drive a real connector deployment or the in-memory
//! model shipped with `sinkpool-sim`:
//!
//! - **Driver contract**: [`ConnectorDriver`] exposes topic, connector and table
//!   operations of the system under test
//! - **Time**: [`TimeProvider`] makes every settle wait injectable
//! - **Errors**: [`HarnessError`] is the shared failure taxonomy
//! - **Payloads**: [`encode_batch`] produces the fixed-schema JSON records
//! - **Naming**: [`NameSalt`] isolates the resources of concurrent runs
//!
//! ## Provider Traits
//!
//! [`TimeProvider`] follows the provider pattern: [`TokioTimeProvider`] sleeps
//! on the wall clock, while tests substitute a virtual clock that records the
//! requested waits and returns immediately.

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

mod driver;
mod error;
mod naming;
mod payload;
mod time;

// Driver exports
pub use driver::{ConnectorDriver, DriverError, TopicDescription};

// Error exports
pub use error::{HarnessError, HarnessResult};

// Naming exports
pub use naming::NameSalt;

// Payload exports
pub use payload::{encode_batch, CodecError, RecordPayload, PAYLOAD_FIELD};

// Provider trait exports
pub use time::{TimeError, TimeProvider, TokioTimeProvider};
