//! # Sinkpool Resilience Harness
//!
//! Fault-injection scenarios for sink connectors that stream records from a
//! topic into a database table, with retry-driven verification.
//!
//! ## Why Resilience Scenarios?
//!
//! Connectors rarely lose data on the happy path. Records go missing, or get
//! written twice, when the connector is deleted, paused or restarted while
//! data is in flight. Each scenario injects one such lifecycle event under
//! load and checks the table against what was sent:
//!
//! - **Fewer rows** than expected may still converge, so verification is
//!   retried with backoff
//! - **More rows** than were ever sent means duplication, and the run aborts
//!
//! ## Core Components
//!
//! - [`Scenario`]: one fault-injection narrative (setup, send, verify, clean)
//! - [`ExpectedRange`]: pure tri-state classification of an observed count
//! - [`verify_until_settled`]: bounded retry loop with exponential backoff
//! - [`SuiteRunner`]: runs scenarios in order and produces a [`SuiteReport`]
//! - [`InMemoryDriver`]: in-memory connector model for end-to-end runs
//!
//! ## Quick Start
//!
//! ```ignore
//! use std::rc::Rc;
//! use sinkpool_sim::{scenarios, InMemoryDriver, SettleConfig, SuiteRunner, VirtualTimeProvider};
//!
//! let salt = NameSalt::random();
//! let report = SuiteRunner::new(Rc::new(InMemoryDriver::new()), Rc::new(VirtualTimeProvider::new()))
//!     .salt(salt.clone())
//!     .settle(SettleConfig::instant())
//!     .scenarios(scenarios::resilience_suite(&salt, |_| true))
//!     .run()
//!     .await;
//! println!("{report}");
//! ```
//!
//! ## Built-in Scenarios
//!
//! | Scenario | Fault | Expected rows |
//! |----------|-------|---------------|
//! | `test_kc_delete_resume_pressure` | delete, then resume | `1000*(n-1)..=1000*n` |
//! | `test_kc_pause_pressure_then_resume` | pause across 3 partitions | exactly 6000 |
//! | `resilience_kc_restart` | restart between batches | exactly 400 |
//! | `test_kc_resilience` | 7 lifecycle iterations | exact per iteration |

#![deny(missing_docs)]
#![deny(clippy::unwrap_used)]

pub mod config;
pub mod providers;
pub mod retry;
pub mod runner;
pub mod scenario;
pub mod scenarios;

// Configuration exports
pub use config::{HarnessConfig, RetryConfig, SettleConfig};

// Provider exports
pub use providers::{
    ConnectorStatus, DriverCall, InMemoryDriver, MemoryDriverConfig, VirtualTimeProvider,
};

// Retry exports
pub use retry::{verify_until_settled, RetryPlan, VerifyStats};

// Runner exports
pub use runner::{ScenarioOutcome, ScenarioReport, SuiteReport, SuiteRunner};

// Scenario exports
pub use scenario::{
    classify_sends, CountCheck, CountOutcome, ExpectedRange, ExpectedSends, Scenario,
    ScenarioContext, Verification,
};

// Re-export core types for convenience
pub use sinkpool_core::{
    ConnectorDriver, DriverError, HarnessError, HarnessResult, NameSalt, TimeProvider,
    TokioTimeProvider, TopicDescription,
};
