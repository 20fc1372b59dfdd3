//! Suite runner and reporting.
//!
//! ## Submodules
//!
//! - `suite` - SuiteRunner sequencing setup, send, retried verify and teardown
//! - `report` - ScenarioReport and SuiteReport types

pub mod report;
pub mod suite;

pub use report::{ScenarioOutcome, ScenarioReport, SuiteReport};
pub use suite::SuiteRunner;
