//! Resilience scenarios for sink connectors.
//!
//! - [`DeleteResumePressure`]: delete under load, resume without recreate
//! - [`PausePressureThenResume`]: pause, send to every partition, resume
//! - [`Restart`]: restart between two batches
//! - [`LifecycleCycle`]: seven iterations over every lifecycle method

pub mod delete_resume_pressure;
pub mod lifecycle_cycle;
pub mod pause_pressure_then_resume;
pub mod restart;

use sinkpool_core::NameSalt;

use crate::scenario::Scenario;

pub use delete_resume_pressure::DeleteResumePressure;
pub use lifecycle_cycle::{LifecycleCycle, LifecycleMethod};
pub use pause_pressure_then_resume::PausePressureThenResume;
pub use restart::Restart;

/// Base names of every built-in scenario, in suite order.
pub const BASE_NAMES: [&str; 4] = [
    delete_resume_pressure::BASE_NAME,
    pause_pressure_then_resume::BASE_NAME,
    restart::BASE_NAME,
    lifecycle_cycle::BASE_NAME,
];

/// Build the built-in scenario called `base_name`, salted with `salt`.
pub fn build(base_name: &str, salt: &NameSalt) -> Option<Box<dyn Scenario>> {
    let scenario: Box<dyn Scenario> = match base_name {
        delete_resume_pressure::BASE_NAME => Box::new(DeleteResumePressure::new(salt)),
        pause_pressure_then_resume::BASE_NAME => Box::new(PausePressureThenResume::new(salt)),
        restart::BASE_NAME => Box::new(Restart::new(salt)),
        lifecycle_cycle::BASE_NAME => Box::new(LifecycleCycle::new(salt)),
        _ => return None,
    };
    Some(scenario)
}

/// Every built-in scenario whose base name passes `filter`.
pub fn resilience_suite(
    salt: &NameSalt,
    filter: impl Fn(&str) -> bool,
) -> Vec<Box<dyn Scenario>> {
    BASE_NAMES
        .iter()
        .filter(|name| filter(name))
        .filter_map(|name| build(name, salt))
        .collect()
}
