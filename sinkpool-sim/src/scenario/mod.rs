//! Scenario trait for resilience testing.
//!
//! A scenario is one fault-injection narrative against the connector under
//! test. The suite runner calls its lifecycle methods in order:
//!
//! 1. **Setup**: provision topics or tables (never retried)
//! 2. **Send**: push records and inject faults, with fixed settle waits
//! 3. **Verify**: compare live state with bookkeeping, retried by the
//!    [`retry`](crate::retry) loop until it settles
//! 4. **Clean**: drop everything the scenario created (idempotent)
//!
//! # Usage
//!
//! ```ignore
//! use sinkpool_sim::{Scenario, ScenarioContext, Verification};
//!
//! struct SmokeTest { topic: String }
//!
//! #[async_trait(?Send)]
//! impl Scenario for SmokeTest {
//!     fn name(&self) -> &str { &self.topic }
//!     fn config_file_name(&self) -> String { "smoke.json".into() }
//!     async fn send(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
//!         ctx.send_records(&self.topic, 10, 0).await
//!     }
//!     async fn verify(&mut self, ctx: &ScenarioContext, _round: usize) -> HarnessResult<Verification> {
//!         let observed = ctx.count_rows(&self.topic).await?;
//!         Ok(CountCheck::new(&self.topic, observed, ExpectedRange::exact(10)).into_verification())
//!     }
//!     async fn clean(&mut self, ctx: &ScenarioContext) -> HarnessResult<()> {
//!         Ok(ctx.driver().clean_table_stage_pipe(&self.topic).await?)
//!     }
//! }
//! ```

pub mod bookkeeping;
pub mod context;
pub mod verification;

use async_trait::async_trait;
use sinkpool_core::HarnessResult;

pub use bookkeeping::ExpectedSends;
pub use context::ScenarioContext;
pub use verification::{
    classify_sends, CountCheck, CountOutcome, ExpectedRange, Verification,
};

/// A fault-injection scenario run by the suite runner.
#[async_trait(?Send)]
pub trait Scenario: 'static {
    /// Derived name of this scenario instance (base identifier + salt).
    fn name(&self) -> &str;

    /// Connector configuration template the runner creates the connector from.
    fn config_file_name(&self) -> String;

    /// Setup phase: provision topics or tables.
    ///
    /// Failures are provisioning errors and abort the scenario before any
    /// data flows. Default implementation is a no-op.
    async fn setup(&mut self, _ctx: &ScenarioContext) -> HarnessResult<()> {
        Ok(())
    }

    /// Send phase: the fault-injection narrative.
    ///
    /// Completes, including all settle waits, before the first `verify`.
    async fn send(&mut self, ctx: &ScenarioContext) -> HarnessResult<()>;

    /// Verify phase: classify the current state.
    ///
    /// `round` is the attempt index since the last reset, starting at 0.
    async fn verify(&mut self, ctx: &ScenarioContext, round: usize)
        -> HarnessResult<Verification>;

    /// Clean phase: drop the scenario's resources. Must be safe to call
    /// repeatedly, and safe to call when `setup` never ran.
    async fn clean(&mut self, ctx: &ScenarioContext) -> HarnessResult<()>;
}
