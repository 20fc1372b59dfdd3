use std::time::Duration;

use sinkpool_sim::scenarios::LifecycleCycle;
use sinkpool_sim::{
    verify_until_settled, DriverCall, HarnessError, InMemoryDriver, MemoryDriverConfig,
    RetryPlan, Scenario, Verification,
};

use crate::support::memory_context;

const TOPIC: &str = "test_kc_resilience_t1";

#[tokio::test]
async fn test_every_iteration_resets_then_cycle_succeeds() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = LifecycleCycle::configure(&ctx).await.unwrap();
    scenario.send(&ctx).await.unwrap();

    for iteration in 1..=7 {
        assert_eq!(
            scenario.verify(&ctx, 0).await.unwrap(),
            Verification::ResetAndRetry,
            "iteration {iteration}"
        );
        assert_eq!(scenario.iteration(), iteration);
    }
    assert_eq!(scenario.verify(&ctx, 0).await.unwrap(), Verification::Success);

    // Iteration 4 leaves one batch behind until iteration 5 recreates the
    // connector, so every batch ends up ingested exactly once.
    assert_eq!(driver.table_rows(TOPIC), Some(14_000));
}

#[tokio::test]
async fn test_retry_loop_drives_the_cycle() {
    let (_driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = LifecycleCycle::configure(&ctx).await.unwrap();
    scenario.send(&ctx).await.unwrap();

    let stats = verify_until_settled(&mut scenario, &ctx, &RetryPlan::immediate(3))
        .await
        .unwrap();

    assert_eq!(stats.resets, 7);
    assert_eq!(stats.attempts, 8);
    // Each iteration waits connector_start, two send settles and one
    // pressure sleep; pause or delete iterations add another pressure sleep.
    assert_eq!(stats.elapsed, Duration::from_secs(7 * 24 + 4 * 10));
}

#[tokio::test]
async fn test_lagging_iteration_is_rechecked_without_rerunning_its_method() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::with_config(MemoryDriverConfig {
        ingest_per_tick: Some(500),
        ..MemoryDriverConfig::default()
    }));
    let mut scenario = LifecycleCycle::configure(&ctx).await.unwrap();

    assert!(matches!(
        scenario.verify(&ctx, 0).await.unwrap(),
        Verification::Retryable { .. }
    ));
    assert_eq!(scenario.iteration(), 1);

    assert_eq!(
        scenario.verify(&ctx, 1).await.unwrap(),
        Verification::ResetAndRetry
    );
    assert_eq!(scenario.iteration(), 1);

    let restarts = driver
        .calls()
        .iter()
        .filter(|call| matches!(call, DriverCall::RestartConnector(_)))
        .count();
    assert_eq!(restarts, 1);
}

#[tokio::test]
async fn test_redelivered_restart_aborts_the_cycle() {
    let (_driver, _time, ctx) = memory_context(InMemoryDriver::with_config(MemoryDriverConfig {
        redelivery_on_restart: 100,
        ..MemoryDriverConfig::default()
    }));
    let mut scenario = LifecycleCycle::configure(&ctx).await.unwrap();

    let err = verify_until_settled(&mut scenario, &ctx, &RetryPlan::immediate(3))
        .await
        .unwrap_err();

    match err {
        HarnessError::NonRetryable { scenario: name, reason } => {
            assert_eq!(name, TOPIC);
            assert!(reason.contains("observed 2100"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(scenario.iteration(), 1);
}
