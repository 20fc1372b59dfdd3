use sinkpool_sim::scenarios::PausePressureThenResume;
use sinkpool_sim::{
    verify_until_settled, ConnectorDriver, ConnectorStatus, DriverCall, InMemoryDriver,
    MemoryDriverConfig, RetryPlan, Scenario, Verification,
};

use crate::support::{memory_context, SALT};

const TOPIC: &str = "test_kc_pause_pressure_then_resume_t1";

#[tokio::test]
async fn test_backlog_of_every_partition_is_ingested_exactly_once() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = PausePressureThenResume::configure(&ctx).await.unwrap();
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();

    scenario.send(&ctx).await.unwrap();

    assert_eq!(driver.end_offsets(TOPIC), Some(vec![2000, 2000, 2000]));
    assert_eq!(
        driver.connector_status(TOPIC),
        Some(ConnectorStatus::Running)
    );
    assert!(driver
        .calls()
        .contains(&DriverCall::DescribeTopic(TOPIC.into())));

    assert_eq!(scenario.goal(), 6000);
    assert_eq!(scenario.verify(&ctx, 0).await.unwrap(), Verification::Success);
}

#[tokio::test]
async fn test_slow_ingestion_converges_through_retries() {
    let (driver, time, ctx) = memory_context(InMemoryDriver::with_config(MemoryDriverConfig {
        ingest_per_tick: Some(100),
        ..MemoryDriverConfig::default()
    }));
    let mut scenario = PausePressureThenResume::configure(&ctx).await.unwrap();
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();
    scenario.send(&ctx).await.unwrap();

    assert!(matches!(
        scenario.verify(&ctx, 0).await.unwrap(),
        Verification::Retryable { .. }
    ));

    let stats = verify_until_settled(&mut scenario, &ctx, &RetryPlan::immediate(200))
        .await
        .unwrap();

    assert!(stats.attempts > 1);
    assert_eq!(driver.table_rows(TOPIC), Some(6000));
    assert_eq!(stats.elapsed, std::time::Duration::ZERO);
    assert!(!time.sleeps().is_empty());
}
