use std::rc::Rc;
use std::time::Duration;

use sinkpool_sim::scenarios::DeleteResumePressure;
use sinkpool_sim::{
    ConnectorDriver, DriverError, HarnessError, InMemoryDriver, Scenario, Verification,
    VirtualTimeProvider,
};

use crate::support::{context, memory_context, FixedCountDriver, SALT};

const TOPIC: &str = "test_kc_delete_resume_pressure_t1";

#[tokio::test]
async fn test_send_forfeits_the_batch_after_resume() {
    let (driver, time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = DeleteResumePressure::configure(&ctx).await.unwrap();
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();

    scenario.send(&ctx).await.unwrap();

    assert_eq!(scenario.expected_sends(), 2);
    assert_eq!(driver.end_offsets(TOPIC), Some(vec![3000]));
    assert_eq!(driver.connector_status(TOPIC), None);
    assert_eq!(
        time.sleeps(),
        vec![
            Duration::from_secs(2),
            Duration::from_secs(2),
            Duration::from_secs(10),
            Duration::from_secs(10),
            Duration::from_secs(2),
        ]
    );
}

#[tokio::test]
async fn test_only_the_first_batch_lands_in_memory() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = DeleteResumePressure::configure(&ctx).await.unwrap();
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();
    scenario.send(&ctx).await.unwrap();

    let verification = scenario.verify(&ctx, 0).await.unwrap();

    assert_eq!(verification, Verification::Success);
    assert_eq!(driver.table_rows(TOPIC), Some(1000));
}

#[tokio::test]
async fn test_verify_classifies_observed_counts() {
    let driver = Rc::new(FixedCountDriver::new(0));
    let time = VirtualTimeProvider::new();
    let ctx = context(driver.clone(), &time);
    let mut scenario = DeleteResumePressure::configure(&ctx).await.unwrap();
    scenario.send(&ctx).await.unwrap();

    for (observed, success) in [(999, false), (1000, true), (1500, true), (2000, true)] {
        driver.count.set(observed);
        let verification = scenario.verify(&ctx, 0).await.unwrap();
        assert_eq!(verification.is_success(), success, "observed {observed}");
    }

    driver.count.set(500);
    assert!(matches!(
        scenario.verify(&ctx, 0).await.unwrap(),
        Verification::Retryable { .. }
    ));

    driver.count.set(2100);
    match scenario.verify(&ctx, 1).await.unwrap() {
        Verification::NonRetryable { reason } => {
            assert!(reason.contains("duplication detected"));
            assert!(reason.contains("observed 2100"));
            assert!(reason.contains("1000..=2000"));
        }
        other => panic!("unexpected verification: {other:?}"),
    }
}

#[tokio::test]
async fn test_existing_topic_is_a_provisioning_error() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    driver.create_topics(TOPIC, 1, 1).await.unwrap();

    let err = DeleteResumePressure::configure(&ctx).await.unwrap_err();

    assert_eq!(
        err,
        HarnessError::Provisioning {
            resource: format!("topic {TOPIC}"),
            source: DriverError::TopicExists(TOPIC.into()),
        }
    );
}

#[tokio::test]
async fn test_clean_twice_succeeds() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = DeleteResumePressure::configure(&ctx).await.unwrap();
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();
    assert_eq!(driver.table_rows(TOPIC), Some(0));

    scenario.clean(&ctx).await.unwrap();
    scenario.clean(&ctx).await.unwrap();

    assert_eq!(driver.table_rows(TOPIC), None);
}
