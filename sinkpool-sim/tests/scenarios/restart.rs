use sinkpool_sim::scenarios::Restart;
use sinkpool_sim::{
    ConnectorDriver, DriverCall, InMemoryDriver, MemoryDriverConfig, Scenario, Verification,
};

use crate::support::{memory_context, SALT};

const CONNECTOR: &str = "resilience_kc_restart_t1";
const TABLE: &str = "resilience_kc_restart_t1_table";

#[tokio::test]
async fn test_restart_keeps_both_batches() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = Restart::configure(&ctx).await.unwrap();
    assert_eq!(driver.table_rows(TABLE), Some(0));
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();

    scenario.send(&ctx).await.unwrap();

    assert!(driver
        .calls()
        .contains(&DriverCall::RestartConnector(CONNECTOR.into())));
    assert_eq!(scenario.verify(&ctx, 0).await.unwrap(), Verification::Success);
    assert_eq!(driver.table_rows(TABLE), Some(400));
}

#[tokio::test]
async fn test_redelivery_after_restart_is_duplication() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::with_config(MemoryDriverConfig {
        redelivery_on_restart: 50,
        ..MemoryDriverConfig::default()
    }));
    let mut scenario = Restart::configure(&ctx).await.unwrap();
    driver
        .create_connector(&scenario.config_file_name(), SALT)
        .await
        .unwrap();
    scenario.send(&ctx).await.unwrap();

    match scenario.verify(&ctx, 0).await.unwrap() {
        Verification::NonRetryable { reason } => {
            assert!(reason.contains("observed 450 rows in resilience_kc_restart_t1_table"));
            assert!(reason.contains("expected 400"));
        }
        other => panic!("unexpected verification: {other:?}"),
    }
}

#[tokio::test]
async fn test_clean_drops_the_dedicated_table() {
    let (driver, _time, ctx) = memory_context(InMemoryDriver::new());
    let mut scenario = Restart::configure(&ctx).await.unwrap();

    scenario.clean(&ctx).await.unwrap();
    scenario.clean(&ctx).await.unwrap();

    assert!(driver
        .calls()
        .contains(&DriverCall::CleanTableStagePipe(TABLE.into())));
    assert_eq!(driver.table_rows(TABLE), None);
}
