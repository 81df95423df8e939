#![cfg(all(feature = "failpoints", feature = "test-utils"))]

use crunch::failpoints::WRITE_BATCH_BEFORE_COMMIT;
use crunch::pipeline::{SyncPipeline, SyncPipelineConfig};
use crunch::store::postgres::PostgresCrunchStore;
use crunch::test_utils::database::TestDatabase;
use crunch::test_utils::failpoints::CustomFailScenario;
use crunch::test_utils::source_file::{TestSourceFile, result_line};
use crunch_postgres::crunch::get_crunch_rows;
use crunch_telemetry::tracing::init_test_tracing;

const CALLER: &str = "0x5ca1ab1e";

#[tokio::test(flavor = "multi_thread")]
async fn batch_failing_before_commit_is_rolled_back_and_the_run_continues() {
    init_test_tracing();
    let _scenario = CustomFailScenario::setup(&[(WRITE_BATCH_BEFORE_COMMIT, "1*return->off")]);

    let database = TestDatabase::spawn().await;
    let source =
        TestSourceFile::from_lines((1..=4).map(|index| result_line(index, 0, index))).await;
    let config = SyncPipelineConfig {
        caller: CALLER.to_owned(),
        source_path: source.path().to_path_buf(),
        batch_max_size: 2,
    };

    let store = PostgresCrunchStore::new(database.pool().clone());
    let summary = SyncPipeline::new(config, store).run().await.unwrap();

    assert_eq!(summary.batches_abandoned, 1);
    assert_eq!(summary.batches_committed, 1);
    assert_eq!(summary.records_inserted, 2);

    let lines: Vec<i64> = get_crunch_rows(database.pool(), CALLER)
        .await
        .unwrap()
        .iter()
        .map(|row| row.line_number)
        .collect();
    assert_eq!(lines, vec![3, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn connection_failure_before_commit_keeps_earlier_batches() {
    init_test_tracing();
    let _scenario =
        CustomFailScenario::setup(&[(WRITE_BATCH_BEFORE_COMMIT, "1*off->1*return(connection)->off")]);

    let database = TestDatabase::spawn().await;
    let source =
        TestSourceFile::from_lines((1..=6).map(|index| result_line(index, 0, index))).await;
    let config = SyncPipelineConfig {
        caller: CALLER.to_owned(),
        source_path: source.path().to_path_buf(),
        batch_max_size: 2,
    };

    let store = PostgresCrunchStore::new(database.pool().clone());
    let summary = SyncPipeline::new(config, store).run().await.unwrap();

    assert_eq!(summary.batches_committed, 2);
    assert_eq!(summary.batches_abandoned, 1);

    let lines: Vec<i64> = get_crunch_rows(database.pool(), CALLER)
        .await
        .unwrap()
        .iter()
        .map(|row| row.line_number)
        .collect();
    assert_eq!(lines, vec![1, 2, 5, 6]);
}
