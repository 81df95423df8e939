#![cfg(feature = "test-utils")]

use std::str::FromStr;

use bigdecimal::BigDecimal;
use crunch::checkpoint::resolve_checkpoint;
use crunch::error::ErrorKind;
use crunch::pipeline::{SyncPipeline, SyncPipelineConfig};
use crunch::store::CrunchStore;
use crunch::store::postgres::PostgresCrunchStore;
use crunch::test_utils::database::TestDatabase;
use crunch::test_utils::source_file::{TestSourceFile, result_line};
use crunch::types::{CrunchRecord, LineNumber};
use crunch_postgres::crunch::get_crunch_rows;
use crunch_telemetry::tracing::init_test_tracing;

const CALLER: &str = "0x5ca1ab1e";

fn record(address: &str, line_number: LineNumber) -> CrunchRecord {
    CrunchRecord {
        salt: format!("salt{line_number}"),
        address: address.to_owned(),
        reward: BigDecimal::from_str("340282366920938463463374607431768211456").unwrap(),
        total_zeroes: 3,
        leading_zeroes: 2,
        line_number,
    }
}

async fn stored_lines(database: &TestDatabase, caller: &str) -> Vec<i64> {
    get_crunch_rows(database.pool(), caller)
        .await
        .unwrap()
        .iter()
        .map(|row| row.line_number)
        .collect()
}

#[tokio::test(flavor = "multi_thread")]
async fn write_batch_stores_rows_and_advances_checkpoint() {
    init_test_tracing();

    let database = TestDatabase::spawn().await;
    let store = PostgresCrunchStore::new(database.pool().clone());

    assert_eq!(store.last_line_number(CALLER).await.unwrap(), None);

    let report = store
        .write_batch(
            CALLER,
            &[record("0x0000ff01", 1), record("0x0000ff02", 2), record("0x0000ff03", 3)],
        )
        .await
        .unwrap();

    assert_eq!(report.inserted, 3);
    assert!(report.conflicts.is_empty());
    assert_eq!(store.last_line_number(CALLER).await.unwrap(), Some(3));
    assert_eq!(store.last_line_number("0xother").await.unwrap(), None);

    let rows = get_crunch_rows(database.pool(), CALLER).await.unwrap();
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[0].caller_address, CALLER);
    assert_eq!(rows[0].salt, "salt1");
    assert_eq!(rows[0].address, "0x0000ff01");
    assert_eq!(
        rows[0].reward,
        BigDecimal::from_str("340282366920938463463374607431768211456").unwrap()
    );
    assert_eq!(rows[0].total_zeroes, 3);
    assert_eq!(rows[0].leading_zeroes, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn conflicting_record_is_skipped_and_the_rest_committed() {
    init_test_tracing();

    let database = TestDatabase::spawn().await;
    let store = PostgresCrunchStore::new(database.pool().clone());
    store
        .write_batch(CALLER, &[record("0x0000ff02", 1)])
        .await
        .unwrap();

    let report = store
        .write_batch(
            CALLER,
            &[record("0x0000ff01", 2), record("0x0000ff02", 3), record("0x0000ff03", 4)],
        )
        .await
        .unwrap();

    assert_eq!(report.inserted, 2);
    assert_eq!(report.conflicts, vec![3]);
    assert_eq!(stored_lines(&database, CALLER).await, vec![1, 2, 4]);
}

#[tokio::test(flavor = "multi_thread")]
async fn same_address_is_allowed_for_different_callers() {
    init_test_tracing();

    let database = TestDatabase::spawn().await;
    let store = PostgresCrunchStore::new(database.pool().clone());

    store
        .write_batch(CALLER, &[record("0x0000ff01", 1)])
        .await
        .unwrap();
    let report = store
        .write_batch("0xother", &[record("0x0000ff01", 7)])
        .await
        .unwrap();

    assert_eq!(report.inserted, 1);
    assert_eq!(store.last_line_number(CALLER).await.unwrap(), Some(1));
    assert_eq!(store.last_line_number("0xother").await.unwrap(), Some(7));
}

#[tokio::test(flavor = "multi_thread")]
async fn failed_batch_leaves_no_rows_behind() {
    init_test_tracing();

    let database = TestDatabase::spawn().await;
    let store = PostgresCrunchStore::new(database.pool().clone());

    let err = store
        .write_batch(
            CALLER,
            &[record("0x0000ff01", 1), record("0x0000ff02", LineNumber::MAX)],
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ConversionError);
    assert!(stored_lines(&database, CALLER).await.is_empty());

    // The connection went back to the pool in a usable state.
    let report = store
        .write_batch(CALLER, &[record("0x0000ff01", 1)])
        .await
        .unwrap();
    assert_eq!(report.inserted, 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn unreachable_database_resolves_checkpoint_to_zero() {
    init_test_tracing();

    let database = TestDatabase::spawn().await;
    let store = PostgresCrunchStore::new(database.pool().clone());
    store
        .write_batch(CALLER, &[record("0x0000ff01", 4)])
        .await
        .unwrap();
    assert_eq!(resolve_checkpoint(&store, CALLER).await, 4);

    store.pool().close().await;

    let err = store.last_line_number(CALLER).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ConnectionFailed);
    assert_eq!(resolve_checkpoint(&store, CALLER).await, 0);
}

#[tokio::test(flavor = "multi_thread")]
async fn pipeline_ingests_file_once_across_runs() {
    init_test_tracing();

    let database = TestDatabase::spawn().await;
    let source =
        TestSourceFile::from_lines((1..=25).map(|index| result_line(index, 1, index))).await;
    let config = SyncPipelineConfig {
        caller: CALLER.to_owned(),
        source_path: source.path().to_path_buf(),
        batch_max_size: 10,
    };

    let store = PostgresCrunchStore::new(database.pool().clone());
    let first = SyncPipeline::new(config.clone(), store.clone())
        .run()
        .await
        .unwrap();
    let second = SyncPipeline::new(config, store).run().await.unwrap();

    assert_eq!(first.records_inserted, 25);
    assert_eq!(first.batches_committed, 3);
    assert_eq!(second.checkpoint, 25);
    assert_eq!(second.records_inserted, 0);
    assert_eq!(second.batches_committed, 0);
    assert_eq!(
        stored_lines(&database, CALLER).await,
        (1..=25).collect::<Vec<i64>>()
    );
}
