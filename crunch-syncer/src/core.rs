use crunch::error::SyncError;
use crunch::pipeline::{SyncPipeline, SyncPipelineConfig, SyncSummary};
use crunch::store::postgres::PostgresCrunchStore;
use crunch_config::shared::{
    BatchConfig, PgConnectionConfig, PoolConfig, SourceConfig, SyncConfig, SyncerConfig,
};
use crunch_postgres::db::connect_to_database;
use sqlx::PgPool;
use tracing::{debug, info};

use crate::error::SyncerResult;
use crate::migrations::apply_crunch_migrations;

/// Runs one sync with the provided configuration.
///
/// Builds the connection pool, makes sure the `crunch` table exists and ingests the source file
/// until it is exhausted.
pub async fn start_syncer_with_config(syncer_config: SyncerConfig) -> SyncerResult<SyncSummary> {
    info!("starting crunch syncer");

    log_config(&syncer_config);

    let sync_config = syncer_config.sync;
    let pool = connect_to_database(&sync_config.pg_connection, &sync_config.pool)
        .await
        .map_err(SyncError::from)?;

    let summary = sync_with_pool(pool, &sync_config).await?;
    info!(
        caller = %sync_config.caller,
        checkpoint = summary.checkpoint,
        inserted = summary.records_inserted,
        skipped = summary.records_skipped,
        batches_abandoned = summary.batches_abandoned,
        "crunch syncer finished"
    );

    Ok(summary)
}

/// Migrates and syncs on `pool`, closing it whether or not either step succeeds.
async fn sync_with_pool(pool: PgPool, sync_config: &SyncConfig) -> SyncerResult<SyncSummary> {
    let result = migrate_and_sync(&pool, sync_config).await;

    pool.close().await;

    result
}

async fn migrate_and_sync(pool: &PgPool, sync_config: &SyncConfig) -> SyncerResult<SyncSummary> {
    apply_crunch_migrations(pool).await?;

    let store = PostgresCrunchStore::new(pool.clone());
    let pipeline = SyncPipeline::new(SyncPipelineConfig::from(sync_config), store);

    Ok(pipeline.run().await?)
}

fn log_config(config: &SyncerConfig) {
    let sync = &config.sync;

    debug!(caller = %sync.caller, "sync caller");
    log_source_config(&sync.source);
    log_batch_config(&sync.batch);
    log_pool_config(&sync.pool);
    log_pg_connection_config(&sync.pg_connection);
}

fn log_source_config(config: &SourceConfig) {
    debug!(path = %config.path.display(), "source config");
}

fn log_batch_config(config: &BatchConfig) {
    debug!(max_size = config.max_size, "batch config");
}

fn log_pool_config(config: &PoolConfig) {
    debug!(
        min_connections = config.min_connections,
        max_connections = config.max_connections,
        "pool config"
    );
}

fn log_pg_connection_config(config: &PgConnectionConfig) {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        username = config.username,
        tls_enabled = config.tls.enabled,
        "postgres connection config",
    );
}
