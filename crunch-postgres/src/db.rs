use crunch_config::shared::{IntoConnectOptions, PgConnectionConfig, PoolConfig};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::debug;

/// Connects to the database holding the `crunch` table with a bounded connection pool.
///
/// The returned pool is the handle shared by the checkpoint lookup and the batch writes, every
/// unit of work acquires from it and returns the connection when it completes or fails.
pub async fn connect_to_database(
    config: &PgConnectionConfig,
    pool_config: &PoolConfig,
) -> Result<PgPool, sqlx::Error> {
    debug!(
        host = config.host,
        port = config.port,
        dbname = config.name,
        min_connections = pool_config.min_connections,
        max_connections = pool_config.max_connections,
        "connecting to postgres"
    );

    PgPoolOptions::new()
        .min_connections(pool_config.min_connections)
        .max_connections(pool_config.max_connections)
        .connect_with(config.with_db())
        .await
}
