use crunch_config::shared::{PgConnectionConfig, TlsConfig};
use crunch_postgres::sqlx::test_utils::{create_pg_database, drop_pg_database};
use sqlx::PgPool;
use tokio::runtime::Handle;
use uuid::Uuid;

/// Generates the configuration of a uniquely named database on the local test server.
///
/// Configuration is read from environment variables:
/// - `TESTS_DATABASE_HOST`: Postgres server hostname (required)
/// - `TESTS_DATABASE_PORT`: Postgres server port (required)
/// - `TESTS_DATABASE_USERNAME`: Database user (required)
/// - `TESTS_DATABASE_PASSWORD`: Database password (optional)
pub fn local_pg_connection_config() -> PgConnectionConfig {
    PgConnectionConfig {
        host: std::env::var("TESTS_DATABASE_HOST").expect("TESTS_DATABASE_HOST must be set"),
        port: std::env::var("TESTS_DATABASE_PORT")
            .expect("TESTS_DATABASE_PORT must be set")
            .parse()
            .expect("TESTS_DATABASE_PORT must be a valid port number"),
        name: format!("crunch_test_{}", Uuid::new_v4().simple()),
        username: std::env::var("TESTS_DATABASE_USERNAME")
            .expect("TESTS_DATABASE_USERNAME must be set"),
        password: std::env::var("TESTS_DATABASE_PASSWORD")
            .ok()
            .map(Into::into),
        tls: TlsConfig::disabled(),
    }
}

/// A freshly created database with the syncer migrations applied.
///
/// The database is dropped when the value goes out of scope, which requires a multi-threaded
/// runtime (`#[tokio::test(flavor = "multi_thread")]`).
pub struct TestDatabase {
    config: PgConnectionConfig,
    pool: PgPool,
}

impl TestDatabase {
    /// Creates a uniquely named database and runs the migrations on it.
    ///
    /// # Panics
    ///
    /// Panics if the database cannot be created or migrated.
    pub async fn spawn() -> Self {
        let config = local_pg_connection_config();
        let pool = create_pg_database(&config).await;

        sqlx::migrate!("../crunch-syncer/migrations")
            .run(&pool)
            .await
            .expect("Failed to run syncer migrations");

        Self { config, pool }
    }

    pub fn config(&self) -> &PgConnectionConfig {
        &self.config
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Drop for TestDatabase {
    fn drop(&mut self) {
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            tokio::task::block_in_place(|| {
                Handle::current().block_on(async {
                    self.pool.close().await;
                    drop_pg_database(&self.config).await;
                });
            });
        }));
    }
}
