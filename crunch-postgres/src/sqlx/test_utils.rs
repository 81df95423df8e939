use crunch_config::shared::{IntoConnectOptions, PgConnectionConfig};
use sqlx::{Connection, Executor, PgConnection, PgPool};

/// Opens a connection to the server's maintenance database, outside the one under test.
async fn admin_connection(config: &PgConnectionConfig) -> Result<PgConnection, sqlx::Error> {
    PgConnection::connect_with(&config.without_db()).await
}

/// Double-quotes `name` for use as an identifier in DDL.
fn quoted_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Creates the database named by `config` and returns a pool connected to it.
///
/// # Panics
/// Panics if the server is unreachable or the database already exists.
pub async fn create_pg_database(config: &PgConnectionConfig) -> PgPool {
    let mut connection = admin_connection(config)
        .await
        .expect("Failed to connect to the Postgres server");
    connection
        .execute(&*format!("create database {}", quoted_identifier(&config.name)))
        .await
        .expect("Failed to create the test database");

    PgPool::connect_with(config.with_db())
        .await
        .expect("Failed to connect to the test database")
}

/// Disconnects every session on the database named by `config` and drops it.
///
/// Failures are printed rather than raised, cleanup runs from `Drop`.
pub async fn drop_pg_database(config: &PgConnectionConfig) {
    let mut connection = match admin_connection(config).await {
        Ok(connection) => connection,
        Err(err) => {
            eprintln!("warning: cannot reach Postgres to drop `{}`: {err}", config.name);
            return;
        }
    };

    let terminated = sqlx::query(
        "select pg_terminate_backend(pid) from pg_stat_activity \
         where datname = $1 and pid <> pg_backend_pid()",
    )
    .bind(&config.name)
    .execute(&mut connection)
    .await;
    if let Err(err) = terminated {
        eprintln!("warning: cannot disconnect sessions of `{}`: {err}", config.name);
    }

    let dropped = connection
        .execute(&*format!(
            "drop database if exists {}",
            quoted_identifier(&config.name)
        ))
        .await;
    if let Err(err) = dropped {
        eprintln!("warning: cannot drop `{}`: {err}", config.name);
    }
}
