use sqlx::PgPool;
use tracing::info;

/// Creates the `crunch` table and its checkpoint index if they are missing.
pub async fn apply_crunch_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    info!("applying crunch migrations");

    let migrator = sqlx::migrate!("./migrations");
    migrator.run(pool).await?;

    info!("crunch migrations successfully applied");

    Ok(())
}
