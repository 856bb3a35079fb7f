use sqlx::{Pool, Postgres};
use tracing::info;

/// Run all pending database migrations
///
/// Migrations under `migrations/` are embedded at compile time; sqlx records
/// which ones were applied, so this is safe to call on every start.
pub async fn run_migrations(pool: &Pool<Postgres>) -> Result<(), sqlx::migrate::MigrateError> {
    info!("Running database migrations...");

    sqlx::migrate!("./migrations").run(pool).await?;

    info!("Database migrations completed successfully");
    Ok(())
}
