use crate::database::DbError;
use app_state::AppSettings;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Pool, Postgres};
use std::time::Duration;
use tracing::info;

/// Connects to the database configured in `settings`.
pub async fn get_db_pool(settings: &AppSettings) -> Result<Pool<Postgres>, DbError> {
    let db_settings = &settings.database;
    info!("Connecting to database.");
    let pool = PgPoolOptions::new()
        .max_connections(db_settings.max_connections)
        .min_connections(db_settings.min_connection)
        .max_lifetime(Duration::from_secs(db_settings.max_lifetime))
        .idle_timeout(Duration::from_secs(db_settings.idle_timeout))
        .acquire_timeout(Duration::from_secs(db_settings.acquire_timeout))
        .test_before_acquire(true)
        .connect(&settings.secrets.database_url)
        .await?;
    Ok(pool)
}

/// Applies the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    info!("Running database migrations.");
    sqlx::migrate!("../../../migrations").run(pool).await?;
    Ok(())
}
