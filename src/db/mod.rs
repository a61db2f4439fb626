//! PostgreSQL pool setup for the `postgres` storage backend

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::config::Config;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);
const IDLE_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error("DATABASE_URL is required for the postgres storage backend")]
    MissingUrl,

    #[error("cannot open pool: {0}")]
    Connect(#[source] sqlx::Error),

    #[error("schema migration failed: {0}")]
    Migrate(#[source] sqlx::migrate::MigrateError),

    #[error("ping failed: {0}")]
    Ping(#[source] sqlx::Error),
}

/// Open the pool described by `DATABASE_URL` and `DB_MAX_CONNECTIONS`
pub async fn create_pool(config: &Config) -> Result<PgPool, DbError> {
    let url = config.database_url.as_deref().ok_or(DbError::MissingUrl)?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .idle_timeout(IDLE_TIMEOUT)
        .connect(url)
        .await
        .map_err(DbError::Connect)?;

    tracing::info!(
        url = %config.database_url_masked(),
        max_connections = config.db_max_connections,
        "Postgres pool ready"
    );
    Ok(pool)
}

/// Bring the library schema up to date
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(DbError::Migrate)?;
    tracing::info!("Library schema is current");
    Ok(())
}

pub async fn check_health(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await
        .map(drop)
        .map_err(DbError::Ping)
}
