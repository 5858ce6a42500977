//! Postgres storage for QR codes.

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod qr_codes;

pub use qr_codes::{
    create_qr_code, delete_qr_code, get_qr_code, get_qr_code_by_id, increment_scans,
    list_qr_codes, update_qr_code, QrCodeRow,
};

// <workspace-root>/migrations, shared with the sqlx::test fixtures
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

const APPLIED_MIGRATIONS: &str = "SELECT COUNT(*) FROM _sqlx_migrations WHERE success = true";

/// Connection limits for the shared pool. Values come from the
/// `QRSHOP_DB_*` settings in [`qrshop_core::AppConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &qrshop_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// An update or delete matched no QR code for the shop.
    #[error("QR code not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// # Errors
///
/// Returns [`sqlx::Error`] if no connection can be opened within the
/// acquire timeout.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await
}

/// Brings the schema up to date and reports how many migrations ran.
///
/// # Errors
///
/// Returns [`sqlx::migrate::MigrateError`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, sqlx::migrate::MigrateError> {
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;
    Ok(usize::try_from(after.saturating_sub(before)).unwrap_or(0))
}

// zero on a fresh database, where the bookkeeping table does not exist yet
async fn applied_migrations(pool: &PgPool) -> i64 {
    sqlx::query_scalar::<_, i64>(APPLIED_MIGRATIONS)
        .fetch_one(pool)
        .await
        .unwrap_or(0)
}

/// Round-trips `SELECT 1` for the health endpoint.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the database is unreachable.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query_scalar::<_, i32>("SELECT 1")
        .fetch_one(pool)
        .await?;
    Ok(())
}
