//! SQLite persistence for buckets and items.
//!
//! Query functions take a `&mut SqliteConnection` so the same call works on a
//! pooled connection or inside a transaction (`&mut *tx`). Every read that
//! feeds occupancy, listing or lookup filters on `deleted_at IS NULL`.

pub mod buckets;
pub mod items;

use sqlx::{
    SqlitePool,
    migrate::{MigrateError, Migrator},
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
};
use std::{str::FromStr, time::Duration};

/// Migrations embedded from `./migrations` at build time.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Connection settings for the metadata database.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    /// How long a writer waits for the database lock before failing.
    pub busy_timeout: Duration,
}

/// Open a pool against a file-backed SQLite database, creating it if needed.
///
/// WAL keeps readers unblocked while one admission holds the write lock.
pub async fn connect(cfg: &DatabaseConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&cfg.url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(cfg.busy_timeout);

    SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_with(options)
        .await
}

/// Single-connection in-memory database with the schema applied.
///
/// Each SQLite in-memory connection is its own database, so the pool is pinned
/// to one connection that never idles out.
pub async fn connect_in_memory() -> Result<SqlitePool, MigrateError> {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect_with(options)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

/// Apply pending migrations. Safe to call on every start-up.
pub async fn migrate(pool: &SqlitePool) -> Result<(), MigrateError> {
    MIGRATOR.run(pool).await
}

/// Lightweight connectivity probe.
pub async fn ping(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    let value = sqlx::query_scalar::<_, i64>("SELECT 1")
        .fetch_one(pool)
        .await?;
    if value == 1 {
        Ok(())
    } else {
        Err(sqlx::Error::Protocol(format!(
            "unexpected probe result: {}",
            value
        )))
    }
}
