use std::thread;
use std::time::Duration;

use diesel::connection::SimpleConnection;
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("../migrations");

pub type DbPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type DbConn = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("Failed to create database pool: {0}")]
    Pool(#[from] r2d2::PoolError),

    #[error("Failed to run database migrations: {0}")]
    Migrations(String),
}

/// Per-connection pragmas. SQLite leaves foreign keys off unless asked.
#[derive(Debug)]
struct ConnectionOptions;

impl CustomizeConnection<SqliteConnection, r2d2::Error> for ConnectionOptions {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(
            "PRAGMA foreign_keys = ON; PRAGMA journal_mode = WAL; PRAGMA busy_timeout = 5000;",
        )
        .map_err(r2d2::Error::QueryError)
    }
}

pub fn create_pool(database_url: &str) -> Result<DbPool, SetupError> {
    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .connection_customizer(Box::new(ConnectionOptions))
        .build(manager)?;

    // Run pending migrations on startup
    let mut conn = pool.get()?;
    conn.run_pending_migrations(MIGRATIONS)
        .map_err(|e| SetupError::Migrations(e.to_string()))?;

    Ok(pool)
}

/// Block until a connection to `database_url` can be established, trying once per second.
/// Returns the number of failed attempts before success, or the last error once
/// `max_attempts` is exhausted.
pub fn wait_for_db(database_url: &str, max_attempts: u32) -> Result<u32, ConnectionError> {
    let mut failures = 0;
    loop {
        match SqliteConnection::establish(database_url) {
            Ok(_) => return Ok(failures),
            Err(e) => {
                failures += 1;
                if failures >= max_attempts {
                    return Err(e);
                }
                tracing::warn!("Database unavailable, waiting 1 second: {}", e);
                thread::sleep(Duration::from_secs(1));
            }
        }
    }
}

/// A migrated pool on a throwaway database file. Keep the directory alive
/// for as long as the pool is used.
#[cfg(test)]
pub fn test_pool() -> (tempfile::TempDir, DbPool) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let url = dir.path().join("test.db");
    let pool = create_pool(url.to_str().expect("Temp path is not UTF-8"))
        .expect("Failed to create test pool");
    (dir, pool)
}
