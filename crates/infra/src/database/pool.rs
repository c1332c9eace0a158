//! SQLite pool helpers
//!
//! Thin wrapper around the r2d2/rusqlite connection pool that converts pool
//! errors into the domain error type used by infrastructure code.

use std::path::Path;
use std::sync::Arc;

use cadence_domain::Result;
use r2d2::PooledConnection;
use r2d2_sqlite::SqliteConnectionManager;

use crate::errors::map_pool_error;

/// Shared SQLite connection pool.
pub type SqlitePool = r2d2::Pool<SqliteConnectionManager>;

/// One checked-out pool connection.
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// Create an `Arc<SqlitePool>` with WAL mode and foreign keys enabled on
/// every connection.
pub fn create_sqlite_pool<P: AsRef<Path>>(path: P, max_size: u32) -> Result<Arc<SqlitePool>> {
    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(|conn| {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )
    });

    r2d2::Pool::builder()
        .max_size(max_size.max(1))
        .build(manager)
        .map(Arc::new)
        .map_err(map_pool_error)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn create_pool_successfully() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("test.db");

        let pool = create_sqlite_pool(&db_path, 4).expect("pool should be created");

        // Smoke test: acquire a connection and create a table
        let conn = pool.get().expect("connection should be acquired");
        conn.execute("CREATE TABLE test (id INTEGER PRIMARY KEY)", rusqlite::params![])
            .expect("table creation should succeed");
    }
}
