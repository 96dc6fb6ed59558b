//! Database pool with split reader/writer connections in WAL mode.
//!
//! SQLite allows only one writer at a time. `DatabasePool` pairs a
//! multi-connection reader pool with a single-connection writer pool, so
//! write transactions are serialized by the pool itself. Both use WAL journal
//! mode and enforce foreign keys.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;

use crate::config::resolve_data_dir;

/// Split read/write pool for SQLite with WAL mode.
///
/// - `reader`: Multi-connection pool (up to 8) for read-only transactions.
/// - `writer`: Single-connection pool; holding its connection is holding the
///   database's write slot.
#[derive(Clone)]
pub struct DatabasePool {
    pub reader: SqlitePool,
    pub writer: SqlitePool,
}

impl DatabasePool {
    /// Create a new DatabasePool with split reader/writer connections.
    ///
    /// Runs migrations automatically on the writer pool.
    /// Both pools use WAL journal mode, foreign key enforcement, and 5-second busy timeout.
    pub async fn new(database_url: &str) -> Result<Self, sqlx::Error> {
        let base_opts = SqliteConnectOptions::from_str(database_url)?
            .journal_mode(SqliteJournalMode::Wal)
            .foreign_keys(true)
            .busy_timeout(std::time::Duration::from_secs(5))
            .create_if_missing(true);

        let read_opts = base_opts.clone().read_only(true);
        let write_opts = base_opts;

        let writer = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(write_opts)
            .await?;

        // Run migrations on writer before opening reader pool
        sqlx::migrate!("../../migrations").run(&writer).await?;

        let reader = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(read_opts)
            .await?;

        tracing::debug!(database_url, "database pool ready");
        Ok(Self { reader, writer })
    }
}

/// Returns the default database URL inside the data directory
/// (`PROFLINK_DATA_DIR`, else `~/.proflink`).
pub fn default_database_url() -> String {
    let data_dir = resolve_data_dir();
    format!("sqlite://{}/proflink.db", data_dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn temp_pool(name: &str) -> DatabasePool {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join(name);
        let url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = DatabasePool::new(&url).await.unwrap();
        std::mem::forget(dir);
        pool
    }

    #[tokio::test]
    async fn test_pool_creates_tables() {
        let pool = temp_pool("test.db").await;

        let tables: Vec<(String,)> = sqlx::query_as(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' AND name != '_sqlx_migrations' ORDER BY name",
        )
        .fetch_all(&pool.reader)
        .await
        .unwrap();

        let table_names: Vec<&str> = tables.iter().map(|t| t.0.as_str()).collect();
        assert_eq!(
            table_names,
            vec!["certificates", "connections", "profiles", "skills", "user_skills"]
        );
    }

    #[tokio::test]
    async fn test_pool_wal_mode() {
        let pool = temp_pool("test_wal.db").await;

        let result: (String,) = sqlx::query_as("PRAGMA journal_mode")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0.to_lowercase(), "wal");
    }

    #[tokio::test]
    async fn test_pool_foreign_keys_enforced() {
        let pool = temp_pool("test_fk.db").await;

        let result: (i32,) = sqlx::query_as("PRAGMA foreign_keys")
            .fetch_one(&pool.writer)
            .await
            .unwrap();

        assert_eq!(result.0, 1, "foreign keys should be enabled");
    }

    #[tokio::test]
    async fn test_reader_is_read_only() {
        let pool = temp_pool("test_ro.db").await;

        let result = sqlx::query("DELETE FROM profiles").execute(&pool.reader).await;
        assert!(result.is_err());
    }

    #[test]
    fn test_default_database_url() {
        let url = default_database_url();
        assert!(url.starts_with("sqlite://"));
        assert!(url.ends_with("proflink.db"));
    }
}
