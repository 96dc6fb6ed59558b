//! `Store` implementation over [`DatabasePool`].
//!
//! Write transactions run on the single writer connection, so two writers
//! never interleave. Read transactions use the reader pool and see one WAL
//! snapshot for their whole lifetime.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use proflink_core::repository::{Store, StoreTx};
use proflink_types::error::RepositoryError;
use sqlx::{Sqlite, Transaction};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `Store`.
#[derive(Clone)]
pub struct SqliteStore {
    pool: DatabasePool,
}

impl SqliteStore {
    /// Create a new store backed by the given database pool.
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }
}

/// An open SQLite transaction. Dropped without [`StoreTx::commit`], it rolls back.
pub struct SqliteTx {
    pub(crate) tx: Transaction<'static, Sqlite>,
}

impl Store for SqliteStore {
    type Tx = SqliteTx;

    async fn begin(&self) -> Result<SqliteTx, RepositoryError> {
        let tx = self.pool.writer.begin().await.map_err(begin_error)?;
        Ok(SqliteTx { tx })
    }

    async fn begin_read(&self) -> Result<SqliteTx, RepositoryError> {
        let tx = self.pool.reader.begin().await.map_err(begin_error)?;
        Ok(SqliteTx { tx })
    }
}

impl StoreTx for SqliteTx {
    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx
            .commit()
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}

fn begin_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => RepositoryError::Connection,
        other => RepositoryError::Query(other.to_string()),
    }
}

/// Map a write failure, turning constraint violations into `Conflict`.
pub(crate) fn write_error(err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err)
            if db_err.message().contains("UNIQUE")
                || db_err.message().contains("FOREIGN KEY") =>
        {
            RepositoryError::Conflict(db_err.message().to_string())
        }
        other => RepositoryError::Query(other.to_string()),
    }
}

pub(crate) fn query_error(err: sqlx::Error) -> RepositoryError {
    RepositoryError::Query(err.to_string())
}

pub(crate) fn parse_datetime(s: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Query(format!("invalid datetime: {e}")))
}

/// Fixed-width RFC 3339 so that text ordering in SQL matches time ordering.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

pub(crate) fn parse_date(s: &str) -> Result<NaiveDate, RepositoryError> {
    s.parse::<NaiveDate>()
        .map_err(|e| RepositoryError::Query(format!("invalid date: {e}")))
}

pub(crate) fn parse_id<T>(s: &str, what: &str) -> Result<T, RepositoryError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    s.parse::<T>()
        .map_err(|e| RepositoryError::Query(format!("invalid {what} id: {e}")))
}

#[cfg(test)]
pub(crate) async fn test_store() -> SqliteStore {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("test.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = DatabasePool::new(&url).await.unwrap();
    // Keep the tempdir alive for the duration of the test
    std::mem::forget(dir);
    SqliteStore::new(pool)
}
