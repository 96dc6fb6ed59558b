//! SQLite connection repository implementation.
//!
//! Status changes are compare-and-set on the current status so that a caller
//! acting on a stale read affects zero rows instead of overwriting a newer
//! state. The partial unique index on `pair_key` keeps one live row per pair.

use chrono::{DateTime, Utc};
use proflink_core::repository::connection::{ConnectionFilter, ConnectionRepository};
use proflink_types::connection::{Connection, ConnectionStatus, Direction, PairKey};
use proflink_types::error::RepositoryError;
use proflink_types::ids::{ConnectionId, ProfileId};
use sqlx::Row;

use super::store::{
    format_datetime, parse_datetime, parse_id, query_error, write_error, SqliteTx,
};

/// `status IN (...)` over the statuses that occupy a pair.
fn live_clause() -> String {
    let statuses: Vec<String> = ConnectionStatus::LIVE
        .iter()
        .map(|status| format!("'{status}'"))
        .collect();
    format!("status IN ({})", statuses.join(", "))
}

struct ConnectionRow {
    id: String,
    requester_id: String,
    recipient_id: String,
    status: String,
    blocked_by: Option<String>,
    created_at: String,
    updated_at: String,
}

impl ConnectionRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            requester_id: row.try_get("requester_id")?,
            recipient_id: row.try_get("recipient_id")?,
            status: row.try_get("status")?,
            blocked_by: row.try_get("blocked_by")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_connection(self) -> Result<Connection, RepositoryError> {
        let status: ConnectionStatus = self
            .status
            .parse()
            .map_err(|e: String| RepositoryError::Query(e))?;

        Ok(Connection {
            id: parse_id(&self.id, "connection")?,
            requester_id: parse_id(&self.requester_id, "profile")?,
            recipient_id: parse_id(&self.recipient_id, "profile")?,
            status,
            blocked_by: self
                .blocked_by
                .as_deref()
                .map(|s| parse_id(s, "profile"))
                .transpose()?,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Connection, RepositoryError> {
    ConnectionRow::from_row(row)
        .map_err(query_error)?
        .into_connection()
}

impl ConnectionRepository for SqliteTx {
    async fn insert_connection(&mut self, connection: &Connection) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "INSERT INTO connections (id, requester_id, recipient_id, pair_key, status, blocked_by, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(connection.id.to_string())
        .bind(connection.requester_id.to_string())
        .bind(connection.recipient_id.to_string())
        .bind(connection.pair_key().as_str())
        .bind(connection.status.to_string())
        .bind(connection.blocked_by.map(|p| p.to_string()))
        .bind(format_datetime(&connection.created_at))
        .bind(format_datetime(&connection.updated_at))
        .execute(&mut *self.tx)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.message().contains("UNIQUE") => {
                Err(RepositoryError::Conflict(format!(
                    "pair '{}' already has a live connection",
                    connection.pair_key()
                )))
            }
            Err(e) => Err(write_error(e)),
        }
    }

    async fn find_connection(
        &mut self,
        id: &ConnectionId,
    ) -> Result<Option<Connection>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM connections WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn find_live_connection(
        &mut self,
        pair: &PairKey,
    ) -> Result<Option<Connection>, RepositoryError> {
        let sql = format!(
            "SELECT * FROM connections WHERE pair_key = ? AND {}",
            live_clause()
        );
        let row = sqlx::query(&sql)
            .bind(pair.as_str())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn transition_connection(
        &mut self,
        id: &ConnectionId,
        expected: ConnectionStatus,
        next: ConnectionStatus,
        blocked_by: Option<&ProfileId>,
        at: DateTime<Utc>,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE connections SET status = ?, blocked_by = ?, updated_at = ?
             WHERE id = ? AND status = ?",
        )
        .bind(next.to_string())
        .bind(blocked_by.map(|p| p.to_string()))
        .bind(format_datetime(&at))
        .bind(id.to_string())
        .bind(expected.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_connection(
        &mut self,
        id: &ConnectionId,
        expected: ConnectionStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM connections WHERE id = ? AND status = ?")
            .bind(id.to_string())
            .bind(expected.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_connections(
        &mut self,
        profile_id: &ProfileId,
        filter: &ConnectionFilter,
    ) -> Result<Vec<Connection>, RepositoryError> {
        let mut sql = String::from("SELECT * FROM connections WHERE ");
        sql.push_str(match filter.direction {
            Direction::Outgoing => "requester_id = ?",
            Direction::Incoming => "recipient_id = ?",
            Direction::Any => "(requester_id = ? OR recipient_id = ?)",
        });
        if filter.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let profile = profile_id.to_string();
        let mut query = sqlx::query(&sql).bind(profile.clone());
        if filter.direction == Direction::Any {
            query = query.bind(profile);
        }
        if let Some(status) = filter.status {
            query = query.bind(status.to_string());
        }

        let rows = query
            .fetch_all(&mut *self.tx)
            .await
            .map_err(query_error)?;
        rows.iter().map(decode).collect()
    }

    async fn count_connections(
        &mut self,
        profile_id: &ProfileId,
        status: ConnectionStatus,
    ) -> Result<u64, RepositoryError> {
        let profile = profile_id.to_string();
        let (count,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM connections
             WHERE status = ? AND (requester_id = ? OR recipient_id = ?)",
        )
        .bind(status.to_string())
        .bind(&profile)
        .bind(&profile)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(query_error)?;
        Ok(count as u64)
    }

    async fn delete_connections_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<u64, RepositoryError> {
        let profile = profile_id.to_string();
        let result = sqlx::query(
            "DELETE FROM connections WHERE requester_id = ? OR recipient_id = ?",
        )
        .bind(&profile)
        .bind(&profile)
        .execute(&mut *self.tx)
        .await
        .map_err(query_error)?;
        Ok(result.rows_affected())
    }
}
