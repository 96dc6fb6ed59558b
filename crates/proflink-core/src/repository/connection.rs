//! Connection repository trait definition.

use chrono::{DateTime, Utc};
use proflink_types::connection::{Connection, ConnectionStatus, Direction, PairKey};
use proflink_types::error::RepositoryError;
use proflink_types::ids::{ConnectionId, ProfileId};

/// Filter criteria for listing a profile's connections.
#[derive(Debug, Clone, Default)]
pub struct ConnectionFilter {
    pub status: Option<ConnectionStatus>,
    pub direction: Direction,
}

impl ConnectionFilter {
    pub fn status(status: ConnectionStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }
}

/// Persistence for the `connections` table.
///
/// Status changes are compare-and-set: they only apply while the row still
/// has the status the caller observed, so two racing transitions on the same
/// id cannot both succeed.
pub trait ConnectionRepository: Send {
    /// Insert a connection. Fails with `Conflict` if a live connection
    /// already exists for the same unordered pair.
    fn insert_connection(
        &mut self,
        connection: &Connection,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_connection(
        &mut self,
        id: &ConnectionId,
    ) -> impl std::future::Future<Output = Result<Option<Connection>, RepositoryError>> + Send;

    /// The live (pending, accepted or blocked) connection for a pair, if any.
    fn find_live_connection(
        &mut self,
        pair: &PairKey,
    ) -> impl std::future::Future<Output = Result<Option<Connection>, RepositoryError>> + Send;

    /// Move `id` from `expected` to `next`. Returns false if the row is gone
    /// or no longer in `expected`.
    fn transition_connection(
        &mut self,
        id: &ConnectionId,
        expected: ConnectionStatus,
        next: ConnectionStatus,
        blocked_by: Option<&ProfileId>,
        at: DateTime<Utc>,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Delete `id` if it is still in `expected`. Returns whether a row was removed.
    fn delete_connection(
        &mut self,
        id: &ConnectionId,
        expected: ConnectionStatus,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Connections where the profile is a party, newest first.
    fn list_connections(
        &mut self,
        profile_id: &ProfileId,
        filter: &ConnectionFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Connection>, RepositoryError>> + Send;

    fn count_connections(
        &mut self,
        profile_id: &ProfileId,
        status: ConnectionStatus,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    /// Remove every connection where the profile is either party.
    fn delete_connections_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
