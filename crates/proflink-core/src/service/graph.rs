//! Connection Graph Manager: directed connection requests between profiles.
//!
//! State machine:
//!
//! ```text
//!  none --request--> pending --accept--> accepted --disconnect--> none
//!                       |  \--reject--> rejected
//!                       \--cancel--> none
//!  any --block--> blocked --unblock (blocker only)--> none
//! ```
//!
//! Uniqueness is over the unordered pair: a request A->B conflicts with a
//! live B->A connection. The store's partial unique index on the pair key is
//! the final arbiter; the lookup here only produces a friendlier error.

use chrono::Utc;
use proflink_types::connection::{
    Connection, ConnectionAction, ConnectionStatus, PairKey,
};
use proflink_types::error::IntegrityError;
use proflink_types::ids::{ConnectionId, ProfileId};

use crate::repository::connection::{ConnectionFilter, ConnectionRepository};
use crate::repository::profile::ProfileRepository;
use crate::service::identity::IdentityStore;

/// What a legal action does to a connection row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Become(ConnectionStatus),
    Remove,
}

/// The transition table. `None` means the action is illegal from `current`.
pub fn next_state(current: ConnectionStatus, action: ConnectionAction) -> Option<Effect> {
    use ConnectionAction as A;
    use ConnectionStatus as S;

    match (current, action) {
        (S::Pending, A::Accept) => Some(Effect::Become(S::Accepted)),
        (S::Pending, A::Reject) => Some(Effect::Become(S::Rejected)),
        (S::Pending, A::Cancel) => Some(Effect::Remove),
        (S::Accepted, A::Disconnect) => Some(Effect::Remove),
        (S::Blocked, A::Unblock) => Some(Effect::Remove),
        (_, A::Block) => Some(Effect::Become(S::Blocked)),
        _ => None,
    }
}

/// Whether `actor` may perform `action` on `connection`.
pub fn may_act(connection: &Connection, action: ConnectionAction, actor: &ProfileId) -> bool {
    match action {
        ConnectionAction::Accept | ConnectionAction::Reject => connection.recipient_id == *actor,
        ConnectionAction::Cancel => connection.requester_id == *actor,
        ConnectionAction::Disconnect | ConnectionAction::Block => connection.is_party(actor),
        ConnectionAction::Unblock => connection.blocked_by.as_ref() == Some(actor),
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionGraph;

impl ConnectionGraph {
    pub fn new() -> Self {
        Self
    }

    /// Create a pending request from `requester` to `recipient`.
    pub async fn request<T>(
        &self,
        tx: &mut T,
        requester: &ProfileId,
        recipient: &ProfileId,
    ) -> Result<Connection, IntegrityError>
    where
        T: ProfileRepository + ConnectionRepository,
    {
        if requester == recipient {
            return Err(IntegrityError::InvalidArgument(
                "a profile cannot connect to itself".to_string(),
            ));
        }
        IdentityStore.ensure_exists(tx, requester).await?;
        IdentityStore.ensure_exists(tx, recipient).await?;

        let pair = PairKey::new(requester, recipient);
        if let Some(existing) = tx.find_live_connection(&pair).await? {
            return Err(IntegrityError::Conflict(format!(
                "connection {} between {requester} and {recipient} is already {}",
                existing.id, existing.status
            )));
        }

        let now = Utc::now();
        let connection = Connection {
            id: ConnectionId::new(),
            requester_id: *requester,
            recipient_id: *recipient,
            status: ConnectionStatus::Pending,
            blocked_by: None,
            created_at: now,
            updated_at: now,
        };
        tx.insert_connection(&connection).await?;
        tracing::info!(connection_id = %connection.id, %requester, %recipient, "connection requested");
        Ok(connection)
    }

    pub async fn accept<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        id: &ConnectionId,
        actor: &ProfileId,
    ) -> Result<Connection, IntegrityError> {
        self.act(tx, id, actor, ConnectionAction::Accept).await?;
        self.get(tx, id).await
    }

    pub async fn reject<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        id: &ConnectionId,
        actor: &ProfileId,
    ) -> Result<Connection, IntegrityError> {
        self.act(tx, id, actor, ConnectionAction::Reject).await?;
        self.get(tx, id).await
    }

    /// Withdraw a pending request. The row is removed.
    pub async fn cancel<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        id: &ConnectionId,
        actor: &ProfileId,
    ) -> Result<(), IntegrityError> {
        self.act(tx, id, actor, ConnectionAction::Cancel).await
    }

    /// End an accepted connection. The row is removed; reconnecting takes a
    /// fresh request.
    pub async fn disconnect<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        id: &ConnectionId,
        actor: &ProfileId,
    ) -> Result<(), IntegrityError> {
        self.act(tx, id, actor, ConnectionAction::Disconnect).await
    }

    /// Block `target` on behalf of `actor`, superseding any live connection
    /// between them. Blocking an already blocked pair is a no-op.
    pub async fn block<T>(
        &self,
        tx: &mut T,
        actor: &ProfileId,
        target: &ProfileId,
    ) -> Result<Connection, IntegrityError>
    where
        T: ProfileRepository + ConnectionRepository,
    {
        if actor == target {
            return Err(IntegrityError::InvalidArgument(
                "a profile cannot block itself".to_string(),
            ));
        }
        IdentityStore.ensure_exists(tx, actor).await?;
        IdentityStore.ensure_exists(tx, target).await?;

        let pair = PairKey::new(actor, target);
        match tx.find_live_connection(&pair).await? {
            Some(existing) if existing.status == ConnectionStatus::Blocked => {
                tracing::debug!(connection_id = %existing.id, %actor, "pair already blocked");
                Ok(existing)
            }
            Some(existing) => {
                self.act(tx, &existing.id, actor, ConnectionAction::Block)
                    .await?;
                self.get(tx, &existing.id).await
            }
            None => {
                let now = Utc::now();
                let connection = Connection {
                    id: ConnectionId::new(),
                    requester_id: *actor,
                    recipient_id: *target,
                    status: ConnectionStatus::Blocked,
                    blocked_by: Some(*actor),
                    created_at: now,
                    updated_at: now,
                };
                tx.insert_connection(&connection).await?;
                tracing::info!(connection_id = %connection.id, %actor, %target, "profile blocked");
                Ok(connection)
            }
        }
    }

    /// Lift a block. Only the blocking party may do so; the row is removed
    /// and a fresh request becomes possible.
    pub async fn unblock<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        actor: &ProfileId,
        target: &ProfileId,
    ) -> Result<(), IntegrityError> {
        let pair = PairKey::new(actor, target);
        let live = tx
            .find_live_connection(&pair)
            .await?
            .ok_or_else(|| IntegrityError::not_found("connection", &pair))?;
        self.act(tx, &live.id, actor, ConnectionAction::Unblock).await
    }

    pub async fn get<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        id: &ConnectionId,
    ) -> Result<Connection, IntegrityError> {
        tx.find_connection(id)
            .await?
            .ok_or_else(|| IntegrityError::not_found("connection", id))
    }

    /// The live connection between two profiles, in either direction.
    pub async fn between<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        a: &ProfileId,
        b: &ProfileId,
    ) -> Result<Option<Connection>, IntegrityError> {
        Ok(tx.find_live_connection(&PairKey::new(a, b)).await?)
    }

    pub async fn list_for_profile<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
        filter: Option<ConnectionFilter>,
    ) -> Result<Vec<Connection>, IntegrityError>
    where
        T: ProfileRepository + ConnectionRepository,
    {
        IdentityStore.ensure_exists(tx, profile_id).await?;
        let filter = filter.unwrap_or_default();
        Ok(tx.list_connections(profile_id, &filter).await?)
    }

    pub async fn count_accepted<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<u64, IntegrityError> {
        Ok(tx
            .count_connections(profile_id, ConnectionStatus::Accepted)
            .await?)
    }

    /// Remove every connection the profile is a party to (cascade step).
    pub async fn purge_profile<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<u64, IntegrityError> {
        Ok(tx.delete_connections_for_profile(profile_id).await?)
    }

    /// Apply `action` to connection `id`.
    ///
    /// Checks run in order: existence, state legality, actor permission. The
    /// write is compare-and-set on the observed status, so a concurrent
    /// transition surfaces as `InvalidState` against the fresh status.
    async fn act<T: ConnectionRepository>(
        &self,
        tx: &mut T,
        id: &ConnectionId,
        actor: &ProfileId,
        action: ConnectionAction,
    ) -> Result<(), IntegrityError> {
        let connection = self.get(tx, id).await?;
        let current = connection.status;

        let effect = next_state(current, action).ok_or(IntegrityError::InvalidState {
            action,
            status: current,
        })?;

        if !may_act(&connection, action, actor) {
            return Err(IntegrityError::Forbidden(format!(
                "profile {actor} may not {action} connection {id}"
            )));
        }

        let applied = match effect {
            Effect::Become(next) => {
                let blocked_by = (next == ConnectionStatus::Blocked).then_some(actor);
                tx.transition_connection(id, current, next, blocked_by, Utc::now())
                    .await?
            }
            Effect::Remove => tx.delete_connection(id, current).await?,
        };

        if !applied {
            let fresh = self.get(tx, id).await?;
            return Err(IntegrityError::InvalidState {
                action,
                status: fresh.status,
            });
        }

        tracing::info!(connection_id = %id, %actor, %action, from = %current, "connection transition");
        Ok(())
    }
}
