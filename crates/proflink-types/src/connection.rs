use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{ConnectionId, ProfileId};

use std::fmt;
use std::str::FromStr;

/// A directional connection record between two profiles.
///
/// `requester_id` and `recipient_id` keep their meaning for the lifetime of
/// the row, so "who initiated" can always be answered. Uniqueness, however,
/// is enforced over the unordered pair (see [`PairKey`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub id: ConnectionId,
    pub requester_id: ProfileId,
    pub recipient_id: ProfileId,
    pub status: ConnectionStatus,
    /// The party that placed the block. Only set while `status` is `Blocked`.
    pub blocked_by: Option<ProfileId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Connection {
    pub fn is_party(&self, profile: &ProfileId) -> bool {
        self.requester_id == *profile || self.recipient_id == *profile
    }

    pub fn pair_key(&self) -> PairKey {
        PairKey::new(&self.requester_id, &self.recipient_id)
    }
}

/// Connection lifecycle states.
///
/// - Pending: requested, awaiting the recipient
/// - Accepted: both parties connected
/// - Rejected: declined by the recipient (kept as history)
/// - Blocked: one party excluded the other; no new request until unblocked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Rejected,
    Blocked,
}

impl ConnectionStatus {
    /// Live connections occupy the pair: at most one may exist per pair.
    pub fn is_live(&self) -> bool {
        !matches!(self, ConnectionStatus::Rejected)
    }

    pub const LIVE: [ConnectionStatus; 3] = [
        ConnectionStatus::Pending,
        ConnectionStatus::Accepted,
        ConnectionStatus::Blocked,
    ];
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionStatus::Pending => write!(f, "pending"),
            ConnectionStatus::Accepted => write!(f, "accepted"),
            ConnectionStatus::Rejected => write!(f, "rejected"),
            ConnectionStatus::Blocked => write!(f, "blocked"),
        }
    }
}

impl FromStr for ConnectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(ConnectionStatus::Pending),
            "accepted" => Ok(ConnectionStatus::Accepted),
            "rejected" => Ok(ConnectionStatus::Rejected),
            "blocked" => Ok(ConnectionStatus::Blocked),
            other => Err(format!("invalid connection status: '{other}'")),
        }
    }
}

impl Default for ConnectionStatus {
    fn default() -> Self {
        ConnectionStatus::Pending
    }
}

/// Actions a party can take on an existing connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionAction {
    Accept,
    Reject,
    Cancel,
    Disconnect,
    Block,
    Unblock,
}

impl fmt::Display for ConnectionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionAction::Accept => write!(f, "accept"),
            ConnectionAction::Reject => write!(f, "reject"),
            ConnectionAction::Cancel => write!(f, "cancel"),
            ConnectionAction::Disconnect => write!(f, "disconnect"),
            ConnectionAction::Block => write!(f, "block"),
            ConnectionAction::Unblock => write!(f, "unblock"),
        }
    }
}

/// Which side of a connection a profile is on, for list queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Profile is the requester.
    Outgoing,
    /// Profile is the recipient.
    Incoming,
    #[default]
    Any,
}

/// Order-independent key for a pair of profiles: `min:max` of the two ids.
///
/// ```
/// use proflink_types::connection::PairKey;
/// use proflink_types::ids::ProfileId;
///
/// let a = ProfileId::new();
/// let b = ProfileId::new();
/// assert_eq!(PairKey::new(&a, &b), PairKey::new(&b, &a));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PairKey(String);

impl PairKey {
    pub fn new(a: &ProfileId, b: &ProfileId) -> Self {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        Self(format!("{low}:{high}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
