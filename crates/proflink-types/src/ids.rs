//! Typed identifiers for every table.
//!
//! All ids wrap a UUID v7 (time-sortable) so that rows created later sort
//! after rows created earlier when ordered by id.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use std::fmt;
use std::str::FromStr;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Create a new id using UUID v7.
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

define_id!(
    /// Identifier of a profile (the root aggregate).
    ProfileId
);
define_id!(
    /// Identifier of a catalog skill.
    SkillId
);
define_id!(
    /// Identifier of a profile-to-skill assignment row.
    AssignmentId
);
define_id!(
    /// Identifier of an issued certificate.
    CertificateId
);
define_id!(
    /// Identifier of a connection record.
    ConnectionId
);
