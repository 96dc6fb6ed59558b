//! Read views and reports spanning several tables of one profile.

use serde::{Deserialize, Serialize};

use crate::certificate::Certificate;
use crate::profile::Profile;
use crate::skill::AssignedSkill;

/// Everything shown on a profile page, read in one transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileOverview {
    pub profile: Profile,
    pub skills: Vec<AssignedSkill>,
    pub certificates: Vec<Certificate>,
    /// Number of accepted connections, either direction.
    pub connection_count: u64,
}

/// Rows removed by a cascading profile delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub assignments: u64,
    pub certificates: u64,
    pub connections: u64,
}

impl CascadeReport {
    pub fn total(&self) -> u64 {
        self.assignments + self.certificates + self.connections
    }
}
