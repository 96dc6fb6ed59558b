//! Skill taxonomy and profile skill assignments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{AssignmentId, ProfileId, SkillId};

/// A canonical skill in the shared catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub id: SkillId,
    /// Display name as first registered (trimmed).
    pub name: String,
    /// Optional grouping ("language", "framework", "soft-skill").
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Skill {
    /// The key the catalog deduplicates on.
    pub fn name_key(&self) -> String {
        normalize_skill_name(&self.name)
    }
}

/// Normalize a skill name for uniqueness: trimmed and case-folded.
///
/// ```
/// use proflink_types::skill::normalize_skill_name;
///
/// assert_eq!(normalize_skill_name("rust "), "rust");
/// assert_eq!(normalize_skill_name("  Rust"), normalize_skill_name("RUST"));
/// ```
pub fn normalize_skill_name(name: &str) -> String {
    name.trim().to_lowercase()
}

/// A profile's claim of a skill at a given proficiency.
///
/// At most one assignment exists per (profile, skill) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillAssignment {
    pub id: AssignmentId,
    pub profile_id: ProfileId,
    pub skill_id: SkillId,
    pub proficiency_level: i32,
    pub created_at: DateTime<Utc>,
}

/// A skill assignment joined with its catalog entry, for read views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedSkill {
    pub skill: Skill,
    pub proficiency_level: i32,
    pub assigned_at: DateTime<Utc>,
}
