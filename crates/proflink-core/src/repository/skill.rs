//! Skill catalog repository trait definition.

use proflink_types::error::RepositoryError;
use proflink_types::ids::SkillId;
use proflink_types::skill::Skill;

/// Filter criteria for listing catalog skills.
#[derive(Debug, Clone, Default)]
pub struct SkillFilter {
    /// Exact category match.
    pub category: Option<String>,
}

impl SkillFilter {
    pub fn category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
        }
    }
}

/// Persistence for the `skills` table.
pub trait SkillRepository: Send {
    /// Insert a new skill. Fails with `Conflict` if its normalized name exists.
    fn insert_skill(
        &mut self,
        skill: &Skill,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_skill(
        &mut self,
        id: &SkillId,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    /// Look up a skill by normalized name.
    fn find_skill_by_key(
        &mut self,
        name_key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Skill>, RepositoryError>> + Send;

    fn update_skill_category(
        &mut self,
        id: &SkillId,
        category: Option<&str>,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// List skills ordered by normalized name, then id.
    fn list_skills(
        &mut self,
        filter: &SkillFilter,
    ) -> impl std::future::Future<Output = Result<Vec<Skill>, RepositoryError>> + Send;

    /// Delete a skill. Fails with `Conflict` while assignments reference it.
    fn delete_skill(
        &mut self,
        id: &SkillId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
