//! Skill Catalog: canonical skill definitions shared by all profiles.

use chrono::Utc;
use proflink_types::error::IntegrityError;
use proflink_types::ids::SkillId;
use proflink_types::skill::{Skill, normalize_skill_name};

use crate::repository::assignment::AssignmentRepository;
use crate::repository::skill::{SkillFilter, SkillRepository};

#[derive(Debug, Clone, Copy, Default)]
pub struct SkillCatalog;

impl SkillCatalog {
    pub fn new() -> Self {
        Self
    }

    /// Register a skill, or return the existing one with the same normalized
    /// name.
    ///
    /// When the skill exists and a non-empty `category` is given that differs
    /// from the stored one, the category is updated. The display name of an
    /// existing skill is never changed.
    pub async fn upsert<T: SkillRepository>(
        &self,
        tx: &mut T,
        name: &str,
        category: Option<&str>,
    ) -> Result<Skill, IntegrityError> {
        let key = normalize_skill_name(name);
        if key.is_empty() {
            return Err(IntegrityError::InvalidArgument(
                "skill name cannot be empty".to_string(),
            ));
        }
        let category = category
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_string);

        if let Some(mut existing) = tx.find_skill_by_key(&key).await? {
            if category.is_some() && category != existing.category {
                tx.update_skill_category(&existing.id, category.as_deref())
                    .await
                    .map_err(|e| e.missing("skill", existing.id))?;
                tracing::debug!(skill_id = %existing.id, ?category, "skill category updated");
                existing.category = category;
            }
            return Ok(existing);
        }

        let skill = Skill {
            id: SkillId::new(),
            name: name.trim().to_string(),
            category,
            created_at: Utc::now(),
        };
        tx.insert_skill(&skill).await?;
        tracing::info!(skill_id = %skill.id, name = %skill.name, "skill registered");
        Ok(skill)
    }

    pub async fn get<T: SkillRepository>(
        &self,
        tx: &mut T,
        id: &SkillId,
    ) -> Result<Skill, IntegrityError> {
        tx.find_skill(id)
            .await?
            .ok_or_else(|| IntegrityError::not_found("skill", id))
    }

    /// List skills, ordered by normalized name.
    pub async fn list<T: SkillRepository>(
        &self,
        tx: &mut T,
        filter: Option<SkillFilter>,
    ) -> Result<Vec<Skill>, IntegrityError> {
        let filter = filter.unwrap_or_default();
        Ok(tx.list_skills(&filter).await?)
    }

    /// Remove a skill nobody holds. Fails with `Conflict` while referenced.
    pub async fn remove<T: SkillRepository + AssignmentRepository>(
        &self,
        tx: &mut T,
        id: &SkillId,
    ) -> Result<(), IntegrityError> {
        let holders = tx.count_assignments_for_skill(id).await?;
        if holders > 0 {
            return Err(IntegrityError::Conflict(format!(
                "skill {id} is assigned to {holders} profile(s)"
            )));
        }
        if !tx.delete_skill(id).await? {
            return Err(IntegrityError::not_found("skill", id));
        }
        tracing::info!(skill_id = %id, "skill removed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Store;
    use crate::testing::MemoryStore;
    use proflink_types::error::{ErrorKind, RepositoryError};

    #[tokio::test]
    async fn test_upsert_is_idempotent_by_normalized_name() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let first = SkillCatalog.upsert(&mut tx, "rust ", None).await.unwrap();
        let second = SkillCatalog.upsert(&mut tx, "Rust", None).await.unwrap();
        let third = SkillCatalog.upsert(&mut tx, "  RUST", None).await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.id, third.id);
        assert_eq!(first.name, "rust");
        assert_eq!(SkillCatalog.list(&mut tx, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_updates_category_only_when_given() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();

        let created = SkillCatalog
            .upsert(&mut tx, "Go", Some("language"))
            .await
            .unwrap();
        let unchanged = SkillCatalog.upsert(&mut tx, "go", None).await.unwrap();
        assert_eq!(unchanged.category.as_deref(), Some("language"));

        let moved = SkillCatalog
            .upsert(&mut tx, "GO", Some("backend"))
            .await
            .unwrap();
        assert_eq!(moved.id, created.id);
        assert_eq!(moved.category.as_deref(), Some("backend"));

        let stored = SkillCatalog.get(&mut tx, &created.id).await.unwrap();
        assert_eq!(stored.category.as_deref(), Some("backend"));
    }

    /// Finds a skill by key but loses the row before the category write.
    struct VanishingSkill(Skill);

    impl SkillRepository for VanishingSkill {
        async fn insert_skill(&mut self, _: &Skill) -> Result<(), RepositoryError> {
            unreachable!()
        }

        async fn find_skill(&mut self, _: &SkillId) -> Result<Option<Skill>, RepositoryError> {
            unreachable!()
        }

        async fn find_skill_by_key(&mut self, _: &str) -> Result<Option<Skill>, RepositoryError> {
            Ok(Some(self.0.clone()))
        }

        async fn update_skill_category(
            &mut self,
            _: &SkillId,
            _: Option<&str>,
        ) -> Result<(), RepositoryError> {
            Err(RepositoryError::NotFound)
        }

        async fn list_skills(&mut self, _: &SkillFilter) -> Result<Vec<Skill>, RepositoryError> {
            unreachable!()
        }

        async fn delete_skill(&mut self, _: &SkillId) -> Result<bool, RepositoryError> {
            unreachable!()
        }
    }

    #[tokio::test]
    async fn test_category_write_on_missing_row_names_the_skill() {
        let skill = Skill {
            id: SkillId::new(),
            name: "Rust".to_string(),
            category: None,
            created_at: Utc::now(),
        };
        let mut tx = VanishingSkill(skill.clone());

        let err = SkillCatalog
            .upsert(&mut tx, "rust", Some("language"))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), format!("skill '{}' not found", skill.id));
    }

    #[tokio::test]
    async fn test_upsert_rejects_blank_name() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = SkillCatalog.upsert(&mut tx, "   ", None).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_list_filters_by_category() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        SkillCatalog.upsert(&mut tx, "Rust", Some("language")).await.unwrap();
        SkillCatalog.upsert(&mut tx, "Axum", Some("framework")).await.unwrap();
        SkillCatalog.upsert(&mut tx, "C", Some("language")).await.unwrap();

        let languages = SkillCatalog
            .list(&mut tx, Some(SkillFilter::category("language")))
            .await
            .unwrap();
        let names: Vec<&str> = languages.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["C", "Rust"]);
    }

    #[tokio::test]
    async fn test_get_and_remove_unknown_skill() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let id = SkillId::new();
        assert_eq!(
            SkillCatalog.get(&mut tx, &id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            SkillCatalog.remove(&mut tx, &id).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
