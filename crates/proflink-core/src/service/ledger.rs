//! Skill Assignment Ledger: which profile holds which skill, and how well.

use chrono::Utc;
use proflink_types::config::ProficiencyBounds;
use proflink_types::error::IntegrityError;
use proflink_types::ids::{AssignmentId, ProfileId, SkillId};
use proflink_types::skill::{AssignedSkill, SkillAssignment};

use crate::repository::assignment::AssignmentRepository;
use crate::repository::profile::ProfileRepository;
use crate::repository::skill::SkillRepository;
use crate::service::catalog::SkillCatalog;
use crate::service::identity::IdentityStore;

/// Maps profiles to catalog skills with a bounded proficiency level.
#[derive(Debug, Clone, Copy)]
pub struct SkillLedger {
    bounds: ProficiencyBounds,
}

impl Default for SkillLedger {
    fn default() -> Self {
        Self::new(ProficiencyBounds::default())
    }
}

impl SkillLedger {
    pub fn new(bounds: ProficiencyBounds) -> Self {
        Self { bounds }
    }

    /// Give a profile a skill. Changing the level of an existing assignment
    /// goes through [`SkillLedger::update_level`]; assigning twice is a `Conflict`.
    pub async fn assign<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
        skill_id: &SkillId,
        level: i32,
    ) -> Result<SkillAssignment, IntegrityError>
    where
        T: ProfileRepository + SkillRepository + AssignmentRepository,
    {
        self.check_level(level)?;
        self.resolve(tx, profile_id, skill_id).await?;

        if tx.find_assignment(profile_id, skill_id).await?.is_some() {
            return Err(IntegrityError::Conflict(format!(
                "profile {profile_id} already holds skill {skill_id}"
            )));
        }

        let assignment = SkillAssignment {
            id: AssignmentId::new(),
            profile_id: *profile_id,
            skill_id: *skill_id,
            proficiency_level: level,
            created_at: Utc::now(),
        };
        tx.insert_assignment(&assignment).await?;
        tracing::info!(%profile_id, %skill_id, level, "skill assigned");
        Ok(assignment)
    }

    /// Change the level of an existing assignment. Never fails with `Conflict`.
    pub async fn update_level<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
        skill_id: &SkillId,
        level: i32,
    ) -> Result<SkillAssignment, IntegrityError>
    where
        T: ProfileRepository + SkillRepository + AssignmentRepository,
    {
        self.check_level(level)?;
        self.resolve(tx, profile_id, skill_id).await?;

        let mut assignment = tx
            .find_assignment(profile_id, skill_id)
            .await?
            .ok_or_else(|| {
                IntegrityError::not_found("skill assignment", format!("{profile_id}/{skill_id}"))
            })?;

        if assignment.proficiency_level != level {
            tx.update_assignment_level(&assignment.id, level)
                .await
                .map_err(|e| {
                    e.missing("skill assignment", format!("{profile_id}/{skill_id}"))
                })?;
            tracing::info!(
                %profile_id,
                %skill_id,
                from = assignment.proficiency_level,
                to = level,
                "proficiency updated"
            );
            assignment.proficiency_level = level;
        }
        Ok(assignment)
    }

    /// Remove an assignment. Revoking something that is not assigned is a
    /// successful no-op; the return value says whether a row was removed.
    pub async fn revoke<T: AssignmentRepository>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> Result<bool, IntegrityError> {
        let removed = tx.delete_assignment(profile_id, skill_id).await?;
        if removed {
            tracing::info!(%profile_id, %skill_id, "skill revoked");
        }
        Ok(removed)
    }

    pub async fn list_for_profile<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<Vec<SkillAssignment>, IntegrityError>
    where
        T: ProfileRepository + AssignmentRepository,
    {
        IdentityStore.ensure_exists(tx, profile_id).await?;
        Ok(tx.list_assignments(profile_id).await?)
    }

    /// Assignments joined with their catalog entries.
    pub async fn assigned_skills<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<Vec<AssignedSkill>, IntegrityError>
    where
        T: ProfileRepository + SkillRepository + AssignmentRepository,
    {
        let assignments = self.list_for_profile(tx, profile_id).await?;
        let mut skills = Vec::with_capacity(assignments.len());
        for assignment in assignments {
            let skill = SkillCatalog.get(tx, &assignment.skill_id).await?;
            skills.push(AssignedSkill {
                skill,
                proficiency_level: assignment.proficiency_level,
                assigned_at: assignment.created_at,
            });
        }
        Ok(skills)
    }

    /// Remove every assignment of a profile (cascade step).
    pub async fn revoke_all<T: AssignmentRepository>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<u64, IntegrityError> {
        Ok(tx.delete_assignments_for_profile(profile_id).await?)
    }

    fn check_level(&self, level: i32) -> Result<(), IntegrityError> {
        if !self.bounds.contains(level) {
            return Err(IntegrityError::InvalidArgument(format!(
                "proficiency level {level} outside [{}, {}]",
                self.bounds.min, self.bounds.max
            )));
        }
        Ok(())
    }

    async fn resolve<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> Result<(), IntegrityError>
    where
        T: ProfileRepository + SkillRepository,
    {
        IdentityStore.ensure_exists(tx, profile_id).await?;
        SkillCatalog.get(tx, skill_id).await?;
        Ok(())
    }
}
