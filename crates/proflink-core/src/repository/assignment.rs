//! Skill assignment repository trait definition.

use proflink_types::error::RepositoryError;
use proflink_types::ids::{AssignmentId, ProfileId, SkillId};
use proflink_types::skill::SkillAssignment;

/// Persistence for the `user_skills` table.
pub trait AssignmentRepository: Send {
    /// Insert an assignment. Fails with `Conflict` if the (profile, skill)
    /// pair already exists.
    fn insert_assignment(
        &mut self,
        assignment: &SkillAssignment,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_assignment(
        &mut self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> impl std::future::Future<Output = Result<Option<SkillAssignment>, RepositoryError>> + Send;

    fn update_assignment_level(
        &mut self,
        id: &AssignmentId,
        level: i32,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the assignment for a pair. Returns whether a row was removed.
    fn delete_assignment(
        &mut self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// All assignments of a profile, oldest first.
    fn list_assignments(
        &mut self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Vec<SkillAssignment>, RepositoryError>> + Send;

    fn delete_assignments_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;

    fn count_assignments_for_skill(
        &mut self,
        skill_id: &SkillId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
