//! SQLite skill assignment repository (`user_skills` table).

use proflink_core::repository::assignment::AssignmentRepository;
use proflink_types::error::RepositoryError;
use proflink_types::ids::{AssignmentId, ProfileId, SkillId};
use proflink_types::skill::SkillAssignment;
use sqlx::Row;

use super::store::{
    format_datetime, parse_datetime, parse_id, query_error, write_error, SqliteTx,
};

struct AssignmentRow {
    id: String,
    user_id: String,
    skill_id: String,
    proficiency_level: i32,
    created_at: String,
}

impl AssignmentRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            skill_id: row.try_get("skill_id")?,
            proficiency_level: row.try_get("proficiency_level")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_assignment(self) -> Result<SkillAssignment, RepositoryError> {
        Ok(SkillAssignment {
            id: parse_id(&self.id, "assignment")?,
            profile_id: parse_id(&self.user_id, "profile")?,
            skill_id: parse_id(&self.skill_id, "skill")?,
            proficiency_level: self.proficiency_level,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<SkillAssignment, RepositoryError> {
    AssignmentRow::from_row(row)
        .map_err(query_error)?
        .into_assignment()
}

impl AssignmentRepository for SqliteTx {
    async fn insert_assignment(&mut self, assignment: &SkillAssignment) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO user_skills (id, user_id, skill_id, proficiency_level, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(assignment.id.to_string())
        .bind(assignment.profile_id.to_string())
        .bind(assignment.skill_id.to_string())
        .bind(assignment.proficiency_level)
        .bind(format_datetime(&assignment.created_at))
        .execute(&mut *self.tx)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_assignment(
        &mut self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> Result<Option<SkillAssignment>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM user_skills WHERE user_id = ? AND skill_id = ?")
            .bind(profile_id.to_string())
            .bind(skill_id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn update_assignment_level(
        &mut self,
        id: &AssignmentId,
        level: i32,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE user_skills SET proficiency_level = ? WHERE id = ?")
            .bind(level)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_assignment(
        &mut self,
        profile_id: &ProfileId,
        skill_id: &SkillId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_skills WHERE user_id = ? AND skill_id = ?")
            .bind(profile_id.to_string())
            .bind(skill_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_assignments(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<Vec<SkillAssignment>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM user_skills WHERE user_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(profile_id.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn delete_assignments_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM user_skills WHERE user_id = ?")
            .bind(profile_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }

    async fn count_assignments_for_skill(&mut self, skill_id: &SkillId) -> Result<u64, RepositoryError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_skills WHERE skill_id = ?")
            .bind(skill_id.to_string())
            .fetch_one(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(count as u64)
    }
}
