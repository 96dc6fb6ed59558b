//! SQLite skill catalog repository implementation.

use proflink_core::repository::skill::{SkillFilter, SkillRepository};
use proflink_types::error::RepositoryError;
use proflink_types::ids::SkillId;
use proflink_types::skill::Skill;
use sqlx::Row;

use super::store::{
    format_datetime, parse_datetime, parse_id, query_error, write_error, SqliteTx,
};

struct SkillRow {
    id: String,
    name: String,
    category: Option<String>,
    created_at: String,
}

impl SkillRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            category: row.try_get("category")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_skill(self) -> Result<Skill, RepositoryError> {
        Ok(Skill {
            id: parse_id(&self.id, "skill")?,
            name: self.name,
            category: self.category,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Skill, RepositoryError> {
    SkillRow::from_row(row).map_err(query_error)?.into_skill()
}

impl SkillRepository for SqliteTx {
    async fn insert_skill(&mut self, skill: &Skill) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO skills (id, name, name_key, category, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(skill.id.to_string())
        .bind(&skill.name)
        .bind(skill.name_key())
        .bind(&skill.category)
        .bind(format_datetime(&skill.created_at))
        .execute(&mut *self.tx)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_skill(&mut self, id: &SkillId) -> Result<Option<Skill>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM skills WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn find_skill_by_key(&mut self, name_key: &str) -> Result<Option<Skill>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM skills WHERE name_key = ?")
            .bind(name_key)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn update_skill_category(
        &mut self,
        id: &SkillId,
        category: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE skills SET category = ? WHERE id = ?")
            .bind(category)
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn list_skills(&mut self, filter: &SkillFilter) -> Result<Vec<Skill>, RepositoryError> {
        let rows = match filter.category {
            Some(ref category) => {
                sqlx::query("SELECT * FROM skills WHERE category = ? ORDER BY name_key, id")
                    .bind(category)
                    .fetch_all(&mut *self.tx)
                    .await
            }
            None => {
                sqlx::query("SELECT * FROM skills ORDER BY name_key, id")
                    .fetch_all(&mut *self.tx)
                    .await
            }
        }
        .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn delete_skill(&mut self, id: &SkillId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM skills WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(write_error)?;
        Ok(result.rows_affected() > 0)
    }
}
