//! SQLite profile repository implementation.

use proflink_core::repository::profile::ProfileRepository;
use proflink_types::error::RepositoryError;
use proflink_types::ids::ProfileId;
use proflink_types::profile::Profile;
use sqlx::Row;

use super::store::{
    format_datetime, parse_datetime, parse_id, query_error, write_error, SqliteTx,
};

/// Internal row type for mapping SQLite rows to domain Profile.
struct ProfileRow {
    id: String,
    name: String,
    email: String,
    phone: Option<String>,
    avatar_url: Option<String>,
    title: Option<String>,
    location: Option<String>,
    linkedin_url: Option<String>,
    github_url: Option<String>,
    rating: f64,
    created_at: String,
    updated_at: String,
}

impl ProfileRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            avatar_url: row.try_get("avatar_url")?,
            title: row.try_get("title")?,
            location: row.try_get("location")?,
            linkedin_url: row.try_get("linkedin_url")?,
            github_url: row.try_get("github_url")?,
            rating: row.try_get("rating")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn into_profile(self) -> Result<Profile, RepositoryError> {
        Ok(Profile {
            id: parse_id(&self.id, "profile")?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            avatar_url: self.avatar_url,
            title: self.title,
            location: self.location,
            linkedin_url: self.linkedin_url,
            github_url: self.github_url,
            rating: self.rating,
            created_at: parse_datetime(&self.created_at)?,
            updated_at: parse_datetime(&self.updated_at)?,
        })
    }
}

fn decode(row: Option<sqlx::sqlite::SqliteRow>) -> Result<Option<Profile>, RepositoryError> {
    match row {
        Some(row) => {
            let profile_row = ProfileRow::from_row(&row).map_err(query_error)?;
            Ok(Some(profile_row.into_profile()?))
        }
        None => Ok(None),
    }
}

impl ProfileRepository for SqliteTx {
    async fn insert_profile(&mut self, profile: &Profile) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO profiles (id, name, email, phone, avatar_url, title, location, linkedin_url, github_url, rating, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(profile.id.to_string())
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(&profile.title)
        .bind(&profile.location)
        .bind(&profile.linkedin_url)
        .bind(&profile.github_url)
        .bind(profile.rating)
        .bind(format_datetime(&profile.created_at))
        .bind(format_datetime(&profile.updated_at))
        .execute(&mut *self.tx)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_profile(&mut self, id: &ProfileId) -> Result<Option<Profile>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        decode(row)
    }

    async fn find_profile_by_email(
        &mut self,
        email: &str,
    ) -> Result<Option<Profile>, RepositoryError> {
        // The email column collates NOCASE.
        let row = sqlx::query("SELECT * FROM profiles WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        decode(row)
    }

    async fn update_profile(&mut self, profile: &Profile) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE profiles SET name = ?, email = ?, phone = ?, avatar_url = ?, title = ?, location = ?,
             linkedin_url = ?, github_url = ?, rating = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&profile.name)
        .bind(&profile.email)
        .bind(&profile.phone)
        .bind(&profile.avatar_url)
        .bind(&profile.title)
        .bind(&profile.location)
        .bind(&profile.linkedin_url)
        .bind(&profile.github_url)
        .bind(profile.rating)
        .bind(format_datetime(&profile.updated_at))
        .bind(profile.id.to_string())
        .execute(&mut *self.tx)
        .await
        .map_err(write_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_profile(&mut self, id: &ProfileId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM profiles WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }
}
