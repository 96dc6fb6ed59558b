//! SQLite certificate repository implementation.

use proflink_core::repository::certificate::CertificateRepository;
use proflink_types::certificate::Certificate;
use proflink_types::error::RepositoryError;
use proflink_types::ids::{CertificateId, ProfileId};
use sqlx::Row;

use super::store::{
    format_datetime, parse_date, parse_datetime, parse_id, query_error, write_error, SqliteTx,
};

struct CertificateRow {
    id: String,
    user_id: String,
    name: String,
    issuer: String,
    issue_date: String,
    url: Option<String>,
    created_at: String,
}

impl CertificateRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            issuer: row.try_get("issuer")?,
            issue_date: row.try_get("issue_date")?,
            url: row.try_get("url")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_certificate(self) -> Result<Certificate, RepositoryError> {
        Ok(Certificate {
            id: parse_id(&self.id, "certificate")?,
            profile_id: parse_id(&self.user_id, "profile")?,
            name: self.name,
            issuer: self.issuer,
            issue_date: parse_date(&self.issue_date)?,
            url: self.url,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Certificate, RepositoryError> {
    CertificateRow::from_row(row)
        .map_err(query_error)?
        .into_certificate()
}

impl CertificateRepository for SqliteTx {
    async fn insert_certificate(&mut self, certificate: &Certificate) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO certificates (id, user_id, name, issuer, issue_date, url, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(certificate.id.to_string())
        .bind(certificate.profile_id.to_string())
        .bind(&certificate.name)
        .bind(&certificate.issuer)
        .bind(certificate.issue_date.to_string())
        .bind(&certificate.url)
        .bind(format_datetime(&certificate.created_at))
        .execute(&mut *self.tx)
        .await
        .map_err(write_error)?;
        Ok(())
    }

    async fn find_certificate(
        &mut self,
        id: &CertificateId,
    ) -> Result<Option<Certificate>, RepositoryError> {
        let row = sqlx::query("SELECT * FROM certificates WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(query_error)?;
        row.as_ref().map(decode).transpose()
    }

    async fn delete_certificate(&mut self, id: &CertificateId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM certificates WHERE id = ?")
            .bind(id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_certificates(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<Vec<Certificate>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT * FROM certificates WHERE user_id = ? ORDER BY issue_date DESC, id ASC",
        )
        .bind(profile_id.to_string())
        .fetch_all(&mut *self.tx)
        .await
        .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn delete_certificates_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM certificates WHERE user_id = ?")
            .bind(profile_id.to_string())
            .execute(&mut *self.tx)
            .await
            .map_err(query_error)?;
        Ok(result.rows_affected())
    }
}
