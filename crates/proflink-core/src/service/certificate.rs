//! Certificate Registry: certificates held by profiles.

use chrono::{Datelike, NaiveDate, Utc};
use proflink_types::certificate::{Certificate, NewCertificate};
use proflink_types::error::IntegrityError;
use proflink_types::ids::{CertificateId, ProfileId};

use crate::repository::certificate::CertificateRepository;
use crate::repository::profile::ProfileRepository;
use crate::service::identity::IdentityStore;

#[derive(Debug, Clone, Copy, Default)]
pub struct CertificateRegistry;

impl CertificateRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Record a certificate for a profile.
    ///
    /// `issue_date` is compared against today's date in UTC; a certificate
    /// issued today is accepted.
    pub async fn add<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
        request: NewCertificate,
    ) -> Result<Certificate, IntegrityError>
    where
        T: ProfileRepository + CertificateRepository,
    {
        let today = Utc::now().date_naive();
        validate(&request, today)?;
        IdentityStore.ensure_exists(tx, profile_id).await?;

        let certificate = Certificate {
            id: CertificateId::new(),
            profile_id: *profile_id,
            name: request.name.trim().to_string(),
            issuer: request.issuer.trim().to_string(),
            issue_date: request.issue_date,
            url: request.url,
            created_at: Utc::now(),
        };
        tx.insert_certificate(&certificate).await?;
        tracing::info!(
            certificate_id = %certificate.id,
            %profile_id,
            issuer = %certificate.issuer,
            "certificate added"
        );
        Ok(certificate)
    }

    pub async fn get<T: CertificateRepository>(
        &self,
        tx: &mut T,
        id: &CertificateId,
    ) -> Result<Certificate, IntegrityError> {
        tx.find_certificate(id)
            .await?
            .ok_or_else(|| IntegrityError::not_found("certificate", id))
    }

    /// Fails with `NotFound` if the certificate is gone, including when it
    /// was already removed by a profile cascade.
    pub async fn remove<T: CertificateRepository>(
        &self,
        tx: &mut T,
        id: &CertificateId,
    ) -> Result<(), IntegrityError> {
        if !tx.delete_certificate(id).await? {
            return Err(IntegrityError::not_found("certificate", id));
        }
        tracing::info!(certificate_id = %id, "certificate removed");
        Ok(())
    }

    pub async fn list_for_profile<T>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<Vec<Certificate>, IntegrityError>
    where
        T: ProfileRepository + CertificateRepository,
    {
        IdentityStore.ensure_exists(tx, profile_id).await?;
        Ok(tx.list_certificates(profile_id).await?)
    }

    pub async fn remove_all<T: CertificateRepository>(
        &self,
        tx: &mut T,
        profile_id: &ProfileId,
    ) -> Result<u64, IntegrityError> {
        Ok(tx.delete_certificates_for_profile(profile_id).await?)
    }
}

fn validate(request: &NewCertificate, today: NaiveDate) -> Result<(), IntegrityError> {
    if request.name.trim().is_empty() {
        return Err(IntegrityError::InvalidArgument(
            "certificate name cannot be empty".to_string(),
        ));
    }
    if request.issuer.trim().is_empty() {
        return Err(IntegrityError::InvalidArgument(
            "certificate issuer cannot be empty".to_string(),
        ));
    }
    // Stored as YYYY-MM-DD text and ordered lexically.
    if request.issue_date.year() < 1 {
        return Err(IntegrityError::InvalidArgument(format!(
            "issue date {} is before year 1",
            request.issue_date
        )));
    }
    if request.issue_date > today {
        return Err(IntegrityError::InvalidArgument(format!(
            "issue date {} is in the future",
            request.issue_date
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::Store;
    use crate::testing::MemoryStore;
    use chrono::Duration;
    use proflink_types::error::ErrorKind;
    use proflink_types::profile::NewProfile;

    #[test]
    fn test_validate_boundary_dates() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let same_day = NewCertificate::new("CKA", "CNCF", today);
        assert!(validate(&same_day, today).is_ok());

        let tomorrow = NewCertificate::new("CKA", "CNCF", today + Duration::days(1));
        let err = validate(&tomorrow, today).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_validate_rejects_years_before_one() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let first = NaiveDate::from_ymd_opt(1, 1, 1).unwrap();
        assert!(validate(&NewCertificate::new("CKA", "CNCF", first), today).is_ok());

        for year in [0, -1, -10_000] {
            let date = NaiveDate::from_ymd_opt(year, 12, 31).unwrap();
            let err = validate(&NewCertificate::new("CKA", "CNCF", date), today).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn test_validate_requires_name_and_issuer() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert!(validate(&NewCertificate::new(" ", "CNCF", today), today).is_err());
        assert!(validate(&NewCertificate::new("CKA", "", today), today).is_err());
    }

    #[tokio::test]
    async fn test_add_list_remove() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let profile = IdentityStore
            .create(&mut tx, NewProfile::new("Ada", "a@x.com"))
            .await
            .unwrap();
        let today = Utc::now().date_naive();

        let older = CertificateRegistry
            .add(
                &mut tx,
                &profile.id,
                NewCertificate::new("AWS SA", "Amazon", today - Duration::days(400)),
            )
            .await
            .unwrap();
        let newer = CertificateRegistry
            .add(&mut tx, &profile.id, NewCertificate::new("CKA", "CNCF", today))
            .await
            .unwrap();

        let listed = CertificateRegistry
            .list_for_profile(&mut tx, &profile.id)
            .await
            .unwrap();
        let ids: Vec<_> = listed.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        CertificateRegistry.remove(&mut tx, &older.id).await.unwrap();
        let err = CertificateRegistry
            .remove(&mut tx, &older.id)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_add_future_date_rejected() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let profile = IdentityStore
            .create(&mut tx, NewProfile::new("Ada", "a@x.com"))
            .await
            .unwrap();
        let tomorrow = Utc::now().date_naive() + Duration::days(1);
        let err = CertificateRegistry
            .add(&mut tx, &profile.id, NewCertificate::new("CKA", "CNCF", tomorrow))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[tokio::test]
    async fn test_add_for_unknown_profile() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let today = Utc::now().date_naive();
        let err = CertificateRegistry
            .add(&mut tx, &ProfileId::new(), NewCertificate::new("CKA", "CNCF", today))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
