//! Certificate repository trait definition.

use proflink_types::certificate::Certificate;
use proflink_types::error::RepositoryError;
use proflink_types::ids::{CertificateId, ProfileId};

/// Persistence for the `certificates` table.
pub trait CertificateRepository: Send {
    fn insert_certificate(
        &mut self,
        certificate: &Certificate,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_certificate(
        &mut self,
        id: &CertificateId,
    ) -> impl std::future::Future<Output = Result<Option<Certificate>, RepositoryError>> + Send;

    /// Returns whether a row was removed.
    fn delete_certificate(
        &mut self,
        id: &CertificateId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;

    /// Certificates of a profile, most recently issued first.
    fn list_certificates(
        &mut self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Vec<Certificate>, RepositoryError>> + Send;

    fn delete_certificates_for_profile(
        &mut self,
        profile_id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<u64, RepositoryError>> + Send;
}
