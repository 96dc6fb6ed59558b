//! Profile repository trait definition.

use proflink_types::error::RepositoryError;
use proflink_types::ids::ProfileId;
use proflink_types::profile::Profile;

/// Persistence for the `profiles` table.
///
/// Uses native async fn in traits (Rust 2024 edition, no async_trait macro).
pub trait ProfileRepository: Send {
    /// Insert a new profile. Fails with `Conflict` if the id or email is taken.
    fn insert_profile(
        &mut self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    fn find_profile(
        &mut self,
        id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Look up a profile by its (already normalized) email.
    fn find_profile_by_email(
        &mut self,
        email: &str,
    ) -> impl std::future::Future<Output = Result<Option<Profile>, RepositoryError>> + Send;

    /// Overwrite every mutable column. Fails with `NotFound` if no row matched.
    fn update_profile(
        &mut self,
        profile: &Profile,
    ) -> impl std::future::Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete the row. Returns whether a row was removed.
    fn delete_profile(
        &mut self,
        id: &ProfileId,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
