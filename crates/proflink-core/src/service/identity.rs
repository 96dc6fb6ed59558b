//! Identity Store: profile records.
//!
//! Source of truth for who exists in the network. Email uniqueness is
//! checked here first and enforced again by the store's unique index.

use chrono::Utc;
use proflink_types::error::IntegrityError;
use proflink_types::ids::ProfileId;
use proflink_types::profile::{NewProfile, Profile, ProfilePatch, normalize_email};

use crate::repository::profile::ProfileRepository;

/// Profile lifecycle operations. Stateless; every call runs on the caller's
/// transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStore;

impl IdentityStore {
    pub fn new() -> Self {
        Self
    }

    /// Create a profile.
    ///
    /// Fails with `Conflict` if the id or email is already taken and with
    /// `InvalidArgument` for an empty name, a malformed email, or a negative
    /// rating.
    pub async fn create<T: ProfileRepository>(
        &self,
        tx: &mut T,
        request: NewProfile,
    ) -> Result<Profile, IntegrityError> {
        let name = validate_name(&request.name)?;
        let email = validate_email(&request.email)?;
        let rating = request.rating.unwrap_or(0.0);
        validate_rating(rating)?;

        if let Some(existing) = tx.find_profile_by_email(&email).await? {
            return Err(IntegrityError::Conflict(format!(
                "email '{email}' already belongs to profile {}",
                existing.id
            )));
        }

        let id = request.id.unwrap_or_default();
        if tx.find_profile(&id).await?.is_some() {
            return Err(IntegrityError::Conflict(format!("profile {id} already exists")));
        }

        let now = Utc::now();
        let profile = Profile {
            id,
            name,
            email,
            phone: request.phone,
            avatar_url: request.avatar_url,
            title: request.title,
            location: request.location,
            linkedin_url: request.linkedin_url,
            github_url: request.github_url,
            rating,
            created_at: now,
            updated_at: now,
        };

        tx.insert_profile(&profile).await?;
        tracing::info!(profile_id = %profile.id, "profile created");
        Ok(profile)
    }

    pub async fn get<T: ProfileRepository>(
        &self,
        tx: &mut T,
        id: &ProfileId,
    ) -> Result<Profile, IntegrityError> {
        tx.find_profile(id)
            .await?
            .ok_or_else(|| IntegrityError::not_found("profile", id))
    }

    pub async fn get_by_email<T: ProfileRepository>(
        &self,
        tx: &mut T,
        email: &str,
    ) -> Result<Profile, IntegrityError> {
        let email = normalize_email(email);
        tx.find_profile_by_email(&email)
            .await?
            .ok_or_else(|| IntegrityError::not_found("profile", &email))
    }

    /// Fails with `NotFound` if `id` is unknown.
    pub async fn ensure_exists<T: ProfileRepository>(
        &self,
        tx: &mut T,
        id: &ProfileId,
    ) -> Result<(), IntegrityError> {
        self.get(tx, id).await.map(|_| ())
    }

    /// Apply a partial update. `updated_at` is always refreshed, even for an
    /// empty patch; `created_at` never changes.
    pub async fn update<T: ProfileRepository>(
        &self,
        tx: &mut T,
        id: &ProfileId,
        mut patch: ProfilePatch,
    ) -> Result<Profile, IntegrityError> {
        let mut profile = self.get(tx, id).await?;

        if let Some(name) = patch.name.take() {
            patch.name = Some(validate_name(&name)?);
        }
        if let Some(email) = patch.email.take() {
            let email = validate_email(&email)?;
            if email != profile.email {
                if let Some(owner) = tx.find_profile_by_email(&email).await? {
                    if owner.id != profile.id {
                        return Err(IntegrityError::Conflict(format!(
                            "email '{email}' already belongs to profile {}",
                            owner.id
                        )));
                    }
                }
            }
            patch.email = Some(email);
        }
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
        }

        patch.apply_to(&mut profile);
        profile.updated_at = Utc::now().max(profile.created_at);

        tx.update_profile(&profile)
            .await
            .map_err(|e| e.missing("profile", id))?;
        tracing::info!(profile_id = %id, "profile updated");
        Ok(profile)
    }

    /// Delete the profile row only. Dependent rows are removed by the
    /// facade's cascade before this is called.
    pub async fn delete<T: ProfileRepository>(
        &self,
        tx: &mut T,
        id: &ProfileId,
    ) -> Result<(), IntegrityError> {
        if !tx.delete_profile(id).await? {
            return Err(IntegrityError::not_found("profile", id));
        }
        tracing::info!(profile_id = %id, "profile deleted");
        Ok(())
    }
}

fn validate_name(name: &str) -> Result<String, IntegrityError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(IntegrityError::InvalidArgument(
            "profile name cannot be empty".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

fn validate_email(email: &str) -> Result<String, IntegrityError> {
    let email = normalize_email(email);
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => Ok(email),
        _ => Err(IntegrityError::InvalidArgument(format!(
            "'{email}' is not a valid email address"
        ))),
    }
}

fn validate_rating(rating: f64) -> Result<(), IntegrityError> {
    if !rating.is_finite() || rating < 0.0 {
        return Err(IntegrityError::InvalidArgument(format!(
            "rating must be a non-negative number, got {rating}"
        )));
    }
    Ok(())
}
