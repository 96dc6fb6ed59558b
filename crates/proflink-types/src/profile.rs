use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::ids::ProfileId;

/// A user's identity record in the network.
///
/// Profile is the root aggregate: skill assignments, certificates and
/// connections all reference it and are removed together with it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub name: String,
    /// Unique across all profiles (compared case-insensitively).
    pub email: String,
    pub phone: Option<String>,
    pub avatar_url: Option<String>,
    /// Job title or headline ("Staff Engineer").
    pub title: Option<String>,
    pub location: Option<String>,
    pub linkedin_url: Option<String>,
    pub github_url: Option<String>,
    /// Aggregate peer rating. Never negative.
    pub rating: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request to create a profile. Only `name` and `email` are required.
///
/// `id` is normally supplied by the authentication provider; when absent a
/// fresh id is generated. `rating` defaults to zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProfile {
    #[serde(default)]
    pub id: Option<ProfileId>,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin_url: Option<String>,
    #[serde(default)]
    pub github_url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl NewProfile {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            ..Default::default()
        }
    }
}

/// Partial update for a profile.
///
/// Absent fields are left untouched. For nullable columns the outer `Option`
/// says whether the field is being changed and the inner one carries the new
/// value, so `Some(None)` clears the column. `id` and `created_at` cannot be
/// patched; `updated_at` is always refreshed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub avatar_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub title: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub location: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub linkedin_url: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub github_url: Option<Option<String>>,
    #[serde(default)]
    pub rating: Option<f64>,
}

impl ProfilePatch {
    /// Apply the patch onto `profile` in place. Validation is the caller's job.
    pub fn apply_to(self, profile: &mut Profile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(email) = self.email {
            profile.email = email;
        }
        if let Some(phone) = self.phone {
            profile.phone = phone;
        }
        if let Some(avatar_url) = self.avatar_url {
            profile.avatar_url = avatar_url;
        }
        if let Some(title) = self.title {
            profile.title = title;
        }
        if let Some(location) = self.location {
            profile.location = location;
        }
        if let Some(linkedin_url) = self.linkedin_url {
            profile.linkedin_url = linkedin_url;
        }
        if let Some(github_url) = self.github_url {
            profile.github_url = github_url;
        }
        if let Some(rating) = self.rating {
            profile.rating = rating;
        }
    }
}

// An explicit `null` must deserialize to `Some(None)`, not `None`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Canonical form of an email address used for uniqueness checks.
///
/// ```
/// use proflink_types::profile::normalize_email;
///
/// assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
/// ```
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
