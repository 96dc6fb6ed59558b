use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CertificateId, ProfileId};

/// A certificate issued to a profile by some external issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Certificate {
    pub id: CertificateId,
    pub profile_id: ProfileId,
    pub name: String,
    pub issuer: String,
    /// Calendar date of issue. Never in the future.
    pub issue_date: NaiveDate,
    /// Verification link, if the issuer provides one.
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request to record a new certificate. The owning profile is passed separately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCertificate {
    pub name: String,
    pub issuer: String,
    pub issue_date: NaiveDate,
    #[serde(default)]
    pub url: Option<String>,
}

impl NewCertificate {
    pub fn new(name: impl Into<String>, issuer: impl Into<String>, issue_date: NaiveDate) -> Self {
        Self {
            name: name.into(),
            issuer: issuer.into(),
            issue_date,
            url: None,
        }
    }
}
