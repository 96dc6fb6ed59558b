//! Configuration types for the integrity layer.
//!
//! `IntegrityConfig` represents the `config.toml` that controls validation
//! bounds and store timeouts.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration. All fields have sensible defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntegrityConfig {
    /// Lowest accepted proficiency level (inclusive).
    #[serde(default = "default_proficiency_min")]
    pub proficiency_min: i32,

    /// Highest accepted proficiency level (inclusive).
    #[serde(default = "default_proficiency_max")]
    pub proficiency_max: i32,

    /// Timeout the service layer should pass to facade calls when it has no
    /// deadline of its own.
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,

    /// Database URL override. Falls back to the data-directory default.
    #[serde(default)]
    pub database_url: Option<String>,
}

fn default_proficiency_min() -> i32 {
    1
}

fn default_proficiency_max() -> i32 {
    5
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for IntegrityConfig {
    fn default() -> Self {
        Self {
            proficiency_min: default_proficiency_min(),
            proficiency_max: default_proficiency_max(),
            default_timeout_ms: default_timeout_ms(),
            database_url: None,
        }
    }
}

impl IntegrityConfig {
    pub fn proficiency_bounds(&self) -> ProficiencyBounds {
        ProficiencyBounds {
            min: self.proficiency_min,
            max: self.proficiency_max,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

/// Inclusive range of accepted proficiency levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProficiencyBounds {
    pub min: i32,
    pub max: i32,
}

impl ProficiencyBounds {
    pub fn contains(&self, level: i32) -> bool {
        (self.min..=self.max).contains(&level)
    }

    pub fn is_valid(&self) -> bool {
        self.min <= self.max
    }
}

impl Default for ProficiencyBounds {
    fn default() -> Self {
        IntegrityConfig::default().proficiency_bounds()
    }
}
