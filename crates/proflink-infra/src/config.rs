//! Configuration loader for ProfLink.
//!
//! Reads `config.toml` from the data directory (`~/.proflink/` in production)
//! and deserializes it into [`IntegrityConfig`]. Falls back to defaults when
//! the file is missing, malformed or inconsistent.

use std::path::{Path, PathBuf};

use proflink_types::config::IntegrityConfig;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `PROFLINK_DATA_DIR` environment variable
/// 2. `~/.proflink`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("PROFLINK_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".proflink");
    }

    PathBuf::from(".proflink")
}

/// Load configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`IntegrityConfig::default()`].
/// - If the file fails to parse, logs a warning and returns the default.
/// - If the proficiency bounds are inverted, logs a warning and keeps the
///   default bounds; other fields are kept.
pub async fn load_config(data_dir: &Path) -> IntegrityConfig {
    let config_path = data_dir.join("config.toml");

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return IntegrityConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return IntegrityConfig::default();
        }
    };

    let mut config = match toml::from_str::<IntegrityConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            return IntegrityConfig::default();
        }
    };

    if !config.proficiency_bounds().is_valid() {
        let defaults = IntegrityConfig::default();
        tracing::warn!(
            min = config.proficiency_min,
            max = config.proficiency_max,
            "Inverted proficiency bounds in {}, using [{}, {}]",
            config_path.display(),
            defaults.proficiency_min,
            defaults.proficiency_max
        );
        config.proficiency_min = defaults.proficiency_min;
        config.proficiency_max = defaults.proficiency_max;
    }

    config
}
