//! Infrastructure layer for ProfLink.
//!
//! Contains the SQLite implementation of the repository traits defined in
//! `proflink-core` and the configuration loader.

pub mod config;
pub mod sqlite;

use anyhow::Context;
use proflink_core::IntegrityFacade;
use proflink_types::config::IntegrityConfig;

use crate::sqlite::pool::{default_database_url, DatabasePool};
use crate::sqlite::store::SqliteStore;

/// Open the configured database (running migrations) and build a facade on it.
///
/// Without a `database_url` in the config, the database lives in the data
/// directory, which is created if needed.
pub async fn open(config: IntegrityConfig) -> anyhow::Result<IntegrityFacade<SqliteStore>> {
    let url = match config.database_url.clone() {
        Some(url) => url,
        None => {
            let data_dir = config::resolve_data_dir();
            tokio::fs::create_dir_all(&data_dir)
                .await
                .with_context(|| format!("creating data directory {}", data_dir.display()))?;
            default_database_url()
        }
    };

    let pool = DatabasePool::new(&url)
        .await
        .with_context(|| format!("opening database {url}"))?;
    tracing::info!(%url, "proflink store opened");
    Ok(IntegrityFacade::new(SqliteStore::new(pool), config))
}
