//! CLI command implementations.

pub mod chat;
pub mod init;
pub mod projects;
pub mod submissions;

use anyhow::{Context, Result};
use std::path::Path;

use crate::adapters::sqlite::{initialize_database, SqliteSubmissionRepository};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;
use crate::services::SubmissionService;
use std::sync::Arc;

/// Load configuration from an explicit file or the project-local hierarchy.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    }
}

/// Open the configured database and wrap it in a submission service.
pub async fn submission_service(
    config: &Config,
) -> Result<SubmissionService<SqliteSubmissionRepository>> {
    let pool = initialize_database(&config.database)
        .await
        .context("Failed to open database. Run 'qa-intake init' first.")?;
    Ok(SubmissionService::new(Arc::new(
        SqliteSubmissionRepository::new(pool),
    )))
}
