use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use std::path::Path;
use thiserror::Error;

use crate::domain::models::Config;

/// Directory holding project-local configuration and data.
pub const CONFIG_DIR: &str = ".qa-intake";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error(
        "Invalid rate limit: {0} requests per {1} seconds. Requests must be 1-100 and the window 1-3600 seconds"
    )]
    InvalidRateLimit(u32, u64),

    #[error("Extraction base_url cannot be empty")]
    EmptyExtractionUrl,

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid extraction requests_per_second: {0}. Must be between 1 and 1000")]
    InvalidExtractionRate(u32),

    #[error("Invalid input_max_chars: {0}. Must be between 1 and 10000")]
    InvalidInputLimit(usize),

    #[error("Invalid grace_period_days: {0}. Must be at most 28")]
    InvalidGracePeriod(u32),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .qa-intake/config.yaml (project config, created by init)
    /// 3. .qa-intake/local.yaml (local overrides, optional)
    /// 4. Environment variables (`QA_INTAKE_*` prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(format!("{CONFIG_DIR}/config.yaml")))
            .merge(Yaml::file(format!("{CONFIG_DIR}/local.yaml")))
            .merge(Env::prefixed("QA_INTAKE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .merge(Env::prefixed("QA_INTAKE_").split("__"))
            .extract()
            .context(format!(
                "Failed to load config from {}",
                path.as_ref().display()
            ))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.trim().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(
                config.database.max_connections,
            ));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        if !(1..=100).contains(&config.rate_limit.max_requests)
            || !(1..=3600).contains(&config.rate_limit.window_seconds)
        {
            return Err(ConfigError::InvalidRateLimit(
                config.rate_limit.max_requests,
                config.rate_limit.window_seconds,
            ));
        }

        if config.extraction.base_url.trim().is_empty() {
            return Err(ConfigError::EmptyExtractionUrl);
        }
        if config.extraction.initial_backoff_ms >= config.extraction.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.extraction.initial_backoff_ms,
                config.extraction.max_backoff_ms,
            ));
        }
        if !(1..=1000).contains(&config.extraction.requests_per_second) {
            return Err(ConfigError::InvalidExtractionRate(
                config.extraction.requests_per_second,
            ));
        }

        if !(1..=10_000).contains(&config.chat.input_max_chars) {
            return Err(ConfigError::InvalidInputLimit(config.chat.input_max_chars));
        }
        if config.chat.grace_period_days > 28 {
            return Err(ConfigError::InvalidGracePeriod(config.chat.grace_period_days));
        }

        config
            .registry
            .validate()
            .map_err(|e| ConfigError::ValidationFailed(e.to_string()))?;

        Ok(())
    }
}
