//! Configuration loading from TOML.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs.
//! Every section and key has a default, so an empty file (or a missing
//! section) yields a working local setup.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;

use crate::types::CommandCenterError;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
}

/// Remote analytics service and fetch policy.
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ApiConfig {
    pub base_url: String,
    pub sentiment_path: String,
    pub rotation_grid_path: String,
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Extra attempts after the first for retryable failures.
    pub max_retries: u32,
    /// Base delay for exponential backoff (ms).
    pub base_backoff_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            sentiment_path: "/api/dashboard/sentiment".to_string(),
            rotation_grid_path: "/api/dashboard/rrg".to_string(),
            timeout_secs: 30,
            max_retries: 2,
            base_backoff_ms: 1000,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DashboardConfig {
    pub enabled: bool,
    pub port: u16,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            port: 8080,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Load from a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &str) -> Result<Self> {
        if std::path::Path::new(path).exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), CommandCenterError> {
        if self.api.base_url.trim().is_empty() {
            return Err(CommandCenterError::Config("api.base_url is empty".into()));
        }
        if self.api.timeout_secs == 0 {
            return Err(CommandCenterError::Config("api.timeout_secs must be > 0".into()));
        }
        Ok(())
    }
}
