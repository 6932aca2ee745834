//! Client configuration.
//!
//! Sources are merged from lowest to highest priority:
//! 1. built-in defaults
//! 2. `testimonios.toml` in the working directory, or an explicit file
//! 3. environment variables prefixed `TESTIMONIOS_` with `__` between levels,
//!    e.g. `TESTIMONIOS_API__BASE_URL=http://localhost:3000`

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://apptestimonial.vercel.app";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const CONFIG_FILE_NAME: &str = "testimonios";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(String),

    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::Load(err.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub roles: RolesConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Order in which role-scoped collections are probed for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProbeOrder {
    /// visitor, editor, admin
    #[default]
    VisitorFirst,
    /// admin, editor, visitor
    AdminFirst,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RolesConfig {
    #[serde(default)]
    pub probe_order: ProbeOrder,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StorageConfig {
    /// Directory for the persisted session. `None` keeps it in memory.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl ClientConfig {
    /// Defaults with a different base URL; mostly for tests and local runs.
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            api: ApiConfig {
                base_url: base_url.into(),
                ..ApiConfig::default()
            },
            ..Self::default()
        }
    }
}

pub fn load_config() -> Result<ClientConfig, ConfigError> {
    load_config_from_path(None)
}

/// Load configuration, reading `config_path` instead of the default file
/// when given. An explicit file must exist.
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<ClientConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("api.base_url", DEFAULT_BASE_URL)?
        .set_default("api.timeout_secs", DEFAULT_TIMEOUT_SECS)?
        .set_default("roles.probe_order", "visitor-first")?;

    builder = match config_path {
        Some(path) => builder.add_source(File::from(path).required(true)),
        None => builder.add_source(File::with_name(CONFIG_FILE_NAME).required(false)),
    };

    builder = builder.add_source(
        Environment::with_prefix("TESTIMONIOS")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config: ClientConfig = builder
        .build()?
        .try_deserialize()
        .map_err(|e| ConfigError::Parse(e.to_string()))?;

    validate_config(&config)?;
    tracing::debug!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        probe_order = ?config.roles.probe_order,
        "configuration loaded"
    );
    Ok(config)
}

pub fn validate_config(config: &ClientConfig) -> Result<(), ConfigError> {
    if config.api.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("api.base_url cannot be empty".to_string()));
    }
    if config.api.timeout_secs == 0 {
        return Err(ConfigError::Validation("api.timeout_secs cannot be 0".to_string()));
    }
    Ok(())
}
