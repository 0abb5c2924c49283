//! Configuration loading for the vaultscope TUI.
//!
//! All fields are required unless explicitly marked optional. No defaults.

use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TuiConfig {
    /// Management-plane base URL, e.g. `https://management.azure.com`.
    pub management_endpoint: String,
    /// DNS suffix appended to vault names for data-plane calls,
    /// e.g. `vault.azure.net`.
    pub vault_dns_suffix: String,
    pub token_scope_management: String,
    pub token_scope_vault: String,
    pub request_timeout_ms: u64,
    /// Concurrency cap for bulk cache warming.
    pub bulk_concurrency: usize,
    /// Optional override of the default cache TTL, in seconds.
    pub cache_ttl_secs: Option<u64>,
    pub persistence_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing configuration file path (use --config or VAULTSCOPE_CONFIG)")]
    MissingConfigPath,
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl TuiConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = config_path_from_args().or_else(config_path_from_env);
        let path = path.ok_or(ConfigError::MissingConfigPath)?;
        let config = Self::from_path(&path)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: TuiConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.management_endpoint.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "management_endpoint",
                reason: "must not be empty".to_string(),
            });
        }
        if self.vault_dns_suffix.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "vault_dns_suffix",
                reason: "must not be empty".to_string(),
            });
        }
        if self.token_scope_management.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "token_scope_management",
                reason: "must not be empty".to_string(),
            });
        }
        if self.token_scope_vault.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "token_scope_vault",
                reason: "must not be empty".to_string(),
            });
        }
        if self.request_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "request_timeout_ms",
                reason: "must be > 0".to_string(),
            });
        }
        if self.bulk_concurrency == 0 {
            return Err(ConfigError::InvalidValue {
                field: "bulk_concurrency",
                reason: "must be > 0".to_string(),
            });
        }
        if self.cache_ttl_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "cache_ttl_secs",
                reason: "must be > 0 when set".to_string(),
            });
        }
        if self.persistence_path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "persistence_path",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn config_path_from_env() -> Option<PathBuf> {
    std::env::var("VAULTSCOPE_CONFIG").ok().map(PathBuf::from)
}

fn config_path_from_args() -> Option<PathBuf> {
    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--config" {
            return args.next().map(PathBuf::from);
        }
    }
    None
}

// ============================================================================
// TESTS
// ============================================================================
