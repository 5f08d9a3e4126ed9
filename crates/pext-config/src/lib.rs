//! Configuration management for pext
//!
//! This module handles loading, validation, and management of
//! pext configuration from YAML files.

pub mod error;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use error::ConfigError;

// ==================== Configuration Types ====================

/// Storage layout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the data directory
    #[serde(default = "default_data_path")]
    pub path: PathBuf,
    /// Subdirectory holding the per-user shard files
    #[serde(default = "default_users_dir")]
    pub users_dir: String,
    /// User registry document file name
    #[serde(default = "default_registry_file")]
    pub registry_file: String,
    /// Card registry document file name
    #[serde(default = "default_cards_file")]
    pub cards_file: String,
    /// Bank catalog document file name
    #[serde(default = "default_banks_file")]
    pub banks_file: String,
}

fn default_data_path() -> PathBuf {
    PathBuf::from("./data")
}

fn default_users_dir() -> String {
    "users".to_string()
}

fn default_registry_file() -> String {
    "userData.json".to_string()
}

fn default_cards_file() -> String {
    "cardsData.json".to_string()
}

fn default_banks_file() -> String {
    "banks.json".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_data_path(),
            users_dir: default_users_dir(),
            registry_file: default_registry_file(),
            cards_file: default_cards_file(),
            banks_file: default_banks_file(),
        }
    }
}

/// Seed import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedConfig {
    /// Run the seed importer at startup
    #[serde(default = "default_true")]
    pub enable: bool,
    /// Bulk seed dataset file name (relative to storage.path)
    #[serde(default = "default_seed_file")]
    pub file: String,
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            enable: true,
            file: default_seed_file(),
        }
    }
}

fn default_seed_file() -> String {
    "demoData.json".to_string()
}

fn default_true() -> bool {
    true
}

/// Record defaults applied at creation time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    /// Currency assigned to users created without one
    #[serde(default = "default_currency")]
    pub currency: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
        }
    }
}

fn default_currency() -> String {
    "USD".to_string()
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Storage layout settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Seed import settings
    #[serde(default)]
    pub seed: SeedConfig,
    /// Record default settings
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a YAML file
    pub fn load(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path)
            .map_err(|_| ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            })?;

        let config: Config = serde_yaml::from_str(&content)
            .map_err(|_| ConfigError::InvalidYaml)?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.path.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "storage.path".to_string(),
                reason: "Data directory path must not be empty".to_string(),
            });
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::InvalidValue {
                    field: "logging.level".to_string(),
                    reason: format!("Unknown log level: {}", other),
                });
            }
        }

        Ok(())
    }

    /// Generate a default configuration file
    pub fn generate_default() -> &'static str {
        include_str!("../templates/default_config.yaml")
    }

    /// Directory holding the per-user shard files
    pub fn users_dir(&self) -> PathBuf {
        self.storage.path.join(&self.storage.users_dir)
    }

    /// Full path to the user registry document
    pub fn registry_path(&self) -> PathBuf {
        self.storage.path.join(&self.storage.registry_file)
    }

    /// Full path to the card registry document
    pub fn cards_path(&self) -> PathBuf {
        self.storage.path.join(&self.storage.cards_file)
    }

    /// Full path to the bank catalog document
    pub fn banks_path(&self) -> PathBuf {
        self.storage.path.join(&self.storage.banks_file)
    }

    /// Full path to the bulk seed dataset
    pub fn seed_path(&self) -> PathBuf {
        self.storage.path.join(&self.seed.file)
    }
}
