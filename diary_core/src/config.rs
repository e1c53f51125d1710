//! Configuration file support for the diary.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/fitdiary/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "fitdiary";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Which storage engine holds the exercise log
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    /// Append-only JSON lines file
    #[default]
    Jsonl,
    /// Single JSON document rewritten on every change
    Document,
    /// In-process key-value store, nothing is persisted
    Memory,
}

/// Storage configuration
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    #[serde(default)]
    pub engine: EngineKind,

    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            engine: EngineKind::default(),
            data_dir: default_data_dir(),
        }
    }
}

/// Exercise catalog configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
pub struct CatalogConfig {
    /// JSON catalog to use instead of the built-in one
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn home_dir_or_cwd() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| PathBuf::from("."))
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| home_dir_or_cwd().join(".local/share"));
    base.join(APP_DIR)
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| home_dir_or_cwd().join(".config"));
        base.join(APP_DIR).join("config.toml")
    }

    /// Reject settings the storage layer cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.storage.engine != EngineKind::Memory
            && self.storage.data_dir.as_os_str().is_empty()
        {
            return Err(Error::Config(
                "storage.data_dir must be set for file-based engines".into(),
            ));
        }
        if let Some(path) = &self.catalog.path {
            if path.as_os_str().is_empty() {
                return Err(Error::Config("catalog.path is empty".into()));
            }
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
