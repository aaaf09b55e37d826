//! Configuration file support for Mint.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/mint/config.toml`.

use crate::history::{VALID_CYCLE_LENGTHS, VALID_FLOW_LENGTHS};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub cycle: CycleConfig,

    #[serde(default)]
    pub ledger: LedgerConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Seed values for a brand-new cycle history
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CycleConfig {
    #[serde(default = "default_cycle_length")]
    pub default_cycle_length: i64,

    #[serde(default = "default_flow_length")]
    pub default_flow_length: i64,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            default_cycle_length: default_cycle_length(),
            default_flow_length: default_flow_length(),
        }
    }
}

/// Ledger display configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_currency")]
    pub currency: String,

    #[serde(default = "default_top_categories")]
    pub top_categories: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            currency: default_currency(),
            top_categories: default_top_categories(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("mint")
}

fn default_cycle_length() -> i64 {
    crate::history::DEFAULT_CYCLE_LENGTH
}

fn default_flow_length() -> i64 {
    crate::history::DEFAULT_FLOW_LENGTH
}

fn default_currency() -> String {
    "¥".into()
}

fn default_top_categories() -> usize {
    4
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

    /// Check seed values against the plausibility ranges used for averaging
    pub fn validate(&self) -> Result<()> {
        if !VALID_CYCLE_LENGTHS.contains(&self.cycle.default_cycle_length) {
            return Err(Error::Config(format!(
                "default_cycle_length {} outside {:?}",
                self.cycle.default_cycle_length, VALID_CYCLE_LENGTHS
            )));
        }
        if !VALID_FLOW_LENGTHS.contains(&self.cycle.default_flow_length) {
            return Err(Error::Config(format!(
                "default_flow_length {} outside {:?}",
                self.cycle.default_flow_length, VALID_FLOW_LENGTHS
            )));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("mint").join("config.toml")
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
