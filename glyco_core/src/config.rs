//! Configuration file support for Glyco.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/glyco/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub readings: ReadingsConfig,

    #[serde(default)]
    pub report: ReportConfig,
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

/// Defaults applied to ingested readings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReadingsConfig {
    #[serde(default = "default_unit")]
    pub default_unit: String,

    #[serde(default = "default_context")]
    pub default_context: String,
}

impl Default for ReadingsConfig {
    fn default() -> Self {
        Self {
            default_unit: default_unit(),
            default_context: default_context(),
        }
    }
}

/// Report export configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ReportConfig {
    #[serde(default = "default_report_title")]
    pub title: String,

    #[serde(default = "default_report_footer")]
    pub footer: String,

    #[serde(default = "default_report_filename")]
    pub filename: String,

    /// Rasterize the trend and per-context charts into the report
    #[serde(default = "default_charts")]
    pub charts: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_report_title(),
            footer: default_report_footer(),
            filename: default_report_filename(),
            charts: default_charts(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("glyco")
}

fn default_unit() -> String {
    crate::DEFAULT_UNIT.into()
}

fn default_context() -> String {
    crate::record::DEFAULT_CONTEXT.into()
}

fn default_report_title() -> String {
    "Health Diary Report".into()
}

fn default_report_footer() -> String {
    "Generated by Health Diary \u{2013} Secure Digital Health Tracker".into()
}

fn default_report_filename() -> String {
    crate::report::REPORT_FILENAME.into()
}

fn default_charts() -> bool {
    true
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

    /// Reject settings the report and ingestion paths cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.readings.default_unit.trim().is_empty() {
            return Err(Error::Config("readings.default_unit must not be empty".into()));
        }
        if self.report.filename.trim().is_empty() {
            return Err(Error::Config("report.filename must not be empty".into()));
        }
        Ok(())
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("glyco").join("config.toml")
    }

    /// Serialize as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml()?)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
