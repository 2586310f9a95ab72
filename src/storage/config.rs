//! Conversion settings and application configuration.
//!
//! Settings live in a TOML file under the platform config directory. Every
//! conversion receives an immutable [`ConversionConfig`]; nothing is global.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::metrics::zones::ZoneStrategy;

/// How watt targets are written to the device file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerEncoding {
    /// Watts offset by 1000 (device reads values >= 1000 as absolute watts)
    #[default]
    Absolute,
    /// Percent of threshold scaled to 0-1000
    ThresholdRelative,
}

impl std::fmt::Display for PowerEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerEncoding::Absolute => write!(f, "absolute"),
            PowerEncoding::ThresholdRelative => write!(f, "threshold-relative"),
        }
    }
}

/// Settings for one conversion run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversionConfig {
    /// Reference (threshold) power in watts
    pub reference_power: f64,
    /// Emit power targets for cycling workouts instead of heart-rate zones
    pub use_cycling_power: bool,
    /// Symmetric tolerance around power targets (0.05 = +/-5%)
    pub power_buffer_fraction: f64,
    pub power_encoding: PowerEncoding,
    pub zone_strategy: ZoneStrategy,
    /// Warmup advances on LAP press instead of a timer
    pub warmup_open_ended: bool,
    /// Cooldown advances on LAP press instead of a timer
    pub cooldown_open_ended: bool,
    /// Replace both warmup power fractions with this value
    pub forced_warmup_fraction: Option<f64>,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            reference_power: 200.0,
            use_cycling_power: false,
            power_buffer_fraction: 0.05,
            power_encoding: PowerEncoding::Absolute,
            zone_strategy: ZoneStrategy::NearestTable,
            warmup_open_ended: false,
            cooldown_open_ended: false,
            forced_warmup_fraction: None,
        }
    }
}

impl ConversionConfig {
    /// Check the values before any document is processed.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference_power.is_finite() || self.reference_power <= 0.0 {
            return Err(ConfigError::InvalidReferencePower(self.reference_power));
        }
        if !self.power_buffer_fraction.is_finite() || self.power_buffer_fraction < 0.0 {
            return Err(ConfigError::InvalidBuffer(self.power_buffer_fraction));
        }
        if let Some(fraction) = self.forced_warmup_fraction {
            if !fraction.is_finite() || fraction <= 0.0 {
                return Err(ConfigError::InvalidForcedWarmup(fraction));
            }
        }
        Ok(())
    }
}

/// Output file settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Directory used when a command gives none
    pub directory: PathBuf,
    /// Replace existing files
    pub overwrite: bool,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            overwrite: true,
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub conversion: ConversionConfig,
    pub output: OutputSettings,
}

/// Get the application config directory.
pub fn get_config_dir() -> PathBuf {
    directories::ProjectDirs::from("com", "zwofit", "zwofit")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Get the default configuration file path.
pub fn get_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Load configuration.
///
/// An explicit `path` must exist. Without one, the default location is used
/// and a missing file yields the defaults.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let path = match path {
        Some(path) => path.to_path_buf(),
        None => {
            let path = get_config_path();
            if !path.exists() {
                tracing::debug!(path = %path.display(), "No config file, using defaults");
                return Ok(AppConfig::default());
            }
            path
        }
    };

    let content = std::fs::read_to_string(&path)
        .map_err(|e| ConfigError::IoError(format!("{}: {}", path.display(), e)))?;

    let config: AppConfig =
        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?;

    tracing::debug!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Load configuration from `path`, or the defaults when the file does not
/// exist yet. Used when creating a new config file.
pub fn load_config_or_default(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "Config file does not exist yet, using defaults");
        return Ok(AppConfig::default());
    }
    load_config(Some(path))
}

/// Save configuration to `path`, creating parent directories.
pub fn save_config(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
    }

    let content =
        toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError(e.to_string()))?;

    std::fs::write(path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

    Ok(())
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Reference power must be greater than 0 W, got {0}")]
    InvalidReferencePower(f64),

    #[error("Power buffer must be 0 or more, got {0}")]
    InvalidBuffer(f64),

    #[error("Forced warmup fraction must be greater than 0, got {0}")]
    InvalidForcedWarmup(f64),
}
