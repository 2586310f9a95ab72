//! Configuration storage.

pub mod config;

pub use config::{
    load_config, load_config_or_default, save_config, AppConfig, ConfigError, ConversionConfig,
    OutputSettings, PowerEncoding,
};
