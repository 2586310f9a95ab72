//! Unit tests for configuration loading and validation.

use tempfile::tempdir;
use zwofit::metrics::ZoneStrategy;
use zwofit::storage::config::{
    load_config, load_config_or_default, save_config, AppConfig, ConfigError,
};
use zwofit::storage::{ConversionConfig, PowerEncoding};

#[test]
fn test_save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("nested").join("config.toml");

    let mut config = AppConfig::default();
    config.conversion.reference_power = 275.0;
    config.conversion.use_cycling_power = true;
    config.conversion.power_encoding = PowerEncoding::ThresholdRelative;
    config.conversion.forced_warmup_fraction = Some(0.55);
    config.output.overwrite = false;

    save_config(&config, &path).unwrap();
    let loaded = load_config(Some(&path)).unwrap();

    assert_eq!(loaded, config);
}

#[test]
fn test_load_explicit_missing_file_fails() {
    let dir = tempdir().unwrap();
    let result = load_config(Some(&dir.path().join("missing.toml")));
    assert!(matches!(result, Err(ConfigError::IoError(_))));
}

#[test]
fn test_init_target_may_not_exist_yet() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("new.toml");

    let mut config = load_config_or_default(&path).unwrap();
    assert_eq!(config, AppConfig::default());

    config.conversion.reference_power = 310.0;
    save_config(&config, &path).unwrap();
    assert_eq!(load_config_or_default(&path).unwrap(), config);
}

#[test]
fn test_init_target_that_exists_must_parse() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("broken.toml");
    std::fs::write(&path, "[conversion\n").unwrap();

    let result = load_config_or_default(&path);
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_load_rejects_unknown_enum_value() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[conversion]\npower_encoding = \"kilowatts\"\n").unwrap();

    let result = load_config(Some(&path));
    assert!(matches!(result, Err(ConfigError::ParseError(_))));
}

#[test]
fn test_defaults() {
    let config = ConversionConfig::default();
    assert_eq!(config.power_buffer_fraction, 0.05);
    assert_eq!(config.power_encoding, PowerEncoding::Absolute);
    assert_eq!(config.zone_strategy, ZoneStrategy::NearestTable);
    assert!(!config.use_cycling_power);
    assert!(!config.warmup_open_ended);
    assert!(!config.cooldown_open_ended);
    assert_eq!(config.forced_warmup_fraction, None);
}

#[test]
fn test_non_finite_values_are_rejected() {
    let config = ConversionConfig {
        reference_power: f64::NAN,
        ..Default::default()
    };
    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidReferencePower(_))
    ));

    let config = ConversionConfig {
        power_buffer_fraction: f64::INFINITY,
        ..Default::default()
    };
    assert!(matches!(config.validate(), Err(ConfigError::InvalidBuffer(_))));
}
