use hestia::config::{Config, TariffConfig};
use std::fs;

fn valid_config() -> Config {
    let mut cfg = Config::default();
    cfg.api.username = "customer@example.com".to_string();
    cfg.api.password = "secret".to_string();
    cfg.api.customer_nr = "1234567890".to_string();
    cfg
}

#[test]
fn save_and_load_yaml_roundtrip() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");

    let mut cfg = valid_config();
    cfg.api.environment = "development".to_string();
    cfg.polling.interval_mins = 5;
    cfg.tariffs.push(TariffConfig {
        division: "naturalgas".to_string(),
        classification: "default".to_string(),
        electrical_heating: true,
        contract_account_nr: Some("100001".to_string()),
    });
    cfg.logging.file = path.with_extension("log").to_string_lossy().to_string();

    cfg.save_to_file(&path).unwrap();
    let loaded = Config::from_file(&path).unwrap();

    assert_eq!(loaded.api.environment, "development");
    assert_eq!(loaded.api.username, "customer@example.com");
    assert_eq!(loaded.polling.interval_mins, 5);
    assert_eq!(loaded.tariffs.len(), 1);
    assert!(loaded.tariffs[0].electrical_heating);
    assert_eq!(loaded.tariffs[0].contract_account_nr.as_deref(), Some("100001"));
    assert_eq!(loaded.logging.file, cfg.logging.file);
}

#[test]
fn defaults_fill_missing_sections() {
    let tmp_dir = tempfile::tempdir().unwrap();
    let path = tmp_dir.path().join("config.yaml");
    fs::write(
        &path,
        b"api:\n  username: customer@example.com\n  password: secret\n  customer_nr: '1234567890'\n",
    )
    .unwrap();

    let cfg = Config::from_file(&path).unwrap();
    assert_eq!(cfg.api.environment, "production");
    assert_eq!(cfg.polling.interval_mins, 30);
    assert!(cfg.polling.poll_on_start);
    assert_eq!(cfg.api.token_refresh_interval_mins, 30);
    assert!(cfg.tariffs.is_empty());
    assert!(cfg.validate().is_ok());
}

#[test]
fn config_validation_errors() {
    let mut cfg = valid_config();

    // Missing credentials
    cfg.api.username.clear();
    assert!(cfg.validate().is_err());

    cfg = valid_config();
    cfg.api.password.clear();
    assert!(cfg.validate().is_err());

    cfg = valid_config();
    cfg.api.customer_nr.clear();
    assert!(cfg.validate().is_err());

    // Unknown environment
    cfg = valid_config();
    cfg.api.environment = "staging".to_string();
    assert!(cfg.validate().is_err());

    // Zero intervals
    cfg = valid_config();
    cfg.polling.interval_mins = 0;
    assert!(cfg.validate().is_err());

    cfg = valid_config();
    cfg.api.request_timeout_secs = 0;
    assert!(cfg.validate().is_err());

    cfg = valid_config();
    cfg.api.token_refresh_interval_mins = 0;
    assert!(cfg.validate().is_err());

    // Tariff rules
    cfg = valid_config();
    cfg.tariffs.push(TariffConfig {
        division: "water".to_string(),
        ..TariffConfig::default()
    });
    assert!(cfg.validate().is_err());

    cfg = valid_config();
    cfg.tariffs.push(TariffConfig {
        division: "naturalgas".to_string(),
        classification: "feedin".to_string(),
        ..TariffConfig::default()
    });
    assert!(cfg.validate().is_err());
}

#[test]
fn from_file_with_invalid_yaml_fails() {
    let tmp = tempfile::NamedTempFile::new().unwrap();
    fs::write(tmp.path(), b"bad: [unclosed").unwrap();
    let err = Config::from_file(tmp.path()).unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("Serialization error"));
}

#[test]
fn from_missing_file_fails_with_io_error() {
    let err = Config::from_file("/nonexistent/hestia_config.yaml").unwrap_err();
    let msg = format!("{}", err);
    assert!(msg.contains("I/O error"));
}
