//! Configuration management for Hestia
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{HestiaError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

fn default_true() -> bool {
    true
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Retailer API connection and credentials
    pub api: ApiConfig,

    /// Polling cadence configuration
    pub polling: PollingConfig,

    /// Tariff subscriptions to publish
    pub tariffs: Vec<TariffConfig>,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Retailer API connection parameters and credentials
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Portal login name
    pub username: String,

    /// Portal password
    pub password: String,

    /// Customer number sent with every accounts request
    pub customer_nr: String,

    /// API environment (production or development)
    pub environment: String,

    /// Explicit base URL override; takes precedence over environment
    pub base_url: Option<String>,

    /// TCP connect timeout in seconds
    pub connect_timeout_secs: u64,

    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,

    /// Background token refresh interval in minutes
    pub token_refresh_interval_mins: u64,
}

/// Polling cadence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Poll interval in minutes
    pub interval_mins: u64,

    /// Whether to poll immediately at session start
    #[serde(default = "default_true")]
    pub poll_on_start: bool,
}

/// One tariff subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TariffConfig {
    /// Energy division (electricity or naturalgas)
    pub division: String,

    /// Tariff classification (default, heating or feedin; electricity only)
    pub classification: String,

    /// Match tariffs for electrically heated premises (natural gas only)
    pub electrical_heating: bool,

    /// Pin a specific contract account number; first match wins when unset
    pub contract_account_nr: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Path to log file or log directory
    pub file: String,

    /// Optional console-specific level override
    pub console_level: Option<String>,

    /// Optional file-specific level override
    pub file_level: Option<String>,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: String::new(),
            customer_nr: String::new(),
            environment: "production".to_string(),
            base_url: None,
            connect_timeout_secs: 20,
            request_timeout_secs: 30,
            token_refresh_interval_mins: 30,
        }
    }
}

// Manual Debug so the password never reaches log output
impl fmt::Debug for ApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiConfig")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("customer_nr", &self.customer_nr)
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field(
                "token_refresh_interval_mins",
                &self.token_refresh_interval_mins,
            )
            .finish()
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_mins: 30,
            poll_on_start: true,
        }
    }
}

impl Default for TariffConfig {
    fn default() -> Self {
        Self {
            division: "electricity".to_string(),
            classification: "default".to_string(),
            electrical_heating: false,
            contract_account_nr: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/hestia.log".to_string(),
            console_level: None,
            file_level: None,
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default locations
    pub fn load() -> Result<Self> {
        let default_paths = ["hestia_config.yaml", "/etc/hestia/config.yaml"];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        // Fall back to default configuration
        Ok(Config::default())
    }

    /// Save configuration to a YAML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.api.username.trim().is_empty() {
            return Err(HestiaError::validation(
                "api.username",
                "Username cannot be empty",
            ));
        }

        if self.api.password.trim().is_empty() {
            return Err(HestiaError::validation(
                "api.password",
                "Password cannot be empty",
            ));
        }

        if self.api.customer_nr.trim().is_empty() {
            return Err(HestiaError::validation(
                "api.customer_nr",
                "Customer number cannot be empty",
            ));
        }

        if !matches!(
            self.api.environment.to_lowercase().as_str(),
            "production" | "development"
        ) {
            return Err(HestiaError::validation(
                "api.environment",
                "Must be 'production' or 'development'",
            ));
        }

        if self.api.connect_timeout_secs == 0 {
            return Err(HestiaError::validation(
                "api.connect_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.api.request_timeout_secs == 0 {
            return Err(HestiaError::validation(
                "api.request_timeout_secs",
                "Must be greater than 0",
            ));
        }

        if self.api.token_refresh_interval_mins == 0 {
            return Err(HestiaError::validation(
                "api.token_refresh_interval_mins",
                "Must be greater than 0",
            ));
        }

        if self.polling.interval_mins == 0 {
            return Err(HestiaError::validation(
                "polling.interval_mins",
                "Must be greater than 0",
            ));
        }

        for (idx, tariff) in self.tariffs.iter().enumerate() {
            tariff
                .validate()
                .map_err(|e| HestiaError::validation(format!("tariffs[{}]", idx), e.to_string()))?;
        }

        Ok(())
    }
}

impl TariffConfig {
    /// Validate one tariff subscription
    pub fn validate(&self) -> Result<()> {
        let division = self.division.to_lowercase();
        if !matches!(division.as_str(), "electricity" | "naturalgas") {
            return Err(HestiaError::validation(
                "division",
                "Must be 'electricity' or 'naturalgas'",
            ));
        }

        let classification = self.classification.to_lowercase();
        if !matches!(classification.as_str(), "default" | "heating" | "feedin") {
            return Err(HestiaError::validation(
                "classification",
                "Must be 'default', 'heating' or 'feedin'",
            ));
        }

        if division == "naturalgas" && classification == "feedin" {
            return Err(HestiaError::validation(
                "classification",
                "'feedin' applies to electricity only",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        let mut config = Config::default();
        config.api.username = "user@example.com".to_string();
        config.api.password = "secret".to_string();
        config.api.customer_nr = "1234567".to_string();
        config
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.api.environment, "production");
        assert_eq!(config.api.connect_timeout_secs, 20);
        assert_eq!(config.api.token_refresh_interval_mins, 30);
        assert_eq!(config.polling.interval_mins, 30);
        assert!(config.polling.poll_on_start);
        assert!(config.tariffs.is_empty());
    }

    #[test]
    fn test_config_validation() {
        let config = valid_config();
        assert!(config.validate().is_ok());

        // Blank credentials are rejected
        let mut config = valid_config();
        config.api.username = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.api.password = String::new();
        assert!(config.validate().is_err());

        // Zero intervals are rejected
        let mut config = valid_config();
        config.polling.interval_mins = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_environment_validation() {
        let mut config = valid_config();
        config.api.environment = "staging".to_string();
        assert!(config.validate().is_err());

        config.api.environment = "Development".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_tariff_validation() {
        let mut config = valid_config();
        config.tariffs.push(TariffConfig::default());
        assert!(config.validate().is_ok());

        config.tariffs[0].division = "water".to_string();
        assert!(config.validate().is_err());

        config.tariffs[0] = TariffConfig {
            division: "naturalgas".to_string(),
            classification: "feedin".to_string(),
            ..TariffConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_serialization() {
        let mut config = valid_config();
        config.tariffs.push(TariffConfig::default());
        let yaml = serde_yaml::to_string(&config).unwrap();
        let deserialized: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config.api.customer_nr, deserialized.api.customer_nr);
        assert_eq!(config.tariffs.len(), deserialized.tariffs.len());
    }

    #[test]
    fn test_debug_redacts_password() {
        let config = valid_config();
        let debug = format!("{:?}", config.api);
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("secret"));
    }
}
