//! Configuration management for the connector.
//!
//! TOML file with three sections: `[connector]`, `[paths]` and `[policy]`.
//! The default configuration path is `~/.config/finderbridge/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use roots::{DefaultPolicy, DriverNamespace, RootError, DEFAULT_DRIVER_NAMESPACE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::connector::ConnectorSettings;
use crate::context::{PathTable, PATH_COURSES, PATH_ROOT, PATH_TEMP, PATH_USERS};
use crate::drivers::default_driver_list;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("driver_namespace must be `::`-separated identifiers, got {0:?}")]
    InvalidNamespace(String),

    #[error("drivers must list at least one driver")]
    EmptyDriverList,

    #[error("drivers contains a blank entry")]
    BlankDriverName,

    #[error("policy is invalid: {0}")]
    InvalidPolicy(RootError),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Connector behaviour.
    pub connector: ConnectorConfig,

    /// Path table, keyed like `path.temp`.
    pub paths: BTreeMap<String, PathBuf>,

    /// Baseline merged into every root.
    pub policy: DefaultPolicy,
}

/// Connector behaviour.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ConnectorConfig {
    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Prefix of qualified driver references.
    pub driver_namespace: String,

    /// Drivers to activate, in root order.
    pub drivers: Vec<String>,

    pub session_close_earlier: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            connector: ConnectorConfig::default(),
            paths: default_paths(),
            policy: DefaultPolicy::builtin(),
        }
    }
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            driver_namespace: DEFAULT_DRIVER_NAMESPACE.to_string(),
            drivers: default_driver_list(),
            session_close_earlier: false,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finderbridge")
        .join("config.toml")
}

/// Returns the default storage directory.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("finderbridge")
}

fn default_paths() -> BTreeMap<String, PathBuf> {
    let data = default_data_dir();
    BTreeMap::from([
        (PATH_TEMP.to_string(), std::env::temp_dir().join("finderbridge")),
        (PATH_ROOT.to_string(), data.clone()),
        (PATH_COURSES.to_string(), data.join("courses")),
        (PATH_USERS.to_string(), data.join("users")),
    ])
}

fn is_identifier(segment: &str) -> bool {
    let mut chars = segment.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - FINDERBRIDGE_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    /// - FINDERBRIDGE_DRIVERS: Comma-separated driver list
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("FINDERBRIDGE_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!(log_level = %level, "Overriding log_level from environment");
                self.connector.log_level = level;
            }
        }

        if let Ok(drivers) = std::env::var("FINDERBRIDGE_DRIVERS") {
            let drivers: Vec<String> = drivers
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !drivers.is_empty() {
                tracing::info!(drivers = ?drivers, "Overriding drivers from environment");
                self.connector.drivers = drivers;
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.connector.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(
                self.connector.log_level.clone(),
            ));
        }

        let namespace = DriverNamespace::new(self.connector.driver_namespace.as_str());
        if !namespace.as_str().split("::").all(is_identifier) {
            return Err(ConfigError::InvalidNamespace(
                self.connector.driver_namespace.clone(),
            ));
        }

        if self.connector.drivers.is_empty() {
            return Err(ConfigError::EmptyDriverList);
        }
        if self.connector.drivers.iter().any(|name| name.trim().is_empty()) {
            return Err(ConfigError::BlankDriverName);
        }

        self.policy.validate().map_err(ConfigError::InvalidPolicy)?;

        Ok(())
    }

    /// Connector settings described by this configuration.
    pub fn settings(&self) -> ConnectorSettings {
        ConnectorSettings {
            driver_list: self.connector.drivers.clone(),
            namespace: DriverNamespace::new(self.connector.driver_namespace.as_str()),
            policy: self.policy.clone(),
            session_close_earlier: self.connector.session_close_earlier,
        }
    }

    /// The configured path table.
    pub fn path_table(&self) -> PathTable {
        PathTable::from(self.paths.clone())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file, creating parent directories.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!(path = %path.display(), "Configuration saved");
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

#[cfg(test)]
mod tests {
    use super::*;
    use roots::{AttributeRule, Command};
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.connector.log_level, "info");
        assert_eq!(config.connector.driver_namespace, "finderbridge::drivers");
        assert_eq!(config.connector.drivers.len(), 5);
        assert!(!config.connector.session_close_earlier);
        assert!(config.paths.contains_key(PATH_TEMP));
        assert_eq!(config.policy, DefaultPolicy::builtin());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_empty() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_from_toml_partial() {
        let toml = r#"
[connector]
drivers = ["HomeDriver"]

[policy]
upload_overwrite = true
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.connector.drivers, vec!["HomeDriver".to_string()]);
        assert_eq!(config.connector.log_level, "info");
        assert!(config.policy.upload_overwrite);
        assert_eq!(config.policy.disabled.len(), 13);
        assert_eq!(config.policy.attributes.len(), 5);
    }

    #[test]
    fn test_from_toml_full() {
        let toml = r#"
[connector]
log_level = "debug"
driver_namespace = "lms::finder"
drivers = ["CourseDriver", "HomeDriver"]
session_close_earlier = true

[paths]
"path.temp" = "/var/tmp/lms"
"path.courses" = "/srv/courses"

[policy]
upload_overwrite = false
upload_allow = ["image"]
upload_deny = ["all"]
upload_order = ["deny", "allow"]
disabled = ["rm", "rename"]

[[policy.attributes]]
pattern = "/\\.bak$/i"
hidden = true
"#;
        let config = Config::from_toml(toml).unwrap();

        assert_eq!(config.connector.log_level, "debug");
        assert!(config.connector.session_close_earlier);
        assert_eq!(config.paths.len(), 2);
        assert_eq!(
            config.paths.get(PATH_COURSES),
            Some(&PathBuf::from("/srv/courses"))
        );
        assert_eq!(config.policy.disabled, vec![Command::Rm, Command::Rename]);
        assert_eq!(config.policy.attributes.len(), 1);
        assert_eq!(config.policy.attributes[0].hidden, Some(true));
        assert_eq!(config.policy.attributes[0].read, None);
        assert!(config.validate().is_ok());

        let settings = config.settings();
        assert_eq!(settings.namespace.as_str(), "lms::finder");
        assert_eq!(settings.driver_list.len(), 2);
        assert!(settings.session_close_earlier);
        assert_eq!(
            config.path_table().get(PATH_TEMP),
            Some(Path::new("/var/tmp/lms"))
        );
    }

    #[test]
    fn test_from_toml_invalid_syntax() {
        let result = Config::from_toml("[connector\nlog_level = ");
        assert!(result.is_err());
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("Invalid TOML configuration"));
    }

    #[test]
    fn test_from_toml_unknown_command() {
        let toml = r#"
[policy]
disabled = ["teleport"]
"#;
        assert!(Config::from_toml(toml).is_err());
    }

    #[test]
    fn test_roundtrip() {
        let mut original = Config::default();
        original.connector.drivers = vec!["DropBoxDriver".to_string()];
        original
            .policy
            .attributes
            .push(AttributeRule::hidden("/^~/"));

        let toml = original.to_toml().unwrap();
        let loaded = Config::from_toml(&toml).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_missing_file() {
        let config = Config::load("/nonexistent/path/config.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original = Config::default();
        original.connector.log_level = "warn".to_string();
        original
            .paths
            .insert(PATH_TEMP.to_string(), temp_dir.path().join("tmp"));

        original.save(&config_path).unwrap();
        let loaded = Config::load(&config_path).unwrap();

        assert_eq!(original, loaded);
    }

    #[test]
    fn test_load_invalid_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "invalid [ toml").unwrap();

        let err = Config::load(&config_path).unwrap_err().to_string();
        assert!(err.contains("Failed to parse config file"));
    }

    #[test]
    fn test_default_config_path() {
        let path = default_config_path();
        assert!(path.to_string_lossy().contains("finderbridge"));
        assert!(path.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn test_validate_log_level() {
        let mut config = Config::default();
        config.connector.log_level = "DEBUG".to_string();
        assert!(config.validate().is_ok());

        config.connector.log_level = "loud".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::InvalidLogLevel("loud".to_string()))
        );
    }

    #[test]
    fn test_validate_namespace() {
        let mut config = Config::default();
        config.connector.driver_namespace = "lms::".to_string();
        assert!(config.validate().is_ok());

        for bad in ["", "lms::::drivers", "lms drivers", "9lms"] {
            config.connector.driver_namespace = bad.to_string();
            assert_eq!(
                config.validate(),
                Err(ConfigError::InvalidNamespace(bad.to_string())),
                "namespace {bad:?}"
            );
        }
    }

    #[test]
    fn test_validate_drivers() {
        let mut config = Config::default();
        config.connector.drivers.clear();
        assert_eq!(config.validate(), Err(ConfigError::EmptyDriverList));

        config.connector.drivers = vec!["HomeDriver".to_string(), " ".to_string()];
        assert_eq!(config.validate(), Err(ConfigError::BlankDriverName));
    }

    #[test]
    fn test_validate_policy_patterns() {
        let mut config = Config::default();
        config.policy.attributes.push(AttributeRule::hidden("no-delimiters"));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidPolicy(
                RootError::MalformedAttributePattern { .. }
            ))
        ));
    }

    #[test]
    #[serial]
    fn test_env_override_log_level() {
        std::env::set_var("FINDERBRIDGE_LOG_LEVEL", "trace");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config.connector.log_level, "trace");

        std::env::remove_var("FINDERBRIDGE_LOG_LEVEL");
    }

    #[test]
    #[serial]
    fn test_env_override_drivers() {
        std::env::set_var("FINDERBRIDGE_DRIVERS", " HomeDriver, ,PersonalDriver ");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(
            config.connector.drivers,
            vec!["HomeDriver".to_string(), "PersonalDriver".to_string()]
        );

        std::env::remove_var("FINDERBRIDGE_DRIVERS");
    }

    #[test]
    #[serial]
    fn test_env_override_empty_does_not_override() {
        std::env::set_var("FINDERBRIDGE_LOG_LEVEL", "");
        std::env::set_var("FINDERBRIDGE_DRIVERS", ",");

        let mut config = Config::default();
        config.apply_env_overrides();
        assert_eq!(config, Config::default());

        std::env::remove_var("FINDERBRIDGE_LOG_LEVEL");
        std::env::remove_var("FINDERBRIDGE_DRIVERS");
    }
}
