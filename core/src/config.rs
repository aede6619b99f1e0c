//! Configuration loading and validation for the sensord daemon
//!
//! Parses a TOML configuration into [`ServerConfig`], applies defaults via
//! serde, and performs validation with field-path error messages. A missing
//! config file means defaults.

use crate::{CoreError, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level daemon configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ServerConfig {
    /// Address to bind the listener on
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
    /// Directory holding one flat file per collection
    pub data_dir: PathBuf,
    /// HTML template served on the dashboard route
    pub template_path: PathBuf,
    /// Plug actuator settings
    pub actuator: ActuatorConfig,
}

/// Settings for the external plug-control invocation and its thresholds
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default, rename_all = "camelCase")]
pub struct ActuatorConfig {
    /// Program running the control script
    pub interpreter: String,
    /// Path of the control script
    pub script: PathBuf,
    /// Temperatures above this switch the plug on
    pub temperature_threshold: i32,
    /// Humidity readings above this switch the plug on
    pub humidity_threshold: i32,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            data_dir: PathBuf::from("data"),
            template_path: PathBuf::from("templates/index.html"),
            actuator: ActuatorConfig::default(),
        }
    }
}

impl Default for ActuatorConfig {
    fn default() -> Self {
        Self {
            interpreter: "python3".to_string(),
            script: PathBuf::from("scripts/switch_plug.py"),
            temperature_threshold: 25,
            humidity_threshold: 60,
        }
    }
}

impl ServerConfig {
    /// Validate the configuration with field-path error messages
    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(CoreError::Validation("host: cannot be empty".to_string()));
        }
        if self.port == 0 {
            return Err(CoreError::Validation(
                "port: must be 1..=65535".to_string(),
            ));
        }
        if self.actuator.interpreter.trim().is_empty() {
            return Err(CoreError::Validation(
                "actuator.interpreter: cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Load configuration from a TOML string
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ServerConfig = toml::from_str(input)
            .map_err(|e| CoreError::Configuration(format!("TOML parse error: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file path
    pub fn from_toml_path(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(&path).map_err(|e| {
            CoreError::Configuration(format!(
                "Failed to read config {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Self::from_toml_str(&data)
    }

    /// Load from the given path, falling back to defaults when no path is
    /// given or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) if p.exists() => Self::from_toml_path(p),
            _ => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = ServerConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.port, 8080);
        assert_eq!(config.actuator.temperature_threshold, 25);
        assert_eq!(config.actuator.humidity_threshold, 60);
    }

    #[test]
    fn parses_partial_toml_with_camel_case_keys() {
        let config = ServerConfig::from_toml_str(
            r#"
            port = 9090
            dataDir = "/var/lib/sensord"

            [actuator]
            interpreter = "python3"
            temperatureThreshold = 30
            "#,
        )
        .expect("should parse");
        assert_eq!(config.port, 9090);
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/sensord"));
        assert_eq!(config.actuator.temperature_threshold, 30);
        // untouched fields keep their defaults
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.actuator.humidity_threshold, 60);
    }

    #[test]
    fn errors_on_zero_port() {
        let err = ServerConfig::from_toml_str("port = 0").unwrap_err();
        assert!(format!("{err}").contains("port: must be 1..=65535"));
    }

    #[test]
    fn errors_on_empty_host() {
        let err = ServerConfig::from_toml_str(r#"host = """#).unwrap_err();
        assert!(format!("{err}").contains("host: cannot be empty"));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config =
            ServerConfig::load_or_default(Some(Path::new("/nonexistent/sensord.toml"))).unwrap();
        assert_eq!(config, ServerConfig::default());
    }
}
