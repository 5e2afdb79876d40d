//! Banded logger configuration
//!
//! JSON or TOML documents describing the logger's destinations. Only
//! `log_dir` and `filename` are required per destination; everything else
//! has a default.
//!
//! # Parsing
//!
//! TOML through the `FromStr` trait, JSON through
//! [`LoggerConfig::from_json_str`]:
//!
//! ```
//! use bandlog_config::LoggerConfig;
//! use std::str::FromStr;
//!
//! let config = LoggerConfig::from_str(
//!     "[[destinations]]\nlog_dir = \"logs\"\nfilename = \"app.log\"",
//! )
//! .unwrap();
//! assert_eq!(config.destinations.len(), 1);
//! ```
//!
//! # Example Config
//!
//! ```json
//! {
//!   "add_caller": true,
//!   "destinations": [
//!     { "log_dir": "/var/log/app", "filename": "access.log",
//!       "suffix": "%Y%m%d%H%M", "rotate_duration": "1m",
//!       "level": "debug", "format": "plain" },
//!     { "log_dir": "/var/log/app", "filename": "error.log",
//!       "soft_link": true, "level": "warn" }
//!   ]
//! }
//! ```

pub mod destination;
pub mod duration;
mod error;
mod validation;

use std::fs;
use std::path::Path;
use std::str::FromStr;

pub use destination::{DEFAULT_RETAIN_AGE, DestinationConfig, OutputFormat};
pub use error::{ConfigError, Result};
pub use validation::{validate_config, validate_destination};

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    /// Record the call site of each entry
    pub add_caller: bool,

    /// Output destinations, in any order
    pub destinations: Vec<DestinationConfig>,
}

impl LoggerConfig {
    pub fn new(add_caller: bool, destinations: Vec<DestinationConfig>) -> Self {
        Self {
            add_caller,
            destinations,
        }
    }

    /// Load configuration from a file
    ///
    /// `.toml` files are parsed as TOML, anything else as JSON.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read, does not parse or fails
    /// validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;

        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));
        if is_toml {
            Self::from_str(&contents)
        } else {
            Self::from_json_str(&contents)
        }
    }

    /// Parse a JSON document
    ///
    /// Accepts a full document (`{"add_caller": .., "destinations": [..]}`),
    /// a single destination object or a bare array of destinations.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(s)?;
        let config = if value.get("destinations").is_some() || value.get("add_caller").is_some() {
            serde_json::from_value::<LoggerConfig>(value)?
        } else if value.is_object() {
            let destination = serde_json::from_value::<DestinationConfig>(value)?;
            Self::new(false, vec![destination])
        } else {
            Self::new(false, serde_json::from_value(value)?)
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a TOML string
    ///
    /// Prefer using the `FromStr` trait implementation.
    fn parse(s: &str) -> Result<Self> {
        let config: LoggerConfig = toml::from_str(s).map_err(ConfigError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_config(self)
    }
}

impl FromStr for LoggerConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bandlog_core::Level;
    use std::io::Write;
    use std::time::Duration;

    const DOCUMENT: &str = r#"{
        "add_caller": true,
        "destinations": [
            {"log_dir": "/var/log/app", "filename": "access.log",
             "suffix": "%Y%m%d%H%M", "rotate_duration": "1m", "level": "debug"},
            {"log_dir": "/var/log/app", "filename": "error.log", "level": "warn"}
        ]
    }"#;

    #[test]
    fn test_json_document() {
        let config = LoggerConfig::from_json_str(DOCUMENT).unwrap();
        assert!(config.add_caller);
        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.destinations[0].level, Level::Debug);
        assert_eq!(
            config.destinations[0].rotation_period(),
            Some(Duration::from_secs(60))
        );
        assert_eq!(config.destinations[1].level, Level::Warn);
    }

    #[test]
    fn test_json_single_destination() {
        let config =
            LoggerConfig::from_json_str(r#"{"log_dir": "logs", "filename": "app.log"}"#).unwrap();
        assert!(!config.add_caller);
        assert_eq!(config.destinations.len(), 1);
        assert_eq!(config.destinations[0].filename, "app.log");
    }

    #[test]
    fn test_json_array() {
        let config = LoggerConfig::from_json_str(
            r#"[{"log_dir": "logs", "filename": "a.log"},
                {"log_dir": "logs", "filename": "b.log", "level": "error"}]"#,
        )
        .unwrap();
        assert_eq!(config.destinations.len(), 2);
        assert_eq!(config.destinations[1].level, Level::Error);
    }

    #[test]
    fn test_json_empty_array_rejected() {
        let err = LoggerConfig::from_json_str("[]").unwrap_err();
        assert!(matches!(err, ConfigError::NoDestinations));
    }

    #[test]
    fn test_json_malformed() {
        let err = LoggerConfig::from_json_str("{not json").unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_json_scalar_rejected() {
        assert!(LoggerConfig::from_json_str("42").is_err());
    }

    #[test]
    fn test_toml_document() {
        let toml = r#"
add_caller = true

[[destinations]]
log_dir = "logs"
filename = "access.log"
level = "debug"
retain_age = "48h"

[[destinations]]
log_dir = "logs"
filename = "error.log"
level = "warn"
format = "plain"

[destinations.encoder]
level_encoder = "capital"
line_ending = "\r\n"
"#;
        let config = LoggerConfig::from_str(toml).unwrap();
        assert!(config.add_caller);
        assert_eq!(
            config.destinations[0].retention(),
            Duration::from_secs(48 * 3600)
        );
        assert_eq!(config.destinations[1].format, OutputFormat::Plain);
        let encoder = config.destinations[1].encoder.as_ref().unwrap();
        assert_eq!(encoder.line_ending, "\r\n");
    }

    #[test]
    fn test_toml_without_destinations_rejected() {
        let err = LoggerConfig::from_str("add_caller = true").unwrap_err();
        assert!(matches!(err, ConfigError::NoDestinations));
    }

    #[test]
    fn test_from_file_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let json_path = dir.path().join("logger.json");
        fs::File::create(&json_path)
            .unwrap()
            .write_all(DOCUMENT.as_bytes())
            .unwrap();
        assert_eq!(
            LoggerConfig::from_file(&json_path).unwrap().destinations.len(),
            2
        );

        let toml_path = dir.path().join("logger.toml");
        fs::write(
            &toml_path,
            "[[destinations]]\nlog_dir = \"logs\"\nfilename = \"app.log\"\n",
        )
        .unwrap();
        assert_eq!(
            LoggerConfig::from_file(&toml_path).unwrap().destinations.len(),
            1
        );
    }

    #[test]
    fn test_from_file_missing() {
        let err = LoggerConfig::from_file("/nonexistent/logger.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
