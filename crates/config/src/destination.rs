//! Per-destination configuration
//!
//! One destination is one rotating file with a minimum level. Destinations
//! are independent; the logger derives each one's severity band from the
//! full set at assembly.
//!
//! # Example
//!
//! ```toml
//! [[destinations]]
//! log_dir = "/var/log/app"
//! filename = "access.log"
//! suffix = "%Y%m%d%H"
//! rotate_duration = "1h"
//! retain_age = "168h"
//! soft_link = true
//! level = "debug"
//! format = "plain"
//!
//! [destinations.encoder]
//! time_encoder = "iso8601"
//! ```

use std::path::PathBuf;
use std::time::Duration;

use bandlog_core::{EncoderConfig, Level};
use serde::Deserialize;

/// Retention used when `retain_age` is unset or zero (7 days)
pub const DEFAULT_RETAIN_AGE: Duration = Duration::from_secs(7 * 24 * 60 * 60);

/// Record layout written by a destination
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// `[level] key=value||key=value`
    Plain,
}

/// Destination configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Directory holding the log files, created if missing
    pub log_dir: PathBuf,

    /// Base file name inside `log_dir`
    pub filename: String,

    /// strftime suffix appended as `.suffix`; empty disables it
    pub suffix: String,

    /// Rotation period; unset or zero disables time rotation
    #[serde(with = "crate::duration")]
    pub rotate_duration: Option<Duration>,

    /// Maximum age of rotated files
    /// Default: 7 days
    #[serde(with = "crate::duration")]
    pub retain_age: Option<Duration>,

    /// Keep a symlink at `log_dir/filename` pointing at the current file
    pub soft_link: bool,

    /// Minimum level written to this destination
    /// Default: info
    pub level: Level,

    pub format: OutputFormat,

    /// Encoder overrides; `None` uses the encoder defaults
    pub encoder: Option<EncoderConfig>,
}

impl DestinationConfig {
    pub fn new(log_dir: impl Into<PathBuf>, filename: impl Into<String>) -> Self {
        Self {
            log_dir: log_dir.into(),
            filename: filename.into(),
            ..Self::default()
        }
    }

    pub fn with_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.suffix = suffix.into();
        self
    }

    pub fn with_rotate_duration(mut self, period: Duration) -> Self {
        self.rotate_duration = Some(period);
        self
    }

    pub fn with_retain_age(mut self, age: Duration) -> Self {
        self.retain_age = Some(age);
        self
    }

    pub fn with_soft_link(mut self, soft_link: bool) -> Self {
        self.soft_link = soft_link;
        self
    }

    pub fn with_level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    pub fn with_format(mut self, format: OutputFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_encoder(mut self, encoder: EncoderConfig) -> Self {
        self.encoder = Some(encoder);
        self
    }

    /// Rotation period, `None` when time rotation is disabled
    pub fn rotation_period(&self) -> Option<Duration> {
        self.rotate_duration.filter(|period| !period.is_zero())
    }

    /// Retention age, falling back to [`DEFAULT_RETAIN_AGE`]
    pub fn retention(&self) -> Duration {
        self.retain_age
            .filter(|age| !age.is_zero())
            .unwrap_or(DEFAULT_RETAIN_AGE)
    }

    /// Human-readable name used in errors and diagnostics
    pub fn display_name(&self) -> String {
        if self.filename.is_empty() {
            self.log_dir.display().to_string()
        } else {
            self.filename.clone()
        }
    }
}
