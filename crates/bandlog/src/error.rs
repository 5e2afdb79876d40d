//! Logger error types

use std::io;
use std::path::{Path, PathBuf};

use bandlog_config::ConfigError;
use bandlog_core::EncodeError;
use bandlog_rotation::RotationError;
use thiserror::Error;

/// Result type for logger operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors from assembling or driving a banded logger
#[derive(Debug, Error)]
pub enum Error {
    /// Assembly needs at least one destination
    #[error("no destinations given")]
    NoDestinations,

    /// Configured log directory or file name cannot form a path
    #[error("invalid log path '{}': {reason}", .path.display())]
    InvalidPath { path: PathBuf, reason: String },

    /// Filesystem operation failed
    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Sink write, sync or close failed
    #[error("destination '{destination}' failed to {action}: {source}")]
    Sink {
        destination: String,
        action: &'static str,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Rotation(#[from] RotationError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    /// A global `tracing` subscriber is already installed
    #[error("failed to install global subscriber: {0}")]
    SetGlobalDefault(String),
}

impl Error {
    /// Create an Io error
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }

    /// Create an InvalidPath error
    pub fn invalid_path(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a Sink error
    pub fn sink(destination: impl Into<String>, action: &'static str, source: io::Error) -> Self {
        Self::Sink {
            destination: destination.into(),
            action,
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_message() {
        let err = Error::io(
            "create directory",
            Path::new("/var/log/app"),
            io::Error::from(io::ErrorKind::PermissionDenied),
        );
        let message = err.to_string();
        assert!(message.contains("create directory"));
        assert!(message.contains("/var/log/app"));
    }

    #[test]
    fn test_wraps_config_error() {
        let err = Error::from(ConfigError::NoDestinations);
        assert!(err.to_string().contains("no destinations"));
    }

    #[test]
    fn test_sink_error_names_destination() {
        let err = Error::sink("error.log", "write", io::Error::other("disk full"));
        assert!(err.to_string().contains("error.log"));
        assert!(err.to_string().contains("disk full"));
    }
}
