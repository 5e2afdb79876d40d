//! Rotation error types

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type for rotation operations
pub type Result<T> = std::result::Result<T, RotationError>;

/// Errors that can occur while opening or writing a rotating file
#[derive(Debug, Error)]
pub enum RotationError {
    /// File pattern is empty or has a bad strftime specifier
    #[error("invalid file pattern '{pattern}': {reason}")]
    InvalidPattern {
        pattern: String,
        reason: &'static str,
    },

    /// Retention glob derived from the pattern is malformed
    #[error("invalid retention glob '{glob}': {source}")]
    Glob {
        glob: String,
        #[source]
        source: glob::PatternError,
    },

    /// Filesystem operation failed
    #[error("failed to {action} '{}': {source}", .path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Write after close
    #[error("rotating file is closed")]
    Closed,
}

impl RotationError {
    /// Create an InvalidPattern error
    pub fn invalid_pattern(pattern: impl Into<String>, reason: &'static str) -> Self {
        Self::InvalidPattern {
            pattern: pattern.into(),
            reason,
        }
    }

    /// Create an Io error
    pub fn io(action: &'static str, path: &Path, source: io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            source,
        }
    }
}

impl From<RotationError> for io::Error {
    fn from(err: RotationError) -> Self {
        let kind = match &err {
            RotationError::Io { source, .. } => source.kind(),
            RotationError::Closed => io::ErrorKind::BrokenPipe,
            RotationError::InvalidPattern { .. } | RotationError::Glob { .. } => {
                io::ErrorKind::InvalidInput
            }
        };
        io::Error::new(kind, err)
    }
}
