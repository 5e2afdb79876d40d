//! Time-bucketed rotating log files
//!
//! A [`RotatingFile`] writes to the file named by a strftime pattern for
//! the current time bucket, keeps an optional symlink pointed at it and
//! removes files older than the configured retention on each rotation.
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bandlog_core::Sink;
//! use bandlog_rotation::{RotatingFile, RotationOptions};
//!
//! let file = RotatingFile::open(
//!     "/var/log/app/access.log.%Y%m%d%H",
//!     RotationOptions::default()
//!         .with_rotation_period(Some(Duration::from_secs(3600)))
//!         .with_link_name(Some("/var/log/app/access.log".into())),
//! )?;
//! file.write_record(b"started\n")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod pattern;
pub mod rotating_file;

pub use error::{Result, RotationError};
pub use pattern::FilePattern;
pub use rotating_file::{
    Clock, DEFAULT_MAX_AGE, RotatingFile, RotationMetrics, RotationOptions, RotationSnapshot,
};
