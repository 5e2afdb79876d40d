//! Rotating writer factory
//!
//! Turns a [`DestinationConfig`] into an open [`RotatingFile`]:
//!
//! ```text
//! log_dir  = logs            → /srv/app/logs (created if missing)
//! filename = access.log      → /srv/app/logs/access.log        (symlink)
//! suffix   = %Y%m%d%H        → /srv/app/logs/access.log.%Y%m%d%H (pattern)
//! ```

use std::fs;
use std::path::{self, Path};

use bandlog_config::DestinationConfig;
use bandlog_rotation::{RotatingFile, RotationOptions};

use crate::error::{Error, Result};

/// Open the rotating file described by `config`
pub fn open_rotating_writer(config: &DestinationConfig) -> Result<RotatingFile> {
    if config.filename.is_empty() {
        return Err(Error::invalid_path(&config.log_dir, "empty file name"));
    }

    let log_dir = path::absolute(&config.log_dir)
        .map_err(|source| Error::io("resolve", &config.log_dir, source))?;

    match fs::metadata(&log_dir) {
        Ok(metadata) if metadata.is_dir() => {}
        Ok(_) => {
            return Err(Error::invalid_path(&log_dir, "not a directory"));
        }
        Err(_) => {
            fs::create_dir_all(&log_dir)
                .map_err(|source| Error::io("create directory", &log_dir, source))?;
        }
    }

    let base = log_dir.join(&config.filename);
    let pattern = pattern_for(&base, &config.suffix)?;

    let options = RotationOptions::default()
        .with_rotation_period(config.rotation_period())
        .with_max_age(config.retention())
        .with_link_name(config.soft_link.then(|| base.clone()));

    let file = RotatingFile::open(pattern, options)?;
    tracing::debug!(
        destination = %config.display_name(),
        path = %file.current_path().display(),
        level = %config.level,
        "opened log destination"
    );
    Ok(file)
}

fn pattern_for(base: &Path, suffix: &str) -> Result<String> {
    let Some(base) = base.to_str() else {
        return Err(Error::invalid_path(base, "path is not valid UTF-8"));
    };
    if suffix.is_empty() {
        Ok(base.to_string())
    } else {
        Ok(format!("{base}.{suffix}"))
    }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
