//! Configuration validation
//!
//! Validates config consistency:
//! - At least one destination
//! - Every destination names a directory and a file
//! - Rotation periods are at least one second

use std::time::Duration;

use crate::LoggerConfig;
use crate::destination::DestinationConfig;
use crate::error::{ConfigError, Result};

/// Shortest rotation period accepted
const MIN_ROTATION_PERIOD: Duration = Duration::from_secs(1);

/// Validate the entire configuration
pub fn validate_config(config: &LoggerConfig) -> Result<()> {
    if config.destinations.is_empty() {
        return Err(ConfigError::NoDestinations);
    }
    for (index, destination) in config.destinations.iter().enumerate() {
        validate_destination(index, destination)?;
    }
    Ok(())
}

/// Validate one destination
pub fn validate_destination(index: usize, destination: &DestinationConfig) -> Result<()> {
    let name = || format!("#{index} ({})", destination.display_name());

    if destination.log_dir.as_os_str().is_empty() {
        return Err(ConfigError::missing_field("destination", name(), "log_dir"));
    }
    if destination.filename.is_empty() {
        return Err(ConfigError::missing_field("destination", name(), "filename"));
    }
    if destination.filename.contains(['/', '\\']) {
        return Err(ConfigError::invalid_value(
            "destination",
            name(),
            "filename",
            "must be a file name, not a path",
        ));
    }
    if let Some(period) = destination.rotation_period()
        && period < MIN_ROTATION_PERIOD
    {
        return Err(ConfigError::invalid_value(
            "destination",
            name(),
            "rotate_duration",
            format!("must be at least 1s, got {period:?}"),
        ));
    }
    Ok(())
}
