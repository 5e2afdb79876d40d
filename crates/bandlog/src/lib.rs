//! Banded multi-destination logger
//!
//! Every destination names a minimum level and a rotating file. The logger
//! sorts the destinations by level and gives each one the band from its own
//! level up to (not including) the next destination's, so each record lands
//! in exactly one file:
//!
//! ```no_run
//! use std::time::Duration;
//!
//! use bandlog::{DestinationConfig, Field, Level, OutputFormat};
//!
//! let logger = bandlog::assemble(
//!     false,
//!     vec![
//!         DestinationConfig::new("/var/log/app", "access.log")
//!             .with_level(Level::Debug)
//!             .with_suffix("%Y%m%d%H")
//!             .with_rotate_duration(Duration::from_secs(3600))
//!             .with_format(OutputFormat::Plain),
//!         DestinationConfig::new("/var/log/app", "error.log")
//!             .with_level(Level::Warn)
//!             .with_soft_link(true),
//!     ],
//! )?;
//!
//! // access.log: [info] path=/users||status=200
//! logger.info("request", &[Field::string("path", "/users"), Field::i64("status", 200)]);
//! // error.log only
//! logger.error("upstream failed", &[Field::string("path", "/orders")]);
//! # Ok::<(), bandlog::Error>(())
//! ```
//!
//! With [`init`], `tracing` events are routed the same way.

pub mod band;
mod error;
mod error_reporter;
mod layer;
mod logger;
mod unit;
pub mod writer;

use std::sync::Arc;

use bandlog_core::{BufferPool, Encoder, new_json_encoder, new_plain_encoder};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub use band::{SeverityBand, banded};
pub use bandlog_config::{DestinationConfig, LoggerConfig, OutputFormat};
pub use bandlog_core::{Caller, EncoderConfig, Entry, Field, Level, LevelEnabler, Sink};
pub use error::{Error, Result};
pub use error_reporter::{DEFAULT_REPORT_INTERVAL, ErrorReporter};
pub use layer::BandedLayer;
pub use logger::{Logger, LoggerMetrics, LoggerMetricsSnapshot};
pub use unit::{Dispatch, FanOut, ProcessingUnit};
pub use writer::open_rotating_writer;

/// Build a logger writing each destination's severity band to its file
///
/// Writers are opened in level order; the first failure aborts assembly
/// and drops (closing) the writers already opened.
pub fn assemble(add_caller: bool, destinations: Vec<DestinationConfig>) -> Result<Logger> {
    if destinations.is_empty() {
        return Err(Error::NoDestinations);
    }

    let pool = Arc::new(BufferPool::default());
    let mut units = Vec::with_capacity(destinations.len());
    for (destination, band) in banded(destinations, |destination| destination.level) {
        let sink = open_rotating_writer(&destination)?;
        let config = destination.encoder.clone().unwrap_or_default();
        let encoder: Box<dyn Encoder> = match destination.format {
            OutputFormat::Json => new_json_encoder(config, Arc::clone(&pool)),
            OutputFormat::Plain => new_plain_encoder(config, Arc::clone(&pool)),
        };

        tracing::debug!(
            destination = %destination.display_name(),
            band = %band,
            format = ?destination.format,
            "assembled log destination"
        );
        units.push(ProcessingUnit::new(
            destination.display_name(),
            encoder,
            Arc::new(sink),
            band,
            Arc::clone(&pool),
        ));
    }

    tracing::info!(destinations = units.len(), add_caller, "banded logger ready");
    Ok(Logger::new(FanOut::new(units), add_caller))
}

/// Assemble a logger and install it as the global `tracing` subscriber
///
/// When `RUST_LOG` is set it filters events before they reach the logger.
pub fn init(config: &LoggerConfig) -> Result<Logger> {
    config.validate()?;
    let logger = Logger::from_config(config)?;
    let filter = EnvFilter::try_from_default_env().ok();

    tracing_subscriber::registry()
        .with(logger.layer())
        .with(filter)
        .try_init()
        .map_err(|e| Error::SetGlobalDefault(e.to_string()))?;

    Ok(logger)
}
