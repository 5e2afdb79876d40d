//! Processing units and fan-out
//!
//! A unit is one destination at run time: an encoder carrying the
//! destination's context fields, the sink it writes to and the severity
//! band it owns. The fan-out hands every record to each unit whose band
//! accepts it.

use std::fmt;
use std::io;
use std::sync::Arc;

use bandlog_core::{BufferPool, Encoder, Entry, Field, Level, LevelEnabler, Sink};

use crate::band::SeverityBand;
use crate::error::{Error, Result};

/// One destination: encoder, sink and band
pub struct ProcessingUnit {
    name: Arc<str>,
    encoder: Box<dyn Encoder>,
    sink: Arc<dyn Sink>,
    band: SeverityBand,
    pool: Arc<BufferPool>,
}

impl ProcessingUnit {
    pub fn new(
        name: impl Into<Arc<str>>,
        encoder: Box<dyn Encoder>,
        sink: Arc<dyn Sink>,
        band: SeverityBand,
        pool: Arc<BufferPool>,
    ) -> Self {
        Self {
            name: name.into(),
            encoder,
            sink,
            band,
            pool,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn band(&self) -> SeverityBand {
        self.band
    }

    /// Whether this unit owns records at `level`
    #[inline]
    pub fn accepts(&self, level: Level) -> bool {
        self.band.enabled(level)
    }

    /// Encode and write one record
    ///
    /// The encoded buffer goes back to the pool whether or not the write
    /// succeeds.
    pub fn write(&self, entry: &Entry, fields: &[Field]) -> Result<usize> {
        let record = self.encoder.encode_entry(entry, fields)?;
        let written = record.len();
        let result = self.sink.write_record(&record);
        self.pool.checkin(record);
        result.map_err(|source| Error::sink(&*self.name, "write", source))?;
        Ok(written)
    }

    /// Unit sharing the sink whose encoder also carries `fields`
    pub fn with_fields(&self, fields: &[Field]) -> Self {
        let mut encoder = self.encoder.clone_encoder();
        encoder.add_fields(fields);
        Self {
            name: Arc::clone(&self.name),
            encoder,
            sink: Arc::clone(&self.sink),
            band: self.band,
            pool: Arc::clone(&self.pool),
        }
    }

    pub fn sync(&self) -> io::Result<()> {
        self.sink.sync()
    }

    pub fn close(&self) -> io::Result<()> {
        self.sink.close()
    }
}

impl fmt::Debug for ProcessingUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProcessingUnit")
            .field("name", &self.name)
            .field("band", &self.band)
            .finish_non_exhaustive()
    }
}

/// Result of handing one record to the fan-out
#[derive(Debug, Default)]
pub struct Dispatch {
    /// Units that wrote the record
    pub written: usize,
    /// Bytes written across those units
    pub bytes: usize,
    /// Failures, tagged with the unit name
    pub failures: Vec<(Arc<str>, Error)>,
}

/// Ordered list of processing units
#[derive(Debug, Default)]
pub struct FanOut {
    units: Vec<ProcessingUnit>,
}

impl FanOut {
    pub fn new(units: Vec<ProcessingUnit>) -> Self {
        Self { units }
    }

    pub fn units(&self) -> &[ProcessingUnit] {
        &self.units
    }

    /// Whether any unit owns records at `level`
    pub fn enabled(&self, level: Level) -> bool {
        self.units.iter().any(|unit| unit.accepts(level))
    }

    /// Names of the units owning records at `level`
    pub fn accepting(&self, level: Level) -> Vec<&str> {
        self.units
            .iter()
            .filter(|unit| unit.accepts(level))
            .map(ProcessingUnit::name)
            .collect()
    }

    /// Write the record to every accepting unit
    ///
    /// A failing unit does not stop the others.
    pub fn write(&self, entry: &Entry, fields: &[Field]) -> Dispatch {
        let mut dispatch = Dispatch::default();
        for unit in self.units.iter().filter(|unit| unit.accepts(entry.level)) {
            match unit.write(entry, fields) {
                Ok(bytes) => {
                    dispatch.written += 1;
                    dispatch.bytes += bytes;
                }
                Err(err) => dispatch.failures.push((Arc::clone(&unit.name), err)),
            }
        }
        dispatch
    }

    /// Fan-out whose units all carry `fields` as context
    pub fn with_fields(&self, fields: &[Field]) -> Self {
        Self {
            units: self
                .units
                .iter()
                .map(|unit| unit.with_fields(fields))
                .collect(),
        }
    }

    /// Sync every sink, returning the first failure
    pub fn sync(&self) -> Result<()> {
        let mut first = None;
        for unit in &self.units {
            if let Err(source) = unit.sync() {
                first.get_or_insert(Error::sink(unit.name(), "sync", source));
            }
        }
        first.map_or(Ok(()), Err)
    }

    /// Close every sink, returning the first failure
    pub fn close(&self) -> Result<()> {
        let mut first = None;
        for unit in &self.units {
            if let Err(source) = unit.close() {
                first.get_or_insert(Error::sink(unit.name(), "close", source));
            }
        }
        first.map_or(Ok(()), Err)
    }
}

#[cfg(test)]
#[path = "unit_test.rs"]
mod unit_test;
