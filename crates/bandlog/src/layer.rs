//! `tracing` bridge
//!
//! [`BandedLayer`] turns `tracing` events into records: the event level
//! picks the destination, the `message` field becomes the entry message,
//! the target becomes the logger name and every other field is carried as
//! a typed [`Field`].
//!
//! Events raised while the logger itself is writing (including its own
//! diagnostics) are skipped so a failing destination cannot feed itself.

use std::borrow::Cow;
use std::fmt;

use bandlog_core::{Caller, Entry, Field, Level};
use tracing::field::{Field as EventField, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use crate::logger::{Logger, is_dispatching};

/// Layer writing `tracing` events to a banded logger
#[derive(Debug, Clone)]
pub struct BandedLayer {
    logger: Logger,
}

impl BandedLayer {
    pub fn new(logger: Logger) -> Self {
        Self { logger }
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

impl<S: Subscriber> Layer<S> for BandedLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if is_dispatching() {
            return;
        }

        let metadata = event.metadata();
        let level = Level::from(*metadata.level());
        if !self.logger.enabled(level) {
            return;
        }

        let mut collector = FieldCollector::default();
        event.record(&mut collector);

        let mut entry = Entry::new(level, collector.message).with_logger_name(metadata.target());
        if self.logger.add_caller()
            && let (Some(file), Some(line)) = (metadata.file(), metadata.line())
        {
            entry = entry.with_caller(Caller::new(file, line));
        }

        // failures are counted and reported by the logger
        let _ = self.logger.log_entry(&entry, &collector.fields);
    }
}

/// Collects event fields in recording order
#[derive(Default)]
struct FieldCollector {
    message: String,
    fields: Vec<Field>,
}

impl FieldCollector {
    fn push(&mut self, field: &EventField, make: impl FnOnce(Cow<'static, str>) -> Field) {
        self.fields.push(make(Cow::Borrowed(field.name())));
    }
}

impl Visit for FieldCollector {
    fn record_f64(&mut self, field: &EventField, value: f64) {
        self.push(field, |key| Field::f64(key, value));
    }

    fn record_i64(&mut self, field: &EventField, value: i64) {
        self.push(field, |key| Field::i64(key, value));
    }

    fn record_u64(&mut self, field: &EventField, value: u64) {
        self.push(field, |key| Field::u64(key, value));
    }

    fn record_i128(&mut self, field: &EventField, value: i128) {
        match i64::try_from(value) {
            Ok(value) => self.record_i64(field, value),
            Err(_) => self.push(field, |key| Field::string(key, value.to_string())),
        }
    }

    fn record_u128(&mut self, field: &EventField, value: u128) {
        match u64::try_from(value) {
            Ok(value) => self.record_u64(field, value),
            Err(_) => self.push(field, |key| Field::string(key, value.to_string())),
        }
    }

    fn record_bool(&mut self, field: &EventField, value: bool) {
        self.push(field, |key| Field::bool(key, value));
    }

    fn record_str(&mut self, field: &EventField, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.push(field, |key| Field::string(key, value.to_string()));
        }
    }

    fn record_bytes(&mut self, field: &EventField, value: &[u8]) {
        self.push(field, |key| Field::binary(key, value));
    }

    fn record_error(&mut self, field: &EventField, value: &(dyn std::error::Error + 'static)) {
        self.push(field, |key| Field::string(key, value.to_string()));
    }

    fn record_debug(&mut self, field: &EventField, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.push(field, |key| Field::string(key, format!("{value:?}")));
        }
    }
}

#[cfg(test)]
#[path = "layer_test.rs"]
mod layer_test;
