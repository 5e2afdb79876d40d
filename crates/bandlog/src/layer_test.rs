//! Tests for the `tracing` bridge

use std::sync::Arc;

use bandlog_core::{
    BufferPool, EncoderConfig, Level, LockedWriter, new_json_encoder, new_plain_encoder,
};
use tracing_subscriber::prelude::*;

use crate::band::SeverityBand;
use crate::logger::Logger;
use crate::unit::{FanOut, ProcessingUnit};

type Capture = Arc<LockedWriter<Vec<u8>>>;

fn capture() -> Capture {
    Arc::new(LockedWriter::new(Vec::new()))
}

fn lines(sink: &Capture) -> Vec<String> {
    sink.with_inner(|buf| {
        String::from_utf8_lossy(buf)
            .lines()
            .map(str::to_string)
            .collect()
    })
}

#[test]
fn test_events_route_by_level() {
    let pool = Arc::new(BufferPool::default());
    let access = capture();
    let errors = capture();
    let logger = Logger::new(
        FanOut::new(vec![
            ProcessingUnit::new(
                "access",
                new_plain_encoder(EncoderConfig::default(), Arc::clone(&pool)),
                access.clone(),
                SeverityBand::between(Level::Debug, Level::Warn),
                Arc::clone(&pool),
            ),
            ProcessingUnit::new(
                "error",
                new_plain_encoder(EncoderConfig::default(), Arc::clone(&pool)),
                errors.clone(),
                SeverityBand::at_least(Level::Warn),
                Arc::clone(&pool),
            ),
        ]),
        false,
    );

    let subscriber = tracing_subscriber::registry().with(logger.layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::info!(path = "/users", status = 200, "request");
        tracing::error!(path = "/orders", retry = false, "upstream failed");
        tracing::trace!(path = "/ignored", "below every band");
    });

    assert_eq!(lines(&access), vec!["[info] path=/users||status=200"]);
    assert_eq!(lines(&errors), vec!["[error] path=/orders||retry=false"]);
    assert_eq!(logger.metrics().snapshot().records_written, 2);
}

#[test]
fn test_event_metadata_becomes_entry() {
    let pool = Arc::new(BufferPool::default());
    let sink = capture();
    let logger = Logger::new(
        FanOut::new(vec![ProcessingUnit::new(
            "all",
            new_json_encoder(EncoderConfig::default(), Arc::clone(&pool)),
            sink.clone(),
            SeverityBand::at_least(Level::Trace),
            pool,
        )]),
        true,
    );

    let subscriber = tracing_subscriber::registry().with(logger.layer());
    tracing::subscriber::with_default(subscriber, || {
        tracing::warn!(target: "billing", amount = 12.5, user = ?("alice", 3), "charge declined");
    });

    let record: serde_json::Value = serde_json::from_str(&lines(&sink)[0]).unwrap();
    assert_eq!(record["level"], "warn");
    assert_eq!(record["logger"], "billing");
    assert_eq!(record["msg"], "charge declined");
    assert_eq!(record["amount"], 12.5);
    assert_eq!(record["user"], "(\"alice\", 3)");
    assert!(
        record["caller"]
            .as_str()
            .unwrap()
            .contains("layer_test.rs:")
    );
}
