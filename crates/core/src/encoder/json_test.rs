//! Tests for the JSON encoder

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use serde_json::{Value, json};

use crate::buffer_pool::BufferPool;
use crate::encoder::{Encoder, EncoderConfig, JsonEncoder, ObjectEncoder, renderers};
use crate::entry::{Caller, Entry};
use crate::error::Result;
use crate::field::{Field, ObjectMarshaler};
use crate::level::Level;

/// Default keys with no timestamp and no newline
fn untimed() -> EncoderConfig {
    let mut config = EncoderConfig::default().with_line_ending("");
    config.time_key.clear();
    config
}

fn encoder(config: EncoderConfig) -> JsonEncoder {
    JsonEncoder::new(config, Arc::new(BufferPool::default()))
}

fn render(enc: &JsonEncoder, entry: &Entry, fields: &[Field]) -> String {
    let buf = enc.encode_entry(entry, fields).unwrap();
    String::from_utf8(buf.to_vec()).unwrap()
}

fn parse(line: &str) -> Value {
    serde_json::from_str(line).unwrap()
}

struct Request {
    id: u64,
    path: &'static str,
}

impl ObjectMarshaler for Request {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()> {
        enc.add_u64("id", self.id);
        enc.add_str("path", self.path);
        Ok(())
    }
}

#[test]
fn test_metadata_then_fields() {
    let enc = encoder(untimed());
    let line = render(
        &enc,
        &Entry::new(Level::Info, "hello"),
        &[Field::string("user", "alice")],
    );
    assert_eq!(line, r#"{"level":"info","msg":"hello","user":"alice"}"#);
}

#[test]
fn test_no_fields_is_valid() {
    let enc = encoder(untimed());
    let line = render(&enc, &Entry::new(Level::Error, "bare"), &[]);
    assert_eq!(line, r#"{"level":"error","msg":"bare"}"#);
}

#[test]
fn test_default_line_ending() {
    let mut config = EncoderConfig::default();
    config.time_key.clear();
    let enc = encoder(config);
    let line = render(&enc, &Entry::new(Level::Info, "m"), &[]);
    assert!(line.ends_with("}\n"));
}

#[test]
fn test_time_logger_and_caller() {
    let config = untimed().with_time_renderer(Some(renderers::epoch_nanos_time));
    let mut config = config;
    config.time_key = "time".to_string();
    let enc = encoder(config);

    let entry = Entry::new(Level::Warn, "slow")
        .with_time(Utc.timestamp_opt(2, 5).unwrap())
        .with_logger_name("db")
        .with_caller(Caller::new("src/store/query.rs", 42));
    let line = render(&enc, &entry, &[]);

    assert_eq!(
        line,
        r#"{"level":"warn","time":2000000005,"logger":"db","caller":"store/query.rs:42","msg":"slow"}"#
    );
}

#[test]
fn test_strings_are_escaped() {
    let enc = encoder(untimed());
    let line = render(
        &enc,
        &Entry::new(Level::Info, "say \"hi\"\n"),
        &[Field::string("path", "C:\\tmp")],
    );
    let value = parse(&line);
    assert_eq!(value["msg"], "say \"hi\"\n");
    assert_eq!(value["path"], "C:\\tmp");
}

#[test]
fn test_typed_values() {
    let enc = encoder(untimed());
    let line = render(
        &enc,
        &Entry::new(Level::Info, "m"),
        &[
            Field::ints("ints", [1, 2, 3]),
            Field::bool("ok", false),
            Field::f64("ratio", 0.5),
            Field::f64("nan", f64::NAN),
            Field::binary("bin", b"hello".to_vec()),
            Field::duration("wait", Duration::from_millis(250)),
            Field::null("nothing"),
            Field::reflected("tags", vec!["a", "b"]),
        ],
    );
    let value = parse(&line);
    assert_eq!(value["ints"], json!([1, 2, 3]));
    assert_eq!(value["ok"], json!(false));
    assert_eq!(value["ratio"], json!(0.5));
    assert_eq!(value["nan"], json!("NaN"));
    assert_eq!(value["bin"], json!("aGVsbG8="));
    assert_eq!(value["wait"], json!(250));
    assert_eq!(value["nothing"], Value::Null);
    assert_eq!(value["tags"], json!(["a", "b"]));
}

#[test]
fn test_nested_object() {
    let enc = encoder(untimed());
    let line = render(
        &enc,
        &Entry::new(Level::Info, "m"),
        &[Field::object(
            "req",
            Request {
                id: 7,
                path: "/users",
            },
        )],
    );
    let value = parse(&line);
    assert_eq!(value["req"], json!({"id": 7, "path": "/users"}));
}

#[test]
fn test_namespace_nests_following_fields() {
    let enc = encoder(untimed());
    let line = render(
        &enc,
        &Entry::new(Level::Info, "m"),
        &[
            Field::i64("a", 1),
            Field::namespace("ns"),
            Field::i64("b", 2),
        ],
    );
    assert_eq!(line, r#"{"level":"info","msg":"m","a":1,"ns":{"b":2}}"#);
}

#[test]
fn test_context_namespace_stays_open_for_record_fields() {
    let mut enc = encoder(untimed());
    enc.add_fields(&[Field::namespace("ctx"), Field::i64("id", 9)]);

    let line = render(&enc, &Entry::new(Level::Info, "m"), &[Field::i64("n", 1)]);
    assert_eq!(line, r#"{"level":"info","msg":"m","ctx":{"id":9,"n":1}}"#);
}

#[test]
fn test_clone_is_independent() {
    let mut enc = encoder(untimed());
    enc.add_fields(&[Field::string("service", "api")]);

    let mut child = enc.clone_encoder();
    child.add_fields(&[Field::i64("req", 1)]);

    assert_eq!(enc.buffered(), br#""service":"api""#);
    assert_eq!(child.buffered(), br#""service":"api","req":1"#);

    let line = render(&enc, &Entry::new(Level::Info, "m"), &[]);
    assert_eq!(line, r#"{"level":"info","msg":"m","service":"api"}"#);
}

#[test]
fn test_output_is_valid_json() {
    let enc = encoder(EncoderConfig::default());
    let entry = Entry::new(Level::Debug, "full").with_caller(Caller::here());
    let line = render(
        &enc,
        &entry,
        &[
            Field::complex("z", 1.0, -1.0),
            Field::time("at", Utc.timestamp_opt(0, 0).unwrap()),
        ],
    );
    let value = parse(line.trim_end());
    assert_eq!(value["level"], "debug");
    assert_eq!(value["z"], "1+-1i");
    assert!(value["caller"].as_str().unwrap().contains("json_test.rs"));
}
