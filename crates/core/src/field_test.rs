//! Tests for fields and their dispatch onto encoders

use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::encoder::{ArrayEncoder, ObjectEncoder, PrimitiveArrayEncoder};
use crate::entry::Caller;
use crate::error::{EncodeError, Result};
use crate::field::{ArrayMarshaler, Field, FieldValue, ObjectMarshaler, ReflectedValue};

/// Records every call as `method(key)` text
#[derive(Default)]
struct Recorder {
    calls: Vec<String>,
}

impl PrimitiveArrayEncoder for Recorder {
    fn append_bool(&mut self, value: bool) {
        self.calls.push(format!("bool {value}"));
    }
    fn append_byte_string(&mut self, value: &[u8]) {
        self.calls.push(format!("bytes {}", value.len()));
    }
    fn append_complex(&mut self, re: f64, im: f64) {
        self.calls.push(format!("complex {re} {im}"));
    }
    fn append_f64(&mut self, value: f64) {
        self.calls.push(format!("f64 {value}"));
    }
    fn append_f32(&mut self, value: f32) {
        self.calls.push(format!("f32 {value}"));
    }
    fn append_i64(&mut self, value: i64) {
        self.calls.push(format!("i64 {value}"));
    }
    fn append_u64(&mut self, value: u64) {
        self.calls.push(format!("u64 {value}"));
    }
    fn append_str(&mut self, value: &str) {
        self.calls.push(format!("str {value}"));
    }
}

impl ArrayEncoder for Recorder {
    fn append_duration(&mut self, value: Duration) {
        self.calls.push(format!("duration {}", value.as_millis()));
    }
    fn append_time(&mut self, value: DateTime<Utc>) {
        self.calls.push(format!("time {}", value.timestamp()));
    }
    fn append_array(&mut self, value: &dyn ArrayMarshaler) -> Result<()> {
        value.marshal_log_array(self)
    }
    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()> {
        value.marshal_log_object(self)
    }
    fn append_reflected(&mut self, value: Option<&dyn ReflectedValue>) -> Result<()> {
        self.calls.push(format!("reflected {}", value.is_some()));
        Ok(())
    }
}

impl ObjectEncoder for Recorder {
    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()> {
        self.calls.push(format!("array({key})"));
        self.append_array(value)
    }
    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()> {
        self.calls.push(format!("object({key})"));
        self.append_object(value)
    }
    fn add_binary(&mut self, key: &str, _value: &[u8]) {
        self.calls.push(format!("binary({key})"));
    }
    fn add_byte_string(&mut self, key: &str, _value: &[u8]) {
        self.calls.push(format!("byte_string({key})"));
    }
    fn add_bool(&mut self, key: &str, _value: bool) {
        self.calls.push(format!("bool({key})"));
    }
    fn add_complex(&mut self, key: &str, _re: f64, _im: f64) {
        self.calls.push(format!("complex({key})"));
    }
    fn add_duration(&mut self, key: &str, _value: Duration) {
        self.calls.push(format!("duration({key})"));
    }
    fn add_f64(&mut self, key: &str, _value: f64) {
        self.calls.push(format!("f64({key})"));
    }
    fn add_f32(&mut self, key: &str, _value: f32) {
        self.calls.push(format!("f32({key})"));
    }
    fn add_i64(&mut self, key: &str, _value: i64) {
        self.calls.push(format!("i64({key})"));
    }
    fn add_u64(&mut self, key: &str, _value: u64) {
        self.calls.push(format!("u64({key})"));
    }
    fn add_str(&mut self, key: &str, value: &str) {
        self.calls.push(format!("str({key}) {value}"));
    }
    fn add_time(&mut self, key: &str, _value: DateTime<Utc>) {
        self.calls.push(format!("time({key})"));
    }
    fn add_reflected(&mut self, key: &str, value: Option<&dyn ReflectedValue>) -> Result<()> {
        if let Some(value) = value {
            value.to_json()?;
        }
        self.calls.push(format!("reflected({key})"));
        Ok(())
    }
    fn open_namespace(&mut self, key: &str) {
        self.calls.push(format!("namespace({key})"));
    }
}

struct Failing;

impl ArrayMarshaler for Failing {
    fn marshal_log_array(&self, _enc: &mut dyn ArrayEncoder) -> Result<()> {
        Err(EncodeError::marshal("disk on fire"))
    }
}

#[test]
fn test_add_to_dispatches_by_type() {
    let fields = [
        Field::bool("b", true),
        Field::i64("i", -1),
        Field::u64("u", 1u32),
        Field::usize("n", 4),
        Field::f64("f", 1.0),
        Field::f32("g", 1.0),
        Field::complex("c", 1.0, 2.0),
        Field::duration("d", Duration::from_secs(1)),
        Field::time("t", DateTime::<Utc>::UNIX_EPOCH),
        Field::string("s", "v"),
        Field::byte_string("bs", "v"),
        Field::binary("bin", vec![0u8, 1]),
        Field::null("r"),
        Field::namespace("ns"),
    ];

    let mut recorder = Recorder::default();
    for field in &fields {
        field.add_to(&mut recorder);
    }

    assert_eq!(
        recorder.calls,
        [
            "bool(b)",
            "i64(i)",
            "u64(u)",
            "u64(n)",
            "f64(f)",
            "f32(g)",
            "complex(c)",
            "duration(d)",
            "time(t)",
            "str(s) v",
            "byte_string(bs)",
            "binary(bin)",
            "reflected(r)",
            "namespace(ns)",
        ]
    );
}

#[test]
fn test_array_helpers_append_each_element() {
    let mut recorder = Recorder::default();
    Field::ints("ints", [1, 2]).add_to(&mut recorder);
    Field::strings("tags", ["x"]).add_to(&mut recorder);
    Field::floats("fs", [0.5]).add_to(&mut recorder);
    Field::uints("us", [7]).add_to(&mut recorder);

    assert_eq!(
        recorder.calls,
        [
            "array(ints)",
            "i64 1",
            "i64 2",
            "array(tags)",
            "str x",
            "array(fs)",
            "f64 0.5",
            "array(us)",
            "u64 7",
        ]
    );
}

#[test]
fn test_failed_value_becomes_error_field() {
    let mut recorder = Recorder::default();
    Field::array("items", Failing).add_to(&mut recorder);

    assert_eq!(
        recorder.calls,
        ["array(items)", "str(itemsError) marshal failed: disk on fire"]
    );
}

#[test]
fn test_error_helper_uses_display() {
    let err = std::io::Error::other("broken pipe");
    let field = Field::error(&err);
    assert_eq!(field.key, "error");
    assert!(matches!(field.value, FieldValue::Str(ref s) if s == "broken pipe"));
}

#[test]
fn test_reflected_value_renders_json() {
    let value = vec![1, 2];
    assert_eq!(value.to_json().unwrap(), b"[1,2]");
}

#[test]
fn test_debug_does_not_expose_binary_contents() {
    let field = Field::binary("secret", vec![1u8, 2, 3]);
    assert_eq!(format!("{:?}", field.value), "Binary(3 bytes)");
}

#[test]
fn test_caller_trimmed_path() {
    assert_eq!(Caller::new("src/a/b/c.rs", 7).trimmed(), "b/c.rs:7");
    assert_eq!(Caller::new("c.rs", 7).trimmed(), "c.rs:7");
    assert_eq!(Caller::new("b/c.rs", 7).trimmed(), "b/c.rs:7");
    assert_eq!(Caller::new("src/a/b/c.rs", 7).to_string(), "src/a/b/c.rs:7");
}
