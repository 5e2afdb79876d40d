//! Plain field encoder
//!
//! Renders a record as a single flat line:
//!
//! ```text
//! [warn] user=alice||ints=1,2,3||latency=12
//! ```
//!
//! The bracketed level is written only when a level key and renderer are
//! configured. Fields are joined by `||`, keys and values by `=`, array
//! elements by `,`. Nested objects flatten into the same line with `||`.
//! Neither separator is escaped inside values.

use std::fmt::{self, Write as _};
use std::mem;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use bytes::{BufMut, BytesMut};
use chrono::{DateTime, Utc};

use super::{
    ArrayEncoder, Encoder, EncoderConfig, ObjectEncoder, PrimitiveArrayEncoder, duration_nanos,
    epoch_millis, reflect,
};
use crate::buffer_pool::BufferPool;
use crate::entry::Entry;
use crate::error::{EncodeError, Result};
use crate::field::{ArrayMarshaler, Field, ObjectMarshaler, ReflectedValue};

/// Joins top-level and nested object fields
const CONNECTOR: &[u8] = b"||";

/// Joins a key and its value
const KEY_SEPARATOR: u8 = b'=';

/// Joins array elements
const ELEMENT_SEPARATOR: u8 = b',';

/// Flat `key=value` encoder
pub struct PlainEncoder {
    buf: BytesMut,
    config: Arc<EncoderConfig>,
    pool: Arc<BufferPool>,
}

impl PlainEncoder {
    pub fn new(config: EncoderConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            buf: pool.checkout(),
            config: Arc::new(config),
            pool,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    /// Empty encoder sharing this one's configuration and pool
    fn sibling(&self) -> Self {
        Self {
            buf: self.pool.checkout(),
            config: Arc::clone(&self.config),
            pool: Arc::clone(&self.pool),
        }
    }

    fn take_buffer(&mut self) -> BytesMut {
        mem::take(&mut self.buf)
    }

    fn add_key(&mut self, key: &str) {
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.put_u8(KEY_SEPARATOR);
    }

    /// Write fields joined by the connector; `first` means nothing precedes them
    fn append_fields(&mut self, fields: &[Field], mut first: bool) {
        for field in fields {
            // namespaces write nothing, so they get no connector either
            if field.is_namespace() {
                field.add_to(self);
                continue;
            }
            if !first {
                self.buf.extend_from_slice(CONNECTOR);
            }
            first = false;
            field.add_to(self);
        }
    }

    /// Run `write`; on failure drop everything written since `mark`
    fn rewind_on_error(
        &mut self,
        mark: usize,
        write: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<()> {
        let result = write(self);
        if result.is_err() {
            self.buf.truncate(mark);
        }
        result
    }

    fn append_non_finite(&mut self, value: f64) -> bool {
        let literal: &[u8] = if value.is_nan() {
            b"\"NaN\""
        } else if value == f64::INFINITY {
            b"\"+Inf\""
        } else if value == f64::NEG_INFINITY {
            b"\"-Inf\""
        } else {
            return false;
        };
        self.buf.extend_from_slice(literal);
        true
    }
}

impl Clone for PlainEncoder {
    fn clone(&self) -> Self {
        let mut copy = self.sibling();
        copy.buf.extend_from_slice(&self.buf);
        copy
    }
}

impl Drop for PlainEncoder {
    fn drop(&mut self) {
        let buf = self.take_buffer();
        if buf.capacity() > 0 {
            self.pool.checkin(buf);
        }
    }
}

impl fmt::Debug for PlainEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlainEncoder")
            .field("buffered", &String::from_utf8_lossy(&self.buf))
            .field("config", &self.config)
            .finish()
    }
}

// =============================================================================
// Scalars
// =============================================================================

impl PrimitiveArrayEncoder for PlainEncoder {
    fn append_bool(&mut self, value: bool) {
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(text);
    }

    fn append_byte_string(&mut self, value: &[u8]) {
        self.buf.extend_from_slice(value);
    }

    fn append_complex(&mut self, re: f64, im: f64) {
        let _ = write!(self.buf, "\"{re}+{im}i\"");
    }

    fn append_f64(&mut self, value: f64) {
        if !self.append_non_finite(value) {
            let _ = write!(self.buf, "{value}");
        }
    }

    fn append_f32(&mut self, value: f32) {
        if !self.append_non_finite(f64::from(value)) {
            let _ = write!(self.buf, "{value}");
        }
    }

    fn append_i64(&mut self, value: i64) {
        let _ = write!(self.buf, "{value}");
    }

    fn append_u64(&mut self, value: u64) {
        let _ = write!(self.buf, "{value}");
    }

    fn append_str(&mut self, value: &str) {
        self.buf.extend_from_slice(value.as_bytes());
    }
}

impl ArrayEncoder for PlainEncoder {
    fn append_duration(&mut self, value: Duration) {
        let before = self.buf.len();
        if let Some(render) = self.config.encode_duration {
            render(value, self);
        }
        if self.buf.len() == before {
            self.append_u64(duration_nanos(value));
        }
    }

    fn append_time(&mut self, value: DateTime<Utc>) {
        let before = self.buf.len();
        if let Some(render) = self.config.encode_time {
            render(value, self);
        }
        if self.buf.len() == before {
            self.append_i64(epoch_millis(value));
        }
    }

    fn append_array(&mut self, value: &dyn ArrayMarshaler) -> Result<()> {
        value.marshal_log_array(&mut PlainArray::new(self))
    }

    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()> {
        value.marshal_log_object(&mut PlainObject::new(self))
    }

    fn append_reflected(&mut self, value: Option<&dyn ReflectedValue>) -> Result<()> {
        let json = reflect(value)?;
        self.buf.extend_from_slice(&json);
        Ok(())
    }
}

// =============================================================================
// Keyed values
// =============================================================================

impl ObjectEncoder for PlainEncoder {
    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()> {
        let mark = self.buf.len();
        self.add_key(key);
        self.rewind_on_error(mark, |enc| enc.append_array(value))
    }

    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()> {
        let mark = self.buf.len();
        self.add_key(key);
        self.rewind_on_error(mark, |enc| enc.append_object(value))
    }

    fn add_binary(&mut self, key: &str, value: &[u8]) {
        self.add_str(key, &STANDARD.encode(value));
    }

    fn add_byte_string(&mut self, key: &str, value: &[u8]) {
        self.add_key(key);
        self.append_byte_string(value);
    }

    fn add_bool(&mut self, key: &str, value: bool) {
        self.add_key(key);
        self.append_bool(value);
    }

    fn add_complex(&mut self, key: &str, re: f64, im: f64) {
        self.add_key(key);
        self.append_complex(re, im);
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        self.add_key(key);
        self.append_duration(value);
    }

    fn add_f64(&mut self, key: &str, value: f64) {
        self.add_key(key);
        self.append_f64(value);
    }

    fn add_f32(&mut self, key: &str, value: f32) {
        self.add_key(key);
        self.append_f32(value);
    }

    fn add_i64(&mut self, key: &str, value: i64) {
        self.add_key(key);
        self.append_i64(value);
    }

    fn add_u64(&mut self, key: &str, value: u64) {
        self.add_key(key);
        self.append_u64(value);
    }

    fn add_str(&mut self, key: &str, value: &str) {
        self.add_key(key);
        self.append_str(value);
    }

    fn add_time(&mut self, key: &str, value: DateTime<Utc>) {
        self.add_key(key);
        self.append_time(value);
    }

    fn add_reflected(&mut self, key: &str, value: Option<&dyn ReflectedValue>) -> Result<()> {
        let json = reflect(value)?;
        self.add_key(key);
        self.buf.extend_from_slice(&json);
        Ok(())
    }

    fn open_namespace(&mut self, _key: &str) {}
}

impl Encoder for PlainEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone())
    }

    fn add_fields(&mut self, fields: &[Field]) {
        let first = self.buf.is_empty();
        self.append_fields(fields, first);
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<BytesMut> {
        if fields.is_empty() && self.buf.is_empty() {
            return Err(EncodeError::EmptyRecord);
        }

        let mut line = self.sibling();
        if !self.config.level_key.is_empty()
            && let Some(render) = self.config.encode_level
        {
            line.buf.put_u8(b'[');
            let start = line.buf.len();
            render(entry.level, &mut line);
            if line.buf.len() == start {
                line.buf.extend_from_slice(entry.level.as_str().as_bytes());
            }
            line.buf.extend_from_slice(b"] ");
        }

        line.buf.extend_from_slice(&self.buf);
        line.append_fields(fields, self.buf.is_empty());
        line.buf.extend_from_slice(self.config.line_ending.as_bytes());

        Ok(line.take_buffer())
    }

    fn buffered(&self) -> &[u8] {
        &self.buf
    }
}

// =============================================================================
// Nested structures
// =============================================================================

/// Array elements written into the parent encoder, comma-separated
struct PlainArray<'a> {
    enc: &'a mut PlainEncoder,
    first: bool,
}

impl<'a> PlainArray<'a> {
    fn new(enc: &'a mut PlainEncoder) -> Self {
        Self { enc, first: true }
    }

    fn separate(&mut self) {
        if !self.first {
            self.enc.buf.put_u8(ELEMENT_SEPARATOR);
        }
        self.first = false;
    }

    fn undo_on_error(
        &mut self,
        mark: usize,
        first: bool,
        write: impl FnOnce(&mut PlainEncoder) -> Result<()>,
    ) -> Result<()> {
        let result = self.enc.rewind_on_error(mark, write);
        if result.is_err() {
            self.first = first;
        }
        result
    }
}

impl PrimitiveArrayEncoder for PlainArray<'_> {
    fn append_bool(&mut self, value: bool) {
        self.separate();
        self.enc.append_bool(value);
    }

    fn append_byte_string(&mut self, value: &[u8]) {
        self.separate();
        self.enc.append_byte_string(value);
    }

    fn append_complex(&mut self, re: f64, im: f64) {
        self.separate();
        self.enc.append_complex(re, im);
    }

    fn append_f64(&mut self, value: f64) {
        self.separate();
        self.enc.append_f64(value);
    }

    fn append_f32(&mut self, value: f32) {
        self.separate();
        self.enc.append_f32(value);
    }

    fn append_i64(&mut self, value: i64) {
        self.separate();
        self.enc.append_i64(value);
    }

    fn append_u64(&mut self, value: u64) {
        self.separate();
        self.enc.append_u64(value);
    }

    fn append_str(&mut self, value: &str) {
        self.separate();
        self.enc.append_str(value);
    }
}

impl ArrayEncoder for PlainArray<'_> {
    fn append_duration(&mut self, value: Duration) {
        self.separate();
        self.enc.append_duration(value);
    }

    fn append_time(&mut self, value: DateTime<Utc>) {
        self.separate();
        self.enc.append_time(value);
    }

    fn append_array(&mut self, value: &dyn ArrayMarshaler) -> Result<()> {
        let (mark, first) = (self.enc.buf.len(), self.first);
        self.separate();
        self.undo_on_error(mark, first, |enc| enc.append_array(value))
    }

    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()> {
        let (mark, first) = (self.enc.buf.len(), self.first);
        self.separate();
        self.undo_on_error(mark, first, |enc| enc.append_object(value))
    }

    fn append_reflected(&mut self, value: Option<&dyn ReflectedValue>) -> Result<()> {
        let json = reflect(value)?;
        self.separate();
        self.enc.buf.extend_from_slice(&json);
        Ok(())
    }
}

/// Object fields written into the parent encoder, joined by the connector
struct PlainObject<'a> {
    enc: &'a mut PlainEncoder,
    first: bool,
}

impl<'a> PlainObject<'a> {
    fn new(enc: &'a mut PlainEncoder) -> Self {
        Self { enc, first: true }
    }

    fn connect(&mut self) {
        if !self.first {
            self.enc.buf.extend_from_slice(CONNECTOR);
        }
        self.first = false;
    }

    fn undo_on_error(
        &mut self,
        mark: usize,
        first: bool,
        write: impl FnOnce(&mut PlainEncoder) -> Result<()>,
    ) -> Result<()> {
        let result = self.enc.rewind_on_error(mark, write);
        if result.is_err() {
            self.first = first;
        }
        result
    }
}

impl ObjectEncoder for PlainObject<'_> {
    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()> {
        let (mark, first) = (self.enc.buf.len(), self.first);
        self.connect();
        self.undo_on_error(mark, first, |enc| enc.add_array(key, value))
    }

    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()> {
        let (mark, first) = (self.enc.buf.len(), self.first);
        self.connect();
        self.undo_on_error(mark, first, |enc| enc.add_object(key, value))
    }

    fn add_binary(&mut self, key: &str, value: &[u8]) {
        self.connect();
        self.enc.add_binary(key, value);
    }

    fn add_byte_string(&mut self, key: &str, value: &[u8]) {
        self.connect();
        self.enc.add_byte_string(key, value);
    }

    fn add_bool(&mut self, key: &str, value: bool) {
        self.connect();
        self.enc.add_bool(key, value);
    }

    fn add_complex(&mut self, key: &str, re: f64, im: f64) {
        self.connect();
        self.enc.add_complex(key, re, im);
    }

    fn add_duration(&mut self, key: &str, value: Duration) {
        self.connect();
        self.enc.add_duration(key, value);
    }

    fn add_f64(&mut self, key: &str, value: f64) {
        self.connect();
        self.enc.add_f64(key, value);
    }

    fn add_f32(&mut self, key: &str, value: f32) {
        self.connect();
        self.enc.add_f32(key, value);
    }

    fn add_i64(&mut self, key: &str, value: i64) {
        self.connect();
        self.enc.add_i64(key, value);
    }

    fn add_u64(&mut self, key: &str, value: u64) {
        self.connect();
        self.enc.add_u64(key, value);
    }

    fn add_str(&mut self, key: &str, value: &str) {
        self.connect();
        self.enc.add_str(key, value);
    }

    fn add_time(&mut self, key: &str, value: DateTime<Utc>) {
        self.connect();
        self.enc.add_time(key, value);
    }

    fn add_reflected(&mut self, key: &str, value: Option<&dyn ReflectedValue>) -> Result<()> {
        let json = reflect(value)?;
        self.connect();
        self.enc.add_key(key);
        self.enc.buf.extend_from_slice(&json);
        Ok(())
    }

    fn open_namespace(&mut self, _key: &str) {}
}

#[cfg(test)]
#[path = "plain_test.rs"]
mod plain_test;
