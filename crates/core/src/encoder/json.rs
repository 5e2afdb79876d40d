//! JSON encoder
//!
//! One JSON object per record. Entry metadata comes first under the
//! configured keys, then context fields, then the record's own fields:
//!
//! ```text
//! {"level":"warn","time":"2024-05-01T10:00:00Z","msg":"slow query","ms":812}
//! ```

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
use crate::error::Result;
use crate::field::{ArrayMarshaler, Field, ObjectMarshaler, ReflectedValue};

/// JSON object encoder
pub struct JsonEncoder {
    buf: BytesMut,
    config: Arc<EncoderConfig>,
    pool: Arc<BufferPool>,
    open_namespaces: usize,
}

impl JsonEncoder {
    pub fn new(config: EncoderConfig, pool: Arc<BufferPool>) -> Self {
        Self {
            buf: pool.checkout(),
            config: Arc::new(config),
            pool,
            open_namespaces: 0,
        }
    }

    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    fn sibling(&self) -> Self {
        Self {
            buf: self.pool.checkout(),
            config: Arc::clone(&self.config),
            pool: Arc::clone(&self.pool),
            open_namespaces: 0,
        }
    }

    fn take_buffer(&mut self) -> BytesMut {
        mem::take(&mut self.buf)
    }

    fn add_element_separator(&mut self) {
        match self.buf.last() {
            None | Some(b'{' | b'[' | b':' | b',') => {}
            Some(_) => self.buf.put_u8(b','),
        }
    }

    fn add_key(&mut self, key: &str) {
        self.add_element_separator();
        self.write_string(key);
        self.buf.put_u8(b':');
    }

    /// Quoted, escaped JSON string
    fn write_string(&mut self, value: &str) {
        let _ = serde_json::to_writer((&mut self.buf).writer(), value);
    }

    fn close_open_namespaces(&mut self) {
        for _ in 0..self.open_namespaces {
            self.buf.put_u8(b'}');
        }
        self.open_namespaces = 0;
    }

    fn append_float(&mut self, value: f64, text: impl fmt::Display) {
        self.add_element_separator();
        if value.is_nan() {
            self.buf.extend_from_slice(b"\"NaN\"");
        } else if value == f64::INFINITY {
            self.buf.extend_from_slice(b"\"+Inf\"");
        } else if value == f64::NEG_INFINITY {
            self.buf.extend_from_slice(b"\"-Inf\"");
        } else {
            let _ = write!(self.buf, "{text}");
        }
    }
}

impl Clone for JsonEncoder {
    fn clone(&self) -> Self {
        let mut copy = self.sibling();
        copy.buf.extend_from_slice(&self.buf);
        copy.open_namespaces = self.open_namespaces;
        copy
    }
}

impl Drop for JsonEncoder {
    fn drop(&mut self) {
        let buf = self.take_buffer();
        if buf.capacity() > 0 {
            self.pool.checkin(buf);
        }
    }
}

impl fmt::Debug for JsonEncoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonEncoder")
            .field("buffered", &String::from_utf8_lossy(&self.buf))
            .field("open_namespaces", &self.open_namespaces)
            .field("config", &self.config)
            .finish()
    }
}

impl PrimitiveArrayEncoder for JsonEncoder {
    fn append_bool(&mut self, value: bool) {
        self.add_element_separator();
        let text: &[u8] = if value { b"true" } else { b"false" };
        self.buf.extend_from_slice(text);
    }

    fn append_byte_string(&mut self, value: &[u8]) {
        self.add_element_separator();
        self.write_string(&String::from_utf8_lossy(value));
    }

    fn append_complex(&mut self, re: f64, im: f64) {
        self.add_element_separator();
        let _ = write!(self.buf, "\"{re}+{im}i\"");
    }

    fn append_f64(&mut self, value: f64) {
        self.append_float(value, value);
    }

    fn append_f32(&mut self, value: f32) {
        self.append_float(f64::from(value), value);
    }

    fn append_i64(&mut self, value: i64) {
        self.add_element_separator();
        let _ = write!(self.buf, "{value}");
    }

    fn append_u64(&mut self, value: u64) {
        self.add_element_separator();
        let _ = write!(self.buf, "{value}");
    }

    fn append_str(&mut self, value: &str) {
        self.add_element_separator();
        self.write_string(value);
    }
}

impl ArrayEncoder for JsonEncoder {
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
        self.add_element_separator();
        self.buf.put_u8(b'[');
        let result = value.marshal_log_array(self);
        self.buf.put_u8(b']');
        result
    }

    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()> {
        self.add_element_separator();
        self.buf.put_u8(b'{');
        let outer = mem::replace(&mut self.open_namespaces, 0);
        let result = value.marshal_log_object(self);
        self.close_open_namespaces();
        self.open_namespaces = outer;
        self.buf.put_u8(b'}');
        result
    }

    fn append_reflected(&mut self, value: Option<&dyn ReflectedValue>) -> Result<()> {
        let json = reflect(value)?;
        self.add_element_separator();
        self.buf.extend_from_slice(&json);
        Ok(())
    }
}

impl ObjectEncoder for JsonEncoder {
    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()> {
        self.add_key(key);
        self.append_array(value)
    }

    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()> {
        self.add_key(key);
        self.append_object(value)
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

    fn open_namespace(&mut self, key: &str) {
        self.add_key(key);
        self.buf.put_u8(b'{');
        self.open_namespaces += 1;
    }
}

impl Encoder for JsonEncoder {
    fn clone_encoder(&self) -> Box<dyn Encoder> {
        Box::new(self.clone())
    }

    fn add_fields(&mut self, fields: &[Field]) {
        for field in fields {
            field.add_to(self);
        }
    }

    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<BytesMut> {
        let config = &self.config;
        let mut line = self.sibling();
        line.buf.put_u8(b'{');

        if !config.level_key.is_empty() {
            line.add_key(&config.level_key);
            let before = line.buf.len();
            if let Some(render) = config.encode_level {
                render(entry.level, &mut line);
            }
            if line.buf.len() == before {
                line.append_str(entry.level.as_str());
            }
        }

        if !config.time_key.is_empty() {
            line.add_key(&config.time_key);
            line.append_time(entry.time);
        }

        if !config.name_key.is_empty()
            && let Some(name) = &entry.logger_name
        {
            line.add_key(&config.name_key);
            line.append_str(name);
        }

        if !config.caller_key.is_empty()
            && let Some(caller) = entry.caller
        {
            line.add_key(&config.caller_key);
            let before = line.buf.len();
            if let Some(render) = config.encode_caller {
                render(caller, &mut line);
            }
            if line.buf.len() == before {
                line.append_str(&caller.to_string());
            }
        }

        if !config.message_key.is_empty() {
            line.add_key(&config.message_key);
            line.append_str(&entry.message);
        }

        if !self.buf.is_empty() {
            line.add_element_separator();
            line.buf.extend_from_slice(&self.buf);
        }
        line.open_namespaces = self.open_namespaces;

        for field in fields {
            field.add_to(&mut line);
        }

        line.close_open_namespaces();
        line.buf.put_u8(b'}');
        line.buf.extend_from_slice(config.line_ending.as_bytes());

        Ok(line.take_buffer())
    }

    fn buffered(&self) -> &[u8] {
        &self.buf
    }
}

#[cfg(test)]
#[path = "json_test.rs"]
mod json_test;
