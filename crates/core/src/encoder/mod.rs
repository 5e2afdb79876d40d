//! Field encoders
//!
//! Encoders turn a record plus its structured fields into bytes. The
//! capability traits mirror the three places a value can be written:
//!
//! - [`PrimitiveArrayEncoder`]: bare scalar values, the target of the
//!   configured renderers
//! - [`ArrayEncoder`]: elements of an array, including nested structures
//! - [`ObjectEncoder`]: keyed values
//!
//! [`Encoder`] adds cloning and record finalization on top of
//! [`ObjectEncoder`]. Two implementations ship with the crate:
//! [`PlainEncoder`] (`[level] k=v||k=v`) and [`JsonEncoder`].

mod config;
mod json;
mod plain;

pub use config::{
    CallerRenderer, DurationRenderer, EncoderConfig, LevelRenderer, TimeRenderer, renderers,
};
pub use json::JsonEncoder;
pub use plain::PlainEncoder;

use std::borrow::Cow;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use chrono::{DateTime, Utc};

use crate::buffer_pool::BufferPool;
use crate::entry::Entry;
use crate::error::Result;
use crate::field::{ArrayMarshaler, Field, ObjectMarshaler, ReflectedValue};

/// Writes bare scalar values
pub trait PrimitiveArrayEncoder {
    fn append_bool(&mut self, value: bool);
    fn append_byte_string(&mut self, value: &[u8]);
    fn append_complex(&mut self, re: f64, im: f64);
    fn append_f64(&mut self, value: f64);
    fn append_f32(&mut self, value: f32);
    fn append_i64(&mut self, value: i64);
    fn append_u64(&mut self, value: u64);
    fn append_str(&mut self, value: &str);
}

/// Writes array elements
pub trait ArrayEncoder: PrimitiveArrayEncoder {
    fn append_duration(&mut self, value: Duration);
    fn append_time(&mut self, value: DateTime<Utc>);
    fn append_array(&mut self, value: &dyn ArrayMarshaler) -> Result<()>;
    fn append_object(&mut self, value: &dyn ObjectMarshaler) -> Result<()>;
    fn append_reflected(&mut self, value: Option<&dyn ReflectedValue>) -> Result<()>;
}

/// Writes keyed values
pub trait ObjectEncoder {
    fn add_array(&mut self, key: &str, value: &dyn ArrayMarshaler) -> Result<()>;
    fn add_object(&mut self, key: &str, value: &dyn ObjectMarshaler) -> Result<()>;
    fn add_binary(&mut self, key: &str, value: &[u8]);
    fn add_byte_string(&mut self, key: &str, value: &[u8]);
    fn add_bool(&mut self, key: &str, value: bool);
    fn add_complex(&mut self, key: &str, re: f64, im: f64);
    fn add_duration(&mut self, key: &str, value: Duration);
    fn add_f64(&mut self, key: &str, value: f64);
    fn add_f32(&mut self, key: &str, value: f32);
    fn add_i64(&mut self, key: &str, value: i64);
    fn add_u64(&mut self, key: &str, value: u64);
    fn add_str(&mut self, key: &str, value: &str);
    fn add_time(&mut self, key: &str, value: DateTime<Utc>);
    fn add_reflected(&mut self, key: &str, value: Option<&dyn ReflectedValue>) -> Result<()>;
    fn open_namespace(&mut self, key: &str);
}

/// A pluggable record encoder
///
/// An encoder accumulates context fields through its [`ObjectEncoder`]
/// methods. [`Encoder::encode_entry`] leaves that context untouched and
/// produces the finished record in a buffer checked out of the encoder's
/// pool; the caller hands the buffer back with [`BufferPool::checkin`].
pub trait Encoder: ObjectEncoder + Send + Sync {
    /// Independent copy carrying the same context
    fn clone_encoder(&self) -> Box<dyn Encoder>;

    /// Append context fields, as a child logger does
    fn add_fields(&mut self, fields: &[Field]);

    /// Render one record
    fn encode_entry(&self, entry: &Entry, fields: &[Field]) -> Result<BytesMut>;

    /// Context accumulated so far
    fn buffered(&self) -> &[u8];
}

/// Plain `key=value` encoder behind the pluggable interface
pub fn new_plain_encoder(config: EncoderConfig, pool: Arc<BufferPool>) -> Box<dyn Encoder> {
    Box::new(PlainEncoder::new(config, pool))
}

/// JSON encoder behind the pluggable interface
pub fn new_json_encoder(config: EncoderConfig, pool: Arc<BufferPool>) -> Box<dyn Encoder> {
    Box::new(JsonEncoder::new(config, pool))
}

/// Milliseconds since the Unix epoch
pub(crate) fn epoch_millis(time: DateTime<Utc>) -> i64 {
    time.timestamp_millis()
}

/// Nanoseconds in a duration, saturating
pub(crate) fn duration_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

/// JSON bytes of a reflected value, `null` for none
pub(crate) fn reflect(value: Option<&dyn ReflectedValue>) -> Result<Cow<'static, [u8]>> {
    match value {
        Some(value) => Ok(Cow::Owned(value.to_json()?)),
        None => Ok(Cow::Borrowed(b"null")),
    }
}
