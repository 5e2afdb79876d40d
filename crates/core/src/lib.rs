//! Bandlog core
//!
//! The record model shared by every bandlog crate:
//!
//! - [`Level`] and [`LevelEnabler`]: severities and acceptance
//! - [`Field`] and [`Entry`]: a log record and its structured fields
//! - [`encoder`]: the pluggable [`Encoder`] interface with the plain
//!   `key=value` encoder and a JSON encoder
//! - [`BufferPool`]: pooled buffers every encoder renders into
//! - [`Sink`]: where finished records go
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bandlog_core::{BufferPool, EncoderConfig, Entry, Field, Level, new_plain_encoder};
//!
//! let pool = Arc::new(BufferPool::default());
//! let encoder = new_plain_encoder(EncoderConfig::default().with_line_ending(""), pool.clone());
//!
//! let line = encoder
//!     .encode_entry(&Entry::new(Level::Warn, "hello"), &[Field::ints("ints", [1, 2, 3])])
//!     .unwrap();
//! assert_eq!(&line[..], b"[warn] ints=1,2,3");
//! pool.checkin(line);
//! ```

pub mod buffer_pool;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod field;
pub mod level;
pub mod sink;

pub use buffer_pool::{BufferPool, BufferPoolConfig, BufferPoolMetrics, BufferPoolSnapshot};
pub use encoder::{
    ArrayEncoder, Encoder, EncoderConfig, JsonEncoder, ObjectEncoder, PlainEncoder,
    PrimitiveArrayEncoder, new_json_encoder, new_plain_encoder, renderers,
};
pub use entry::{Caller, Entry};
pub use error::{EncodeError, Result};
pub use field::{ArrayMarshaler, Field, FieldValue, ObjectMarshaler, ReflectedValue};
pub use level::{Level, LevelEnabler, ParseLevelError};
pub use sink::{LockedWriter, Sink};
