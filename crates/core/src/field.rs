//! Structured fields attached to log records
//!
//! A [`Field`] is a key plus a typed value. Encoders never inspect the value
//! directly; [`Field::add_to`] dispatches it onto the matching
//! [`ObjectEncoder`] method.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::encoder::{ArrayEncoder, ObjectEncoder};
use crate::error::Result;

/// Renders a sequence of values through an [`ArrayEncoder`]
pub trait ArrayMarshaler: Send + Sync {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()>;
}

/// Renders a set of key/value pairs through an [`ObjectEncoder`]
pub trait ObjectMarshaler: Send + Sync {
    fn marshal_log_object(&self, enc: &mut dyn ObjectEncoder) -> Result<()>;
}

/// A value rendered through its `serde` representation
pub trait ReflectedValue: Send + Sync {
    /// JSON rendering of the value
    fn to_json(&self) -> serde_json::Result<Vec<u8>>;
}

impl<T: Serialize + Send + Sync> ReflectedValue for T {
    fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Typed field payload
#[derive(Clone)]
pub enum FieldValue {
    Bool(bool),
    I64(i64),
    U64(u64),
    F64(f64),
    F32(f32),
    Complex(f64, f64),
    Duration(Duration),
    Time(DateTime<Utc>),
    Str(Cow<'static, str>),
    /// UTF-8 text held as bytes, written verbatim
    ByteString(Vec<u8>),
    /// Opaque bytes, written as base64
    Binary(Vec<u8>),
    Array(Arc<dyn ArrayMarshaler>),
    Object(Arc<dyn ObjectMarshaler>),
    /// `None` renders as `null`
    Reflected(Option<Arc<dyn ReflectedValue>>),
    /// Opens a namespace for the fields that follow
    Namespace,
}

impl fmt::Debug for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::I64(v) => write!(f, "I64({v})"),
            Self::U64(v) => write!(f, "U64({v})"),
            Self::F64(v) => write!(f, "F64({v})"),
            Self::F32(v) => write!(f, "F32({v})"),
            Self::Complex(re, im) => write!(f, "Complex({re}, {im})"),
            Self::Duration(v) => write!(f, "Duration({v:?})"),
            Self::Time(v) => write!(f, "Time({v})"),
            Self::Str(v) => write!(f, "Str({v:?})"),
            Self::ByteString(v) => write!(f, "ByteString({:?})", String::from_utf8_lossy(v)),
            Self::Binary(v) => write!(f, "Binary({} bytes)", v.len()),
            Self::Array(_) => f.write_str("Array(..)"),
            Self::Object(_) => f.write_str("Object(..)"),
            Self::Reflected(Some(_)) => f.write_str("Reflected(..)"),
            Self::Reflected(None) => f.write_str("Reflected(null)"),
            Self::Namespace => f.write_str("Namespace"),
        }
    }
}

/// A key plus a typed value
#[derive(Debug, Clone)]
pub struct Field {
    pub key: Cow<'static, str>,
    pub value: FieldValue,
}

impl Field {
    pub fn new(key: impl Into<Cow<'static, str>>, value: FieldValue) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }

    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self::new(key, FieldValue::Bool(value))
    }

    pub fn i64(key: impl Into<Cow<'static, str>>, value: impl Into<i64>) -> Self {
        Self::new(key, FieldValue::I64(value.into()))
    }

    pub fn u64(key: impl Into<Cow<'static, str>>, value: impl Into<u64>) -> Self {
        Self::new(key, FieldValue::U64(value.into()))
    }

    pub fn usize(key: impl Into<Cow<'static, str>>, value: usize) -> Self {
        Self::new(key, FieldValue::U64(value as u64))
    }

    pub fn f64(key: impl Into<Cow<'static, str>>, value: f64) -> Self {
        Self::new(key, FieldValue::F64(value))
    }

    pub fn f32(key: impl Into<Cow<'static, str>>, value: f32) -> Self {
        Self::new(key, FieldValue::F32(value))
    }

    pub fn complex(key: impl Into<Cow<'static, str>>, re: f64, im: f64) -> Self {
        Self::new(key, FieldValue::Complex(re, im))
    }

    pub fn duration(key: impl Into<Cow<'static, str>>, value: Duration) -> Self {
        Self::new(key, FieldValue::Duration(value))
    }

    pub fn time(key: impl Into<Cow<'static, str>>, value: DateTime<Utc>) -> Self {
        Self::new(key, FieldValue::Time(value))
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, FieldValue::Str(value.into()))
    }

    pub fn byte_string(key: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::ByteString(value.into()))
    }

    pub fn binary(key: impl Into<Cow<'static, str>>, value: impl Into<Vec<u8>>) -> Self {
        Self::new(key, FieldValue::Binary(value.into()))
    }

    pub fn array(key: impl Into<Cow<'static, str>>, value: impl ArrayMarshaler + 'static) -> Self {
        Self::new(key, FieldValue::Array(Arc::new(value)))
    }

    pub fn object(
        key: impl Into<Cow<'static, str>>,
        value: impl ObjectMarshaler + 'static,
    ) -> Self {
        Self::new(key, FieldValue::Object(Arc::new(value)))
    }

    /// Value rendered through `serde_json`
    pub fn reflected<T>(key: impl Into<Cow<'static, str>>, value: T) -> Self
    where
        T: Serialize + Send + Sync + 'static,
    {
        Self::new(key, FieldValue::Reflected(Some(Arc::new(value))))
    }

    /// Reflected `null`
    pub fn null(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, FieldValue::Reflected(None))
    }

    pub fn namespace(key: impl Into<Cow<'static, str>>) -> Self {
        Self::new(key, FieldValue::Namespace)
    }

    pub fn ints(key: impl Into<Cow<'static, str>>, values: impl IntoIterator<Item = i64>) -> Self {
        Self::array(key, values.into_iter().collect::<Vec<i64>>())
    }

    pub fn uints(key: impl Into<Cow<'static, str>>, values: impl IntoIterator<Item = u64>) -> Self {
        Self::array(key, values.into_iter().collect::<Vec<u64>>())
    }

    pub fn floats(key: impl Into<Cow<'static, str>>, values: impl IntoIterator<Item = f64>) -> Self {
        Self::array(key, values.into_iter().collect::<Vec<f64>>())
    }

    pub fn strings<S: Into<String>>(
        key: impl Into<Cow<'static, str>>,
        values: impl IntoIterator<Item = S>,
    ) -> Self {
        Self::array(key, values.into_iter().map(Into::into).collect::<Vec<String>>())
    }

    /// Error rendered through its `Display` under the key `error`
    pub fn error(err: &dyn std::error::Error) -> Self {
        Self::string("error", err.to_string())
    }

    /// Whether this field is a namespace marker
    pub fn is_namespace(&self) -> bool {
        matches!(self.value, FieldValue::Namespace)
    }

    /// Dispatch the value onto the encoder
    ///
    /// A value that fails to encode is replaced by a `<key>Error` string
    /// field carrying the failure, so the rest of the record still renders.
    pub fn add_to(&self, enc: &mut dyn ObjectEncoder) {
        let key = self.key.as_ref();
        let result = match &self.value {
            FieldValue::Bool(v) => {
                enc.add_bool(key, *v);
                Ok(())
            }
            FieldValue::I64(v) => {
                enc.add_i64(key, *v);
                Ok(())
            }
            FieldValue::U64(v) => {
                enc.add_u64(key, *v);
                Ok(())
            }
            FieldValue::F64(v) => {
                enc.add_f64(key, *v);
                Ok(())
            }
            FieldValue::F32(v) => {
                enc.add_f32(key, *v);
                Ok(())
            }
            FieldValue::Complex(re, im) => {
                enc.add_complex(key, *re, *im);
                Ok(())
            }
            FieldValue::Duration(v) => {
                enc.add_duration(key, *v);
                Ok(())
            }
            FieldValue::Time(v) => {
                enc.add_time(key, *v);
                Ok(())
            }
            FieldValue::Str(v) => {
                enc.add_str(key, v);
                Ok(())
            }
            FieldValue::ByteString(v) => {
                enc.add_byte_string(key, v);
                Ok(())
            }
            FieldValue::Binary(v) => {
                enc.add_binary(key, v);
                Ok(())
            }
            FieldValue::Array(v) => enc.add_array(key, v.as_ref()),
            FieldValue::Object(v) => enc.add_object(key, v.as_ref()),
            FieldValue::Reflected(v) => enc.add_reflected(key, v.as_deref()),
            FieldValue::Namespace => {
                enc.open_namespace(key);
                Ok(())
            }
        };

        if let Err(err) = result {
            enc.add_str(&format!("{key}Error"), &err.to_string());
        }
    }
}

// =============================================================================
// Array marshalers for common element types
// =============================================================================

macro_rules! vec_marshaler {
    ($($ty:ty => $append:ident),* $(,)?) => {
        $(
            impl ArrayMarshaler for Vec<$ty> {
                fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
                    for value in self {
                        enc.$append(*value);
                    }
                    Ok(())
                }
            }
        )*
    };
}

vec_marshaler! {
    bool => append_bool,
    i64 => append_i64,
    u64 => append_u64,
    f64 => append_f64,
    f32 => append_f32,
    Duration => append_duration,
    DateTime<Utc> => append_time,
}

impl ArrayMarshaler for Vec<String> {
    fn marshal_log_array(&self, enc: &mut dyn ArrayEncoder) -> Result<()> {
        for value in self {
            enc.append_str(value);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "field_test.rs"]
mod field_test;
