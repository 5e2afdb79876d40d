//! Duration fields that accept numbers or humantime strings
//!
//! Integers and floats are nanosecond counts; strings go through
//! `humantime` (`"90s"`, `"1h 30m"`, `"168h"`). `null` and a missing field
//! both mean unset.
//!
//! ```
//! # use std::time::Duration;
//! # use serde::Deserialize;
//! #[derive(Deserialize)]
//! struct Retention {
//!     #[serde(default, with = "bandlog_config::duration")]
//!     retain_age: Option<Duration>,
//! }
//!
//! let from_number: Retention = serde_json::from_str(r#"{"retain_age": 60000000000}"#).unwrap();
//! let from_string: Retention = serde_json::from_str(r#"{"retain_age": "1m"}"#).unwrap();
//! assert_eq!(from_number.retain_age, from_string.retain_age);
//! ```

use std::fmt;
use std::time::Duration;

use serde::de::{self, Deserializer, Visitor};
use serde::ser::Serializer;

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(DurationVisitor)
}

pub fn serialize<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(duration) => {
            serializer.collect_str(&humantime::format_duration(*duration))
        }
        None => serializer.serialize_none(),
    }
}

struct DurationVisitor;

impl<'de> Visitor<'de> for DurationVisitor {
    type Value = Option<Duration>;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a duration as nanoseconds or a string like \"90s\"")
    }

    fn visit_u64<E: de::Error>(self, nanos: u64) -> Result<Self::Value, E> {
        Ok(Some(Duration::from_nanos(nanos)))
    }

    fn visit_i64<E: de::Error>(self, nanos: i64) -> Result<Self::Value, E> {
        u64::try_from(nanos)
            .map(|nanos| Some(Duration::from_nanos(nanos)))
            .map_err(|_| E::custom(format!("duration must not be negative: {nanos}")))
    }

    fn visit_f64<E: de::Error>(self, nanos: f64) -> Result<Self::Value, E> {
        if !nanos.is_finite() || nanos < 0.0 {
            return Err(E::custom(format!(
                "duration must be a finite, non-negative number: {nanos}"
            )));
        }
        Duration::try_from_secs_f64(nanos / 1e9)
            .map(Some)
            .map_err(E::custom)
    }

    fn visit_str<E: de::Error>(self, text: &str) -> Result<Self::Value, E> {
        let text = text.trim();
        if text == "0" {
            return Ok(Some(Duration::ZERO));
        }
        humantime::parse_duration(text)
            .map(Some)
            .map_err(|err| E::custom(format!("invalid duration '{text}': {err}")))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}
