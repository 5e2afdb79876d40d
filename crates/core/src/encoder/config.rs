//! Encoder configuration
//!
//! Keys name the entry metadata in the output; renderers decide how levels,
//! timestamps, durations and call sites are written. Renderers are plain
//! function pointers so a configuration is cheap to copy and share.
//!
//! # Example
//!
//! ```json
//! {
//!   "level_key": "level",
//!   "time_encoder": "iso8601",
//!   "duration_encoder": "string",
//!   "line_ending": "\n"
//! }
//! ```

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};

use super::PrimitiveArrayEncoder;
use crate::entry::Caller;
use crate::level::Level;

pub type LevelRenderer = fn(Level, &mut dyn PrimitiveArrayEncoder);
pub type TimeRenderer = fn(DateTime<Utc>, &mut dyn PrimitiveArrayEncoder);
pub type DurationRenderer = fn(Duration, &mut dyn PrimitiveArrayEncoder);
pub type CallerRenderer = fn(Caller, &mut dyn PrimitiveArrayEncoder);

/// Built-in renderers
pub mod renderers {
    use std::time::Duration;

    use chrono::{DateTime, Local, SecondsFormat, Utc};

    use super::{CallerRenderer, DurationRenderer, LevelRenderer, TimeRenderer};
    use crate::encoder::PrimitiveArrayEncoder;
    use crate::entry::Caller;
    use crate::level::Level;

    pub fn lowercase_level(level: Level, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_str(level.as_str());
    }

    pub fn capital_level(level: Level, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_str(level.as_capital_str());
    }

    /// `2024-05-01T10:00:00+02:00`, local offset
    pub fn rfc3339_time(time: DateTime<Utc>, enc: &mut dyn PrimitiveArrayEncoder) {
        let local = time.with_timezone(&Local);
        enc.append_str(&local.to_rfc3339_opts(SecondsFormat::Secs, true));
    }

    /// RFC 3339 with fractional seconds, local offset
    pub fn rfc3339_nano_time(time: DateTime<Utc>, enc: &mut dyn PrimitiveArrayEncoder) {
        let local = time.with_timezone(&Local);
        enc.append_str(&local.to_rfc3339_opts(SecondsFormat::AutoSi, true));
    }

    /// `2024-05-01T10:00:00.123+0200`, local offset
    pub fn iso8601_time(time: DateTime<Utc>, enc: &mut dyn PrimitiveArrayEncoder) {
        let local = time.with_timezone(&Local);
        enc.append_str(&local.format("%Y-%m-%dT%H:%M:%S%.3f%z").to_string());
    }

    /// Floating-point seconds since the Unix epoch
    pub fn epoch_seconds_time(time: DateTime<Utc>, enc: &mut dyn PrimitiveArrayEncoder) {
        let nanos = f64::from(time.timestamp_subsec_nanos());
        enc.append_f64(time.timestamp() as f64 + nanos / 1e9);
    }

    /// Floating-point milliseconds since the Unix epoch
    pub fn epoch_millis_time(time: DateTime<Utc>, enc: &mut dyn PrimitiveArrayEncoder) {
        let nanos = f64::from(time.timestamp_subsec_nanos());
        enc.append_f64(time.timestamp() as f64 * 1e3 + nanos / 1e6);
    }

    /// Integer nanoseconds since the Unix epoch
    pub fn epoch_nanos_time(time: DateTime<Utc>, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_i64(time.timestamp_nanos_opt().unwrap_or(i64::MAX));
    }

    /// Human-readable, e.g. `1m 30s`
    pub fn string_duration(duration: Duration, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_str(&humantime::format_duration(duration).to_string());
    }

    /// Whole milliseconds
    pub fn millis_duration(duration: Duration, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_i64(i64::try_from(duration.as_millis()).unwrap_or(i64::MAX));
    }

    /// Floating-point seconds
    pub fn seconds_duration(duration: Duration, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_f64(duration.as_secs_f64());
    }

    /// Whole nanoseconds
    pub fn nanos_duration(duration: Duration, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_i64(i64::try_from(duration.as_nanos()).unwrap_or(i64::MAX));
    }

    /// `dir/file.rs:42`
    pub fn short_caller(caller: Caller, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_str(&caller.trimmed());
    }

    /// Full path, `src/dir/file.rs:42`
    pub fn full_caller(caller: Caller, enc: &mut dyn PrimitiveArrayEncoder) {
        enc.append_str(&caller.to_string());
    }

    /// Level renderer by name; `Some(None)` disables rendering
    pub fn level_by_name(name: &str) -> Option<Option<LevelRenderer>> {
        let renderer: LevelRenderer = match name {
            "" | "lowercase" | "lower" => lowercase_level,
            "capital" | "upper" | "uppercase" => capital_level,
            "none" => return Some(None),
            _ => return None,
        };
        Some(Some(renderer))
    }

    /// Time renderer by name; `Some(None)` disables rendering
    pub fn time_by_name(name: &str) -> Option<Option<TimeRenderer>> {
        let renderer: TimeRenderer = match name {
            "" | "rfc3339" => rfc3339_time,
            "rfc3339nano" | "rfc3339_nano" => rfc3339_nano_time,
            "iso8601" => iso8601_time,
            "epoch" | "seconds" => epoch_seconds_time,
            "millis" | "epoch_millis" => epoch_millis_time,
            "nanos" | "epoch_nanos" => epoch_nanos_time,
            "none" => return Some(None),
            _ => return None,
        };
        Some(Some(renderer))
    }

    /// Duration renderer by name; `Some(None)` disables rendering
    pub fn duration_by_name(name: &str) -> Option<Option<DurationRenderer>> {
        let renderer: DurationRenderer = match name {
            "" | "millis" | "ms" => millis_duration,
            "string" => string_duration,
            "seconds" | "secs" => seconds_duration,
            "nanos" | "ns" => nanos_duration,
            "none" => return Some(None),
            _ => return None,
        };
        Some(Some(renderer))
    }

    /// Caller renderer by name; `Some(None)` disables rendering
    pub fn caller_by_name(name: &str) -> Option<Option<CallerRenderer>> {
        let renderer: CallerRenderer = match name {
            "" | "short" => short_caller,
            "full" => full_caller,
            "none" => return Some(None),
            _ => return None,
        };
        Some(Some(renderer))
    }
}

/// Keys, renderers and line ending shared by the encoders
///
/// An empty key omits that piece of entry metadata. A `None` renderer makes
/// encoders fall back to their raw representation (nanoseconds for
/// durations, epoch milliseconds for timestamps).
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct EncoderConfig {
    pub message_key: String,
    pub level_key: String,
    pub time_key: String,
    pub name_key: String,
    pub caller_key: String,
    pub line_ending: String,

    #[serde(rename = "level_encoder", deserialize_with = "deserialize_level")]
    pub encode_level: Option<LevelRenderer>,

    #[serde(rename = "time_encoder", deserialize_with = "deserialize_time")]
    pub encode_time: Option<TimeRenderer>,

    #[serde(rename = "duration_encoder", deserialize_with = "deserialize_duration")]
    pub encode_duration: Option<DurationRenderer>,

    #[serde(rename = "caller_encoder", deserialize_with = "deserialize_caller")]
    pub encode_caller: Option<CallerRenderer>,
}

impl Default for EncoderConfig {
    /// `time`/`level`/`logger`/`caller`/`msg` keys, lowercase levels,
    /// RFC 3339 timestamps, millisecond durations, short call sites
    fn default() -> Self {
        Self {
            message_key: "msg".to_string(),
            level_key: "level".to_string(),
            time_key: "time".to_string(),
            name_key: "logger".to_string(),
            caller_key: "caller".to_string(),
            line_ending: "\n".to_string(),
            encode_level: Some(renderers::lowercase_level),
            encode_time: Some(renderers::rfc3339_time),
            encode_duration: Some(renderers::millis_duration),
            encode_caller: Some(renderers::short_caller),
        }
    }
}

impl EncoderConfig {
    pub fn with_level_renderer(mut self, renderer: Option<LevelRenderer>) -> Self {
        self.encode_level = renderer;
        self
    }

    pub fn with_time_renderer(mut self, renderer: Option<TimeRenderer>) -> Self {
        self.encode_time = renderer;
        self
    }

    pub fn with_duration_renderer(mut self, renderer: Option<DurationRenderer>) -> Self {
        self.encode_duration = renderer;
        self
    }

    pub fn with_caller_renderer(mut self, renderer: Option<CallerRenderer>) -> Self {
        self.encode_caller = renderer;
        self
    }

    pub fn with_line_ending(mut self, line_ending: impl Into<String>) -> Self {
        self.line_ending = line_ending.into();
        self
    }

    pub fn with_level_key(mut self, key: impl Into<String>) -> Self {
        self.level_key = key.into();
        self
    }
}

impl fmt::Debug for EncoderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderConfig")
            .field("message_key", &self.message_key)
            .field("level_key", &self.level_key)
            .field("time_key", &self.time_key)
            .field("name_key", &self.name_key)
            .field("caller_key", &self.caller_key)
            .field("line_ending", &self.line_ending)
            .field("encode_level", &self.encode_level.is_some())
            .field("encode_time", &self.encode_time.is_some())
            .field("encode_duration", &self.encode_duration.is_some())
            .field("encode_caller", &self.encode_caller.is_some())
            .finish()
    }
}

fn deserialize_renderer<'de, D, R>(
    deserializer: D,
    kind: &str,
    lookup: fn(&str) -> Option<Option<R>>,
) -> Result<Option<R>, D::Error>
where
    D: Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    lookup(&name.to_ascii_lowercase())
        .ok_or_else(|| serde::de::Error::custom(format!("unknown {kind} encoder: {name:?}")))
}

fn deserialize_level<'de, D: Deserializer<'de>>(d: D) -> Result<Option<LevelRenderer>, D::Error> {
    deserialize_renderer(d, "level", renderers::level_by_name)
}

fn deserialize_time<'de, D: Deserializer<'de>>(d: D) -> Result<Option<TimeRenderer>, D::Error> {
    deserialize_renderer(d, "time", renderers::time_by_name)
}

fn deserialize_duration<'de, D: Deserializer<'de>>(
    d: D,
) -> Result<Option<DurationRenderer>, D::Error> {
    deserialize_renderer(d, "duration", renderers::duration_by_name)
}

fn deserialize_caller<'de, D: Deserializer<'de>>(d: D) -> Result<Option<CallerRenderer>, D::Error> {
    deserialize_renderer(d, "caller", renderers::caller_by_name)
}
