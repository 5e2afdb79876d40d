//! Log records as seen by encoders

use std::borrow::Cow;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::level::Level;

/// Source location of a log call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub file: &'static str,
    pub line: u32,
}

impl Caller {
    pub fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// Location of the `#[track_caller]` call site
    #[track_caller]
    pub fn here() -> Self {
        let location = std::panic::Location::caller();
        Self::new(location.file(), location.line())
    }

    /// `file:line` with the path cut down to the last directory and file name
    ///
    /// `src/handlers/users.rs:42` becomes `handlers/users.rs:42`.
    pub fn trimmed(&self) -> String {
        let file = self.file;
        let trimmed = match file.rfind(['/', '\\']) {
            Some(last) => match file[..last].rfind(['/', '\\']) {
                Some(previous) => &file[previous + 1..],
                None => file,
            },
            None => file,
        };
        format!("{}:{}", trimmed, self.line)
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// A single log record, without its structured fields
#[derive(Debug, Clone)]
pub struct Entry {
    pub level: Level,
    pub time: DateTime<Utc>,
    /// Logger name (the `tracing` target when bridged)
    pub logger_name: Option<Cow<'static, str>>,
    pub message: String,
    pub caller: Option<Caller>,
}

impl Entry {
    /// Record stamped with the current time
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            time: Utc::now(),
            logger_name: None,
            message: message.into(),
            caller: None,
        }
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    pub fn with_logger_name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.logger_name = Some(name.into());
        self
    }

    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }
}
