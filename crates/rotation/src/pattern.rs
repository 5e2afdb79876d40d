//! strftime file name patterns
//!
//! A pattern such as `/var/log/app/access.log.%Y%m%d%H%M` names one file
//! per time bucket. The same pattern, with every specifier turned into `*`,
//! finds all the files it has produced so far.

use std::fmt::{self, Write as _};
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, TimeZone};
use glob::Pattern;

use crate::error::{Result, RotationError};

/// Validated strftime template for log file paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    template: String,
}

impl FilePattern {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        if template.is_empty() {
            return Err(RotationError::invalid_pattern(template, "empty pattern"));
        }
        if StrftimeItems::new(&template).any(|item| matches!(item, Item::Error)) {
            return Err(RotationError::invalid_pattern(
                template,
                "unknown or incomplete strftime specifier",
            ));
        }
        Ok(Self { template })
    }

    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// Whether the pattern contains any time specifier
    pub fn has_specifiers(&self) -> bool {
        StrftimeItems::new(&self.template).any(|item| {
            !matches!(
                item,
                Item::Literal(_) | Item::OwnedLiteral(_) | Item::Space(_) | Item::OwnedSpace(_)
            )
        })
    }

    /// File path for the given instant
    pub fn render<Tz: TimeZone>(&self, time: &DateTime<Tz>) -> PathBuf
    where
        Tz::Offset: fmt::Display,
    {
        let mut path = String::with_capacity(self.template.len() + 16);
        let _ = write!(path, "{}", time.format(&self.template));
        PathBuf::from(path)
    }

    /// Glob matching every path the pattern can render
    ///
    /// Literal text is escaped; each specifier (with its padding and width
    /// modifiers) becomes a single `*`.
    pub fn glob(&self) -> String {
        let mut glob = String::with_capacity(self.template.len());
        let mut literal = String::new();
        let mut chars = self.template.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '%' {
                literal.push(c);
                continue;
            }
            if chars.peek() == Some(&'%') {
                chars.next();
                literal.push('%');
                continue;
            }
            while let Some(&modifier) = chars.peek()
                && matches!(modifier, '-' | '_' | '#' | '.' | ':' | '0'..='9')
            {
                chars.next();
            }
            chars.next();

            glob.push_str(&Pattern::escape(&literal));
            literal.clear();
            if !glob.ends_with('*') {
                glob.push('*');
            }
        }

        glob.push_str(&Pattern::escape(&literal));
        glob
    }
}

impl fmt::Display for FilePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

#[cfg(test)]
#[path = "pattern_test.rs"]
mod pattern_test;
