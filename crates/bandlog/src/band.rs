//! Severity bands
//!
//! Each destination names only a minimum level. Sorting the destinations by
//! that level and capping each one just below the next gives bands that do
//! not overlap, so a record is written by the single destination whose band
//! holds its level:
//!
//! ```text
//! access: debug, error: warn
//!
//!   trace   debug   info   warn   error
//!           [--- access ---)[-- error -->
//! ```

use std::fmt;

use bandlog_core::{Level, LevelEnabler};

/// Half-open level range `[lower, upper)`; no upper bound when `upper` is `None`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeverityBand {
    pub lower: Level,
    pub upper: Option<Level>,
}

impl SeverityBand {
    /// Band accepting `lower` and everything more severe
    pub fn at_least(lower: Level) -> Self {
        Self { lower, upper: None }
    }

    /// Band accepting `lower <= level < upper`
    pub fn between(lower: Level, upper: Level) -> Self {
        Self {
            lower,
            upper: Some(upper),
        }
    }

    /// Whether no level falls inside the band
    pub fn is_empty(&self) -> bool {
        self.upper.is_some_and(|upper| upper <= self.lower)
    }
}

impl LevelEnabler for SeverityBand {
    #[inline]
    fn enabled(&self, level: Level) -> bool {
        self.lower.enabled(level) && !self.upper.is_some_and(|upper| upper.enabled(level))
    }
}

impl fmt::Display for SeverityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper {
            Some(upper) => write!(f, "[{}, {})", self.lower, upper),
            None => write!(f, "[{}, ..)", self.lower),
        }
    }
}

/// Pair every item with its severity band
///
/// Items are returned in ascending level order. Sorting is stable, so among
/// items with the same level the last one in input order owns that level and
/// the earlier ones get an empty band.
pub fn banded<T, F>(mut items: Vec<T>, level_of: F) -> Vec<(T, SeverityBand)>
where
    F: Fn(&T) -> Level,
{
    items.sort_by_key(|item| level_of(item));

    let levels: Vec<Level> = items.iter().map(&level_of).collect();
    for pair in levels.windows(2) {
        if pair[0] == pair[1] {
            tracing::warn!(
                level = %pair[0],
                "several destinations share a level; only the last one receives its records"
            );
        }
    }

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            let band = match levels.get(index + 1) {
                Some(&next) => SeverityBand::between(levels[index], next),
                None => SeverityBand::at_least(levels[index]),
            };
            (item, band)
        })
        .collect()
}

#[cfg(test)]
#[path = "band_test.rs"]
mod band_test;
