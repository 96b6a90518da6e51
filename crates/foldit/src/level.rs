//! Puzzle levels as players see them ("4-5").

use std::fmt;
use std::str::FromStr;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_new::new;
use serde::{Deserialize, Serialize};

/// A puzzle set and subset pair, shown to users as `set-subset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Getters, Serialize, Deserialize, new)]
pub struct Level {
    set: i32,
    subset: i32,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.set, self.subset)
    }
}

impl FromStr for Level {
    type Err = LevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (set, subset) = s
            .trim()
            .split_once('-')
            .ok_or_else(|| LevelParseError::new(format!("Expected 'set-subset', got '{}'", s)))?;

        let set = set
            .parse()
            .map_err(|e| LevelParseError::new(format!("Invalid set '{}': {}", set, e)))?;
        let subset = subset
            .parse()
            .map_err(|e| LevelParseError::new(format!("Invalid subset '{}': {}", subset, e)))?;

        Ok(Self { set, subset })
    }
}

/// Error parsing a [`Level`] from text.
#[derive(Debug, Clone, Display, Error)]
#[display("Level parse error: {} at {}:{}", message, file, line)]
pub struct LevelParseError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl LevelParseError {
    /// Creates a new parse error with caller location tracking.
    #[track_caller]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
