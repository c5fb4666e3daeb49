//! Time of day value object (`hh:mm:ss`)

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveTime, Timelike};

use crate::domain::error::ClockTimeParseError;

/// A wall-clock time of day with one-second resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClockTime(NaiveTime);

impl ClockTime {
    /// Seconds elapsed since midnight
    pub fn seconds_from_midnight(&self) -> u64 {
        u64::from(self.0.num_seconds_from_midnight())
    }
}

impl FromStr for ClockTime {
    type Err = ClockTimeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M:%S")
            .map(Self)
            .map_err(|_| ClockTimeParseError {
                input: s.to_string(),
            })
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}
