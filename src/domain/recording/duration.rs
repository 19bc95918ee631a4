//! Duration value object for CLI options and auto-stop limits

use std::fmt;
use std::str::FromStr;
use std::time::Duration as StdDuration;

use crate::domain::error::DurationParseError;

/// Millisecond-precision duration, validated on creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration {
    milliseconds: u64,
}

impl Duration {
    pub const fn from_millis(ms: u64) -> Self {
        Self { milliseconds: ms }
    }

    pub const fn from_secs(secs: u64) -> Self {
        Self {
            milliseconds: secs * 1000,
        }
    }

    pub const fn as_millis(&self) -> u64 {
        self.milliseconds
    }

    pub const fn as_secs(&self) -> u64 {
        self.milliseconds / 1000
    }

    pub const fn as_std(&self) -> StdDuration {
        StdDuration::from_millis(self.milliseconds)
    }
}

impl FromStr for Duration {
    type Err = DurationParseError;

    /// Accepts `"90"` (seconds), `"30s"`, `"2m"`, `"1m30s"`. Zero is invalid.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let input = s.trim().to_lowercase();
        let err = || DurationParseError { input: s.to_string() };

        if input.is_empty() {
            return Err(err());
        }

        // Bare number means seconds
        if input.chars().all(|c| c.is_ascii_digit()) {
            let secs: u64 = input.parse().map_err(|_| err())?;
            if secs == 0 {
                return Err(err());
            }
            return Ok(Self::from_secs(secs));
        }

        let mut total_secs: u64 = 0;
        let mut number = String::new();
        for ch in input.chars() {
            match ch {
                '0'..='9' => number.push(ch),
                'm' | 's' if !number.is_empty() => {
                    let value: u64 = number.parse().map_err(|_| err())?;
                    total_secs += if ch == 'm' { value * 60 } else { value };
                    number.clear();
                }
                _ => return Err(err()),
            }
        }
        if !number.is_empty() || total_secs == 0 {
            return Err(err());
        }

        Ok(Self::from_secs(total_secs))
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let minutes = self.as_secs() / 60;
        let seconds = self.as_secs() % 60;
        match (minutes, seconds) {
            (0, s) => write!(f, "{}s", s),
            (m, 0) => write!(f, "{}m", m),
            (m, s) => write!(f, "{}m{}s", m, s),
        }
    }
}
