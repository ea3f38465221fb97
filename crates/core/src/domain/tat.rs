//! Turnaround time between request creation and a review decision.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::domain::timestamp::LiteralTimestamp;

const MILLIS_PER_DAY: i64 = 86_400_000;
const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_MINUTE: i64 = 60_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Turnaround {
    Elapsed { days: i64, hours: i64, minutes: i64 },
    /// One of the timestamps is not a timestamp at all.
    InvalidDate,
    /// The review happened before the request was created.
    InvalidRange,
    /// The timestamps looked valid but could not be turned into instants.
    Unavailable,
}

impl Turnaround {
    pub fn between(created_at: &str, reviewed_at: &str) -> Self {
        let parsed = LiteralTimestamp::parse(created_at).and_then(|created| {
            LiteralTimestamp::parse(reviewed_at).map(|reviewed| (created, reviewed))
        });

        let (created, reviewed) = match parsed {
            Ok(pair) => pair,
            Err(error) if error.is_structural() => return Self::InvalidDate,
            Err(_) => return Self::Unavailable,
        };

        Self::from_millis(created.millis_until(&reviewed))
    }

    pub fn from_millis(elapsed_ms: i64) -> Self {
        if elapsed_ms < 0 {
            return Self::InvalidRange;
        }

        let days = elapsed_ms / MILLIS_PER_DAY;
        let hours = (elapsed_ms % MILLIS_PER_DAY) / MILLIS_PER_HOUR;
        let minutes = (elapsed_ms % MILLIS_PER_HOUR) / MILLIS_PER_MINUTE;
        Self::Elapsed { days, hours, minutes }
    }

    pub fn is_duration(&self) -> bool {
        matches!(self, Self::Elapsed { .. })
    }
}

impl fmt::Display for Turnaround {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Elapsed { days, hours, minutes } => {
                write!(f, "{days} days, {hours} hours, {minutes} minutes")
            }
            Self::InvalidDate => f.write_str("Invalid date"),
            Self::InvalidRange => f.write_str("Invalid time range"),
            Self::Unavailable => f.write_str("Unable to calculate"),
        }
    }
}

impl Serialize for Turnaround {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
