//! Literal parsing of upstream timestamps.
//!
//! The workflow backend writes local wall-clock time into strings that carry a
//! UTC-style offset suffix (`2025-08-07T07:07:13.000+0000`). The digits are
//! taken at face value: no offset arithmetic is applied, so the parsed value is
//! the wall-clock time the reviewer saw.

use chrono::format::ParseErrorKind;
use chrono::{Datelike, NaiveDateTime, ParseError, Timelike};
use thiserror::Error;

pub const INVALID_DATE_PLACEHOLDER: &str = "Invalid date";
pub const INVALID_TIME_PLACEHOLDER: &str = "Invalid time";

const T_SEPARATED: &str = "%Y-%m-%dT%H:%M:%S%.f";
const SPACE_SEPARATED: &str = "%Y-%m-%d %H:%M:%S%.f";

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TimestampError {
    #[error("timestamp `{0}` does not split into a date and a time part")]
    Shape(String),
    #[error("timestamp `{raw}` is malformed: {source}")]
    Malformed { raw: String, source: ParseError },
    #[error("timestamp offset `{0}` is not `Z`, `±HH`, `±HHMM` or `±HH:MM`")]
    Offset(String),
    #[error("timestamp `{0}` names a date or time that does not exist")]
    OutOfRange(String),
}

impl TimestampError {
    /// Structural failures mean the string is not a timestamp at all; range
    /// failures mean it looked like one but named an impossible instant.
    pub fn is_structural(&self) -> bool {
        !matches!(self, Self::OutOfRange(_))
    }

    fn from_chrono(error: ParseError, raw: &str) -> Self {
        match error.kind() {
            ParseErrorKind::OutOfRange | ParseErrorKind::Impossible => {
                Self::OutOfRange(raw.to_string())
            }
            ParseErrorKind::Invalid => Self::Malformed { raw: raw.to_string(), source: error },
            _ => Self::Shape(raw.to_string()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiteralTimestamp {
    raw: String,
    wall_clock: NaiveDateTime,
}

impl LiteralTimestamp {
    /// Accepts `YYYY-MM-DDTHH:MM:SS[.fff]` followed by `±ZZZZ`, `±ZZ:ZZ`, `Z`
    /// or nothing. A single space is accepted in place of `T` because decision
    /// timestamps travel as `YYYY-MM-DD HH:MM:SS`.
    pub fn parse(raw: &str) -> Result<Self, TimestampError> {
        let trimmed = raw.trim();
        if trimmed.split(['T', ' ']).count() != 2 {
            return Err(TimestampError::Shape(raw.to_string()));
        }

        let format = if trimmed.contains('T') { T_SEPARATED } else { SPACE_SEPARATED };
        let (wall_clock, offset) = NaiveDateTime::parse_and_remainder(trimmed, format)
            .map_err(|error| TimestampError::from_chrono(error, raw))?;
        check_offset(offset)?;

        // Sub-millisecond digits are dropped.
        let millis = wall_clock.nanosecond() / 1_000_000 * 1_000_000;
        let wall_clock = wall_clock.with_nanosecond(millis).unwrap_or(wall_clock);

        Ok(Self { raw: raw.to_string(), wall_clock })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn wall_clock(&self) -> NaiveDateTime {
        self.wall_clock
    }

    /// `DD/MM/YYYY`
    pub fn display_date(&self) -> String {
        let date = self.wall_clock.date();
        format!("{:02}/{:02}/{:04}", date.day(), date.month(), date.year())
    }

    /// `H:MM:SS AM` on a 12-hour clock.
    pub fn display_time(&self) -> String {
        let time = self.wall_clock.time();
        let (is_pm, hour) = time.hour12();
        let meridiem = if is_pm { "PM" } else { "AM" };
        format!("{hour}:{:02}:{:02} {meridiem}", time.minute(), time.second())
    }

    /// Signed milliseconds from `self` to `later`.
    pub fn millis_until(&self, later: &LiteralTimestamp) -> i64 {
        later.wall_clock.signed_duration_since(self.wall_clock).num_milliseconds()
    }
}

/// Display form of an upstream timestamp that never fails: unparseable input
/// degrades to placeholder strings so a single bad record still renders.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayStamp {
    pub date: String,
    pub time: String,
}

impl DisplayStamp {
    pub fn from_raw(raw: &str) -> Self {
        match LiteralTimestamp::parse(raw) {
            Ok(stamp) => Self { date: stamp.display_date(), time: stamp.display_time() },
            Err(_) => Self {
                date: INVALID_DATE_PLACEHOLDER.to_string(),
                time: INVALID_TIME_PLACEHOLDER.to_string(),
            },
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.date == INVALID_DATE_PLACEHOLDER
    }
}

fn check_offset(offset: &str) -> Result<(), TimestampError> {
    if offset.is_empty() || offset.eq_ignore_ascii_case("z") {
        return Ok(());
    }

    let well_formed = offset.strip_prefix(['+', '-']).is_some_and(|rest| {
        let digits: String = rest.chars().filter(|ch| *ch != ':').collect();
        matches!(digits.len(), 2 | 4) && digits.chars().all(|ch| ch.is_ascii_digit())
    });
    if well_formed {
        Ok(())
    } else {
        Err(TimestampError::Offset(offset.to_string()))
    }
}
