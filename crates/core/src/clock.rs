use chrono::{DateTime, Duration, NaiveDateTime, Utc};

/// Decisions are stamped with India Standard Time wall-clock values.
const IST_OFFSET_SECS: i64 = 5 * 3_600 + 30 * 60;

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The two renderings of one decision instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActionStamp {
    /// `YYYY-MM-DD HH:MM:SS`, sent to the decision endpoint.
    pub reviewed_at: String,
    /// ISO form with a `Z` suffix, kept locally for turnaround computation.
    pub acted_at: String,
}

impl ActionStamp {
    pub fn at(instant: DateTime<Utc>) -> Self {
        let wall_clock = ist_wall_clock(instant);
        Self {
            reviewed_at: wall_clock.format("%Y-%m-%d %H:%M:%S").to_string(),
            acted_at: wall_clock.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        }
    }
}

/// Shifts a UTC instant to IST and drops the zone, matching how the backend
/// stores local time.
pub fn ist_wall_clock(instant: DateTime<Utc>) -> NaiveDateTime {
    instant.naive_utc() + Duration::seconds(IST_OFFSET_SECS)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::ActionStamp;

    #[test]
    fn stamps_are_shifted_to_ist() {
        let instant = Utc.with_ymd_and_hms(2025, 8, 9, 20, 40, 13).single().expect("instant");
        let stamp = ActionStamp::at(instant);

        assert_eq!(stamp.reviewed_at, "2025-08-10 02:10:13");
        assert_eq!(stamp.acted_at, "2025-08-10T02:10:13.000Z");
    }
}
