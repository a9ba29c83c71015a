//! Civil-calendar dates and the wall-clock abstraction.
//!
//! Reset decisions are made against calendar dates in a single civil
//! timezone, never against raw timestamps. [`CivilDate`] is the engine's
//! date type: it renders and persists as fixed-width `YYYY-MM-DD`, so its
//! ordering coincides with lexicographic ordering of the stored strings.
//!
//! The clock is a trait so tests can pin or advance "today" without touching
//! the system clock.

use std::fmt;

use chrono::{DateTime, Months, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{QuotaGateError, Result};

/// Source of the current wall-clock time.
///
/// The engine only ever uses the clock to derive a [`CivilDate`] and to
/// stamp `updated_at` on persisted records.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// The real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A calendar date in the engine's civil timezone.
///
/// Serializes as a plain `YYYY-MM-DD` string. `Ord` is chronological, which
/// for this fixed-width format is the same as lexicographic order of the
/// rendered form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CivilDate(NaiveDate);

impl CivilDate {
    /// The stored/rendered format.
    pub const FORMAT: &'static str = "%Y-%m-%d";

    /// Construct from calendar components. Returns `None` for impossible
    /// dates (e.g. Feb 30).
    #[must_use]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse a stored `YYYY-MM-DD` string.
    pub fn parse(value: &str) -> Result<Self> {
        NaiveDate::parse_from_str(value, Self::FORMAT)
            .map(Self)
            .map_err(|_| QuotaGateError::invalid_date(value))
    }

    /// Today's date as observed in `tz` at the instant `now`.
    ///
    /// This is the sole authority for "what day is it" in the engine.
    #[must_use]
    pub fn today_in(now: DateTime<Utc>, tz: Tz) -> Self {
        Self(now.with_timezone(&tz).date_naive())
    }

    /// Add whole calendar months, clamping the day-of-month to the target
    /// month's length (Jan 31 + 1 month is Feb 28, or Feb 29 in a leap
    /// year — never a roll into March).
    #[must_use]
    pub fn add_calendar_months(self, months: u32) -> Self {
        // checked_add_months only fails at the far end of the supported year
        // range, centuries past any billing horizon.
        Self(self.0.checked_add_months(Months::new(months)).unwrap_or(self.0))
    }

    /// The wrapped calendar date.
    #[must_use]
    pub fn as_naive(&self) -> NaiveDate {
        self.0
    }
}

impl fmt::Display for CivilDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(Self::FORMAT))
    }
}

impl From<NaiveDate> for CivilDate {
    fn from(date: NaiveDate) -> Self {
        Self(date)
    }
}

impl Serialize for CivilDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for CivilDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&value, Self::FORMAT)
            .map(Self)
            .map_err(serde::de::Error::custom)
    }
}

/// Manually driven clock for tests.
#[cfg(any(test, feature = "test-support"))]
pub mod test {
    use std::sync::{Arc, RwLock};

    use chrono::Duration;

    use super::*;

    /// A clock that only moves when told to.
    ///
    /// Cheaply cloneable; clones share the same instant, so a test can hold
    /// one handle while the service under test holds another.
    #[derive(Clone)]
    pub struct ManualClock {
        now: Arc<RwLock<DateTime<Utc>>>,
    }

    impl ManualClock {
        /// Create a clock pinned at `now`.
        #[must_use]
        pub fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: Arc::new(RwLock::new(now)),
            }
        }

        /// Pin the clock to a new instant.
        pub fn set(&self, now: DateTime<Utc>) {
            *self.now.write().unwrap() = now;
        }

        /// Advance the clock by whole days.
        pub fn advance_days(&self, days: i64) {
            let mut now = self.now.write().unwrap();
            *now += Duration::days(days);
        }
    }

    impl Clock for ManualClock {
        fn now_utc(&self) -> DateTime<Utc> {
            *self.now.read().unwrap()
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> CivilDate {
        CivilDate::from_ymd(y, m, d).unwrap()
    }

    #[test]
    fn test_render_fixed_width() {
        assert_eq!(date(2025, 1, 2).to_string(), "2025-01-02");
        assert_eq!(date(2025, 12, 31).to_string(), "2025-12-31");
    }

    #[test]
    fn test_parse_round_trip() {
        let parsed = CivilDate::parse("2025-02-28").unwrap();
        assert_eq!(parsed, date(2025, 2, 28));
        assert_eq!(parsed.to_string(), "2025-02-28");

        assert!(CivilDate::parse("2025-13-01").is_err());
        assert!(CivilDate::parse("not-a-date").is_err());
    }

    #[test]
    fn test_ordering_matches_lexicographic() {
        let dates = [
            date(2024, 12, 31),
            date(2025, 1, 1),
            date(2025, 1, 2),
            date(2025, 2, 1),
            date(2025, 10, 9),
        ];
        for pair in dates.windows(2) {
            assert!(pair[0] < pair[1]);
            assert!(pair[0].to_string() < pair[1].to_string());
        }
    }

    #[test]
    fn test_add_months_clamps_day() {
        assert_eq!(date(2025, 1, 31).add_calendar_months(1), date(2025, 2, 28));
        assert_eq!(date(2024, 1, 31).add_calendar_months(1), date(2024, 2, 29));
        assert_eq!(date(2025, 3, 31).add_calendar_months(1), date(2025, 4, 30));
        assert_eq!(date(2025, 1, 15).add_calendar_months(1), date(2025, 2, 15));
    }

    #[test]
    fn test_add_months_year_rollover() {
        assert_eq!(date(2025, 12, 15).add_calendar_months(1), date(2026, 1, 15));
        assert_eq!(date(2025, 6, 30).add_calendar_months(12), date(2026, 6, 30));
    }

    #[test]
    fn test_today_in_crosses_midnight_of_zone() {
        // 22:30 UTC on June 30 is already July 1 in Rome (CEST, UTC+2).
        let summer = Utc.with_ymd_and_hms(2025, 6, 30, 22, 30, 0).unwrap();
        assert_eq!(
            CivilDate::today_in(summer, Tz::Europe__Rome),
            date(2025, 7, 1)
        );

        // 23:30 UTC on Jan 31 is already Feb 1 in Rome (CET, UTC+1).
        let winter = Utc.with_ymd_and_hms(2025, 1, 31, 23, 30, 0).unwrap();
        assert_eq!(
            CivilDate::today_in(winter, Tz::Europe__Rome),
            date(2025, 2, 1)
        );

        // Same instant, different zone, different civil day.
        assert_eq!(CivilDate::today_in(winter, Tz::UTC), date(2025, 1, 31));
    }

    #[test]
    fn test_serde_as_plain_string() {
        let json = serde_json::to_string(&date(2025, 3, 7)).unwrap();
        assert_eq!(json, "\"2025-03-07\"");

        let back: CivilDate = serde_json::from_str("\"2025-03-07\"").unwrap();
        assert_eq!(back, date(2025, 3, 7));

        let err: std::result::Result<CivilDate, _> = serde_json::from_str("\"07/03/2025\"");
        assert!(err.is_err());
    }

    #[test]
    fn test_manual_clock() {
        use test::ManualClock;

        let start = Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap();
        let clock = ManualClock::at(start);
        assert_eq!(clock.now_utc(), start);

        clock.advance_days(3);
        assert_eq!(
            CivilDate::today_in(clock.now_utc(), Tz::UTC),
            date(2025, 1, 4)
        );
    }
}
