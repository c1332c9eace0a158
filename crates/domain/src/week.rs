//! Weekly period resolution
//!
//! Reporting weeks roll over on Friday at 21:30 local time, not at midnight
//! and not on Monday. Every instant belongs to exactly one rollover interval
//! `[Friday 21:30, next Friday 21:30)`, identified by a [`WeekKey`]. Two
//! activity windows are derived from that single numbering:
//!
//! - the **Friday window** for Info records: `[Friday 21:30, next Friday
//!   23:45]`, a 7-day span with a deliberate 2h15m tail for late-evening
//!   data entry;
//! - the **Monday window** for Plan records: `[Monday 00:00, Sunday
//!   23:59:59]` of the calendar week containing the Friday anchor.
//!
//! Both windows are pure functions of `(week_number, year)`, so a single
//! target row keyed by the week identifier serves Info and Plan aggregation
//! alike. All arithmetic happens in one fixed UTC offset; there is no DST
//! and no per-record time zone.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset, Utc,
    Weekday,
};
use serde::{Deserialize, Serialize};

use crate::config::WeekConfig;
use crate::constants::{
    INFO_TAIL_HOUR, INFO_TAIL_MINUTE, MAX_WEEK_NUMBER, ROLLOVER_HOUR, ROLLOVER_MINUTE,
    SECONDS_PER_WEEK, WEEKS_PER_YEAR,
};
use crate::errors::{CadenceError, Result};

/// Timestamp in the single configured fixed offset.
pub type Instant = DateTime<FixedOffset>;

/// Identifier of one reporting week.
///
/// Equality and ordering follow the Friday rollover numbering, not ISO
/// weeks. Field order matters: deriving `Ord` with `year` first makes keys
/// sort chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct WeekKey {
    pub year: i32,
    pub week_number: u8,
}

impl WeekKey {
    pub const fn new(week_number: u8, year: i32) -> Self {
        Self { year, week_number }
    }
}

impl std::fmt::Display for WeekKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "week {} of {}", self.week_number, self.year)
    }
}

/// Datetime range used to filter activity records for one week.
///
/// `start` is always inclusive; `end` is inclusive only when
/// `end_inclusive` is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSpec {
    pub start: Instant,
    pub end: Instant,
    pub end_inclusive: bool,
}

impl WindowSpec {
    /// Whether `instant` falls inside the window, honoring `end_inclusive`.
    pub fn contains(&self, instant: Instant) -> bool {
        if instant < self.start {
            return false;
        }
        if self.end_inclusive {
            instant <= self.end
        } else {
            instant < self.end
        }
    }

    /// Total span of the window.
    pub fn duration(&self) -> Duration {
        self.end.signed_duration_since(self.start)
    }
}

/// The week resolution engine.
///
/// Stateless and cheap to copy; configured once with the fixed UTC offset
/// and the supported year range. All operations are O(1) arithmetic with no
/// I/O, safe to call concurrently.
#[derive(Debug, Clone, Copy)]
pub struct WeekScheme {
    offset: FixedOffset,
    min_year: i32,
    max_year: i32,
}

impl Default for WeekScheme {
    fn default() -> Self {
        Self::from_config(&WeekConfig::default())
    }
}

impl WeekScheme {
    /// Build a scheme from configuration, validating the offset.
    pub fn new(utc_offset_seconds: i32, min_year: i32, max_year: i32) -> Result<Self> {
        let offset = FixedOffset::east_opt(utc_offset_seconds).ok_or_else(|| {
            CadenceError::Config(format!("invalid UTC offset: {utc_offset_seconds}s"))
        })?;
        if min_year > max_year {
            return Err(CadenceError::Config(format!(
                "supported year range is empty: {min_year}..={max_year}"
            )));
        }
        Ok(Self { offset, min_year, max_year })
    }

    /// Build a scheme from a [`WeekConfig`], falling back to UTC when the
    /// configured offset is out of range.
    pub fn from_config(config: &WeekConfig) -> Self {
        let offset = FixedOffset::east_opt(config.utc_offset_seconds).unwrap_or_else(|| Utc.fix());
        Self { offset, min_year: config.min_year, max_year: config.max_year }
    }

    /// The configured fixed offset.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Convert a UTC timestamp into the scheme's fixed offset.
    pub fn to_local(&self, utc: DateTime<Utc>) -> Instant {
        utc.with_timezone(&self.offset)
    }

    /// Parse an RFC 3339 timestamp into the scheme's offset.
    ///
    /// Malformed input is an error, never silently replaced by "now".
    pub fn parse_instant(&self, raw: &str) -> Result<Instant> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&self.offset))
            .map_err(|err| CadenceError::InvalidInstant(format!("{raw:?}: {err}")))
    }

    /// Convert Unix epoch seconds into the scheme's offset.
    pub fn instant_from_epoch(&self, seconds: i64) -> Result<Instant> {
        DateTime::<Utc>::from_timestamp(seconds, 0)
            .map(|dt| dt.with_timezone(&self.offset))
            .ok_or_else(|| {
                CadenceError::InvalidInstant(format!("epoch seconds out of range: {seconds}"))
            })
    }

    /// Assign an instant to its reporting week.
    ///
    /// The instant belongs to the week whose rollover interval
    /// `[Friday 21:30, next Friday 21:30)` contains it. Week 1 of a year
    /// starts at the first January Friday, 21:30; instants before that
    /// belong to the previous year's numbering. Week numbers cap at 52: the
    /// 53rd rollover period of a long year stays week 52 of the old year.
    pub fn resolve_week(&self, instant: Instant) -> Result<WeekKey> {
        let local = instant.with_timezone(&self.offset);
        let calendar_year = local.year();
        if calendar_year < self.min_year || calendar_year > self.max_year {
            return Err(CadenceError::InvalidInstant(format!(
                "timestamp year {calendar_year} outside supported range {}..={}",
                self.min_year, self.max_year
            )));
        }

        let mut anchor_year = calendar_year;
        let mut first = self.first_rollover(anchor_year)?;
        if local < first {
            anchor_year -= 1;
            if anchor_year < self.min_year {
                return Err(CadenceError::InvalidInstant(format!(
                    "timestamp precedes week 1 of minimum supported year {}",
                    self.min_year
                )));
            }
            first = self.first_rollover(anchor_year)?;
        }

        let elapsed = local.signed_duration_since(first).num_seconds();
        let weeks_passed = elapsed.div_euclid(SECONDS_PER_WEEK);
        let week_number = u8::try_from(weeks_passed + 1)
            .unwrap_or(u8::MAX)
            .min(WEEKS_PER_YEAR);

        Ok(WeekKey::new(week_number, anchor_year))
    }

    /// The exact Friday 21:30 instant beginning the given week.
    ///
    /// Single source of truth for both window functions; they never
    /// recompute the anchor independently. Week 53 is accepted as a lookup
    /// (it addresses the spill period of long years) even though
    /// [`Self::resolve_week`] never produces it.
    pub fn anchor_friday_start(&self, week_number: u8, year: i32) -> Result<Instant> {
        self.validate_key(week_number, year)?;
        let first = self.first_rollover(year)?;
        Ok(first + Duration::weeks(i64::from(week_number) - 1))
    }

    /// Activity window for Info records: `[Friday 21:30, next Friday
    /// 23:45]`, end inclusive.
    ///
    /// Not a clean 7x24h span: the time-of-day of the end is forced to
    /// 23:45, overlapping 2h15m into the next rollover period so
    /// late-evening entries still land in the closing week.
    pub fn friday_window(&self, week: WeekKey) -> Result<WindowSpec> {
        let start = self.anchor_friday_start(week.week_number, week.year)?;
        let end_date = (start + Duration::days(7)).date_naive();
        let end = self.localize(end_date.and_time(info_tail_time()));
        Ok(WindowSpec { start, end, end_inclusive: true })
    }

    /// Activity window for Plan records: `[Monday 00:00, Sunday 23:59:59]`
    /// of the calendar week containing the Friday anchor, end inclusive.
    ///
    /// This is a re-projection of the Friday-anchored week index onto
    /// calendar Monday/Sunday bounds, not an independent Monday counter, so
    /// the same `(week_number, year)` key addresses targets for both record
    /// kinds. The anchor date is a Friday, so the Monday of its calendar
    /// week is always four days earlier.
    pub fn monday_window(&self, week: WeekKey) -> Result<WindowSpec> {
        let anchor = self.anchor_friday_start(week.week_number, week.year)?;
        let monday = anchor.date_naive() - Duration::days(4);
        let start = self.localize(monday.and_time(NaiveTime::MIN));
        let end = self.localize((monday + Duration::days(6)).and_time(day_end_time()));
        Ok(WindowSpec { start, end, end_inclusive: true })
    }

    /// All regular week keys of a year, in order.
    pub fn weeks_of_year(&self, year: i32) -> Result<Vec<WeekKey>> {
        self.validate_key(1, year)?;
        Ok((1..=WEEKS_PER_YEAR).map(|n| WeekKey::new(n, year)).collect())
    }

    fn validate_key(&self, week_number: u8, year: i32) -> Result<()> {
        if week_number < 1 || week_number > MAX_WEEK_NUMBER {
            return Err(CadenceError::InvalidWeekKey(format!(
                "week number {week_number} outside 1..={MAX_WEEK_NUMBER}"
            )));
        }
        if year < self.min_year || year > self.max_year {
            return Err(CadenceError::InvalidWeekKey(format!(
                "year {year} outside supported range {}..={}",
                self.min_year, self.max_year
            )));
        }
        Ok(())
    }

    /// First rollover instant of a year: first January Friday at 21:30.
    fn first_rollover(&self, year: i32) -> Result<Instant> {
        let jan_1 = NaiveDate::from_ymd_opt(year, 1, 1)
            .ok_or_else(|| CadenceError::InvalidWeekKey(format!("invalid year: {year}")))?;
        let days_to_friday = (Weekday::Fri.num_days_from_monday() + 7
            - jan_1.weekday().num_days_from_monday())
            % 7;
        let friday = jan_1 + Duration::days(i64::from(days_to_friday));
        Ok(self.localize(friday.and_time(rollover_time())))
    }

    /// Attach the fixed offset to a local wall-clock datetime. Infallible
    /// for fixed offsets: no gaps, no ambiguity.
    fn localize(&self, local: NaiveDateTime) -> Instant {
        DateTime::from_naive_utc_and_offset(local - self.offset, self.offset)
    }
}

fn rollover_time() -> NaiveTime {
    NaiveTime::from_hms_opt(ROLLOVER_HOUR, ROLLOVER_MINUTE, 0).unwrap_or(NaiveTime::MIN)
}

fn info_tail_time() -> NaiveTime {
    NaiveTime::from_hms_opt(INFO_TAIL_HOUR, INFO_TAIL_MINUTE, 0).unwrap_or(NaiveTime::MIN)
}

fn day_end_time() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN)
}
