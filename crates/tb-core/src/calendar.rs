//! Calendar-day arithmetic in the active timezone.
//!
//! Blocks are stored as UTC instants, but "which day does this belong to" and
//! "what hour did it start" are questions about the user's wall clock. A
//! [`Calendar`] carries the fixed UTC offset used to answer them, so every
//! function that groups by day stays pure and testable.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Timelike, Utc,
};
use serde::{Deserialize, Serialize};

/// The timezone used to map instants onto calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    offset: FixedOffset,
}

impl Default for Calendar {
    fn default() -> Self {
        Self::utc()
    }
}

impl Calendar {
    /// A calendar that uses UTC days.
    #[must_use]
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
        }
    }

    /// A calendar with the given fixed offset.
    #[must_use]
    pub const fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// A calendar from an offset in seconds east of UTC.
    ///
    /// Returns `None` if the offset is out of range (more than a day).
    pub fn from_offset_seconds(seconds: i32) -> Option<Self> {
        FixedOffset::east_opt(seconds).map(Self::new)
    }

    /// The offset this calendar applies.
    pub const fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// The calendar day an instant falls on.
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// The local hour (0..24) an instant falls in.
    pub fn hour_of(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.offset).hour()
    }

    /// Local midnight at the start of `date`, as a UTC instant.
    pub fn day_start(&self, date: NaiveDate) -> DateTime<Utc> {
        let local_midnight = date.and_time(NaiveTime::MIN);
        let utc_naive =
            local_midnight - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Utc.from_utc_datetime(&utc_naive)
    }

    /// Local midnight at the end of `date` (start of the next day).
    pub fn day_end(&self, date: NaiveDate) -> DateTime<Utc> {
        self.day_start(date) + Duration::days(1)
    }

    /// The instant `hour:minute` local time on `date`.
    ///
    /// `hour` may be 24 to express the end of the day.
    pub fn at(&self, date: NaiveDate, hour: u32, minute: u32) -> DateTime<Utc> {
        self.day_start(date) + Duration::hours(i64::from(hour)) + Duration::minutes(i64::from(minute))
    }

    /// The Monday that starts the ISO week containing `date`.
    pub fn week_start(date: NaiveDate) -> NaiveDate {
        let days_since_monday = date.weekday().num_days_from_monday();
        date - Duration::days(i64::from(days_since_monday))
    }
}

/// An inclusive range of calendar days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// First day in the range.
    pub start: NaiveDate,
    /// Last day in the range (inclusive).
    pub end: NaiveDate,
}

impl DateRange {
    /// Creates a range, swapping the bounds if they are reversed.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        if end < start {
            Self {
                start: end,
                end: start,
            }
        } else {
            Self { start, end }
        }
    }

    /// A range covering a single day.
    pub const fn single(date: NaiveDate) -> Self {
        Self {
            start: date,
            end: date,
        }
    }

    /// The `days` days ending on (and including) `last`.
    ///
    /// A zero-day request is treated as a single day.
    pub fn trailing(last: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: last - Duration::days(span),
            end: last,
        }
    }

    /// Whether `date` lies inside the range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Number of days in the range.
    pub fn len_days(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// Iterates over every day in the range in ascending order.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + use<> {
        let end = self.end;
        self.start.iter_days().take_while(move |d| *d <= end)
    }
}
