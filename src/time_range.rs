use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MILLIS_PER_MINUTE: i64 = 60 * 1000;
pub const MILLIS_PER_HOUR: i64 = 60 * MILLIS_PER_MINUTE;
pub const MILLIS_PER_DAY: i64 = 24 * MILLIS_PER_HOUR;

/// A span of working time within a single day.
///
/// An `end` of 00:00 is read as 24:00, the end of the day. A range of
/// 00:00-00:00 therefore covers the whole day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub const fn new(start: NaiveTime, end: NaiveTime) -> Self {
        Self { start, end }
    }

    /// Whole-hour range; an hour outside 0..24 maps to midnight.
    pub const fn from_hours(start_hour: u32, end_hour: u32) -> Self {
        let start = match NaiveTime::from_hms_opt(start_hour, 0, 0) {
            Some(time) => time,
            None => NaiveTime::MIN,
        };
        let end = match NaiveTime::from_hms_opt(end_hour, 0, 0) {
            Some(time) => time,
            None => NaiveTime::MIN,
        };
        Self { start, end }
    }

    /// Build a range from hour/minute pairs, returning `None` for invalid times.
    pub fn from_hm(start_hour: u32, start_minute: u32, end_hour: u32, end_minute: u32) -> Option<Self> {
        let start = NaiveTime::from_hms_opt(start_hour, start_minute, 0)?;
        let end = if end_hour == 24 && end_minute == 0 {
            NaiveTime::MIN
        } else {
            NaiveTime::from_hms_opt(end_hour, end_minute, 0)?
        };
        Some(Self::new(start, end))
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn ends_at_midnight(&self) -> bool {
        is_midnight(self.end)
    }

    pub fn duration_millis(&self) -> i64 {
        millis_in_range(self.start, self.end)
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let end = if self.ends_at_midnight() {
            "24:00".to_string()
        } else {
            self.end.format("%H:%M").to_string()
        };
        write!(f, "{}-{}", self.start.format("%H:%M"), end)
    }
}

pub fn is_midnight(time: NaiveTime) -> bool {
    time == NaiveTime::MIN
}

/// Milliseconds elapsed since the start of the day.
pub fn time_millis(time: NaiveTime) -> i64 {
    i64::from(time.num_seconds_from_midnight()) * 1000 + i64::from(time.nanosecond() / 1_000_000)
}

/// Length of `[start, end]`, treating an `end` of midnight as 24:00.
pub fn millis_in_range(start: NaiveTime, end: NaiveTime) -> i64 {
    let end = if is_midnight(end) { MILLIS_PER_DAY } else { time_millis(end) };
    end - time_millis(start)
}

/// Length of the overlap between two ranges, honouring the midnight sentinel
/// on either end.
pub fn overlap_millis(start1: NaiveTime, end1: NaiveTime, start2: NaiveTime, end2: NaiveTime) -> i64 {
    let max_start = start1.max(start2);

    let min_end = match (is_midnight(end1), is_midnight(end2)) {
        (true, false) => end2,
        (false, true) => end1,
        _ => end1.min(end2),
    };

    if is_midnight(min_end) || max_start < min_end {
        millis_in_range(max_start, min_end)
    } else {
        0
    }
}

pub fn add_millis(time: NaiveTime, millis: i64) -> NaiveTime {
    time.overflowing_add_signed(chrono::Duration::milliseconds(millis)).0
}

pub fn subtract_millis(time: NaiveTime, millis: i64) -> NaiveTime {
    time.overflowing_sub_signed(chrono::Duration::milliseconds(millis)).0
}

pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// Place `time` on the day of `instant`.
pub fn set_time(instant: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    instant.date().and_time(time)
}

/// Place a finish `time` on the day of `instant`; midnight rolls over to the
/// start of the following day.
pub fn set_end_time(instant: NaiveDateTime, time: NaiveTime) -> NaiveDateTime {
    if is_midnight(time) {
        let next = instant.date().checked_add_days(Days::new(1)).unwrap_or(instant.date());
        day_start(next)
    } else {
        set_time(instant, time)
    }
}

/// Drop any sub-second component.
pub fn truncate_millis(instant: NaiveDateTime) -> NaiveDateTime {
    instant.with_nanosecond(0).unwrap_or(instant)
}
