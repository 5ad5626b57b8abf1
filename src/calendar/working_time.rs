//! Working time arithmetic: time between instants, instant plus duration,
//! and the nearest start or finish of work.

use crate::calendar::CalendarRef;
use crate::calendar::cache::DateMemo;
use crate::duration::{DurationValue, TimeUnit, TimeUnitDefaults};
use crate::time_range::{
    MILLIS_PER_DAY, MILLIS_PER_HOUR, MILLIS_PER_MINUTE, TimeRange, add_millis, day_start, is_midnight,
    millis_in_range, overlap_millis, set_end_time, set_time, subtract_millis, truncate_millis,
};
use chrono::{Days, NaiveDateTime, NaiveTime, TimeDelta};
use tracing::{trace, warn};

/// Upper bound on the number of days searched for the next or previous
/// working day before giving up.
pub const MAX_NONWORKING_DAYS: u32 = 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Forward,
    Backward,
}

/// Round half up, as the millisecond arithmetic below expects.
fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

fn round_two_places(value: f64) -> f64 {
    round_half_up(value * 100.0) as f64 / 100.0
}

fn step(instant: NaiveDateTime, direction: Direction) -> Option<NaiveDateTime> {
    match direction {
        Direction::Forward => instant.checked_add_days(Days::new(1)),
        Direction::Backward => instant.checked_sub_days(Days::new(1)),
    }
}

/// Working time in `ranges` from `target` to the end of the day.
fn total_time_from(ranges: &[TimeRange], target: NaiveTime) -> i64 {
    ranges
        .iter()
        .filter(|range| range.ends_at_midnight() || target <= range.end())
        .map(|range| overlap_millis(range.start(), range.end(), target, range.end()))
        .sum()
}

/// Working time in `ranges` between two times of the same day.
fn total_time_between(ranges: &[TimeRange], start: NaiveTime, end: NaiveTime) -> i64 {
    if start == end {
        return 0;
    }
    ranges
        .iter()
        .map(|range| overlap_millis(start, end, range.start(), range.end()))
        .sum()
}

fn total_time(ranges: &[TimeRange]) -> i64 {
    ranges.iter().map(TimeRange::duration_millis).sum()
}

impl<'a> CalendarRef<'a> {
    /// Working time between two instants, negative when `end` precedes `start`.
    pub fn get_work(&self, start: NaiveDateTime, end: NaiveDateTime, unit: TimeUnit) -> DurationValue {
        self.convert_format(self.work_millis(start, end), unit)
    }

    /// Working milliseconds between two instants, cached per `(start, end)` pair.
    pub(crate) fn work_millis(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let key = (start, end);
        if let Some(total) = self.calendar().cache().working_time.get(&key).copied() {
            trace!(calendar = %self.id(), %start, %end, "working time cache hit");
            return total;
        }

        let total = self.compute_work_millis(start, end);
        self.calendar().cache().working_time.put(key, total);
        total
    }

    fn compute_work_millis(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let (start, end, invert) = if start > end { (end, start, true) } else { (start, end, false) };

        let total = if start.date() == end.date() {
            total_time_between(&self.ranges(start.date()), start.time(), end.time())
        } else {
            self.multi_day_work_millis(start, end)
        };

        if invert { -total } else { total }
    }

    fn multi_day_work_millis(&self, start: NaiveDateTime, end: NaiveDateTime) -> i64 {
        let canonical_end = day_start(end.date());
        let mut total = 0;

        // Find the first working day; the start day itself counts from its
        // own time of day, any later day counts in full.
        let mut current = start;
        while !self.is_working_date(current.date()) && current < canonical_end {
            match step(current, Direction::Forward) {
                Some(next) => current = next,
                None => break,
            }
        }

        if current < canonical_end {
            let target = if current == start { start.time() } else { NaiveTime::MIN };
            total += total_time_from(&self.ranges(current.date()), target);

            while let Some(next) = step(current, Direction::Forward) {
                current = next;
                if current >= canonical_end {
                    break;
                }
                total += total_time(&self.ranges(current.date()));
            }
        }

        total + total_time_between(&self.ranges(end.date()), NaiveTime::MIN, end.time())
    }

    /// Express a millisecond total in `unit`.
    ///
    /// Days and weeks use this calendar's effective minutes per day and per
    /// week, months use minutes per day and the project's days per month,
    /// and years use minutes per year. A zero divisor yields zero.
    pub(crate) fn convert_format(&self, total: i64, unit: TimeUnit) -> DurationValue {
        let millis = total as f64;
        let minute = MILLIS_PER_MINUTE as f64;
        let divide = |divisor: f64| if divisor == 0.0 { 0.0 } else { millis / divisor };

        let amount = match unit {
            TimeUnit::Minutes | TimeUnit::ElapsedMinutes => millis / minute,
            TimeUnit::Hours | TimeUnit::ElapsedHours => millis / MILLIS_PER_HOUR as f64,
            TimeUnit::Days => divide(f64::from(self.minutes_per_day()) * minute),
            TimeUnit::Weeks => divide(f64::from(self.minutes_per_week()) * minute),
            TimeUnit::Months => {
                divide(f64::from(self.days_per_month()) * f64::from(self.minutes_per_day()) * minute)
            }
            TimeUnit::Years => divide(f64::from(self.minutes_per_year()) * minute),
            TimeUnit::ElapsedDays => millis / MILLIS_PER_DAY as f64,
            TimeUnit::ElapsedWeeks => millis / (7 * MILLIS_PER_DAY) as f64,
            TimeUnit::ElapsedMonths => millis / (30 * MILLIS_PER_DAY) as f64,
            TimeUnit::ElapsedYears => millis / (52 * 7 * MILLIS_PER_DAY) as f64,
        };
        DurationValue::new(amount, unit)
    }

    /// Number of working dates from `start` to `end`, inclusive, ignoring
    /// time of day.
    pub fn get_duration(&self, start: NaiveDateTime, end: NaiveDateTime) -> DurationValue {
        let mut days = (end.date() - start.date()).num_days() + 1;
        let mut date = start.date();
        let mut working = 0u32;

        while days > 0 {
            if self.is_working_date(date) {
                working += 1;
            }
            days -= 1;
            match date.succ_opt() {
                Some(next) => date = next,
                None => break,
            }
        }
        DurationValue::new(f64::from(working), TimeUnit::Days)
    }

    /// The instant reached by working `duration` from `start`. Negative
    /// durations work backwards; elapsed units ignore working hours.
    pub fn get_date(&self, start: NaiveDateTime, duration: DurationValue) -> NaiveDateTime {
        let settings = self.settings();
        if duration.unit().is_elapsed() {
            let minutes = duration.convert_units(TimeUnit::ElapsedMinutes, settings).amount();
            return TimeDelta::try_milliseconds(round_half_up(minutes * MILLIS_PER_MINUTE as f64))
                .and_then(|offset| start.checked_add_signed(offset))
                .unwrap_or(start);
        }

        let minutes = round_two_places(duration.convert_units(TimeUnit::Minutes, settings).amount());
        if duration.amount() < 0.0 {
            self.date_from_negative_duration(start, -round_half_up(minutes * MILLIS_PER_MINUTE as f64))
        } else {
            self.date_from_positive_duration(start, round_half_up(minutes * MILLIS_PER_MINUTE as f64))
        }
    }

    fn date_from_positive_duration(&self, start: NaiveDateTime, remaining: i64) -> NaiveDateTime {
        if remaining == 0 {
            return start;
        }

        let memo = self.calendar().cache().date_memo;
        let (mut current_start, mut left) = (start, remaining);

        // Resume from the previous answer when the same start is asked for
        // at least as much work.
        if let Some(memo) = memo.filter(|memo| memo.start == start && remaining >= memo.remaining) {
            trace!(calendar = %self.id(), %start, "resuming date calculation from memo");
            current_start = memo.result;
            left -= memo.remaining;
            if left == 0 {
                return memo.result;
            }
        }

        let (result, exhausted) = self.forward_from(current_start, left);
        if !exhausted {
            self.calendar().cache().date_memo = Some(DateMemo { start, remaining, result });
        }
        result
    }

    /// Work forward from `start` until `remaining` milliseconds are used.
    /// The flag is set when the search for a working day gave up.
    fn forward_from(&self, start: NaiveDateTime, mut remaining: i64) -> (NaiveDateTime, bool) {
        let mut current_start = start;
        let mut current_end = day_start(start.date())
            .checked_add_days(Days::new(1))
            .unwrap_or(start);

        while remaining > 0 {
            let capacity = self.work_millis(current_start, current_end);

            if remaining == capacity {
                if let Some(finish) = self.finish_time(current_start.date()) {
                    current_end = set_end_time(current_start, finish);
                }
                break;
            }

            if remaining > capacity {
                remaining -= capacity;
                let (day, exhausted) = self.adjacent_working_day(current_start, Direction::Forward);
                if exhausted {
                    return (truncate_millis(day), true);
                }
                current_start = match self.start_time(day.date()) {
                    Some(time) => set_time(day, time),
                    None => day,
                };
                current_end = match self.finish_time(current_start.date()) {
                    Some(time) => set_end_time(current_start, time),
                    None => current_start,
                };
            } else {
                match self.forward_within_day(current_start, remaining) {
                    Some(end) => current_end = end,
                    None => warn!(calendar = %self.id(), %current_start, "working ranges did not absorb remaining time"),
                }
                remaining = 0;
            }
        }

        (truncate_millis(current_end), false)
    }

    /// Locate the end of `remaining` milliseconds of work starting at
    /// `current_start`, when the day has enough working time left.
    fn forward_within_day(&self, current_start: NaiveDateTime, mut remaining: i64) -> Option<NaiveDateTime> {
        let ranges = self.ranges(current_start.date());
        let start_time = current_start.time();
        let mut first_range = true;

        for range in ranges.iter() {
            let mut range_start = range.start();
            let range_end = range.end();

            if first_range && !range.ends_at_midnight() && range_end < start_time {
                continue;
            }
            if first_range && range_start < start_time {
                range_start = start_time;
            }
            first_range = false;

            let range_millis = millis_in_range(range_start, range_end);
            if remaining > range_millis {
                remaining -= range_millis;
            } else if remaining == range_millis {
                return Some(set_end_time(current_start, range_end));
            } else {
                return Some(set_time(current_start, add_millis(range_start, remaining)));
            }
        }
        None
    }

    fn date_from_negative_duration(&self, end: NaiveDateTime, mut remaining: i64) -> NaiveDateTime {
        if remaining == 0 {
            return end;
        }

        let mut current_end = end;
        let mut current_start = if is_midnight(end.time()) {
            end.checked_sub_days(Days::new(1)).map_or(end, |day| day_start(day.date()))
        } else {
            day_start(end.date())
        };

        while remaining > 0 {
            let capacity = self.work_millis(current_start, current_end);

            if remaining == capacity {
                if let Some(time) = self.start_time(current_start.date()) {
                    current_start = set_time(current_start, time);
                }
                break;
            }

            if remaining > capacity {
                remaining -= capacity;
                let (day, exhausted) = self.adjacent_working_day(current_start, Direction::Backward);
                if exhausted {
                    return truncate_millis(step(current_end, Direction::Backward).unwrap_or(current_end));
                }
                current_start = day;
                current_end = match self.finish_time(day.date()) {
                    Some(time) => set_end_time(day, time),
                    None => day,
                };
            } else {
                match self.backward_within_day(current_start, current_end, remaining) {
                    Some(start) => current_start = start,
                    None => warn!(calendar = %self.id(), %current_end, "working ranges did not absorb remaining time"),
                }
                remaining = 0;
            }
        }

        truncate_millis(current_start)
    }

    /// Locate the start of `remaining` milliseconds of work ending at
    /// `current_end`, scanning the day's ranges from last to first.
    fn backward_within_day(
        &self,
        current_start: NaiveDateTime,
        current_end: NaiveDateTime,
        mut remaining: i64,
    ) -> Option<NaiveDateTime> {
        let ranges = self.ranges(current_start.date());
        let end_time = current_end.time();
        let mut last_range = true;

        for range in ranges.iter().rev() {
            let range_start = range.start();
            let mut range_end = range.end();

            if !is_midnight(end_time) && end_time < range_start {
                continue;
            }
            if last_range && !is_midnight(end_time) && (range.ends_at_midnight() || range_end > end_time) {
                range_end = end_time;
            }
            last_range = false;

            let range_millis = millis_in_range(range_start, range_end);
            if remaining > range_millis {
                remaining -= range_millis;
            } else if remaining == range_millis {
                return Some(set_time(current_start, range_start));
            } else {
                return Some(set_time(current_start, subtract_millis(range_end, remaining)));
            }
        }
        None
    }

    /// Step a day at a time from `from` until a working date is found. When
    /// none is found within [`MAX_NONWORKING_DAYS`], the adjacent day is
    /// returned and the flag is set.
    fn adjacent_working_day(&self, from: NaiveDateTime, direction: Direction) -> (NaiveDateTime, bool) {
        let fallback = step(from, direction).unwrap_or(from);
        let mut current = from;

        for _ in 0..MAX_NONWORKING_DAYS {
            let Some(next) = step(current, direction) else {
                break;
            };
            current = next;
            if self.is_working_date(current.date()) {
                return (current, false);
            }
        }

        warn!(
            calendar = %self.id(),
            %from,
            ?direction,
            "no working day within {MAX_NONWORKING_DAYS} days"
        );
        (fallback, true)
    }

    /// The instant at or after `instant` when work next starts.
    pub fn get_next_work_start(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let time = instant.time();
        let today = self
            .ranges(instant.date())
            .iter()
            .find(|range| range.ends_at_midnight() || time < range.end())
            .map(|range| time.max(range.start()));

        if let Some(start) = today {
            return set_time(instant, start);
        }

        let (day, exhausted) = self.adjacent_working_day(instant, Direction::Forward);
        if exhausted {
            return day;
        }
        match self.start_time(day.date()) {
            Some(start) => set_time(day, start),
            None => day,
        }
    }

    /// The instant at or before `instant` when work last finished.
    ///
    /// A range ending at midnight finishes at the start of the next day, so
    /// it never counts as finished on its own day.
    pub fn get_previous_work_finish(&self, instant: NaiveDateTime) -> NaiveDateTime {
        let time = instant.time();
        let today = self
            .ranges(instant.date())
            .iter()
            .rev()
            .find(|range| !range.ends_at_midnight() && time >= range.end())
            .map(TimeRange::end);

        if let Some(finish) = today {
            return set_time(instant, finish);
        }

        let (day, exhausted) = self.adjacent_working_day(instant, Direction::Backward);
        if exhausted {
            return day;
        }
        match self.finish_time(day.date()) {
            Some(finish) => set_end_time(day, finish),
            None => day,
        }
    }
}
