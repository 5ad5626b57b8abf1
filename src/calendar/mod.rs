//! Calendar definitions and the queries that resolve them.
//!
//! A [`ProjectCalendar`] owns its own week, exceptions and work weeks. All
//! queries that need to consult a parent go through [`CalendarRef`], a
//! borrowed view that pairs a calendar with the [`ProjectCalendars`] set it
//! belongs to.

pub mod cache;
pub mod days;
pub mod exception;
pub mod recurrence;
pub mod week;
pub mod working_time;

use crate::calendars::{CalendarId, ProjectCalendars};
use crate::duration::{DurationValue, TimeUnit, TimeUnitDefaults};
use crate::settings::ProjectSettings;
use crate::time_range::TimeRange;
use cache::CalendarCache;
use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use days::{ALL_WEEKDAYS, CalendarDays, DayType};
use exception::{CalendarException, expand_exceptions};
use parking_lot::{Mutex, MutexGuard};
use recurrence::RecurringData;
use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use tracing::debug;
use week::WorkWeek;

pub const DEFAULT_BASE_CALENDAR_NAME: &str = "Standard";

/// Upper bound on parent chain walks.
pub const MAX_CALENDAR_DEPTH: usize = 64;

/// Where the inclusive span `from..=to` lies relative to `date`.
///
/// `Less` means the span ends before `date`, `Greater` that it starts after.
pub(crate) fn range_ordering(from: NaiveDate, to: NaiveDate, date: NaiveDate) -> Ordering {
    if to < date {
        Ordering::Less
    } else if from > date {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

/// A working calendar: a plain week, dated exceptions, date-scoped work
/// weeks and optional per-calendar minute defaults.
#[derive(Debug)]
pub struct ProjectCalendar {
    id: CalendarId,
    name: Option<String>,
    parent: Option<CalendarId>,
    days: CalendarDays,
    exceptions: Vec<CalendarException>,
    work_weeks: Vec<WorkWeek>,
    minutes_per_day: Option<u32>,
    minutes_per_week: Option<u32>,
    minutes_per_month: Option<u32>,
    minutes_per_year: Option<u32>,
    cache: Mutex<CalendarCache>,
}

impl ProjectCalendar {
    pub fn new(id: CalendarId) -> Self {
        Self {
            id,
            name: None,
            parent: None,
            days: CalendarDays::new(),
            exceptions: Vec::new(),
            work_weeks: Vec::new(),
            minutes_per_day: None,
            minutes_per_week: None,
            minutes_per_month: None,
            minutes_per_year: None,
            cache: Mutex::new(CalendarCache::new()),
        }
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn parent_id(&self) -> Option<CalendarId> {
        self.parent
    }

    pub fn is_derived(&self) -> bool {
        self.parent.is_some()
    }

    pub(crate) fn set_parent_id(&mut self, parent: Option<CalendarId>) {
        self.parent = parent;
        self.days.default_unset_day_types();
        self.clear_cache();
    }

    pub fn days(&self) -> &CalendarDays {
        &self.days
    }

    /// Mutable access to the plain week.
    pub fn days_mut(&mut self) -> &mut CalendarDays {
        self.clear_cache();
        &mut self.days
    }

    pub fn calendar_day_type(&self, day: Weekday) -> Option<DayType> {
        self.days.calendar_day_type(day)
    }

    pub fn set_calendar_day_type(&mut self, day: Weekday, day_type: DayType) {
        self.clear_cache();
        self.days.set_calendar_day_type(day, day_type);
    }

    pub fn set_working_day(&mut self, day: Weekday, working: bool) {
        self.clear_cache();
        self.days.set_working_day(day, working);
    }

    pub fn calendar_hours(&self, day: Weekday) -> Option<&[TimeRange]> {
        self.days.calendar_hours(day)
    }

    pub fn add_calendar_hours(&mut self, day: Weekday) -> &mut Vec<TimeRange> {
        self.clear_cache();
        self.days.add_calendar_hours(day)
    }

    pub fn remove_calendar_hours(&mut self, day: Weekday) {
        self.clear_cache();
        self.days.remove_calendar_hours(day);
    }

    pub fn add_default_calendar_days(&mut self) {
        self.clear_cache();
        self.days.add_default_calendar_days();
    }

    pub fn add_default_calendar_hours(&mut self) {
        self.clear_cache();
        self.days.add_default_calendar_hours();
    }

    /// Exceptions as defined, sorted by start date.
    pub fn calendar_exceptions(&self) -> &[CalendarException] {
        &self.exceptions
    }

    pub fn add_calendar_exception(&mut self, date: NaiveDate) -> &mut CalendarException {
        self.push_exception(CalendarException::for_date(date))
    }

    pub fn add_calendar_exception_range(&mut self, from_date: NaiveDate, to_date: NaiveDate) -> &mut CalendarException {
        self.push_exception(CalendarException::new(from_date, to_date))
    }

    pub fn add_recurring_exception(&mut self, recurring: RecurringData) -> &mut CalendarException {
        self.push_exception(CalendarException::recurring(recurring))
    }

    /// Insert an exception, keeping the list ordered by start date.
    pub fn push_exception(&mut self, exception: CalendarException) -> &mut CalendarException {
        self.clear_cache();
        let index = self
            .exceptions
            .partition_point(|existing| existing.from_date() <= exception.from_date());
        self.exceptions.insert(index, exception);
        &mut self.exceptions[index]
    }

    /// Remove the first exception equal to `exception`.
    pub fn remove_calendar_exception(&mut self, exception: &CalendarException) -> Option<CalendarException> {
        let index = self.exceptions.iter().position(|existing| existing == exception)?;
        self.clear_cache();
        Some(self.exceptions.remove(index))
    }

    pub fn clear_calendar_exceptions(&mut self) {
        self.clear_cache();
        self.exceptions.clear();
    }

    /// Work weeks sorted by start date.
    pub fn work_weeks(&self) -> &[WorkWeek] {
        &self.work_weeks
    }

    pub fn add_work_week(&mut self, from_date: NaiveDate, to_date: NaiveDate) -> &mut WorkWeek {
        self.push_work_week(WorkWeek::new(from_date, to_date))
    }

    pub fn push_work_week(&mut self, week: WorkWeek) -> &mut WorkWeek {
        self.clear_cache();
        let index = self
            .work_weeks
            .partition_point(|existing| existing.from_date() <= week.from_date());
        self.work_weeks.insert(index, week);
        &mut self.work_weeks[index]
    }

    pub fn remove_work_week(&mut self, week: &WorkWeek) -> Option<WorkWeek> {
        let index = self.work_weeks.iter().position(|existing| existing == week)?;
        self.clear_cache();
        Some(self.work_weeks.remove(index))
    }

    pub fn clear_work_weeks(&mut self) {
        self.clear_cache();
        self.work_weeks.clear();
    }

    pub fn calendar_minutes_per_day(&self) -> Option<u32> {
        self.minutes_per_day
    }

    pub fn set_calendar_minutes_per_day(&mut self, minutes: Option<u32>) {
        self.clear_cache();
        self.minutes_per_day = minutes;
    }

    pub fn calendar_minutes_per_week(&self) -> Option<u32> {
        self.minutes_per_week
    }

    pub fn set_calendar_minutes_per_week(&mut self, minutes: Option<u32>) {
        self.clear_cache();
        self.minutes_per_week = minutes;
    }

    pub fn calendar_minutes_per_month(&self) -> Option<u32> {
        self.minutes_per_month
    }

    pub fn set_calendar_minutes_per_month(&mut self, minutes: Option<u32>) {
        self.clear_cache();
        self.minutes_per_month = minutes;
    }

    pub fn calendar_minutes_per_year(&self) -> Option<u32> {
        self.minutes_per_year
    }

    pub fn set_calendar_minutes_per_year(&mut self, minutes: Option<u32>) {
        self.clear_cache();
        self.minutes_per_year = minutes;
    }

    /// Own exceptions expanded into a date-sorted lookup table. Parent
    /// exceptions are not included.
    pub fn expanded_calendar_exceptions(&self) -> Arc<Vec<CalendarException>> {
        if let Some(expanded) = self.cache().expanded_exceptions.clone() {
            return expanded;
        }

        let expanded = Arc::new(expand_exceptions(&self.exceptions));
        debug!(calendar = %self.id, count = expanded.len(), "expanded calendar exceptions");
        self.cache().expanded_exceptions = Some(Arc::clone(&expanded));
        expanded
    }

    /// True when no derived data is currently held for this calendar.
    pub fn is_cache_empty(&self) -> bool {
        self.cache().is_empty()
    }

    pub(crate) fn cache(&self) -> MutexGuard<'_, CalendarCache> {
        self.cache.lock()
    }

    pub(crate) fn clear_cache(&mut self) {
        self.cache.get_mut().clear();
    }

    pub(crate) fn clear_shared_cache(&self) {
        self.cache().clear();
    }
}

impl Clone for ProjectCalendar {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            name: self.name.clone(),
            parent: self.parent,
            days: self.days.clone(),
            exceptions: self.exceptions.clone(),
            work_weeks: self.work_weeks.clone(),
            minutes_per_day: self.minutes_per_day,
            minutes_per_week: self.minutes_per_week,
            minutes_per_month: self.minutes_per_month,
            minutes_per_year: self.minutes_per_year,
            cache: Mutex::new(CalendarCache::new()),
        }
    }
}

/// A calendar viewed together with the set that owns it.
///
/// Every query that can fall back to a parent calendar lives here.
#[derive(Clone, Copy)]
pub struct CalendarRef<'a> {
    calendars: &'a ProjectCalendars,
    calendar: &'a ProjectCalendar,
}

impl<'a> Deref for CalendarRef<'a> {
    type Target = ProjectCalendar;

    fn deref(&self) -> &Self::Target {
        self.calendar
    }
}

impl fmt::Debug for CalendarRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CalendarRef").field(&self.calendar.id).finish()
    }
}

impl<'a> CalendarRef<'a> {
    pub(crate) fn new(calendars: &'a ProjectCalendars, calendar: &'a ProjectCalendar) -> Self {
        Self { calendars, calendar }
    }

    pub fn calendar(&self) -> &'a ProjectCalendar {
        self.calendar
    }

    pub fn calendars(&self) -> &'a ProjectCalendars {
        self.calendars
    }

    pub fn settings(&self) -> &'a ProjectSettings {
        self.calendars.settings()
    }

    pub fn parent(&self) -> Option<CalendarRef<'a>> {
        self.calendar.parent.and_then(|id| self.calendars.calendar(id))
    }

    /// This calendar followed by its ancestors, nearest first.
    pub fn lineage(&self) -> impl Iterator<Item = CalendarRef<'a>> + 'a {
        std::iter::successors(Some(*self), |calendar| calendar.parent()).take(MAX_CALENDAR_DEPTH)
    }

    /// Calendars whose parent is this calendar.
    pub fn derived_calendars(&self) -> Vec<CalendarRef<'a>> {
        self.calendars
            .derived_calendar_ids(self.calendar.id)
            .into_iter()
            .filter_map(|id| self.calendars.calendar(id))
            .collect()
    }

    /// Effective classification of `day`. `Default` defers to the parent; at
    /// the root it means Monday to Friday working.
    pub fn day_type(&self, day: Weekday) -> DayType {
        for calendar in self.lineage() {
            match calendar.days.calendar_day_type(day) {
                Some(DayType::Default) | None => continue,
                Some(day_type) => return day_type,
            }
        }

        if matches!(day, Weekday::Sat | Weekday::Sun) {
            DayType::NonWorking
        } else {
            DayType::Working
        }
    }

    pub fn is_working_day(&self, day: Weekday) -> bool {
        self.day_type(day) == DayType::Working
    }

    /// Stored hours for `day`, from this calendar or the nearest ancestor
    /// that records any.
    pub fn hours(&self, day: Weekday) -> &'a [TimeRange] {
        self.lineage()
            .find_map(|calendar| calendar.calendar.days.calendar_hours(day))
            .unwrap_or(&[])
    }

    /// Effective working ranges for `date`, after exceptions and work weeks.
    pub fn hours_for_date(&self, date: NaiveDate) -> Vec<TimeRange> {
        self.ranges(date).into_owned()
    }

    /// The exception covering `date`, searching parents when this calendar has none.
    pub fn exception(&self, date: NaiveDate) -> Option<CalendarException> {
        self.lineage().find_map(|calendar| {
            let expanded = calendar.calendar.expanded_calendar_exceptions();
            expanded
                .binary_search_by(|exception| exception.compare_date(date))
                .ok()
                .map(|index| expanded[index].clone())
        })
    }

    /// The work week covering `date`, searching parents when this calendar has none.
    pub fn work_week(&self, date: NaiveDate) -> Option<&'a WorkWeek> {
        self.lineage().find_map(|calendar| {
            let weeks = &calendar.calendar.work_weeks;
            weeks
                .binary_search_by(|week| week.compare_date(date))
                .ok()
                .map(|index| &weeks[index])
        })
    }

    /// Resolve the working ranges for `date`: exception first, then the
    /// applicable work week or this calendar's own week.
    pub(crate) fn ranges(&self, date: NaiveDate) -> Cow<'a, [TimeRange]> {
        if let Some(exception) = self.exception(date) {
            return Cow::Owned(exception.ranges().to_vec());
        }

        let days = match self.work_week(date) {
            Some(week) => week.days(),
            None => &self.calendar.days,
        };
        Cow::Borrowed(self.resolve_day(days, date.weekday()))
    }

    /// Weekday-only resolution against this calendar's own week.
    pub fn ranges_for_day(&self, day: Weekday) -> &'a [TimeRange] {
        self.resolve_day(&self.calendar.days, day)
    }

    fn resolve_day(&self, days: &'a CalendarDays, day: Weekday) -> &'a [TimeRange] {
        match days.calendar_day_type(day).unwrap_or(DayType::Default) {
            DayType::NonWorking => &[],
            DayType::Working => days.calendar_hours(day).unwrap_or(&[]),
            DayType::Default => self.parent().map_or(&[][..], |parent| parent.hours(day)),
        }
    }

    pub fn is_working_date(&self, date: NaiveDate) -> bool {
        !self.ranges(date).is_empty()
    }

    /// Start of the first working range on `date`.
    pub fn start_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        if let Some(time) = self.calendar.cache().start_times.get(&date).copied() {
            return Some(time);
        }

        let time = self.ranges(date).first()?.start();
        self.calendar.cache().start_times.insert(date, time);
        Some(time)
    }

    /// End of the last working range on `date`; midnight means end of day.
    pub fn finish_time(&self, date: NaiveDate) -> Option<NaiveTime> {
        self.ranges(date).last().map(TimeRange::end)
    }

    /// Working time in a typical `day`, ignoring exceptions and work weeks.
    pub fn get_work_for_day(&self, day: Weekday, unit: TimeUnit) -> DurationValue {
        let total = self.ranges_for_day(day).iter().map(TimeRange::duration_millis).sum();
        self.convert_format(total, unit)
    }

    pub fn get_work_for_date(&self, date: NaiveDate, unit: TimeUnit) -> DurationValue {
        let total = self.ranges(date).iter().map(TimeRange::duration_millis).sum();
        self.convert_format(total, unit)
    }

    /// Expanded exceptions with every work week folded in as weekly
    /// recurring exceptions, for consumers that only understand flat
    /// exception lists.
    pub fn expanded_calendar_exceptions_with_work_weeks(&self) -> Vec<CalendarException> {
        if self.calendar.work_weeks.is_empty() {
            return self.calendar.expanded_calendar_exceptions().as_ref().clone();
        }

        let settings = self.settings();
        let mut scratch = ProjectCalendar::new(self.calendar.id);
        crate::helper::merge_exceptions(&mut scratch, &self.calendar.exceptions);
        for week in &self.calendar.work_weeks {
            let converted = week.convert_to_recurring_exceptions(settings.project_start, settings.project_finish);
            crate::helper::merge_exceptions(&mut scratch, &converted);
        }
        scratch.expanded_calendar_exceptions().as_ref().clone()
    }
}

impl TimeUnitDefaults for CalendarRef<'_> {
    fn minutes_per_day(&self) -> u32 {
        self.lineage()
            .find_map(|calendar| calendar.calendar.minutes_per_day)
            .unwrap_or(self.settings().minutes_per_day)
    }

    fn minutes_per_week(&self) -> u32 {
        self.lineage()
            .find_map(|calendar| calendar.calendar.minutes_per_week)
            .unwrap_or(self.settings().minutes_per_week)
    }

    fn minutes_per_month(&self) -> u32 {
        self.lineage()
            .find_map(|calendar| calendar.calendar.minutes_per_month)
            .unwrap_or(self.settings().minutes_per_month)
    }

    fn minutes_per_year(&self) -> u32 {
        self.lineage()
            .find_map(|calendar| calendar.calendar.minutes_per_year)
            .unwrap_or(self.settings().minutes_per_year)
    }

    fn days_per_month(&self) -> u32 {
        self.settings().days_per_month
    }
}

impl fmt::Display for CalendarRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Calendar {} \"{}\"", self.calendar.id, self.calendar.name().unwrap_or(""))?;
        if let Some(parent) = self.parent() {
            writeln!(f, "  base calendar: {} \"{}\"", parent.id(), parent.name().unwrap_or(""))?;
        }

        for day in ALL_WEEKDAYS {
            let stored = self
                .calendar
                .days
                .calendar_day_type(day)
                .map_or_else(|| "unset".to_string(), |day_type| day_type.to_string());
            let hours: Vec<String> = self.ranges_for_day(day).iter().map(ToString::to_string).collect();
            writeln!(f, "  {day:?}: {stored} [{}]", hours.join(", "))?;
        }

        for exception in &self.calendar.exceptions {
            writeln!(f, "  exception {exception}")?;
        }
        for week in &self.calendar.work_weeks {
            writeln!(
                f,
                "  work week {}..{} \"{}\"",
                week.from_date(),
                week.to_date(),
                week.name().unwrap_or("")
            )?;
        }
        Ok(())
    }
}
