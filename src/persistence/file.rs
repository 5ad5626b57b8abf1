use super::{PersistenceError, PersistenceResult};
use crate::calendar::ProjectCalendar;
use crate::calendar::days::{ALL_WEEKDAYS, CalendarDays};
use crate::calendar::exception::CalendarException;
use crate::calendar::week::WorkWeek;
use crate::calendars::{CalendarId, ProjectCalendars};
use crate::settings::ProjectSettings;
use crate::time_range::TimeRange;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use tracing::{debug, warn};

/// Serialized form of a whole calendar set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSetSnapshot {
    #[serde(default)]
    pub settings: ProjectSettings,
    pub calendars: Vec<CalendarSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarSnapshot {
    pub id: CalendarId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CalendarId>,
    #[serde(default)]
    pub days: CalendarDays,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exceptions: Vec<CalendarException>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub work_weeks: Vec<WorkWeek>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_per_day: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_per_week: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_per_month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minutes_per_year: Option<u32>,
}

impl CalendarSnapshot {
    fn from_calendar(calendar: &ProjectCalendar) -> Self {
        Self {
            id: calendar.id(),
            name: calendar.name().map(str::to_string),
            parent: calendar.parent_id(),
            days: calendar.days().clone(),
            exceptions: calendar.calendar_exceptions().to_vec(),
            work_weeks: calendar.work_weeks().to_vec(),
            minutes_per_day: calendar.calendar_minutes_per_day(),
            minutes_per_week: calendar.calendar_minutes_per_week(),
            minutes_per_month: calendar.calendar_minutes_per_month(),
            minutes_per_year: calendar.calendar_minutes_per_year(),
        }
    }

    fn validate(&self) -> PersistenceResult<()> {
        for day in ALL_WEEKDAYS {
            if let Some(hours) = self.days.calendar_hours(day) {
                validate_ranges(hours, || format!("calendar {} {day:?}", self.id))?;
            }
        }
        for exception in &self.exceptions {
            if exception.from_date() > exception.to_date() {
                return Err(PersistenceError::InvalidData(format!(
                    "calendar {} exception starts {} after it ends {}",
                    self.id,
                    exception.from_date(),
                    exception.to_date()
                )));
            }
            validate_ranges(exception.ranges(), || format!("calendar {} exception {exception}", self.id))?;
        }
        for week in &self.work_weeks {
            if week.from_date() > week.to_date() {
                return Err(PersistenceError::InvalidData(format!(
                    "calendar {} work week starts {} after it ends {}",
                    self.id,
                    week.from_date(),
                    week.to_date()
                )));
            }
            for day in ALL_WEEKDAYS {
                if let Some(hours) = week.days().calendar_hours(day) {
                    validate_ranges(hours, || format!("calendar {} work week {day:?}", self.id))?;
                }
            }
        }
        Ok(())
    }

    fn into_calendar(self) -> ProjectCalendar {
        let mut calendar = ProjectCalendar::new(self.id);
        if let Some(name) = self.name {
            calendar.set_name(name);
        }
        *calendar.days_mut() = self.days;
        for exception in self.exceptions {
            calendar.push_exception(exception);
        }
        for week in self.work_weeks {
            calendar.push_work_week(week);
        }
        calendar.set_calendar_minutes_per_day(self.minutes_per_day);
        calendar.set_calendar_minutes_per_week(self.minutes_per_week);
        calendar.set_calendar_minutes_per_month(self.minutes_per_month);
        calendar.set_calendar_minutes_per_year(self.minutes_per_year);
        calendar
    }
}

fn validate_ranges(ranges: &[TimeRange], context: impl Fn() -> String) -> PersistenceResult<()> {
    match ranges
        .iter()
        .find(|range| !range.ends_at_midnight() && range.start() > range.end())
    {
        Some(range) => Err(PersistenceError::InvalidData(format!(
            "{}: time range {range} ends before it starts",
            context()
        ))),
        None => Ok(()),
    }
}

pub fn to_snapshot(calendars: &ProjectCalendars) -> CalendarSetSnapshot {
    CalendarSetSnapshot {
        settings: calendars.settings().clone(),
        calendars: calendars
            .iter()
            .map(|calendar| CalendarSnapshot::from_calendar(calendar.calendar()))
            .collect(),
    }
}

/// Rebuild a calendar set. Every calendar is inserted before parents are
/// linked, so a snapshot may list derived calendars ahead of their bases.
pub fn from_snapshot(snapshot: CalendarSetSnapshot) -> PersistenceResult<ProjectCalendars> {
    for calendar in &snapshot.calendars {
        calendar.validate()?;
    }

    let mut calendars = ProjectCalendars::new(snapshot.settings);
    let mut links = Vec::new();
    for calendar in snapshot.calendars {
        if let Some(parent) = calendar.parent {
            links.push((calendar.id, parent));
        }
        calendars.insert_calendar(calendar.into_calendar())?;
    }

    for (id, parent) in links {
        if !calendars.contains(parent) {
            warn!(calendar = %id, %parent, "snapshot references an unknown base calendar; loading as a root calendar");
            continue;
        }
        calendars.set_parent(id, Some(parent))?;
    }
    Ok(calendars)
}

pub fn save_calendars_to_json<P: AsRef<Path>>(calendars: &ProjectCalendars, path: P) -> PersistenceResult<()> {
    let snapshot = to_snapshot(calendars);
    let file = File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, &snapshot)?;
    debug!(path = %path.as_ref().display(), calendars = snapshot.calendars.len(), "saved calendars");
    Ok(())
}

pub fn load_calendars_from_json<P: AsRef<Path>>(path: P) -> PersistenceResult<ProjectCalendars> {
    let file = File::open(path.as_ref())?;
    let snapshot: CalendarSetSnapshot = serde_json::from_reader(file)?;
    debug!(path = %path.as_ref().display(), calendars = snapshot.calendars.len(), "loaded calendar snapshot");
    from_snapshot(snapshot)
}
