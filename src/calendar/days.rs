use crate::time_range::TimeRange;
use chrono::Weekday;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Days in the order the calendar tables store them, Sunday first.
pub const ALL_WEEKDAYS: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

pub const DEFAULT_WORKING_MORNING: TimeRange = TimeRange::from_hours(8, 12);
pub const DEFAULT_WORKING_AFTERNOON: TimeRange = TimeRange::from_hours(13, 17);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayType {
    Working,
    NonWorking,
    /// Inherit the classification from the parent calendar.
    Default,
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DayType::Working => "working",
            DayType::NonWorking => "non-working",
            DayType::Default => "default",
        };
        f.write_str(label)
    }
}

/// Normalise a weekday to 1..=7, Sunday being 1.
pub fn day_number(day: Weekday) -> u32 {
    day.number_from_sunday()
}

fn day_index(day: Weekday) -> usize {
    day.num_days_from_sunday() as usize
}

/// Per-weekday classification and working hours for a plain week.
///
/// A day with no stored type is "unset"; the hours table distinguishes
/// "no hours recorded" (`None`) from "explicitly no hours" (an empty list).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CalendarDays {
    day_types: [Option<DayType>; 7],
    hours: [Option<Vec<TimeRange>>; 7],
}

impl CalendarDays {
    pub fn new() -> Self {
        Self::default()
    }

    /// The stored day type, without consulting any parent.
    pub fn calendar_day_type(&self, day: Weekday) -> Option<DayType> {
        self.day_types[day_index(day)]
    }

    pub fn set_calendar_day_type(&mut self, day: Weekday, day_type: DayType) {
        let index = day_index(day);
        self.day_types[index] = Some(day_type);
        match day_type {
            DayType::Default => self.hours[index] = None,
            DayType::NonWorking => {
                self.hours[index].get_or_insert_with(Vec::new);
            }
            // Working days keep whatever hours are recorded, possibly none.
            DayType::Working => {}
        }
    }

    pub fn set_working_day(&mut self, day: Weekday, working: bool) {
        let day_type = if working { DayType::Working } else { DayType::NonWorking };
        self.set_calendar_day_type(day, day_type);
    }

    /// The stored hours for `day`, without consulting any parent.
    pub fn calendar_hours(&self, day: Weekday) -> Option<&[TimeRange]> {
        self.hours[day_index(day)].as_deref()
    }

    /// Start a fresh, empty set of hours for `day`, replacing any existing set.
    pub fn add_calendar_hours(&mut self, day: Weekday) -> &mut Vec<TimeRange> {
        let slot = &mut self.hours[day_index(day)];
        *slot = Some(Vec::new());
        slot.get_or_insert_with(Vec::new)
    }

    /// Mutable access to the hours for `day`, creating an empty set when none exists.
    pub fn calendar_hours_mut(&mut self, day: Weekday) -> &mut Vec<TimeRange> {
        self.hours[day_index(day)].get_or_insert_with(Vec::new)
    }

    pub fn remove_calendar_hours(&mut self, day: Weekday) {
        self.hours[day_index(day)] = None;
    }

    /// Mark Monday to Friday as working and the weekend as non-working.
    pub fn add_default_calendar_days(&mut self) {
        for day in ALL_WEEKDAYS {
            let working = !matches!(day, Weekday::Sat | Weekday::Sun);
            self.day_types[day_index(day)] = Some(if working { DayType::Working } else { DayType::NonWorking });
        }
    }

    pub fn add_default_calendar_hours(&mut self) {
        for day in ALL_WEEKDAYS {
            self.add_default_calendar_hours_for(day);
        }
    }

    /// Weekdays get 08:00-12:00 and 13:00-17:00; the weekend gets an empty set.
    pub fn add_default_calendar_hours_for(&mut self, day: Weekday) {
        let hours = self.add_calendar_hours(day);
        if !matches!(day, Weekday::Sat | Weekday::Sun) {
            hours.push(DEFAULT_WORKING_MORNING);
            hours.push(DEFAULT_WORKING_AFTERNOON);
        }
    }

    /// Any day without a stored type becomes `Default`.
    pub(crate) fn default_unset_day_types(&mut self) {
        for slot in &mut self.day_types {
            if slot.is_none() {
                *slot = Some(DayType::Default);
            }
        }
    }
}
