use crate::calendar::days::{ALL_WEEKDAYS, CalendarDays, DayType};
use crate::calendar::exception::CalendarException;
use crate::calendar::range_ordering;
use crate::calendar::recurrence::{RecurrenceType, RecurringData};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// An alternate weekly pattern in force between two dates (inclusive).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkWeek {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    from_date: NaiveDate,
    to_date: NaiveDate,
    days: CalendarDays,
}

impl WorkWeek {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            name: None,
            from_date,
            to_date,
            days: CalendarDays::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = Some(name.into());
    }

    pub fn from_date(&self) -> NaiveDate {
        self.from_date
    }

    pub fn to_date(&self) -> NaiveDate {
        self.to_date
    }

    pub fn days(&self) -> &CalendarDays {
        &self.days
    }

    pub fn days_mut(&mut self) -> &mut CalendarDays {
        &mut self.days
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.compare_date(date) == Ordering::Equal
    }

    pub fn compare_date(&self, date: NaiveDate) -> Ordering {
        range_ordering(self.from_date, self.to_date, date)
    }

    /// Express this week as weekly recurring exceptions, one per day whose
    /// type is set explicitly. The span is clipped to `earliest..=latest`
    /// when those bounds are supplied.
    pub fn convert_to_recurring_exceptions(
        &self,
        earliest: Option<NaiveDate>,
        latest: Option<NaiveDate>,
    ) -> Vec<CalendarException> {
        let from_date = earliest.map_or(self.from_date, |date| self.from_date.max(date));
        let to_date = latest.map_or(self.to_date, |date| self.to_date.min(date));
        if from_date > to_date {
            return Vec::new();
        }

        let mut exceptions = Vec::new();
        for day in ALL_WEEKDAYS {
            let working = match self.days.calendar_day_type(day) {
                Some(DayType::Working) => true,
                Some(DayType::NonWorking) => false,
                Some(DayType::Default) | None => continue,
            };

            let mut recurrence = RecurringData::new(RecurrenceType::Weekly, from_date);
            recurrence.set_frequency(Some(1));
            recurrence.set_finish_date(Some(to_date));
            recurrence.set_use_end_date(true);
            recurrence.set_day_of_week(day);
            if !recurrence.is_valid() {
                continue;
            }

            let mut exception = CalendarException::recurring(recurrence);
            if let Some(name) = &self.name {
                exception.set_name(name.clone());
            }
            if working {
                if let Some(hours) = self.days.calendar_hours(day) {
                    exception.ranges_mut().extend_from_slice(hours);
                }
            }
            exceptions.push(exception);
        }
        exceptions
    }
}
