use crate::calendar::recurrence::{RecurrenceType, RecurringData};
use crate::calendar::range_ordering;
use crate::time_range::TimeRange;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Expansion order for recurring exceptions, lowest priority first.
const ORDERED_RECURRENCE_TYPES: [RecurrenceType; 4] = [
    RecurrenceType::Weekly,
    RecurrenceType::Monthly,
    RecurrenceType::Yearly,
    RecurrenceType::Daily,
];

/// A dated override of a calendar's normal working hours.
///
/// An exception with no ranges marks its dates as non-working. When a
/// recurrence is attached, the date span is taken from the first and last
/// generated dates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarException {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    from_date: NaiveDate,
    to_date: NaiveDate,
    #[serde(default)]
    ranges: Vec<TimeRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    recurring: Option<RecurringData>,
}

impl CalendarException {
    pub fn new(from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            name: None,
            from_date,
            to_date,
            ranges: Vec::new(),
            recurring: None,
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    pub fn recurring(recurring: RecurringData) -> Self {
        let from_date = recurring.calculated_first_date().unwrap_or(recurring.start_date());
        let to_date = recurring.calculated_last_date().unwrap_or(from_date);
        Self {
            name: None,
            from_date,
            to_date,
            ranges: Vec::new(),
            recurring: Some(recurring),
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

    pub fn ranges(&self) -> &[TimeRange] {
        &self.ranges
    }

    pub fn ranges_mut(&mut self) -> &mut Vec<TimeRange> {
        &mut self.ranges
    }

    pub fn add_range(&mut self, range: TimeRange) {
        self.ranges.push(range);
    }

    pub fn recurrence(&self) -> Option<&RecurringData> {
        self.recurring.as_ref()
    }

    pub fn is_working(&self) -> bool {
        !self.ranges.is_empty()
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        self.compare_date(date) == Ordering::Equal
    }

    /// True when the date spans of the two exceptions overlap.
    pub fn contains(&self, other: &CalendarException) -> bool {
        !(other.to_date < self.from_date || other.from_date > self.to_date)
    }

    /// Where this exception lies relative to `date`.
    pub fn compare_date(&self, date: NaiveDate) -> Ordering {
        range_ordering(self.from_date, self.to_date, date)
    }

    /// One concrete single-date exception per recurrence occurrence, or a
    /// copy of this exception when it does not recur.
    pub fn expanded_exceptions(&self) -> Vec<CalendarException> {
        match &self.recurring {
            None => vec![self.clone()],
            Some(recurring) => recurring
                .dates()
                .iter()
                .map(|date| CalendarException {
                    name: self.name.clone(),
                    from_date: *date,
                    to_date: *date,
                    ranges: self.ranges.clone(),
                    recurring: None,
                })
                .collect(),
        }
    }
}

impl fmt::Display for CalendarException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.from_date == self.to_date {
            write!(f, "{}", self.from_date)?;
        } else {
            write!(f, "{}..{}", self.from_date, self.to_date)?;
        }
        if let Some(name) = &self.name {
            write!(f, " \"{name}\"")?;
        }
        if self.ranges.is_empty() {
            f.write_str(" non-working")?;
        } else {
            let ranges: Vec<String> = self.ranges.iter().map(ToString::to_string).collect();
            write!(f, " {}", ranges.join(" "))?;
        }
        if let Some(recurring) = &self.recurring {
            write!(f, " ({recurring})")?;
        }
        Ok(())
    }
}

/// Build the date-sorted lookup table for a list of exceptions.
///
/// Recurring exceptions are expanded type by type so that later types win
/// on a shared date; single-date exceptions (including recurrences with a
/// single occurrence) are applied last and override everything else.
pub(crate) fn expand_exceptions(exceptions: &[CalendarException]) -> Vec<CalendarException> {
    let mut non_recurring = Vec::new();
    let mut recurring: Vec<(RecurrenceType, Vec<CalendarException>)> = Vec::new();

    for exception in exceptions {
        let mut expanded = exception.expanded_exceptions();
        if expanded.len() == 1 {
            non_recurring.append(&mut expanded);
        } else if let Some(data) = &exception.recurring {
            recurring.push((data.recurrence_type(), expanded));
        }
    }

    let mut by_date = BTreeMap::new();
    for recurrence_type in ORDERED_RECURRENCE_TYPES {
        for (_, expanded) in recurring.iter().filter(|(kind, _)| *kind == recurrence_type) {
            for exception in expanded {
                by_date.insert(exception.from_date, exception.clone());
            }
        }
    }

    for exception in non_recurring {
        by_date.insert(exception.from_date, exception);
    }

    by_date.into_values().collect()
}
