//! Calendar manipulation that works across a calendar hierarchy.

use crate::calendar::days::{ALL_WEEKDAYS, DayType};
use crate::calendar::exception::CalendarException;
use crate::calendar::week::WorkWeek;
use crate::calendar::{CalendarRef, ProjectCalendar};
use crate::time_range::TimeRange;
use chrono::Weekday;

/// Merge `source` exceptions into `target`, letting exceptions already in
/// `target` win wherever the two overlap.
///
/// A source exception that collides with nothing is copied as-is, keeping
/// its recurrence. One that collides is expanded and only the occurrences
/// clear of the target's exceptions are added, as dated exceptions.
pub fn merge_exceptions(target: &mut ProjectCalendar, source: &[CalendarException]) {
    let existing = target.expanded_calendar_exceptions();

    for exception in source {
        let expanded = exception.expanded_exceptions();
        let collides = |candidate: &CalendarException| existing.iter().any(|e| e.contains(candidate));

        if !expanded.iter().any(collides) {
            target.push_exception(exception.clone());
            continue;
        }

        for occurrence in expanded.into_iter().filter(|occurrence| !collides(occurrence)) {
            let added = target.add_calendar_exception_range(occurrence.from_date(), occurrence.to_date());
            added.ranges_mut().extend_from_slice(occurrence.ranges());
        }
    }
}

/// Merge the exceptions of `source` and of every calendar it derives from
/// into `target`. Nearer calendars take precedence.
pub fn merge_calendar_exceptions(target: &mut ProjectCalendar, source: CalendarRef<'_>) {
    for calendar in source.lineage() {
        merge_exceptions(target, calendar.calendar_exceptions());
    }
}

/// A standalone copy of `calendar` that behaves like the original without
/// needing its base calendars. Root calendars are returned as a plain copy.
pub fn flatten(calendar: CalendarRef<'_>) -> ProjectCalendar {
    if !calendar.is_derived() {
        return calendar.calendar().clone();
    }

    let mut flat = ProjectCalendar::new(calendar.id());
    if let Some(name) = calendar.name() {
        flat.set_name(name);
    }
    // Overrides come from the nearest calendar in the lineage that sets one.
    let nearest = |field: fn(&ProjectCalendar) -> Option<u32>| {
        calendar.lineage().find_map(|calendar| field(calendar.calendar()))
    };
    flat.set_calendar_minutes_per_day(nearest(ProjectCalendar::calendar_minutes_per_day));
    flat.set_calendar_minutes_per_week(nearest(ProjectCalendar::calendar_minutes_per_week));
    flat.set_calendar_minutes_per_month(nearest(ProjectCalendar::calendar_minutes_per_month));
    flat.set_calendar_minutes_per_year(nearest(ProjectCalendar::calendar_minutes_per_year));

    for day in ALL_WEEKDAYS {
        let hours = calendar.hours(day);
        flat.add_calendar_hours(day).extend_from_slice(hours);
        let day_type = if hours.is_empty() { DayType::NonWorking } else { DayType::Working };
        flat.set_calendar_day_type(day, day_type);
    }

    for week in calendar.work_weeks() {
        flat.push_work_week(flatten_work_week(calendar, week));
    }

    merge_calendar_exceptions(&mut flat, calendar);
    flat
}

/// Copy of `week` in which `Default` days carry the hours they would have
/// inherited from the base calendar.
fn flatten_work_week(calendar: CalendarRef<'_>, week: &WorkWeek) -> WorkWeek {
    let mut flat = week.clone();
    for day in ALL_WEEKDAYS {
        if week.days().calendar_day_type(day) == Some(DayType::Default) {
            let inherited = inherited_hours(calendar, day);
            let days = flat.days_mut();
            if inherited.is_empty() {
                days.set_calendar_day_type(day, DayType::NonWorking);
            } else {
                days.set_calendar_day_type(day, DayType::Working);
                days.add_calendar_hours(day).extend_from_slice(inherited);
            }
        }
    }
    flat
}

fn inherited_hours<'a>(calendar: CalendarRef<'a>, day: Weekday) -> &'a [TimeRange] {
    calendar.parent().map_or(&[][..], |parent| parent.hours(day))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::recurrence::{RecurrenceType, RecurringData};
    use crate::calendars::CalendarId;
    use chrono::NaiveDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn colliding_recurrence_keeps_only_clear_occurrences() {
        let mut target = ProjectCalendar::new(CalendarId::new(1));
        target.add_calendar_exception(d(2024, 1, 3));

        let mut daily = RecurringData::new(RecurrenceType::Daily, d(2024, 1, 2));
        daily.set_occurrences(Some(3));
        let source = vec![CalendarException::recurring(daily)];
        merge_exceptions(&mut target, &source);

        let dates: Vec<_> = target
            .calendar_exceptions()
            .iter()
            .map(|exception| (exception.from_date(), exception.to_date()))
            .collect();
        assert_eq!(
            dates,
            vec![
                (d(2024, 1, 2), d(2024, 1, 2)),
                (d(2024, 1, 3), d(2024, 1, 3)),
                (d(2024, 1, 4), d(2024, 1, 4)),
            ]
        );
        assert!(target.calendar_exceptions().iter().all(|e| e.recurrence().is_none()));
    }

    #[test]
    fn overlapping_dated_exception_is_dropped() {
        let mut target = ProjectCalendar::new(CalendarId::new(1));
        target.add_calendar_exception(d(2024, 1, 3));

        merge_exceptions(&mut target, &[CalendarException::new(d(2024, 1, 2), d(2024, 1, 4))]);
        assert_eq!(target.calendar_exceptions().len(), 1);
    }

    #[test]
    fn clear_exception_is_copied_verbatim() {
        let mut target = ProjectCalendar::new(CalendarId::new(1));
        let source = vec![CalendarException::new(d(2024, 1, 2), d(2024, 1, 4))];
        merge_exceptions(&mut target, &source);
        assert_eq!(target.calendar_exceptions(), source.as_slice());
    }
}
