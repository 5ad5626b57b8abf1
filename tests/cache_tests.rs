use chrono::{NaiveDate, NaiveDateTime, Weekday};
use schedule_calendar::calendar::days::DEFAULT_WORKING_MORNING;
use schedule_calendar::{CalendarId, DurationValue, ProjectCalendars, TimeUnit};

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    d(y, m, day).and_hms_opt(h, min, 0).unwrap()
}

fn base_and_child() -> (ProjectCalendars, CalendarId, CalendarId) {
    let mut calendars = ProjectCalendars::default();
    let base = calendars.add_default_base_calendar();
    let child = calendars.add_default_derived_calendar(base).unwrap();
    (calendars, base, child)
}

#[test]
fn exception_added_after_query_is_seen() {
    let (mut calendars, base, _) = base_and_child();
    let (start, end) = (dt(2006, 3, 13, 0, 0), dt(2006, 3, 17, 0, 0));

    let before = calendars.calendar(base).unwrap().get_work(start, end, TimeUnit::Hours);
    assert_eq!(before.amount(), 32.0);
    assert!(!calendars.calendar(base).unwrap().is_cache_empty());

    calendars.calendar_mut(base).unwrap().add_calendar_exception(d(2006, 3, 15));
    let after = calendars.calendar(base).unwrap().get_work(start, end, TimeUnit::Hours);
    assert_eq!(after.amount(), 24.0);
}

#[test]
fn parent_change_reaches_derived_calendar() {
    let (mut calendars, base, child) = base_and_child();
    let (start, end) = (dt(2006, 3, 13, 0, 0), dt(2006, 3, 14, 0, 0));

    assert_eq!(calendars.calendar(child).unwrap().get_work(start, end, TimeUnit::Hours).amount(), 8.0);
    assert!(!calendars.calendar(child).unwrap().is_cache_empty());

    calendars
        .calendar_mut(base)
        .unwrap()
        .add_calendar_hours(Weekday::Mon)
        .push(DEFAULT_WORKING_MORNING);
    assert!(calendars.calendar(child).unwrap().is_cache_empty());
    assert_eq!(calendars.calendar(child).unwrap().get_work(start, end, TimeUnit::Hours).amount(), 4.0);
}

#[test]
fn reparenting_discards_derived_results() {
    let (mut calendars, base, child) = base_and_child();
    let other = {
        let mut cal = calendars.add_calendar();
        cal.set_name("Night");
        cal.id()
    };
    let (start, end) = (dt(2006, 3, 13, 0, 0), dt(2006, 3, 14, 0, 0));
    assert_eq!(calendars.calendar(child).unwrap().get_work(start, end, TimeUnit::Hours).amount(), 8.0);

    calendars.set_parent(child, Some(other)).unwrap();
    assert_eq!(calendars.derived_calendar_ids(base), Vec::<CalendarId>::new());
    assert_eq!(calendars.derived_calendar_ids(other), vec![child]);
    assert_eq!(calendars.calendar(child).unwrap().get_work(start, end, TimeUnit::Hours).amount(), 0.0);
}

#[test]
fn date_memo_is_dropped_on_change() {
    let (mut calendars, base, _) = base_and_child();
    let start = dt(2003, 10, 9, 8, 0);

    let first = calendars.calendar(base).unwrap().get_date(start, DurationValue::hours(16.0));
    assert_eq!(first, dt(2003, 10, 10, 17, 0));

    calendars.calendar_mut(base).unwrap().add_calendar_exception(d(2003, 10, 10));
    let second = calendars.calendar(base).unwrap().get_date(start, DurationValue::hours(24.0));
    assert_eq!(second, dt(2003, 10, 14, 17, 0));
}

#[test]
fn reversed_query_is_computed_separately() {
    let (calendars, base, _) = base_and_child();
    let cal = calendars.calendar(base).unwrap();
    let (a, b) = (dt(2006, 3, 13, 10, 0), dt(2006, 3, 15, 11, 0));
    let forward = cal.get_work(a, b, TimeUnit::Minutes);
    let backward = cal.get_work(b, a, TimeUnit::Minutes);
    assert_eq!(forward.amount(), -backward.amount());
    assert_eq!(forward.amount(), (6.0 + 8.0 + 3.0) * 60.0);
}

#[test]
fn settings_change_clears_every_calendar() {
    let (mut calendars, base, child) = base_and_child();
    let (start, end) = (dt(2006, 3, 13, 0, 0), dt(2006, 3, 14, 0, 0));
    calendars.calendar(base).unwrap().get_work(start, end, TimeUnit::Days);
    calendars.calendar(child).unwrap().get_work(start, end, TimeUnit::Days);

    let mut settings = calendars.settings().clone();
    settings.minutes_per_day = 240;
    calendars.set_settings(settings);

    assert!(calendars.calendar(base).unwrap().is_cache_empty());
    assert!(calendars.calendar(child).unwrap().is_cache_empty());
    assert_eq!(calendars.calendar(child).unwrap().get_work(start, end, TimeUnit::Days).amount(), 2.0);
}
