use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use schedule_calendar::calendar::days::ALL_WEEKDAYS;
use schedule_calendar::{CalendarId, DayType, DurationValue, ProjectCalendars, TimeRange, TimeUnit};

fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, day).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn standard() -> (ProjectCalendars, CalendarId) {
    let mut calendars = ProjectCalendars::default();
    let id = calendars.add_default_base_calendar();
    (calendars, id)
}

#[test]
fn forward_across_a_weekend() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    // 2003-10-09 is a Thursday
    let date = cal.get_date(dt(2003, 10, 9, 8, 0), DurationValue::hours(24.0));
    assert_eq!(date, dt(2003, 10, 13, 17, 0));
}

#[test]
fn forward_within_a_day_splits_a_range() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    // 2h until noon, the remaining 2h after lunch
    assert_eq!(cal.get_date(dt(2003, 10, 13, 10, 0), DurationValue::hours(4.0)), dt(2003, 10, 13, 15, 0));
    assert_eq!(cal.get_date(dt(2003, 10, 13, 6, 0), DurationValue::hours(1.0)), dt(2003, 10, 13, 9, 0));
    assert_eq!(cal.get_date(dt(2003, 10, 13, 10, 0), DurationValue::hours(2.0)), dt(2003, 10, 13, 12, 0));
}

#[test]
fn forward_exactly_a_day_ends_at_finish_time() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_date(dt(2003, 10, 13, 8, 0), DurationValue::days(1.0)), dt(2003, 10, 13, 17, 0));
}

#[test]
fn forward_from_after_hours_starts_next_morning() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_date(dt(2003, 10, 13, 18, 0), DurationValue::hours(1.0)), dt(2003, 10, 14, 9, 0));
    assert_eq!(cal.get_date(dt(2003, 10, 10, 18, 0), DurationValue::hours(1.0)), dt(2003, 10, 13, 9, 0));
}

#[test]
fn backward_across_a_weekend() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let date = cal.get_date(dt(2003, 10, 13, 17, 0), DurationValue::hours(-24.0));
    assert_eq!(date, dt(2003, 10, 9, 8, 0));
}

#[test]
fn backward_within_a_day() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_date(dt(2003, 10, 13, 14, 0), DurationValue::hours(-4.0)), dt(2003, 10, 13, 9, 0));
    assert_eq!(cal.get_date(dt(2003, 10, 13, 14, 0), DurationValue::hours(-1.0)), dt(2003, 10, 13, 13, 0));
}

#[test]
fn backward_from_midnight_uses_the_whole_previous_day() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let midnight = dt(2024, 1, 2, 0, 0);
    assert_eq!(cal.get_date(midnight, DurationValue::hours(-2.0)), dt(2024, 1, 1, 15, 0));
    assert_eq!(cal.get_date(midnight, DurationValue::hours(-6.0)), dt(2024, 1, 1, 10, 0));
    assert_eq!(cal.get_date(midnight, DurationValue::hours(-8.0)), dt(2024, 1, 1, 8, 0));
}

#[test]
fn zero_duration_returns_start() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let start = dt(2003, 10, 11, 3, 15);
    assert_eq!(cal.get_date(start, DurationValue::zero(TimeUnit::Hours)), start);
}

#[test]
fn elapsed_units_ignore_working_time() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let start = dt(2003, 10, 10, 16, 0);
    assert_eq!(
        cal.get_date(start, DurationValue::new(24.0, TimeUnit::ElapsedHours)),
        dt(2003, 10, 11, 16, 0)
    );
    assert_eq!(
        cal.get_date(start, DurationValue::new(-1.0, TimeUnit::ElapsedDays)),
        dt(2003, 10, 9, 16, 0)
    );
    assert_eq!(
        cal.get_date(start, DurationValue::new(1.5, TimeUnit::ElapsedMinutes)),
        dt(2003, 10, 10, 16, 1) + chrono::TimeDelta::seconds(30)
    );
}

#[test]
fn repeated_forward_queries_match_fresh_results() {
    let (calendars, id) = standard();
    let start = dt(2003, 10, 9, 8, 0);

    let memoized: Vec<_> = [8.0, 16.0, 20.0, 3.0, 40.0]
        .iter()
        .map(|hours| calendars.calendar(id).unwrap().get_date(start, DurationValue::hours(*hours)))
        .collect();

    for (hours, expected) in [8.0, 16.0, 20.0, 3.0, 40.0].iter().zip(memoized) {
        let (fresh_set, fresh_id) = standard();
        let fresh = fresh_set.calendar(fresh_id).unwrap().get_date(start, DurationValue::hours(*hours));
        assert_eq!(fresh, expected, "{hours}h");
    }
}

#[test]
fn around_the_clock_crosses_midnight() {
    let mut calendars = ProjectCalendars::default();
    let id = {
        let mut cal = calendars.add_calendar();
        for day in ALL_WEEKDAYS {
            cal.set_calendar_day_type(day, DayType::Working);
            cal.add_calendar_hours(day).push(TimeRange::new(NaiveTime::MIN, NaiveTime::MIN));
        }
        cal.id()
    };
    let cal = calendars.calendar(id).unwrap();

    assert_eq!(cal.get_date(dt(2024, 1, 1, 0, 0), DurationValue::hours(24.0)), dt(2024, 1, 2, 0, 0));
    assert_eq!(cal.get_date(dt(2024, 1, 1, 23, 30), DurationValue::hours(1.0)), dt(2024, 1, 2, 0, 30));
    assert_eq!(cal.get_date(dt(2024, 1, 2, 0, 30), DurationValue::hours(-1.0)), dt(2024, 1, 1, 23, 30));
}

#[test]
fn all_non_working_calendar_terminates() {
    let mut calendars = ProjectCalendars::default();
    let id = {
        let mut cal = calendars.add_calendar();
        for day in ALL_WEEKDAYS {
            cal.set_calendar_day_type(day, DayType::NonWorking);
        }
        cal.id()
    };
    let cal = calendars.calendar(id).unwrap();
    let start = dt(2024, 1, 1, 8, 0);

    assert!(!cal.is_working_day(Weekday::Mon));
    assert_eq!(cal.get_date(start, DurationValue::hours(8.0)), dt(2024, 1, 2, 8, 0));
    assert_eq!(cal.get_date(start, DurationValue::hours(-8.0)), dt(2023, 12, 31, 8, 0));
    assert_eq!(cal.get_next_work_start(start), dt(2024, 1, 2, 8, 0));
    assert_eq!(cal.get_previous_work_finish(start), dt(2023, 12, 31, 8, 0));
    assert_eq!(cal.get_work(start, dt(2024, 3, 1, 8, 0), TimeUnit::Hours).amount(), 0.0);
}

fn all_non_working() -> (ProjectCalendars, CalendarId) {
    let mut calendars = ProjectCalendars::default();
    let id = {
        let mut cal = calendars.add_calendar();
        for day in ALL_WEEKDAYS {
            cal.set_calendar_day_type(day, DayType::NonWorking);
        }
        cal.id()
    };
    (calendars, id)
}

#[test]
fn gave_up_results_do_not_feed_later_queries() {
    let (calendars, id) = all_non_working();
    let start = dt(2024, 1, 1, 8, 0);
    let cal = calendars.calendar(id).unwrap();

    let short = cal.get_date(start, DurationValue::hours(8.0));
    let long = cal.get_date(start, DurationValue::hours(16.0));

    let (fresh_set, fresh_id) = all_non_working();
    let fresh = fresh_set.calendar(fresh_id).unwrap().get_date(start, DurationValue::hours(16.0));
    assert_eq!(short, dt(2024, 1, 2, 8, 0));
    assert_eq!(long, fresh);
    assert_eq!(long, dt(2024, 1, 2, 8, 0));
}

#[test]
fn concurrent_readers_agree_with_fresh_results() {
    let (calendars, id) = standard();
    let starts = [dt(2003, 10, 9, 8, 0), dt(2003, 10, 13, 10, 0), dt(2003, 10, 15, 14, 0)];
    let hours = [4.0, 8.0, 13.0, 24.0, 40.0];

    std::thread::scope(|scope| {
        for start in starts {
            let calendars = &calendars;
            scope.spawn(move || {
                for _ in 0..20 {
                    for amount in hours {
                        calendars.calendar(id).unwrap().get_date(start, DurationValue::hours(amount));
                    }
                }
            });
        }
    });

    for start in starts {
        for amount in hours {
            let (fresh_set, fresh_id) = standard();
            let fresh = fresh_set.calendar(fresh_id).unwrap().get_date(start, DurationValue::hours(amount));
            let shared = calendars.calendar(id).unwrap().get_date(start, DurationValue::hours(amount));
            assert_eq!(shared, fresh, "{start} + {amount}h");
        }
    }
}
