use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use schedule_calendar::calendar::days::ALL_WEEKDAYS;
use schedule_calendar::{CalendarId, DayType, ProjectCalendars, TimeRange, TimeUnit};

fn dt(y: i32, m: u32, day: u32, h: u32, min: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, day).unwrap().and_hms_opt(h, min, 0).unwrap()
}

fn standard() -> (ProjectCalendars, CalendarId) {
    let mut calendars = ProjectCalendars::default();
    let id = calendars.add_default_base_calendar();
    (calendars, id)
}

fn around_the_clock() -> (ProjectCalendars, CalendarId) {
    let mut calendars = ProjectCalendars::default();
    let id = {
        let mut cal = calendars.add_calendar();
        for day in ALL_WEEKDAYS {
            cal.set_calendar_day_type(day, DayType::Working);
            cal.add_calendar_hours(day).push(TimeRange::new(NaiveTime::MIN, NaiveTime::MIN));
        }
        cal.id()
    };
    (calendars, id)
}

#[test]
fn full_day_is_eight_hours() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    // 2006-03-13 is a Monday
    let work = cal.get_work(dt(2006, 3, 13, 0, 0), dt(2006, 3, 14, 0, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), 8.0);
    assert_eq!(work.unit(), TimeUnit::Hours);
}

#[test]
fn partial_days_in_days() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2006, 3, 14, 8, 0), dt(2006, 3, 15, 9, 0), TimeUnit::Days);
    assert!((work.amount() - 1.125).abs() < 1e-9);
}

#[test]
fn reversed_instants_give_negative_work() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2006, 3, 15, 9, 0), dt(2006, 3, 14, 8, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), -9.0);
}

#[test]
fn same_day_sums_overlap_with_ranges() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2006, 3, 13, 10, 0), dt(2006, 3, 13, 14, 30), TimeUnit::Minutes);
    assert_eq!(work.amount(), 210.0);
    let none = cal.get_work(dt(2006, 3, 13, 10, 0), dt(2006, 3, 13, 10, 0), TimeUnit::Minutes);
    assert_eq!(none.amount(), 0.0);
}

#[test]
fn weekend_in_the_middle_counts_nothing() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2006, 3, 17, 13, 0), dt(2006, 3, 20, 10, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), 6.0);
}

#[test]
fn start_on_a_weekend_counts_from_the_next_working_day() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2006, 3, 18, 10, 0), dt(2006, 3, 20, 10, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), 2.0);
}

#[test]
fn unit_conversion_uses_calendar_defaults() {
    let (mut calendars, id) = standard();
    let (start, end) = (dt(2006, 3, 13, 0, 0), dt(2006, 3, 14, 0, 0));
    {
        let cal = calendars.calendar(id).unwrap();
        assert_eq!(cal.get_work(start, end, TimeUnit::Minutes).amount(), 480.0);
        assert_eq!(cal.get_work(start, end, TimeUnit::Days).amount(), 1.0);
        assert!((cal.get_work(start, end, TimeUnit::Weeks).amount() - 0.2).abs() < 1e-9);
        assert!((cal.get_work(start, end, TimeUnit::Months).amount() - 0.05).abs() < 1e-9);
        assert!((cal.get_work(start, end, TimeUnit::ElapsedDays).amount() - 1.0 / 3.0).abs() < 1e-9);
    }

    calendars.calendar_mut(id).unwrap().set_calendar_minutes_per_day(Some(240));
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_work(start, end, TimeUnit::Days).amount(), 2.0);
}

#[test]
fn zero_minutes_per_day_gives_zero_days() {
    let (mut calendars, id) = standard();
    calendars.calendar_mut(id).unwrap().set_calendar_minutes_per_day(Some(0));
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2006, 3, 13, 0, 0), dt(2006, 3, 14, 0, 0), TimeUnit::Days);
    assert_eq!(work.amount(), 0.0);
}

#[test]
fn typical_day_and_date_work() {
    let (mut calendars, id) = standard();
    calendars
        .calendar_mut(id)
        .unwrap()
        .add_calendar_exception(NaiveDate::from_ymd_opt(2006, 3, 15).unwrap());
    let cal = calendars.calendar(id).unwrap();

    assert_eq!(cal.get_work_for_day(Weekday::Wed, TimeUnit::Hours).amount(), 8.0);
    assert_eq!(cal.get_work_for_day(Weekday::Sun, TimeUnit::Hours).amount(), 0.0);
    let holiday = NaiveDate::from_ymd_opt(2006, 3, 15).unwrap();
    assert_eq!(cal.get_work_for_date(holiday, TimeUnit::Hours).amount(), 0.0);
}

#[test]
fn duration_counts_working_dates_only() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    let days = cal.get_duration(dt(2006, 3, 13, 17, 0), dt(2006, 3, 24, 8, 0));
    assert_eq!(days.amount(), 10.0);
    assert_eq!(days.unit(), TimeUnit::Days);
}

#[test]
fn around_the_clock_day_is_twenty_four_hours() {
    let (calendars, id) = around_the_clock();
    let cal = calendars.calendar(id).unwrap();
    let work = cal.get_work(dt(2024, 1, 1, 0, 0), dt(2024, 1, 2, 0, 0), TimeUnit::Hours);
    assert_eq!(work.amount(), 24.0);
    let partial = cal.get_work(dt(2024, 1, 1, 22, 0), dt(2024, 1, 2, 1, 0), TimeUnit::Hours);
    assert_eq!(partial.amount(), 3.0);
}

#[test]
fn next_work_start() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_next_work_start(dt(2006, 3, 13, 7, 0)), dt(2006, 3, 13, 8, 0));
    assert_eq!(cal.get_next_work_start(dt(2006, 3, 13, 9, 0)), dt(2006, 3, 13, 9, 0));
    assert_eq!(cal.get_next_work_start(dt(2006, 3, 13, 12, 30)), dt(2006, 3, 13, 13, 0));
    assert_eq!(cal.get_next_work_start(dt(2006, 3, 17, 17, 30)), dt(2006, 3, 20, 8, 0));
    assert_eq!(cal.get_next_work_start(dt(2006, 3, 18, 10, 0)), dt(2006, 3, 20, 8, 0));
}

#[test]
fn previous_work_finish() {
    let (calendars, id) = standard();
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_previous_work_finish(dt(2006, 3, 13, 12, 30)), dt(2006, 3, 13, 12, 0));
    assert_eq!(cal.get_previous_work_finish(dt(2006, 3, 13, 17, 0)), dt(2006, 3, 13, 17, 0));
    assert_eq!(cal.get_previous_work_finish(dt(2006, 3, 13, 18, 0)), dt(2006, 3, 13, 17, 0));
    assert_eq!(cal.get_previous_work_finish(dt(2006, 3, 13, 7, 0)), dt(2006, 3, 10, 17, 0));
}

#[test]
fn previous_finish_of_a_midnight_range_is_the_next_day_start() {
    let (calendars, id) = around_the_clock();
    let cal = calendars.calendar(id).unwrap();
    assert_eq!(cal.get_previous_work_finish(dt(2024, 1, 2, 10, 0)), dt(2024, 1, 2, 0, 0));
}
