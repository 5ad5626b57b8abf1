use chrono::{NaiveDate, NaiveDateTime};
use schedule_calendar::persistence::{load_calendars_from_json, save_calendars_to_json};
use schedule_calendar::{CalendarId, DurationValue, ProjectCalendars, ProjectSettings, TimeRange, TimeUnit};
use std::io::{self, Write};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const INSTANT_FORMAT: &str = "%Y-%m-%dT%H:%M";

fn print_help() {
    println!(
        "Commands:\n  help                               Show this help\n  show                               Show the current calendar\n  calendars                          List calendars\n  load <path>                        Load calendars from JSON\n  save <path>                        Save calendars to JSON\n  use <id>                           Select the current calendar\n  exception <from> [to] [HH:MM-HH:MM ...]\n                                     Add an exception (no ranges = non-working)\n  work <start> <end> [unit]          Working time between two instants\n  date <start> <amount><unit>        Instant reached after a duration\n  next <instant>                     Next start of work\n  prev <instant>                     Previous end of work\n  working <YYYY-MM-DD>               Is the date a working date\n  quit|exit                          Exit\nInstants use YYYY-MM-DDTHH:MM; units are m, h, d, w, mo, y, em, eh, ed, ew, emo, ey."
    );
}

fn parse_instant(input: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(input, INSTANT_FORMAT).ok()
}

fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d").ok()
}

fn parse_range(input: &str) -> Option<TimeRange> {
    let (start, end) = input.split_once('-')?;
    let (sh, sm) = start.split_once(':')?;
    let (eh, em) = end.split_once(':')?;
    TimeRange::from_hm(sh.parse().ok()?, sm.parse().ok()?, eh.parse().ok()?, em.parse().ok()?)
}

/// Split "1.5d" into amount and unit; a bare number means hours.
fn parse_duration(input: &str) -> Option<DurationValue> {
    let split = input
        .char_indices()
        .find(|(index, c)| c.is_ascii_alphabetic() && *index > 0)
        .map_or(input.len(), |(index, _)| index);
    let (amount, unit) = input.split_at(split);
    let unit = if unit.is_empty() { TimeUnit::Hours } else { unit.parse().ok()? };
    Some(DurationValue::new(amount.parse().ok()?, unit))
}

fn format_instant(instant: NaiveDateTime) -> String {
    instant.format(INSTANT_FORMAT).to_string()
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "schedule_calendar=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let mut calendars = ProjectCalendars::new(ProjectSettings::default());
    let mut current = calendars.add_default_base_calendar();

    println!("Schedule Calendar (CLI) - type 'help' for commands\n");

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        line.clear();
        match stdin.read_line(&mut line) {
            Ok(0) | Err(_) => break,
            Ok(_) => {}
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let mut parts = input.split_whitespace();
        let cmd = parts.next().unwrap_or("");

        match cmd {
            "help" => print_help(),
            "quit" | "exit" => break,
            "show" => match calendars.calendar(current) {
                Some(calendar) => print!("{calendar}"),
                None => println!("No calendar selected."),
            },
            "calendars" => {
                for calendar in calendars.iter() {
                    let marker = if calendar.id() == current { "*" } else { " " };
                    let parent = calendar.parent_id().map(|id| format!(" (base {id})")).unwrap_or_default();
                    println!("{marker} {} {}{parent}", calendar.id(), calendar.name().unwrap_or(""));
                }
            }
            "load" => match parts.next() {
                Some(path) => match load_calendars_from_json(path) {
                    Ok(loaded) => {
                        calendars = loaded;
                        current = calendars.iter().next().map_or(CalendarId::new(0), |c| c.id());
                        println!("Calendars loaded from {path} ({} calendars).", calendars.len());
                    }
                    Err(e) => println!("Load error: {e}"),
                },
                None => println!("Usage: load <path>"),
            },
            "save" => match parts.next() {
                Some(path) => match save_calendars_to_json(&calendars, path) {
                    Ok(()) => println!("Calendars saved to {path}."),
                    Err(e) => println!("Save error: {e}"),
                },
                None => println!("Usage: save <path>"),
            },
            "use" => match parts.next().and_then(|s| s.parse::<u32>().ok()) {
                Some(id) if calendars.contains(CalendarId::new(id)) => {
                    current = CalendarId::new(id);
                    println!("Using calendar {id}.");
                }
                Some(id) => println!("Unknown calendar {id}."),
                None => println!("Usage: use <id>"),
            },
            "exception" => {
                let args: Vec<&str> = parts.collect();
                let Some(from) = args.first().and_then(|s| parse_date(s)) else {
                    println!("Usage: exception <from> [to] [HH:MM-HH:MM ...]");
                    continue;
                };
                let (to, range_args) = match args.get(1).and_then(|s| parse_date(s)) {
                    Some(to) => (to, &args[2..]),
                    None => (from, &args[1..]),
                };
                let Some(ranges) = range_args.iter().map(|s| parse_range(s)).collect::<Option<Vec<_>>>() else {
                    println!("Invalid time range (HH:MM-HH:MM)");
                    continue;
                };
                match calendars.try_calendar_mut(current) {
                    Ok(mut calendar) => {
                        calendar.add_calendar_exception_range(from, to).ranges_mut().extend(ranges);
                        println!("Exception added.");
                    }
                    Err(e) => println!("Error: {e}"),
                }
            }
            "work" => {
                let start = parts.next().and_then(parse_instant);
                let end = parts.next().and_then(parse_instant);
                let unit = match parts.next().map(str::parse::<TimeUnit>) {
                    None => TimeUnit::Hours,
                    Some(Ok(unit)) => unit,
                    Some(Err(_)) => {
                        println!("Invalid unit");
                        continue;
                    }
                };
                match (start, end, calendars.calendar(current)) {
                    (Some(start), Some(end), Some(calendar)) => {
                        println!("Work: {}", calendar.get_work(start, end, unit));
                    }
                    _ => println!("Usage: work <start> <end> [unit]"),
                }
            }
            "date" => {
                let start = parts.next().and_then(parse_instant);
                let duration = parts.next().and_then(parse_duration);
                match (start, duration, calendars.calendar(current)) {
                    (Some(start), Some(duration), Some(calendar)) => {
                        println!("Date: {}", format_instant(calendar.get_date(start, duration)));
                    }
                    _ => println!("Usage: date <start> <amount><unit>"),
                }
            }
            "next" | "prev" => match (parts.next().and_then(parse_instant), calendars.calendar(current)) {
                (Some(instant), Some(calendar)) => {
                    if cmd == "next" {
                        println!("Next work start: {}", format_instant(calendar.get_next_work_start(instant)));
                    } else {
                        println!(
                            "Previous work finish: {}",
                            format_instant(calendar.get_previous_work_finish(instant))
                        );
                    }
                }
                _ => println!("Usage: {cmd} <instant>"),
            },
            "working" => match (parts.next().and_then(parse_date), calendars.calendar(current)) {
                (Some(date), Some(calendar)) => {
                    let state = if calendar.is_working_date(date) { "working" } else { "non-working" };
                    println!("{date} is {state}.");
                }
                _ => println!("Usage: working <YYYY-MM-DD>"),
            },
            _ => println!("Unknown command. Type 'help'."),
        }
    }
}
