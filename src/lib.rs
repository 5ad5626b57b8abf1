pub mod calendar;
pub mod calendars;
pub mod duration;
pub mod helper;
pub mod persistence;
pub mod settings;
pub mod time_range;

pub use calendar::days::{CalendarDays, DayType};
pub use calendar::exception::CalendarException;
pub use calendar::recurrence::{RecurrenceType, RecurringData};
pub use calendar::week::WorkWeek;
pub use calendar::{CalendarRef, ProjectCalendar};
pub use calendars::{CalendarError, CalendarId, CalendarMut, ProjectCalendars};
pub use duration::{DurationValue, TimeUnit, TimeUnitDefaults};
pub use settings::ProjectSettings;
pub use time_range::TimeRange;
