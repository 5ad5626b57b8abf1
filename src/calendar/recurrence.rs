use crate::calendar::days::ALL_WEEKDAYS;
use chrono::{Datelike, Days, Months, NaiveDate, Weekday};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecurrenceType {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl fmt::Display for RecurrenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RecurrenceType::Daily => "Daily",
            RecurrenceType::Weekly => "Weekly",
            RecurrenceType::Monthly => "Monthly",
            RecurrenceType::Yearly => "Yearly",
        };
        f.write_str(label)
    }
}

/// A recurrence pattern and the dates it generates.
///
/// Generated dates are computed on first use and kept until a setter is
/// called. Termination is governed by the finish date when one is set,
/// otherwise by the occurrence count (at least one).
///
/// `day_number` is the day of the month for absolute patterns, or 1-4 for
/// "first" to "fourth" and 5 for "last" in relative patterns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringData {
    recurrence_type: RecurrenceType,
    start_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    finish_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    occurrences: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    frequency: Option<u32>,
    #[serde(default)]
    relative: bool,
    #[serde(default)]
    working_days_only: bool,
    #[serde(default)]
    use_end_date: bool,
    /// Enabled days for weekly patterns, Sunday first.
    #[serde(default)]
    weekly_days: [bool; 7],
    #[serde(default, skip_serializing_if = "Option::is_none")]
    day_number: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    month_number: Option<u32>,
    #[serde(skip)]
    dates: OnceCell<Vec<NaiveDate>>,
}

impl RecurringData {
    pub fn new(recurrence_type: RecurrenceType, start_date: NaiveDate) -> Self {
        Self {
            recurrence_type,
            start_date,
            finish_date: None,
            occurrences: None,
            frequency: None,
            relative: false,
            working_days_only: false,
            use_end_date: false,
            weekly_days: [false; 7],
            day_number: None,
            month_number: None,
            dates: OnceCell::new(),
        }
    }

    pub fn recurrence_type(&self) -> RecurrenceType {
        self.recurrence_type
    }

    pub fn set_recurrence_type(&mut self, recurrence_type: RecurrenceType) {
        self.recurrence_type = recurrence_type;
        self.clear_dates_cache();
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    pub fn set_start_date(&mut self, date: NaiveDate) {
        self.start_date = date;
        self.clear_dates_cache();
    }

    pub fn finish_date(&self) -> Option<NaiveDate> {
        self.finish_date
    }

    pub fn set_finish_date(&mut self, date: Option<NaiveDate>) {
        self.finish_date = date;
        self.clear_dates_cache();
    }

    pub fn occurrences(&self) -> Option<u32> {
        self.occurrences
    }

    pub fn set_occurrences(&mut self, occurrences: Option<u32>) {
        self.occurrences = occurrences;
        self.clear_dates_cache();
    }

    pub fn frequency(&self) -> Option<u32> {
        self.frequency
    }

    pub fn set_frequency(&mut self, frequency: Option<u32>) {
        self.frequency = frequency;
        self.clear_dates_cache();
    }

    pub fn relative(&self) -> bool {
        self.relative
    }

    pub fn set_relative(&mut self, relative: bool) {
        self.relative = relative;
        self.clear_dates_cache();
    }

    pub fn working_days_only(&self) -> bool {
        self.working_days_only
    }

    pub fn set_working_days_only(&mut self, working_days_only: bool) {
        self.working_days_only = working_days_only;
        self.clear_dates_cache();
    }

    pub fn use_end_date(&self) -> bool {
        self.use_end_date
    }

    pub fn set_use_end_date(&mut self, use_end_date: bool) {
        self.use_end_date = use_end_date;
        self.clear_dates_cache();
    }

    pub fn weekly_day(&self, day: Weekday) -> bool {
        self.weekly_days[day.num_days_from_sunday() as usize]
    }

    pub fn set_weekly_day(&mut self, day: Weekday, enabled: bool) {
        self.weekly_days[day.num_days_from_sunday() as usize] = enabled;
        self.clear_dates_cache();
    }

    /// Enable weekly days from a bitmap; `masks` holds the bit for each day, Sunday first.
    pub fn weekly_days_from_bitmap(&mut self, days: u32, masks: &[u32; 7]) {
        for (index, mask) in masks.iter().enumerate() {
            self.weekly_days[index] = days & mask != 0;
        }
        self.clear_dates_cache();
    }

    /// The first enabled weekday, Monday first.
    pub fn day_of_week(&self) -> Option<Weekday> {
        let mut day = Weekday::Mon;
        for _ in 0..7 {
            if self.weekly_day(day) {
                return Some(day);
            }
            day = day.succ();
        }
        None
    }

    /// Replace the enabled weekdays with `day` alone.
    pub fn set_day_of_week(&mut self, day: Weekday) {
        self.weekly_days = [false; 7];
        self.set_weekly_day(day, true);
    }

    pub fn day_number(&self) -> Option<u32> {
        self.day_number
    }

    pub fn set_day_number(&mut self, day_number: Option<u32>) {
        self.day_number = day_number;
        self.clear_dates_cache();
    }

    pub fn month_number(&self) -> Option<u32> {
        self.month_number
    }

    pub fn set_month_number(&mut self, month_number: Option<u32>) {
        self.month_number = month_number;
        self.clear_dates_cache();
    }

    /// Configure an absolute yearly pattern anchored on the day and month of `date`.
    pub fn set_yearly_absolute_from_date(&mut self, date: NaiveDate) {
        self.day_number = Some(date.day());
        self.month_number = Some(date.month());
        self.clear_dates_cache();
    }

    pub fn dates(&self) -> &[NaiveDate] {
        self.dates.get_or_init(|| self.populate_dates())
    }

    pub fn is_valid(&self) -> bool {
        !self.dates().is_empty()
    }

    pub fn calculated_first_date(&self) -> Option<NaiveDate> {
        self.dates().first().copied()
    }

    pub fn calculated_last_date(&self) -> Option<NaiveDate> {
        self.dates().last().copied()
    }

    fn clear_dates_cache(&mut self) {
        self.dates = OnceCell::new();
    }

    fn effective_frequency(&self) -> u32 {
        self.frequency.unwrap_or(0).max(1)
    }

    fn populate_dates(&self) -> Vec<NaiveDate> {
        let frequency = self.effective_frequency();
        let mut dates = Vec::new();
        match self.recurrence_type {
            RecurrenceType::Daily => self.daily_dates(frequency, &mut dates),
            RecurrenceType::Weekly => self.weekly_dates(frequency, &mut dates),
            RecurrenceType::Monthly if self.relative => self.monthly_relative_dates(frequency, &mut dates),
            RecurrenceType::Monthly => self.monthly_absolute_dates(frequency, &mut dates),
            RecurrenceType::Yearly if self.relative => self.yearly_relative_dates(&mut dates),
            RecurrenceType::Yearly => self.yearly_absolute_dates(&mut dates),
        }
        dates
    }

    fn more_dates(&self, date: NaiveDate, dates: &[NaiveDate]) -> bool {
        match self.finish_date {
            Some(finish) => date <= finish,
            None => dates.len() < self.occurrences.unwrap_or(0).max(1) as usize,
        }
    }

    fn daily_dates(&self, frequency: u32, dates: &mut Vec<NaiveDate>) {
        let mut date = Some(self.start_date);
        while let Some(current) = date {
            if !self.more_dates(current, dates) {
                break;
            }
            dates.push(current);
            date = current.checked_add_days(Days::new(u64::from(frequency)));
        }
    }

    fn weekly_dates(&self, frequency: u32, dates: &mut Vec<NaiveDate>) {
        if !self.weekly_days.contains(&true) {
            return;
        }

        // Walk whole weeks from the Sunday on or before the start date.
        let back = u64::from(self.start_date.weekday().num_days_from_sunday());
        let Some(mut date) = self.start_date.checked_sub_days(Days::new(back)) else {
            return;
        };

        while self.more_dates(date, dates) {
            let mut offset = 0u64;
            for day in ALL_WEEKDAYS {
                if self.weekly_day(day) {
                    if offset != 0 {
                        match date.checked_add_days(Days::new(offset)) {
                            Some(next) => date = next,
                            None => return,
                        }
                        offset = 0;
                    }
                    if !self.more_dates(date, dates) {
                        break;
                    }
                    if date >= self.start_date {
                        dates.push(date);
                    }
                }
                offset += 1;
            }

            if frequency > 1 {
                offset += 7 * u64::from(frequency - 1);
            }
            match date.checked_add_days(Days::new(offset)) {
                Some(next) => date = next,
                None => return,
            }
        }
    }

    fn monthly_relative_dates(&self, frequency: u32, dates: &mut Vec<NaiveDate>) {
        let Some(day) = self.day_of_week() else {
            return;
        };
        let day_number = self.day_number.unwrap_or(0);
        let mut date = first_of_month(self.start_date);

        while self.more_dates(date, dates) {
            date = relative_day(date, day, day_number);
            if date >= self.start_date {
                dates.push(date);
                if !self.more_dates(date, dates) {
                    break;
                }
            }
            match first_of_month(date).checked_add_months(Months::new(frequency)) {
                Some(next) => date = next,
                None => return,
            }
        }
    }

    fn monthly_absolute_dates(&self, frequency: u32, dates: &mut Vec<NaiveDate>) {
        let required_day = self.day_number.unwrap_or(0);
        if required_day < 1 {
            return;
        }

        let mut date = first_of_month(self.start_date);
        if required_day < self.start_date.day() {
            match date.checked_add_months(Months::new(1)) {
                Some(next) => date = next,
                None => return,
            }
        }

        while self.more_dates(date, dates) {
            date = clamped_day(date, required_day);
            dates.push(date);
            match first_of_month(date).checked_add_months(Months::new(frequency)) {
                Some(next) => date = next,
                None => return,
            }
        }
    }

    fn yearly_relative_dates(&self, dates: &mut Vec<NaiveDate>) {
        let Some(day) = self.day_of_week() else {
            return;
        };
        let Some(mut date) = self.yearly_anchor() else {
            return;
        };
        let day_number = self.day_number.unwrap_or(0);

        while self.more_dates(date, dates) {
            date = relative_day(date, day, day_number);
            if date >= self.start_date {
                dates.push(date);
                if !self.more_dates(date, dates) {
                    break;
                }
            }
            match first_of_month(date).checked_add_months(Months::new(12)) {
                Some(next) => date = next,
                None => return,
            }
        }
    }

    fn yearly_absolute_dates(&self, dates: &mut Vec<NaiveDate>) {
        let required_day = self.day_number.unwrap_or(0);
        if required_day < 1 {
            return;
        }
        let Some(mut date) = self.yearly_anchor() else {
            return;
        };

        while self.more_dates(date, dates) {
            date = clamped_day(date, required_day);
            if date < self.start_date {
                match date.checked_add_months(Months::new(12)) {
                    Some(next) => date = next,
                    None => return,
                }
            }
            dates.push(date);
            match first_of_month(date).checked_add_months(Months::new(12)) {
                Some(next) => date = next,
                None => return,
            }
        }
    }

    /// First day of the configured month in the start year.
    fn yearly_anchor(&self) -> Option<NaiveDate> {
        let month = self.month_number?;
        NaiveDate::from_ymd_opt(self.start_date.year(), month, 1)
    }
}

impl PartialEq for RecurringData {
    fn eq(&self, other: &Self) -> bool {
        self.recurrence_type == other.recurrence_type
            && self.start_date == other.start_date
            && self.finish_date == other.finish_date
            && self.occurrences == other.occurrences
            && self.frequency == other.frequency
            && self.relative == other.relative
            && self.working_days_only == other.working_days_only
            && self.use_end_date == other.use_end_date
            && self.weekly_days == other.weekly_days
            && self.day_number == other.day_number
            && self.month_number == other.month_number
    }
}

impl fmt::Display for RecurringData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let frequency = ordinal(self.effective_frequency());
        write!(f, "{}", self.recurrence_type)?;

        match self.recurrence_type {
            RecurrenceType::Daily => {
                let unit = if self.working_days_only { "working day" } else { "day" };
                write!(f, " {frequency} {unit}")?;
            }
            RecurrenceType::Weekly => {
                let days: Vec<String> = ALL_WEEKDAYS
                    .iter()
                    .filter(|day| self.weekly_day(**day))
                    .map(|day| weekday_name(*day).to_string())
                    .collect();
                write!(f, " {frequency} week on {}", days.join(", "))?;
            }
            RecurrenceType::Monthly => {
                if self.relative {
                    write!(
                        f,
                        " on the {} {} of {frequency} month",
                        day_ordinal(self.day_number),
                        self.day_of_week().map(weekday_name).unwrap_or("?"),
                    )?;
                } else {
                    write!(f, " on day {} of {frequency} month", self.day_number.unwrap_or(0))?;
                }
            }
            RecurrenceType::Yearly => {
                let month = self.month_number.map(month_name).unwrap_or("?");
                if self.relative {
                    write!(
                        f,
                        " on the {} {} of {month}",
                        day_ordinal(self.day_number),
                        self.day_of_week().map(weekday_name).unwrap_or("?"),
                    )?;
                } else {
                    write!(f, " on the {} {month}", self.day_number.unwrap_or(0))?;
                }
            }
        }

        write!(f, " from {}", self.start_date)?;
        if let Some(occurrences) = self.occurrences {
            write!(f, " for {occurrences} occurrences")?;
        }
        if let Some(finish) = self.finish_date {
            write!(f, " to {finish}")?;
        }
        Ok(())
    }
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

fn last_of_month(date: NaiveDate) -> NaiveDate {
    first_of_month(date)
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .unwrap_or(date)
}

/// `day` within the month of `date`, clamped to the month's length.
fn clamped_day(date: NaiveDate, day: u32) -> NaiveDate {
    let last = last_of_month(date);
    last.with_day(day.min(last.day())).unwrap_or(last)
}

/// Resolve "nth weekday" (1-4) or "last weekday" (5 and above) within the month of `date`.
fn relative_day(date: NaiveDate, day: Weekday, day_number: u32) -> NaiveDate {
    if day_number > 4 {
        last_relative_day(date, day)
    } else {
        ordinal_relative_day(date, day, day_number)
    }
}

fn ordinal_relative_day(date: NaiveDate, day: Weekday, day_number: u32) -> NaiveDate {
    let first = first_of_month(date);
    let current = first.weekday().num_days_from_sunday();
    let required = day.num_days_from_sunday();
    let mut offset = u64::from((required + 7 - current) % 7);
    if day_number > 1 {
        offset += 7 * u64::from(day_number - 1);
    }
    first.checked_add_days(Days::new(offset)).unwrap_or(first)
}

fn last_relative_day(date: NaiveDate, day: Weekday) -> NaiveDate {
    let last = last_of_month(date);
    let current = last.weekday().num_days_from_sunday();
    let required = day.num_days_from_sunday();
    let offset = u64::from((current + 7 - required) % 7);
    last.checked_sub_days(Days::new(offset)).unwrap_or(last)
}

fn ordinal(value: u32) -> String {
    match value {
        1 => "every".to_string(),
        2 => "every other".to_string(),
        3 => "every 3rd".to_string(),
        n => format!("every {n}th"),
    }
}

fn day_ordinal(day_number: Option<u32>) -> &'static str {
    match day_number {
        Some(1) => "first",
        Some(2) => "second",
        Some(3) => "third",
        Some(4) => "fourth",
        Some(n) if n > 4 => "last",
        _ => "?",
    }
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> &'static str {
    const MONTHS: [&str; 12] = [
        "January",
        "February",
        "March",
        "April",
        "May",
        "June",
        "July",
        "August",
        "September",
        "October",
        "November",
        "December",
    ];
    month
        .checked_sub(1)
        .and_then(|index| MONTHS.get(index as usize))
        .copied()
        .unwrap_or("?")
}
