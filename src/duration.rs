use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

/// Tolerance used when comparing duration amounts.
pub const DURATION_EPSILON: f64 = 0.00001;

const MINUTES_PER_ELAPSED_DAY: f64 = 60.0 * 24.0;
const MINUTES_PER_ELAPSED_WEEK: f64 = 60.0 * 24.0 * 7.0;
const MINUTES_PER_ELAPSED_MONTH: f64 = 60.0 * 24.0 * 30.0;
const MINUTES_PER_ELAPSED_YEAR: f64 = 60.0 * 24.0 * 7.0 * 52.0;

/// Conservative defaults used when two durations in different units are ordered.
const COMPARE_MINUTES_PER_DAY: f64 = 8.0 * 60.0;
const COMPARE_MINUTES_PER_WEEK: f64 = 5.0 * 8.0 * 60.0;
const COMPARE_DAYS_PER_MONTH: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeUnit {
    Minutes,
    Hours,
    Days,
    Weeks,
    Months,
    Years,
    ElapsedMinutes,
    ElapsedHours,
    ElapsedDays,
    ElapsedWeeks,
    ElapsedMonths,
    ElapsedYears,
}

impl TimeUnit {
    pub const ALL: [TimeUnit; 12] = [
        TimeUnit::Minutes,
        TimeUnit::Hours,
        TimeUnit::Days,
        TimeUnit::Weeks,
        TimeUnit::Months,
        TimeUnit::Years,
        TimeUnit::ElapsedMinutes,
        TimeUnit::ElapsedHours,
        TimeUnit::ElapsedDays,
        TimeUnit::ElapsedWeeks,
        TimeUnit::ElapsedMonths,
        TimeUnit::ElapsedYears,
    ];

    /// Elapsed units measure wall-clock time and ignore calendar defaults.
    pub fn is_elapsed(self) -> bool {
        matches!(
            self,
            TimeUnit::ElapsedMinutes
                | TimeUnit::ElapsedHours
                | TimeUnit::ElapsedDays
                | TimeUnit::ElapsedWeeks
                | TimeUnit::ElapsedMonths
                | TimeUnit::ElapsedYears
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TimeUnit::Minutes => "m",
            TimeUnit::Hours => "h",
            TimeUnit::Days => "d",
            TimeUnit::Weeks => "w",
            TimeUnit::Months => "mo",
            TimeUnit::Years => "y",
            TimeUnit::ElapsedMinutes => "em",
            TimeUnit::ElapsedHours => "eh",
            TimeUnit::ElapsedDays => "ed",
            TimeUnit::ElapsedWeeks => "ew",
            TimeUnit::ElapsedMonths => "emo",
            TimeUnit::ElapsedYears => "ey",
        }
    }
}

impl FromStr for TimeUnit {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        TimeUnit::ALL
            .iter()
            .copied()
            .find(|unit| unit.as_str().eq_ignore_ascii_case(value.trim()))
            .ok_or_else(|| format!("unknown time unit '{value}'"))
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of the values used to convert between non-elapsed units.
pub trait TimeUnitDefaults {
    fn minutes_per_day(&self) -> u32;
    fn minutes_per_week(&self) -> u32;
    fn minutes_per_month(&self) -> u32;
    fn minutes_per_year(&self) -> u32;
    fn days_per_month(&self) -> u32;
}

/// An amount of time expressed in a particular unit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DurationValue {
    amount: f64,
    unit: TimeUnit,
}

impl DurationValue {
    pub fn new(amount: f64, unit: TimeUnit) -> Self {
        Self { amount, unit }
    }

    pub fn zero(unit: TimeUnit) -> Self {
        Self::new(0.0, unit)
    }

    pub fn minutes(amount: f64) -> Self {
        Self::new(amount, TimeUnit::Minutes)
    }

    pub fn hours(amount: f64) -> Self {
        Self::new(amount, TimeUnit::Hours)
    }

    pub fn days(amount: f64) -> Self {
        Self::new(amount, TimeUnit::Days)
    }

    pub fn amount(&self) -> f64 {
        self.amount
    }

    pub fn unit(&self) -> TimeUnit {
        self.unit
    }

    /// Convert this duration to `unit` using the supplied defaults.
    pub fn convert_units<D: TimeUnitDefaults + ?Sized>(&self, unit: TimeUnit, defaults: &D) -> Self {
        if unit == self.unit {
            return *self;
        }
        convert_units(
            self.amount,
            self.unit,
            unit,
            f64::from(defaults.minutes_per_day()),
            f64::from(defaults.minutes_per_week()),
            f64::from(defaults.days_per_month()),
        )
    }

    pub fn negate(&self) -> Self {
        if self.amount == 0.0 {
            *self
        } else {
            Self::new(-self.amount, self.unit)
        }
    }

    /// Sum two durations, expressing the result in the units of `a`.
    pub fn add<D: TimeUnitDefaults + ?Sized>(
        a: Option<DurationValue>,
        b: Option<DurationValue>,
        defaults: &D,
    ) -> Option<DurationValue> {
        match (a, b) {
            (None, None) => None,
            (None, Some(b)) => Some(b),
            (Some(a), None) => Some(a),
            (Some(a), Some(b)) => {
                let b = b.convert_units(a.unit, defaults);
                Some(Self::new(a.amount + b.amount, a.unit))
            }
        }
    }

    /// Order two durations. Differing units are reconciled with 8h days,
    /// 40h weeks and 20 day months.
    pub fn compare(&self, other: &DurationValue) -> Ordering {
        let other = if self.unit == other.unit {
            *other
        } else {
            convert_units(
                other.amount,
                other.unit,
                self.unit,
                COMPARE_MINUTES_PER_DAY,
                COMPARE_MINUTES_PER_WEEK,
                COMPARE_DAYS_PER_MONTH,
            )
        };

        if duration_value_equals(self.amount, other.amount) {
            Ordering::Equal
        } else if self.amount < other.amount {
            Ordering::Less
        } else {
            Ordering::Greater
        }
    }
}

impl PartialEq for DurationValue {
    fn eq(&self, other: &Self) -> bool {
        self.unit == other.unit && duration_value_equals(self.amount, other.amount)
    }
}

impl fmt::Display for DurationValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}{}", self.amount, self.unit)
    }
}

pub fn duration_value_equals(lhs: f64, rhs: f64) -> bool {
    (lhs - rhs).abs() < DURATION_EPSILON
}

/// Convert `value` from one unit to another.
///
/// The value is first normalised to minutes, then expressed in the target
/// unit. Elapsed units use fixed wall-clock constants; the others use the
/// supplied defaults. A zero default in a divisor yields a zero duration.
pub fn convert_units(
    value: f64,
    from: TimeUnit,
    to: TimeUnit,
    minutes_per_day: f64,
    minutes_per_week: f64,
    days_per_month: f64,
) -> DurationValue {
    if from == to {
        return DurationValue::new(value, from);
    }

    let minutes = match from {
        TimeUnit::Years => value * (minutes_per_week * 52.0),
        TimeUnit::ElapsedYears => value * MINUTES_PER_ELAPSED_YEAR,
        TimeUnit::Months => value * (minutes_per_day * days_per_month),
        TimeUnit::ElapsedMonths => value * MINUTES_PER_ELAPSED_MONTH,
        TimeUnit::Weeks => value * minutes_per_week,
        TimeUnit::ElapsedWeeks => value * MINUTES_PER_ELAPSED_WEEK,
        TimeUnit::Days => value * minutes_per_day,
        TimeUnit::ElapsedDays => value * MINUTES_PER_ELAPSED_DAY,
        TimeUnit::Hours | TimeUnit::ElapsedHours => value * 60.0,
        TimeUnit::Minutes | TimeUnit::ElapsedMinutes => value,
    };

    let amount = match to {
        TimeUnit::Minutes | TimeUnit::ElapsedMinutes => minutes,
        TimeUnit::Hours | TimeUnit::ElapsedHours => minutes / 60.0,
        TimeUnit::Days => divide_or_zero(minutes, minutes_per_day),
        TimeUnit::ElapsedDays => minutes / MINUTES_PER_ELAPSED_DAY,
        TimeUnit::Weeks => divide_or_zero(minutes, minutes_per_week),
        TimeUnit::ElapsedWeeks => minutes / MINUTES_PER_ELAPSED_WEEK,
        TimeUnit::Months => divide_or_zero(minutes, minutes_per_day * days_per_month),
        TimeUnit::ElapsedMonths => minutes / MINUTES_PER_ELAPSED_MONTH,
        TimeUnit::Years => divide_or_zero(minutes, minutes_per_week * 52.0),
        TimeUnit::ElapsedYears => minutes / MINUTES_PER_ELAPSED_YEAR,
    };

    DurationValue::new(amount, to)
}

fn divide_or_zero(value: f64, divisor: f64) -> f64 {
    if divisor == 0.0 { 0.0 } else { value / divisor }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_divisor_yields_zero_not_nan() {
        let result = convert_units(10.0, TimeUnit::Hours, TimeUnit::Days, 0.0, 2400.0, 20.0);
        assert_eq!(result.amount(), 0.0);

        let result = convert_units(10.0, TimeUnit::Hours, TimeUnit::Months, 480.0, 2400.0, 0.0);
        assert_eq!(result.amount(), 0.0);

        let result = convert_units(10.0, TimeUnit::Hours, TimeUnit::Years, 480.0, 0.0, 20.0);
        assert_eq!(result.amount(), 0.0);
    }

    #[test]
    fn elapsed_units_ignore_defaults() {
        let result = convert_units(1.0, TimeUnit::ElapsedDays, TimeUnit::Minutes, 1.0, 1.0, 1.0);
        assert_eq!(result.amount(), 1440.0);

        let result = convert_units(1.0, TimeUnit::ElapsedYears, TimeUnit::ElapsedMinutes, 1.0, 1.0, 1.0);
        assert_eq!(result.amount(), 60.0 * 24.0 * 7.0 * 52.0);
    }

    #[test]
    fn compare_uses_conservative_constants() {
        let day = DurationValue::days(1.0);
        assert_eq!(day.compare(&DurationValue::hours(8.0)), Ordering::Equal);
        assert_eq!(day.compare(&DurationValue::hours(9.0)), Ordering::Less);
        assert_eq!(day.compare(&DurationValue::minutes(60.0)), Ordering::Greater);
    }

    #[test]
    fn display_uses_short_unit_names() {
        assert_eq!(DurationValue::hours(8.0).to_string(), "8.0h");
        assert_eq!(DurationValue::new(1.5, TimeUnit::ElapsedMonths).to_string(), "1.5emo");
    }
}
