use crate::duration::TimeUnitDefaults;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Project-wide defaults consulted when a calendar has no override of its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub minutes_per_day: u32,
    pub minutes_per_week: u32,
    pub minutes_per_month: u32,
    pub minutes_per_year: u32,
    pub days_per_month: u32,
    /// Earliest start of the project, used to bound work week expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_start: Option<NaiveDate>,
    /// Latest finish of the project, used to bound work week expansion.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_finish: Option<NaiveDate>,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            minutes_per_day: 480,
            minutes_per_week: 2400,
            minutes_per_month: 9600,
            minutes_per_year: 115_200,
            days_per_month: 20,
            project_start: None,
            project_finish: None,
        }
    }
}

impl TimeUnitDefaults for ProjectSettings {
    fn minutes_per_day(&self) -> u32 {
        self.minutes_per_day
    }

    fn minutes_per_week(&self) -> u32 {
        self.minutes_per_week
    }

    fn minutes_per_month(&self) -> u32 {
        self.minutes_per_month
    }

    fn minutes_per_year(&self) -> u32 {
        self.minutes_per_year
    }

    fn days_per_month(&self) -> u32 {
        self.days_per_month
    }
}
