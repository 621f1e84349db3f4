//! Business hours configuration

use serde::Deserialize;

use crate::domain::scheduling::{BusinessHours, DailyWindow};

use super::error::ValidationError;

/// Opening hours in local time at a fixed UTC offset
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct BusinessHoursConfig {
    /// Offset of local time from UTC, in hours
    #[serde(default = "default_utc_offset")]
    pub utc_offset_hours: i32,

    #[serde(default = "default_weekday_open")]
    pub weekday_open_hour: u32,

    #[serde(default = "default_weekday_close")]
    pub weekday_close_hour: u32,

    #[serde(default = "default_saturday_open")]
    pub saturday_open_hour: u32,

    #[serde(default = "default_saturday_close")]
    pub saturday_close_hour: u32,

    /// Sunday is closed unless both hours are set
    #[serde(default)]
    pub sunday_open_hour: Option<u32>,

    #[serde(default)]
    pub sunday_close_hour: Option<u32>,
}

impl BusinessHoursConfig {
    /// Validate business hours configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(ValidationError::InvalidUtcOffset(self.utc_offset_hours));
        }
        check_window("weekday", self.weekday_open_hour, self.weekday_close_hour)?;
        check_window("saturday", self.saturday_open_hour, self.saturday_close_hour)?;
        match (self.sunday_open_hour, self.sunday_close_hour) {
            (Some(open), Some(close)) => check_window("sunday", open, close),
            (None, None) => Ok(()),
            _ => Err(ValidationError::MissingRequired(
                "business_hours.sunday_open_hour and sunday_close_hour",
            )),
        }
    }

    /// Builds the domain schedule.
    pub fn to_business_hours(&self) -> Result<BusinessHours, ValidationError> {
        self.validate()?;

        let window = |day: &'static str, open: u32, close: u32| {
            DailyWindow::new(open, close)
                .map_err(|_| ValidationError::InvalidOpeningHours { day, open, close })
        };

        let sunday = match (self.sunday_open_hour, self.sunday_close_hour) {
            (Some(open), Some(close)) => Some(window("sunday", open, close)?),
            _ => None,
        };

        BusinessHours::new(
            self.utc_offset_hours,
            window("weekday", self.weekday_open_hour, self.weekday_close_hour)?,
            Some(window("saturday", self.saturday_open_hour, self.saturday_close_hour)?),
            sunday,
        )
        .map_err(|_| ValidationError::InvalidUtcOffset(self.utc_offset_hours))
    }
}

fn check_window(day: &'static str, open: u32, close: u32) -> Result<(), ValidationError> {
    if open >= close || close > 24 {
        return Err(ValidationError::InvalidOpeningHours { day, open, close });
    }
    Ok(())
}

impl Default for BusinessHoursConfig {
    fn default() -> Self {
        Self {
            utc_offset_hours: default_utc_offset(),
            weekday_open_hour: default_weekday_open(),
            weekday_close_hour: default_weekday_close(),
            saturday_open_hour: default_saturday_open(),
            saturday_close_hour: default_saturday_close(),
            sunday_open_hour: None,
            sunday_close_hour: None,
        }
    }
}

fn default_utc_offset() -> i32 {
    -3
}

fn default_weekday_open() -> u32 {
    8
}

fn default_weekday_close() -> u32 {
    18
}

fn default_saturday_open() -> u32 {
    8
}

fn default_saturday_close() -> u32 {
    12
}
