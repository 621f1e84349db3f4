//! Service hours, evaluated in the business's local time.

use chrono::{Datelike, FixedOffset, Timelike, Weekday};

use crate::domain::foundation::{Timestamp, ValidationError};

/// Opening window for one day, in whole local hours `[open, close)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyWindow {
    pub open_hour: u32,
    pub close_hour: u32,
}

impl DailyWindow {
    pub fn new(open_hour: u32, close_hour: u32) -> Result<Self, ValidationError> {
        if open_hour >= close_hour || close_hour > 24 {
            return Err(ValidationError::invalid_format(
                "business_hours",
                format!("window {open_hour}-{close_hour} must satisfy open < close <= 24"),
            ));
        }
        Ok(Self {
            open_hour,
            close_hour,
        })
    }

    fn contains(&self, hour: u32) -> bool {
        hour >= self.open_hour && hour < self.close_hour
    }
}

/// Weekly schedule: Monday–Friday share one window, Saturday and Sunday
/// are optional.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessHours {
    offset: FixedOffset,
    weekday: DailyWindow,
    saturday: Option<DailyWindow>,
    sunday: Option<DailyWindow>,
}

impl BusinessHours {
    pub fn new(
        utc_offset_hours: i32,
        weekday: DailyWindow,
        saturday: Option<DailyWindow>,
        sunday: Option<DailyWindow>,
    ) -> Result<Self, ValidationError> {
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            ValidationError::invalid_format(
                "utc_offset_hours",
                format!("{utc_offset_hours} is not a valid UTC offset"),
            )
        })?;

        Ok(Self {
            offset,
            weekday,
            saturday,
            sunday,
        })
    }

    /// Monday–Friday 08–18, Saturday 08–12, Sunday closed, at UTC-3.
    pub fn standard() -> Self {
        Self {
            offset: FixedOffset::west_opt(3 * 3600).expect("UTC-3 is a valid offset"),
            weekday: DailyWindow {
                open_hour: 8,
                close_hour: 18,
            },
            saturday: Some(DailyWindow {
                open_hour: 8,
                close_hour: 12,
            }),
            sunday: None,
        }
    }

    /// True when `at` falls inside the window for its local weekday.
    pub fn is_open_at(&self, at: Timestamp) -> bool {
        let local = at.in_offset(self.offset);
        let window = match local.weekday() {
            Weekday::Sat => self.saturday,
            Weekday::Sun => self.sunday,
            _ => Some(self.weekday),
        };
        window.is_some_and(|w| w.contains(local.hour()))
    }
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self::standard()
    }
}
