//! Opening-hours rule for reservations.
//!
//! Hours are whole UTC hours. A booking must start inside `[open_hour, close_hour)` and, when a
//! duration is known, `start_hour + duration / 60` (integer division) must stay below
//! `close_hour`. Minutes are truncated on both sides: 23:59 counts as hour 23 and a 119-minute
//! booking counts as one hour.

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpeningHours {
    /// First hour (UTC) a reservation may start in
    pub open_hour: u32,
    /// Closing hour (UTC); 24 is midnight
    pub close_hour: u32,
}

impl Default for OpeningHours {
    fn default() -> Self {
        Self {
            open_hour: 19,
            close_hour: 24,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OpeningHoursViolation {
    #[error("Reservations are only available between {open_hour:02}:00 and {close_hour:02}:00.")]
    OutsideOpeningHours { open_hour: u32, close_hour: u32 },

    #[error("Reservation must end before the restaurant closes at {close_hour:02}:00.")]
    EndsAfterClosing { close_hour: u32 },
}

impl OpeningHours {
    /// Check a start instant and optional duration (minutes) against the opening window.
    ///
    /// A zero or negative duration is not rejected here.
    pub fn validate(&self, start: &DateTime<Utc>, duration_minutes: Option<i32>) -> Result<(), OpeningHoursViolation> {
        let start_hour = i64::from(start.hour());

        if start_hour < i64::from(self.open_hour) || start_hour >= i64::from(self.close_hour) {
            return Err(OpeningHoursViolation::OutsideOpeningHours {
                open_hour: self.open_hour,
                close_hour: self.close_hour,
            });
        }

        if let Some(duration) = duration_minutes {
            let end_hour = start_hour + i64::from(duration) / 60;
            if end_hour >= i64::from(self.close_hour) {
                return Err(OpeningHoursViolation::EndsAfterClosing {
                    close_hour: self.close_hour,
                });
            }
        }

        Ok(())
    }
}
