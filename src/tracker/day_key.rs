use std::fmt::Display;

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

/// Identifies one calendar day in device local time. Two instants that fall on the same local day
/// map to the same key, and keys order the same way the calendar does.
#[derive(PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DayKey(NaiveDate);

impl DayKey {
    /// Normalizes an instant to the calendar day it falls on. The timezone of the instant decides
    /// the day, so callers pass `Local` times.
    pub fn for_instant<Tz: TimeZone>(instant: DateTime<Tz>) -> Self {
        Self(instant.date_naive())
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Returns the previous calendar day.
    pub fn previous(self) -> Self {
        Self(
            self.0
                .pred_opt()
                .expect("Beginning of time should never happen"),
        )
    }
}

impl Display for DayKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}
