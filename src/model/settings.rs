use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::clock_time::ClockTime;

pub const SETTINGS_KEY: &str = "attendance";
pub const DEFAULT_ACTIVITY_NAME: &str = "Rapat Rutin FOKSI";
pub const DEFAULT_OPEN_TIME: ClockTime = match ClockTime::from_hm(8, 0) {
    Some(t) => t,
    None => unreachable!(),
};
pub const DEFAULT_CLOSE_TIME: ClockTime = match ClockTime::from_hm(17, 0) {
    Some(t) => t,
    None => unreachable!(),
};

/// The single attendance window, replaced wholesale on every save.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "activity_name": "Rapat Rutin FOKSI",
    "date": "2024-01-01",
    "open_time": "08:00",
    "close_time": "17:00",
    "active": true,
    "updated_at": "2024-01-01T00:00:00Z"
}))]
pub struct AttendanceSettings {
    pub activity_name: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "08:00")]
    pub open_time: ClockTime,
    #[schema(value_type = String, example = "17:00")]
    pub close_time: ClockTime,
    pub active: bool,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: DateTime<Utc>,
}

impl AttendanceSettings {
    /// Inactive window for `today`, used when nothing has been saved yet.
    pub fn default_for(today: NaiveDate, now: DateTime<Utc>) -> Self {
        AttendanceSettings {
            activity_name: DEFAULT_ACTIVITY_NAME.to_string(),
            date: today,
            open_time: DEFAULT_OPEN_TIME,
            close_time: DEFAULT_CLOSE_TIME,
            active: false,
            updated_at: now,
        }
    }

    /// Default window opened for `today`.
    pub fn opened_for(today: NaiveDate, now: DateTime<Utc>) -> Self {
        AttendanceSettings {
            active: true,
            ..Self::default_for(today, now)
        }
    }
}
