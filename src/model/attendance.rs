use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::{IntoParams, ToSchema};

use crate::model::clock_time::ClockTime;

/// H = hadir, I = izin, S = sakit, A = alpa.
#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Hash, Serialize, Deserialize, Display, EnumString, AsRefStr,
    ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "H")]
    #[strum(serialize = "H")]
    Present,
    #[serde(rename = "I")]
    #[strum(serialize = "I")]
    Excused,
    #[serde(rename = "S")]
    #[strum(serialize = "S")]
    Sick,
    #[serde(rename = "A")]
    #[strum(serialize = "A")]
    Absent,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "id": "9b0d5f8e-1c1a-4a51-8c0e-2f0a7d9e4b11",
    "user_id": "3f1c2a9e-8d57-4e0b-9a43-5b1c1d2e7f10",
    "name": "Siti Rahma",
    "position": "Ketua Regional",
    "region": "Jawa Barat",
    "institution": "SMAN 1 Bandung",
    "status": "H",
    "note": "",
    "date": "2024-01-01",
    "submitted_at": "09:00",
    "created_at": "2024-01-01T02:00:00Z"
}))]
pub struct AttendanceRecord {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub position: String,
    pub region: String,
    pub institution: String,
    pub status: AttendanceStatus,
    pub note: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = String, example = "09:00")]
    pub submitted_at: ClockTime,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: String,
    pub name: String,
    pub position: String,
    pub region: String,
    pub institution: String,
    pub status: AttendanceStatus,
    pub note: String,
    pub date: NaiveDate,
    pub submitted_at: ClockTime,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Only records of this member
    pub user_id: Option<String>,
    /// Only records of this day (YYYY-MM-DD)
    #[schema(value_type = Option<String>, format = "date", example = "2024-01-01")]
    #[param(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    /// Only records with this status code (H, I, S, A)
    #[schema(value_type = Option<String>, example = "H")]
    #[param(value_type = Option<String>)]
    pub status: Option<AttendanceStatus>,
    /// Records on or after this day
    #[schema(value_type = Option<String>, format = "date", example = "2024-01-01")]
    #[param(value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    /// Records on or before this day
    #[schema(value_type = Option<String>, format = "date", example = "2024-01-31")]
    #[param(value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

impl AttendanceFilter {
    pub fn for_user(user_id: &str) -> Self {
        AttendanceFilter {
            user_id: Some(user_id.to_string()),
            ..Default::default()
        }
    }

    pub fn for_date(date: NaiveDate) -> Self {
        AttendanceFilter {
            date: Some(date),
            ..Default::default()
        }
    }

    /// Inclusive date range.
    pub fn between(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        AttendanceFilter {
            from,
            to,
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &AttendanceRecord) -> bool {
        self.user_id.as_deref().is_none_or(|id| id == record.user_id)
            && self.date.is_none_or(|d| d == record.date)
            && self.status.is_none_or(|s| s == record.status)
            && self.from.is_none_or(|d| record.date >= d)
            && self.to.is_none_or(|d| record.date <= d)
    }
}
