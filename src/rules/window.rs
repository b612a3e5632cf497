//! Attendance window eligibility.
//!
//! The window is open only when the settings are active, dated today, and
//! the current minute lies within `open_time..=close_time`. Both bounds are
//! inclusive. A member who already has a record for today is rejected
//! regardless of the window.

use chrono::NaiveDateTime;
use serde::Serialize;
use strum_macros::{AsRefStr, Display};
use utoipa::ToSchema;

use crate::model::{clock_time::ClockTime, settings::AttendanceSettings};

#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum WindowStatus {
    Open,
    Inactive,
    OtherDate,
    BeforeOpen,
    AfterClose,
}

impl WindowStatus {
    pub fn is_open(self) -> bool {
        self == WindowStatus::Open
    }

    /// Member-facing explanation of the window state.
    pub fn message(self) -> &'static str {
        match self {
            WindowStatus::Open => "Absensi dibuka.",
            WindowStatus::Inactive | WindowStatus::OtherDate => "Absensi belum dibuka.",
            WindowStatus::BeforeOpen => "Absensi belum dimulai.",
            WindowStatus::AfterClose => {
                "Absensi sudah ditutup atau waktu absensi telah berakhir."
            }
        }
    }
}

/// Why a submission was refused.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Display, AsRefStr)]
pub enum Rejection {
    #[strum(serialize = "already-submitted")]
    AlreadySubmitted,
    #[strum(serialize = "not-open")]
    NotOpen,
    #[strum(serialize = "outside-hours")]
    OutsideHours,
}

impl Rejection {
    pub fn message(self) -> &'static str {
        match self {
            Rejection::AlreadySubmitted => "Anda sudah mengisi absensi hari ini",
            Rejection::NotOpen => "Absensi sedang ditutup",
            Rejection::OutsideHours => "Absensi hanya dapat diisi pada jam yang ditentukan",
        }
    }
}

pub fn window_status(settings: &AttendanceSettings, now: NaiveDateTime) -> WindowStatus {
    if !settings.active {
        return WindowStatus::Inactive;
    }
    if settings.date != now.date() {
        return WindowStatus::OtherDate;
    }

    let current = ClockTime::from_time(now.time());
    if current < settings.open_time {
        WindowStatus::BeforeOpen
    } else if current > settings.close_time {
        WindowStatus::AfterClose
    } else {
        WindowStatus::Open
    }
}

pub fn is_open(settings: &AttendanceSettings, now: NaiveDateTime) -> bool {
    window_status(settings, now).is_open()
}

pub fn can_submit(
    settings: &AttendanceSettings,
    now: NaiveDateTime,
    already_submitted: bool,
) -> Result<(), Rejection> {
    if already_submitted {
        return Err(Rejection::AlreadySubmitted);
    }

    match window_status(settings, now) {
        WindowStatus::Open => Ok(()),
        WindowStatus::Inactive | WindowStatus::OtherDate => Err(Rejection::NotOpen),
        WindowStatus::BeforeOpen | WindowStatus::AfterClose => Err(Rejection::OutsideHours),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};

    fn settings(active: bool, date: &str, open: &str, close: &str) -> AttendanceSettings {
        AttendanceSettings {
            activity_name: "Rapat Rutin FOKSI".into(),
            date: date.parse().unwrap(),
            open_time: open.parse().unwrap(),
            close_time: close.parse().unwrap(),
            active,
            updated_at: Utc::now(),
        }
    }

    fn at(date: &str, time: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(&format!("{} {}", date, time), "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn inactive_settings_are_never_open() {
        let s = settings(false, "2024-01-01", "00:00", "23:59");
        for minute in (0..24 * 60).step_by(7) {
            let now = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(minute / 60, minute % 60, 0)
                .unwrap();
            assert!(!is_open(&s, now));
            assert_eq!(window_status(&s, now), WindowStatus::Inactive);
        }
    }

    #[test]
    fn open_exactly_within_inclusive_bounds() {
        let s = settings(true, "2024-01-01", "08:00", "17:00");
        let open = ClockTime::from_hm(8, 0).unwrap().minutes() as u32;
        let close = ClockTime::from_hm(17, 0).unwrap().minutes() as u32;
        for minute in 0..24 * 60 {
            let now = NaiveDate::from_ymd_opt(2024, 1, 1)
                .unwrap()
                .and_hms_opt(minute / 60, minute % 60, 30)
                .unwrap();
            assert_eq!(is_open(&s, now), (open..=close).contains(&minute), "minute {minute}");
        }
    }

    #[test]
    fn boundary_scenario() {
        let s = settings(true, "2024-01-01", "08:00", "17:00");
        assert!(is_open(&s, at("2024-01-01", "08:00")));
        assert!(is_open(&s, at("2024-01-01", "17:00")));
        assert!(!is_open(&s, at("2024-01-01", "07:59")));
        assert!(!is_open(&s, at("2024-01-01", "17:01")));
        assert_eq!(window_status(&s, at("2024-01-01", "07:59")), WindowStatus::BeforeOpen);
        assert_eq!(window_status(&s, at("2024-01-01", "17:01")), WindowStatus::AfterClose);
    }

    #[test]
    fn closed_on_other_dates() {
        let s = settings(true, "2024-01-01", "08:00", "17:00");
        assert!(!is_open(&s, at("2024-01-02", "09:00")));
        assert_eq!(window_status(&s, at("2023-12-31", "09:00")), WindowStatus::OtherDate);
        assert_eq!(can_submit(&s, at("2024-01-02", "09:00"), false), Err(Rejection::NotOpen));
    }

    #[test]
    fn already_submitted_wins_over_open_window() {
        let s = settings(true, "2024-01-01", "08:00", "17:00");
        assert_eq!(can_submit(&s, at("2024-01-01", "09:00"), false), Ok(()));
        assert_eq!(
            can_submit(&s, at("2024-01-01", "09:05"), true),
            Err(Rejection::AlreadySubmitted)
        );
        let closed = settings(false, "2024-01-01", "08:00", "17:00");
        assert_eq!(
            can_submit(&closed, at("2024-01-01", "09:05"), true),
            Err(Rejection::AlreadySubmitted)
        );
    }

    #[test]
    fn rejection_reasons() {
        let inactive = settings(false, "2024-01-01", "08:00", "17:00");
        assert_eq!(can_submit(&inactive, at("2024-01-01", "09:00"), false), Err(Rejection::NotOpen));

        let s = settings(true, "2024-01-01", "08:00", "17:00");
        assert_eq!(
            can_submit(&s, at("2024-01-01", "18:00"), false),
            Err(Rejection::OutsideHours)
        );
        assert_eq!(Rejection::OutsideHours.as_ref(), "outside-hours");
        assert_eq!(Rejection::NotOpen.to_string(), "not-open");
        assert_eq!(Rejection::AlreadySubmitted.as_ref(), "already-submitted");
    }
}
