use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceStats {
    /// Number of users with the member role
    pub member_count: u64,
    /// Records submitted today
    pub today_count: u64,
    /// Records ever submitted
    pub total_count: u64,
    /// Today's attendance rate in percent
    pub attendance_rate: u64,
}

impl AttendanceStats {
    pub fn from_counts(member_count: u64, today_count: u64, total_count: u64) -> Self {
        AttendanceStats {
            member_count,
            today_count,
            total_count,
            attendance_rate: attendance_rate(today_count, member_count),
        }
    }
}

/// `round(today / members * 100)`, half away from zero; 0 without members.
pub fn attendance_rate(today_count: u64, member_count: u64) -> u64 {
    if member_count == 0 {
        return 0;
    }
    (today_count * 200 + member_count) / (member_count * 2)
}

/// Per-status share of the records in a report period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct StatusBreakdown {
    pub total: u64,
    pub present: u64,
    pub excused: u64,
    pub sick: u64,
    pub absent: u64,
    /// Percent of `total`, rounded like `attendance_rate`
    pub present_rate: u64,
    pub excused_rate: u64,
    pub sick_rate: u64,
    pub absent_rate: u64,
}

impl StatusBreakdown {
    pub fn tally(statuses: impl IntoIterator<Item = AttendanceStatus>) -> Self {
        let mut b = StatusBreakdown::default();
        for status in statuses {
            b.total += 1;
            match status {
                AttendanceStatus::Present => b.present += 1,
                AttendanceStatus::Excused => b.excused += 1,
                AttendanceStatus::Sick => b.sick += 1,
                AttendanceStatus::Absent => b.absent += 1,
            }
        }
        b.present_rate = attendance_rate(b.present, b.total);
        b.excused_rate = attendance_rate(b.excused, b.total);
        b.sick_rate = attendance_rate(b.sick, b.total);
        b.absent_rate = attendance_rate(b.absent, b.total);
        b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_members_means_zero_rate() {
        assert_eq!(attendance_rate(0, 0), 0);
        assert_eq!(attendance_rate(5, 0), 0);
    }

    #[test]
    fn everyone_present_is_one_hundred() {
        for n in 1..50 {
            assert_eq!(attendance_rate(n, n), 100);
        }
    }

    #[test]
    fn rounds_to_nearest_percent() {
        assert_eq!(attendance_rate(1, 3), 33);
        assert_eq!(attendance_rate(2, 3), 67);
        assert_eq!(attendance_rate(1, 8), 13); // 12.5
        assert_eq!(attendance_rate(1, 200), 1); // 0.5
        assert_eq!(attendance_rate(1, 201), 0);
        assert_eq!(attendance_rate(0, 10), 0);
    }

    #[test]
    fn stats_carry_counts() {
        let stats = AttendanceStats::from_counts(4, 3, 20);
        assert_eq!(stats.member_count, 4);
        assert_eq!(stats.today_count, 3);
        assert_eq!(stats.total_count, 20);
        assert_eq!(stats.attendance_rate, 75);
    }

    #[test]
    fn breakdown_counts_and_rates_each_status() {
        use AttendanceStatus::*;
        let b = StatusBreakdown::tally([Present, Present, Present, Excused, Sick, Present, Present, Absent]);
        assert_eq!(b.total, 8);
        assert_eq!((b.present, b.excused, b.sick, b.absent), (5, 1, 1, 1));
        assert_eq!(b.present_rate, 63); // 62.5
        assert_eq!(b.excused_rate, 13); // 12.5
        assert_eq!(b.sick_rate, 13);
        assert_eq!(b.absent_rate, 13);
    }

    #[test]
    fn empty_period_is_all_zero() {
        assert_eq!(StatusBreakdown::tally(Vec::<AttendanceStatus>::new()), StatusBreakdown::default());
    }
}
