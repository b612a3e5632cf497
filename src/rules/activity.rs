use chrono::{DateTime, Utc};

/// Relative time in Indonesian, e.g. "5 menit yang lalu".
pub fn time_ago(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - then).num_seconds().max(0);

    const UNITS: [(i64, &str); 5] = [
        (31_536_000, "tahun"),
        (2_592_000, "bulan"),
        (86_400, "hari"),
        (3_600, "jam"),
        (60, "menit"),
    ];

    for (size, unit) in UNITS {
        let count = seconds / size;
        if count >= 1 {
            return format!("{} {} yang lalu", count, unit);
        }
    }

    "Beberapa detik yang lalu".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn picks_largest_whole_unit() {
        let now = Utc::now();
        assert_eq!(time_ago(now - Duration::seconds(10), now), "Beberapa detik yang lalu");
        assert_eq!(time_ago(now - Duration::seconds(90), now), "1 menit yang lalu");
        assert_eq!(time_ago(now - Duration::hours(5), now), "5 jam yang lalu");
        assert_eq!(time_ago(now - Duration::days(3), now), "3 hari yang lalu");
        assert_eq!(time_ago(now - Duration::days(65), now), "2 bulan yang lalu");
        assert_eq!(time_ago(now - Duration::days(800), now), "2 tahun yang lalu");
    }

    #[test]
    fn future_timestamps_read_as_just_now() {
        let now = Utc::now();
        assert_eq!(time_ago(now + Duration::minutes(3), now), "Beberapa detik yang lalu");
    }
}
