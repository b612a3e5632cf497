use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};

/// Source of "now". The attendance window is evaluated in local wall-clock
/// time of a fixed UTC offset.
pub trait Clock: Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;

    fn offset(&self) -> FixedOffset;

    fn now_local(&self) -> NaiveDateTime {
        self.now_utc().with_timezone(&self.offset()).naive_local()
    }

    fn today(&self) -> NaiveDate {
        self.now_local().date()
    }
}

pub struct SystemClock {
    offset: FixedOffset,
}

impl SystemClock {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn offset(&self) -> FixedOffset {
        self.offset
    }
}

#[cfg(test)]
pub use fixed::FixedClock;


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_date_follows_offset() {
        let wib = FixedOffset::east_opt(7 * 3600).unwrap();
        let clock = FixedClock::at_local("2024-01-01 06:30", wib);
        assert_eq!(clock.now_local().format("%Y-%m-%d %H:%M").to_string(), "2024-01-01 06:30");
        // 23:30 UTC the previous day
        assert_eq!(clock.now_utc().format("%Y-%m-%d %H:%M").to_string(), "2023-12-31 23:30");
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        clock.advance(chrono::Duration::minutes(5));
        assert_eq!(clock.now_local().format("%H:%M").to_string(), "06:35");
    }
}
