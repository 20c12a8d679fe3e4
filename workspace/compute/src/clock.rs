use std::fmt::Debug;
use std::sync::{PoisonError, RwLock};

use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Source of "now" for everything that stamps or schedules records.
pub trait Clock: Send + Sync + Debug {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall clock in the host's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Starts at midnight of `date`.
    pub fn at_date(date: NaiveDate) -> Self {
        Self::new(date.and_time(chrono::NaiveTime::MIN))
    }

    pub fn set(&self, now: NaiveDateTime) {
        *self.now.write().unwrap_or_else(PoisonError::into_inner) = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap_or_else(PoisonError::into_inner);
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.read().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_moves_only_when_told() {
        let start = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let clock = FixedClock::at_date(start);
        assert_eq!(clock.today(), start);
        assert_eq!(clock.now(), clock.now());

        clock.advance(Duration::days(31));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 5, 11).unwrap());

        clock.set(start.and_hms_opt(23, 59, 59).unwrap());
        assert_eq!(clock.today(), start);
    }
}
