use std::iter::FusedIterator;

use chrono::{Days, Months, NaiveDate};

use super::Frequency;

impl Frequency {
    /// Moves `date` forward by exactly one period.
    ///
    /// Months and years follow chrono's overflow rule: a day that does not
    /// exist in the target month is clamped to that month's last day
    /// (Jan 31 + 1 month = Feb 28/29, Feb 29 + 1 year = Feb 28).
    /// Returns `None` only when the result falls outside chrono's date range.
    pub fn advance(self, date: NaiveDate) -> Option<NaiveDate> {
        match self {
            Frequency::Weekly => date.checked_add_days(Days::new(7)),
            Frequency::Monthly => date.checked_add_months(Months::new(1)),
            Frequency::Yearly => date.checked_add_months(Months::new(12)),
        }
    }
}

/// Lazy sequence of due dates, starting at the seed date itself.
///
/// Each date is derived from the previous one, so a clamped day carries
/// forward (Jan 31, Feb 29, Mar 29, ...). The seed is copied in, so the
/// sequence can be cloned and walked again without touching the caller's date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrences {
    frequency: Frequency,
    next: Option<NaiveDate>,
    until: NaiveDate,
}

/// Every due date from `start` through `until` (inclusive).
/// Empty when `start` is after `until`.
pub fn occurrences(frequency: Frequency, start: NaiveDate, until: NaiveDate) -> Occurrences {
    Occurrences {
        frequency,
        next: Some(start),
        until,
    }
}

impl Occurrences {
    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    /// The first date this sequence has not yielded yet, even if it lies past `until`.
    pub fn peek_next(&self) -> Option<NaiveDate> {
        self.next
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next.filter(|date| *date <= self.until)?;
        self.next = self.frequency.advance(current);
        Some(current)
    }
}

impl FusedIterator for Occurrences {}
