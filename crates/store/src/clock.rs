//! Date source for the issue-on-first-publish rule.
use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Current calendar date.
    fn today(&self) -> NaiveDate;
}

/// Local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock frozen on one date, for tests and replays.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_returns_its_date() {
        let Some(date) = NaiveDate::from_ymd_opt(2024, 2, 29) else {
            panic!("valid fixture date");
        };
        assert_eq!(FixedClock(date).today(), date);
        assert_eq!(FixedClock(date).today().format("%Y-%m-%d").to_string(), "2024-02-29");
    }
}
