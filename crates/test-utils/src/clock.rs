use std::sync::atomic::{AtomicI64, Ordering};

use backwatch::backup::Clock;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};

/// Parse `YYYY-MM-DDTHH:MM:SS` into a `NaiveDateTime`.
pub fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S").expect("valid test timestamp")
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

/// Advances by one second on every call, starting at `start`.
#[derive(Debug)]
pub struct SteppingClock {
    start: NaiveDateTime,
    calls: AtomicI64,
}

impl SteppingClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            start,
            calls: AtomicI64::new(0),
        }
    }

    pub fn from_epoch_2024() -> Self {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .expect("valid date");
        Self::new(start)
    }
}

impl Clock for SteppingClock {
    fn now(&self) -> NaiveDateTime {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        self.start + TimeDelta::seconds(n)
    }
}
