//! Wall-clock capability used by event validation.

use chrono::{Local, NaiveDateTime};

pub trait Clock {
    /// Current local wall-clock time.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always reports the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
