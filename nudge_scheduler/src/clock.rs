use chrono::{Local, NaiveDateTime};

/// Source of wall-clock time. Reminders carry no timezone, so the clock
/// reports naive local time.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> NaiveDateTime;
}

pub struct LocalClock;

impl Clock for LocalClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
