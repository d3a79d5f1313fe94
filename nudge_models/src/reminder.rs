use std::{fmt, path::PathBuf, str::FromStr};

use chrono::{NaiveTime, Timelike};
use thiserror::Error;
use uuid::Uuid;

pub type ReminderId = Uuid;

pub fn new_reminder_id() -> ReminderId {
    Uuid::new_v4()
}

const FIRE_TIME_FORMAT: &str = "%H:%M:%S";

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid reminder time {0:?}, expected HH:MM:SS")]
pub struct ParseFireTimeError(pub String);

/// Time of day a reminder fires at, truncated to whole seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReminderFireTime(NaiveTime);

impl ReminderFireTime {
    pub fn new(inner: NaiveTime) -> Self {
        let normalized_time = inner.with_nanosecond(0).expect("Will never fail.");
        Self(normalized_time)
    }

    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, second).map(Self)
    }

    pub fn time(&self) -> &NaiveTime {
        &self.0
    }

    pub fn into_time(self) -> NaiveTime {
        self.0
    }
}

impl FromStr for ReminderFireTime {
    type Err = ParseFireTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s, FIRE_TIME_FORMAT)
            .ok()
            // `%S` accepts 60 as a leap second, which is not a valid fire time.
            .filter(|time| time.nanosecond() < 1_000_000_000)
            .map(Self::new)
            .ok_or_else(|| ParseFireTimeError(s.to_owned()))
    }
}

impl fmt::Display for ReminderFireTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(FIRE_TIME_FORMAT))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReminderStyle {
    Popup,
    Banner,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub id: ReminderId,
    pub fire_at: ReminderFireTime,
    pub text: String,
    pub style: ReminderStyle,
    pub media_path: Option<PathBuf>,
}
