use std::collections::HashMap;

use chrono::{NaiveDateTime, NaiveTime, TimeDelta};
use nudge_models::reminder::{Reminder, ReminderId};

#[derive(Debug, Clone)]
struct WatchedReminder {
    reminder: Reminder,
    /// Occurrences at or before this instant are already handled.
    watermark: NaiveDateTime,
}

/// Set of reminders being watched, with per-reminder fired watermarks.
///
/// A reminder is due when its most recent occurrence lies after its
/// watermark. Firing moves the watermark to the tick time, so every daily
/// occurrence fires once, even when the tick that should have caught it
/// arrives late.
#[derive(Debug, Clone, Default)]
pub struct ReminderWatch {
    entries: Vec<WatchedReminder>,
}

impl ReminderWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn contains(&self, id: ReminderId) -> bool {
        self.entries.iter().any(|entry| entry.reminder.id == id)
    }

    pub fn reminders(&self) -> impl Iterator<Item = &Reminder> {
        self.entries.iter().map(|entry| &entry.reminder)
    }

    pub fn watch(&mut self, reminder: Reminder, now: NaiveDateTime) -> anyhow::Result<()> {
        if self.contains(reminder.id) {
            anyhow::bail!("Already scheduled")
        }

        self.entries.push(WatchedReminder {
            reminder,
            watermark: arming_watermark(now),
        });

        Ok(())
    }

    pub fn unwatch(&mut self, id: ReminderId) -> Option<Reminder> {
        let position = self
            .entries
            .iter()
            .position(|entry| entry.reminder.id == id)?;

        Some(self.entries.remove(position).reminder)
    }

    pub fn replace(&mut self, reminders: Vec<Reminder>, now: NaiveDateTime) {
        let mut watermarks: HashMap<ReminderId, NaiveDateTime> = self
            .entries
            .drain(..)
            .map(|entry| (entry.reminder.id, entry.watermark))
            .collect();

        for reminder in reminders {
            match watermarks.remove(&reminder.id) {
                Some(watermark) => self.entries.push(WatchedReminder {
                    reminder,
                    watermark,
                }),
                None if self.contains(reminder.id) => {
                    log::warn!("Ignoring duplicate reminder {} in watch set", reminder.id);
                }
                None => self.entries.push(WatchedReminder {
                    reminder,
                    watermark: arming_watermark(now),
                }),
            }
        }
    }

    /// Returns the reminders due at `now` in insertion order and marks them fired.
    pub fn take_due(&mut self, now: NaiveDateTime) -> Vec<Reminder> {
        let mut due = Vec::new();

        for entry in &mut self.entries {
            let occurrence = last_occurrence(entry.reminder.fire_at.time(), now);
            if occurrence > entry.watermark {
                entry.watermark = now;
                due.push(entry.reminder.clone());
            }
        }

        due
    }
}

/// Latest instant at or before `now` whose time of day is `fire_at`.
pub fn last_occurrence(fire_at: &NaiveTime, now: NaiveDateTime) -> NaiveDateTime {
    let today = now.date();
    let date = if *fire_at <= now.time() {
        today
    } else {
        today
            .checked_sub_signed(TimeDelta::days(1))
            .expect("Not realistic to overflow")
    };

    date.and_time(*fire_at)
}

/// A reminder armed during the very second it is due still fires on the next tick.
fn arming_watermark(now: NaiveDateTime) -> NaiveDateTime {
    now - TimeDelta::seconds(1)
}

#[cfg(test)]
mod tests;
