use std::path::PathBuf;

use async_trait::async_trait;

use nudge_models::reminder::{
    Reminder, ReminderFireTime, ReminderId, ReminderStyle, new_reminder_id,
};

/// Reminder as collected by the add-reminder flow, before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub text: String,
    pub fire_at: ReminderFireTime,
    pub style: ReminderStyle,
    pub media_path: Option<PathBuf>,
}

impl NewReminder {
    pub fn into_reminder(self) -> Reminder {
        let NewReminder {
            text,
            fire_at,
            style,
            media_path,
        } = self;

        Reminder {
            id: new_reminder_id(),
            fire_at,
            text,
            style,
            // An empty path coming from a form field means "no media".
            media_path: media_path.filter(|path| !path.as_os_str().is_empty()),
        }
    }
}

/// Single source of truth for the user's reminders.
///
/// Every mutation is written through to durable storage before it becomes
/// visible in memory; a failed write leaves the set untouched.
#[async_trait]
pub trait ReminderStorage: Send + Sync {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Re-reads durable storage and replaces the in-memory set with its contents.
    async fn load(&self) -> Result<Vec<Reminder>, Self::Error>;
    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error>;
    async fn get_all(&self) -> Result<Vec<Reminder>, Self::Error>;
    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, Self::Error>;
    async fn remove(&self, id: ReminderId) -> Result<Reminder, Self::Error>;
    /// Replaces the whole set verbatim.
    async fn save(&self, reminders: Vec<Reminder>) -> Result<(), Self::Error>;
}
