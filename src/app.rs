use std::sync::Arc;

use nudge_models::reminder::{Reminder, ReminderId};
use nudge_scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder};
use nudge_storage::{NewReminder, ReminderStorage};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Nothing is configured yet. Informational, not a failure.
    NoReminders,
    Watching(usize),
}

/// Keeps the reminder store and the scheduler in step.
///
/// Every edit is written through the store first and only then reflected into
/// the scheduler, so the scheduler never watches a reminder that is not
/// persisted.
pub struct ReminderApp<S: ReminderStorage> {
    storage: Arc<S>,
    scheduler: Arc<dyn ReminderScheduler>,
}

impl<S: ReminderStorage> ReminderApp<S> {
    pub fn new(storage: Arc<S>, scheduler: Arc<dyn ReminderScheduler>) -> Self {
        Self { storage, scheduler }
    }

    pub async fn start(&self) -> anyhow::Result<StartOutcome> {
        let reminders = self.storage.load().await?;
        let count = reminders.len();
        self.scheduler.replace_reminders(reminders).await?;

        if count == 0 {
            Ok(StartOutcome::NoReminders)
        } else {
            Ok(StartOutcome::Watching(count))
        }
    }

    pub async fn list_reminders(&self) -> anyhow::Result<Vec<Reminder>> {
        Ok(self.storage.get_all().await?)
    }

    pub async fn add_reminder(&self, reminder: NewReminder) -> anyhow::Result<Reminder> {
        let reminder = self.storage.insert(reminder).await?;
        self.scheduler
            .schedule_reminder(ScheduleRequest::new(reminder.clone()))
            .await?;

        Ok(reminder)
    }

    pub async fn remove_reminder(&self, id: ReminderId) -> anyhow::Result<Reminder> {
        let reminder = self.storage.remove(id).await?;
        self.scheduler
            .cancel_reminder(&ScheduledReminder::new(id))
            .await?;

        Ok(reminder)
    }

    pub async fn set_reminders(&self, reminders: Vec<Reminder>) -> anyhow::Result<()> {
        self.storage.save(reminders.clone()).await?;
        self.scheduler.replace_reminders(reminders).await
    }

    pub async fn shutdown(&self) -> anyhow::Result<()> {
        self.scheduler.stop().await
    }
}
