use async_trait::async_trait;

use nudge_models::reminder::{Reminder, ReminderId};

pub struct ScheduleRequest {
    pub reminder: Reminder,
}

impl ScheduleRequest {
    pub fn new(reminder: Reminder) -> Self {
        Self { reminder }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub id: ReminderId,
}

impl ScheduledReminder {
    pub fn new(id: ReminderId) -> Self {
        Self { id }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerStatus {
    /// Nothing to watch, no tick is pending.
    Idle,
    /// Periodic tick is active.
    Armed,
    /// Delivering due reminders inside a tick.
    Firing,
}

#[async_trait]
pub trait ReminderScheduler: Send + Sync + 'static {
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder>;

    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()>;

    /// Swaps the whole watched set. Reminders that stay keep their fired state.
    async fn replace_reminders(&self, reminders: Vec<Reminder>) -> anyhow::Result<()>;

    fn status(&self) -> SchedulerStatus;

    async fn stop(&self) -> anyhow::Result<()>;
}
