use async_trait::async_trait;
use nudge_models::reminder::Reminder;

/// Surfaces a due reminder to the user.
///
/// Called from inside a scheduler tick, so implementations hand the reminder
/// off to the UI and return; they must not wait for the user to dismiss it.
#[async_trait]
pub trait ReminderDeliveryChannel: Send + Sync + 'static {
    async fn send_reminder_notification(&self, reminder: &Reminder) -> anyhow::Result<()>;
}
