use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use nudge_models::reminder::{Reminder, ReminderStyle};
use nudge_scheduler::delivery::ReminderDeliveryChannel;

/// Delivery channel for running without a desktop front end: popups and
/// banners are written to the log.
pub struct LogDeliveryChannel;

#[async_trait]
impl ReminderDeliveryChannel for LogDeliveryChannel {
    async fn send_reminder_notification(&self, reminder: &Reminder) -> anyhow::Result<()> {
        if let Some(media_path) = &reminder.media_path {
            check_media(media_path).await?;
        }

        log::info!("{}", get_message_text(reminder));
        Ok(())
    }
}

async fn check_media(media_path: &Path) -> anyhow::Result<()> {
    let file = tokio::fs::File::open(media_path)
        .await
        .with_context(|| format!("Cannot read media file {}", media_path.display()))?;
    let metadata = file
        .metadata()
        .await
        .with_context(|| format!("Cannot read media file {}", media_path.display()))?;

    anyhow::ensure!(
        metadata.is_file(),
        "Media path {} is not a file",
        media_path.display()
    );

    Ok(())
}

fn get_message_text(reminder: &Reminder) -> String {
    let media = reminder
        .media_path
        .as_ref()
        .map(|path| format!(" [media: {}]", path.display()))
        .unwrap_or_default();

    let (icon, label) = match reminder.style {
        ReminderStyle::Popup => ("🔔", "popup"),
        ReminderStyle::Banner => ("📢", "banner"),
    };

    format!(
        "{icon} [{label}] {}: {}{media}",
        reminder.fire_at, reminder.text
    )
}
