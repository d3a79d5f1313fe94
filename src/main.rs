use std::sync::Arc;

use anyhow::Context;
use nudge::{
    app::{ReminderApp, StartOutcome},
    appsettings,
    delivery::LogDeliveryChannel,
};
use nudge_scheduler::{LocalClock, TickReminderScheduler};
use nudge_storage::json::JsonReminderStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    pretty_env_logger::init();

    let settings = appsettings::load().context("Failed to load settings")?;
    log::info!("Using reminder storage {}", settings.storage.path.display());

    let storage = JsonReminderStorage::new(&settings.storage.path);
    let scheduler = Arc::new(TickReminderScheduler::new(
        Arc::new(LogDeliveryChannel),
        Arc::new(LocalClock),
        settings.scheduler.tick_interval(),
    ));
    let app = ReminderApp::new(Arc::new(storage), scheduler);

    // A corrupt document is left alone rather than replaced by an empty set on the next edit.
    let outcome = app
        .start()
        .await
        .context("Cannot start with unreadable reminder storage, fix or move the file")?;

    match outcome {
        StartOutcome::NoReminders => log::info!(
            "No reminders set yet, add some to {}",
            settings.storage.path.display()
        ),
        StartOutcome::Watching(count) => log::info!("Watching {count} reminders"),
    }

    tokio::signal::ctrl_c().await?;
    log::info!("Shutting down");
    app.shutdown().await
}
