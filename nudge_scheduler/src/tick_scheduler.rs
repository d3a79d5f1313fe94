use std::{sync::Arc, time::Duration};

use anyhow::{Context, anyhow};
use async_trait::async_trait;
use nudge_models::reminder::{Reminder, ReminderId};
use thiserror::Error;
use tokio::{
    sync::{Mutex, mpsc, oneshot, watch},
    task::{self, JoinHandle},
    time::{self, Instant, Interval, MissedTickBehavior},
};
use tokio_util::sync::CancellationToken;

use crate::{
    clock::Clock,
    delivery::ReminderDeliveryChannel,
    reminder_watch::ReminderWatch,
    scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder, SchedulerStatus},
};

const COMMAND_BUFFER: usize = 64;
const STOP_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
#[error("Failed to deliver reminder {reminder_id}: {error:#}")]
pub struct NotifyFailure {
    pub reminder_id: ReminderId,
    pub error: anyhow::Error,
}

#[derive(Debug, Default)]
pub struct TickReport {
    pub delivered: Vec<ReminderId>,
    pub failures: Vec<NotifyFailure>,
}

/// Delivers `reminders` one after another. A failed delivery is logged and
/// recorded, and the remaining reminders are still delivered.
pub async fn deliver_reminders(
    reminders: Vec<Reminder>,
    delivery: &dyn ReminderDeliveryChannel,
) -> TickReport {
    let mut report = TickReport::default();

    for reminder in reminders {
        log::info!(
            "[FIRE] Delivering reminder {}. [fire_at = {}, style = {:?}]",
            reminder.id,
            reminder.fire_at,
            reminder.style
        );

        match delivery.send_reminder_notification(&reminder).await {
            Ok(()) => report.delivered.push(reminder.id),
            Err(error) => {
                let failure = NotifyFailure {
                    reminder_id: reminder.id,
                    error,
                };
                log::error!("{failure}");
                report.failures.push(failure);
            }
        }
    }

    report
}

enum SchedulerCommand {
    Schedule {
        reminder: Reminder,
        reply: oneshot::Sender<anyhow::Result<()>>,
    },
    Cancel {
        id: ReminderId,
        reply: oneshot::Sender<anyhow::Result<()>>,
    },
    Replace {
        reminders: Vec<Reminder>,
        reply: oneshot::Sender<()>,
    },
}

/// Scheduler that polls the watched reminders on a fixed interval.
///
/// A single task owns the watch set. Mutations arrive as messages and are
/// applied between ticks, so a tick always evaluates a consistent set and
/// ticks never overlap.
pub struct TickReminderScheduler {
    tx: mpsc::Sender<SchedulerCommand>,
    status: watch::Receiver<SchedulerStatus>,
    shutdown: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TickReminderScheduler {
    pub fn new(
        delivery_channel: Arc<dyn ReminderDeliveryChannel>,
        clock: Arc<dyn Clock>,
        tick_interval: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        let (status_tx, status) = watch::channel(SchedulerStatus::Idle);
        let shutdown = CancellationToken::new();

        let scheduler_loop = SchedulerLoop {
            watch: ReminderWatch::new(),
            ticker: None,
            tick_interval,
            delivery_channel,
            clock,
            status_tx,
        };
        let task = task::spawn(scheduler_loop.run(rx, shutdown.child_token()));

        Self {
            tx,
            status,
            shutdown,
            task: Mutex::new(Some(task)),
        }
    }

    pub fn subscribe_status(&self) -> watch::Receiver<SchedulerStatus> {
        self.status.clone()
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> SchedulerCommand,
    ) -> anyhow::Result<T> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(command(reply_tx))
            .await
            .map_err(|_| anyhow!("Scheduler is stopped"))?;

        reply_rx.await.context("Scheduler is stopped")
    }
}

impl Drop for TickReminderScheduler {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

#[async_trait]
impl ReminderScheduler for TickReminderScheduler {
    async fn schedule_reminder(
        &self,
        schedule_request: ScheduleRequest,
    ) -> anyhow::Result<ScheduledReminder> {
        let reminder = schedule_request.reminder;
        let id = reminder.id;

        self.request(|reply| SchedulerCommand::Schedule { reminder, reply })
            .await??;

        Ok(ScheduledReminder { id })
    }

    async fn cancel_reminder(&self, scheduled_reminder: &ScheduledReminder) -> anyhow::Result<()> {
        let id = scheduled_reminder.id;
        self.request(|reply| SchedulerCommand::Cancel { id, reply })
            .await?
    }

    async fn replace_reminders(&self, reminders: Vec<Reminder>) -> anyhow::Result<()> {
        self.request(|reply| SchedulerCommand::Replace { reminders, reply })
            .await
    }

    fn status(&self) -> SchedulerStatus {
        *self.status.borrow()
    }

    async fn stop(&self) -> anyhow::Result<()> {
        self.shutdown.cancel();

        let task = self.task.lock().await.take();
        if let Some(task) = task {
            time::timeout(STOP_TIMEOUT, task)
                .await
                .context("Timed out waiting for the scheduler to stop")?
                .context("Scheduler task failed")?;
        }

        Ok(())
    }
}

struct SchedulerLoop {
    watch: ReminderWatch,
    ticker: Option<Interval>,
    tick_interval: Duration,
    delivery_channel: Arc<dyn ReminderDeliveryChannel>,
    clock: Arc<dyn Clock>,
    status_tx: watch::Sender<SchedulerStatus>,
}

impl SchedulerLoop {
    async fn run(
        mut self,
        mut rx: mpsc::Receiver<SchedulerCommand>,
        shutdown: CancellationToken,
    ) {
        log::info!("Starting reminder scheduler. [tick = {:?}]", self.tick_interval);

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                command = rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
                _ = next_tick(&mut self.ticker) => self.tick().await,
            }
        }

        self.ticker = None;
        self.status_tx.send_replace(SchedulerStatus::Idle);
        log::info!("Reminder scheduler stopped");
    }

    fn handle_command(&mut self, command: SchedulerCommand) {
        let now = self.clock.now();

        match command {
            SchedulerCommand::Schedule { reminder, reply } => {
                let id = reminder.id;
                let fire_at = reminder.fire_at;
                let result = self.watch.watch(reminder, now);
                if result.is_ok() {
                    log::info!("[SCHEDULE] Watching reminder {id}. [fire_at = {fire_at}]");
                }
                self.sync_ticker();
                let _ = reply.send(result);
            }
            SchedulerCommand::Cancel { id, reply } => {
                let result = match self.watch.unwatch(id) {
                    Some(_) => {
                        log::info!("[CANCEL] Stopped watching reminder {id}");
                        Ok(())
                    }
                    None => Err(anyhow!("No such reminder {id}")),
                };
                self.sync_ticker();
                let _ = reply.send(result);
            }
            SchedulerCommand::Replace { reminders, reply } => {
                self.watch.replace(reminders, now);
                log::info!("[REPLACE] Watching {} reminders", self.watch.len());
                self.sync_ticker();
                let _ = reply.send(());
            }
        }
    }

    async fn tick(&mut self) {
        let now = self.clock.now();
        let due = self.watch.take_due(now);
        if due.is_empty() {
            return;
        }

        self.status_tx.send_replace(SchedulerStatus::Firing);
        let report = deliver_reminders(due, self.delivery_channel.as_ref()).await;
        self.status_tx.send_replace(SchedulerStatus::Armed);

        log::debug!(
            "Tick at {now} finished. [delivered = {}, failed = {}]",
            report.delivered.len(),
            report.failures.len()
        );
    }

    /// Ticks only while there is something to watch.
    fn sync_ticker(&mut self) {
        match (self.watch.is_empty(), self.ticker.is_some()) {
            (true, true) => {
                self.ticker = None;
                self.status_tx.send_replace(SchedulerStatus::Idle);
                log::info!("[IDLE] No reminders left to watch");
            }
            (false, false) => {
                let mut ticker = time::interval(self.tick_interval);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
                self.ticker = Some(ticker);
                self.status_tx.send_replace(SchedulerStatus::Armed);
                log::info!("[ARMED] Watching {} reminders", self.watch.len());
            }
            _ => {}
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) -> Instant {
    match ticker {
        Some(ticker) => ticker.tick().await,
        None => std::future::pending().await,
    }
}
