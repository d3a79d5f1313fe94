mod clock;
pub mod delivery;
mod reminder_watch;
mod scheduler;
mod tick_scheduler;

pub use clock::{Clock, LocalClock};
pub use reminder_watch::{ReminderWatch, last_occurrence};
pub use scheduler::{ReminderScheduler, ScheduleRequest, ScheduledReminder, SchedulerStatus};
pub use tick_scheduler::{NotifyFailure, TickReminderScheduler, TickReport, deliver_reminders};
