pub mod json;
mod reminder;

pub use reminder::{NewReminder, ReminderStorage};
