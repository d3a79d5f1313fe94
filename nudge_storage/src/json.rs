pub mod reminder_storage;

pub use reminder_storage::{JsonReminderError, JsonReminderStorage};
