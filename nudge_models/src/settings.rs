use std::{path::PathBuf, time::Duration};

use serde::Deserialize;

const DEFAULT_STORAGE_PATH: &str = "reminders.json";
const DEFAULT_TICK_INTERVAL_MS: u64 = 1000;

#[derive(Deserialize, Debug, Clone)]
pub struct StorageSettings {
    #[serde(default = "default_storage_path")]
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_storage_path(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct SchedulerSettings {
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl SchedulerSettings {
    /// Never zero: a zero interval is bumped to one millisecond.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub scheduler: SchedulerSettings,
}

fn default_storage_path() -> PathBuf {
    PathBuf::from(DEFAULT_STORAGE_PATH)
}

fn default_tick_interval_ms() -> u64 {
    DEFAULT_TICK_INTERVAL_MS
}
