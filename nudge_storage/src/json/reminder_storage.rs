mod model;

use std::{
    collections::HashSet,
    io,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use model::ReminderStorageModel;
use nudge_models::reminder::{Reminder, ReminderId, new_reminder_id};
use thiserror::Error;
use tokio::{fs, io::AsyncWriteExt, sync::RwLock};

use crate::reminder::{NewReminder, ReminderStorage};

#[derive(Debug, Error)]
pub enum JsonReminderError {
    #[error("Reminder storage {path:?} is corrupt: {reason}")]
    CorruptStorage { path: PathBuf, reason: String },

    #[error("Reminder {0} does not exist")]
    NotFound(ReminderId),

    #[error("I/O error on reminder storage {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Serialize(#[from] serde_json::Error),
}

/// Reminder store backed by a single JSON document holding the whole set.
pub struct JsonReminderStorage {
    path: PathBuf,
    reminders: RwLock<Vec<Reminder>>,
}

impl JsonReminderStorage {
    /// Creates an empty store for `path` without touching the file system.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            reminders: RwLock::new(Vec::new()),
        }
    }

    /// Creates a store for `path` and loads the document, if there is one.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, JsonReminderError> {
        let storage = Self::new(path);
        storage.load().await?;
        Ok(storage)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ReminderStorage for JsonReminderStorage {
    type Error = JsonReminderError;

    async fn load(&self) -> Result<Vec<Reminder>, Self::Error> {
        let mut store = self.reminders.write().await;
        let LoadedDocument {
            reminders,
            ids_assigned,
        } = read_document(&self.path).await?;

        if ids_assigned {
            // Assigned ids are written back so they stay stable across loads.
            write_document(&self.path, &reminders).await?;
            log::info!("Persisted assigned reminder ids to {}", self.path.display());
        }

        log::info!(
            "Loaded {} reminders from {}",
            reminders.len(),
            self.path.display()
        );
        *store = reminders.clone();

        Ok(reminders)
    }

    async fn get(&self, id: ReminderId) -> Result<Option<Reminder>, Self::Error> {
        let store = self.reminders.read().await;
        Ok(store.iter().find(|reminder| reminder.id == id).cloned())
    }

    async fn get_all(&self) -> Result<Vec<Reminder>, Self::Error> {
        let store = self.reminders.read().await;
        Ok(store.clone())
    }

    async fn insert(&self, reminder: NewReminder) -> Result<Reminder, Self::Error> {
        let mut store = self.reminders.write().await;
        let reminder = reminder.into_reminder();

        let mut updated = store.clone();
        updated.push(reminder.clone());
        write_document(&self.path, &updated).await?;
        *store = updated;

        log::info!(
            "Added reminder {} at {}. [reminders = {}]",
            reminder.id,
            reminder.fire_at,
            store.len()
        );
        Ok(reminder)
    }

    async fn remove(&self, id: ReminderId) -> Result<Reminder, Self::Error> {
        let mut store = self.reminders.write().await;
        let position = store
            .iter()
            .position(|reminder| reminder.id == id)
            .ok_or(JsonReminderError::NotFound(id))?;

        let mut updated = store.clone();
        let removed = updated.remove(position);
        write_document(&self.path, &updated).await?;
        *store = updated;

        log::info!(
            "Removed reminder {}. [reminders = {}]",
            removed.id,
            store.len()
        );
        Ok(removed)
    }

    async fn save(&self, reminders: Vec<Reminder>) -> Result<(), Self::Error> {
        let mut store = self.reminders.write().await;
        write_document(&self.path, &reminders).await?;
        *store = reminders;

        log::info!("Saved {} reminders", store.len());
        Ok(())
    }
}

struct LoadedDocument {
    reminders: Vec<Reminder>,
    /// Some entry had no id or a duplicate one and got a fresh id.
    ids_assigned: bool,
}

async fn read_document(path: &Path) -> Result<LoadedDocument, JsonReminderError> {
    let bytes = match fs::read(path).await {
        Ok(bytes) => bytes,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            log::info!(
                "Reminder storage {} does not exist yet, starting empty",
                path.display()
            );
            return Ok(LoadedDocument {
                reminders: Vec::new(),
                ids_assigned: false,
            });
        }
        Err(source) => {
            return Err(JsonReminderError::Io {
                path: path.to_owned(),
                source,
            });
        }
    };

    let corrupt = |reason: String| JsonReminderError::CorruptStorage {
        path: path.to_owned(),
        reason,
    };

    let models: Vec<ReminderStorageModel> =
        serde_json::from_slice(&bytes).map_err(|error| corrupt(error.to_string()))?;

    let mut seen_ids = HashSet::with_capacity(models.len());
    let mut reminders = Vec::with_capacity(models.len());
    let mut ids_assigned = false;
    for (index, model) in models.into_iter().enumerate() {
        ids_assigned |= model.id.is_none();
        let mut reminder = Reminder::try_from(model)
            .map_err(|error| corrupt(format!("entry {index}: {error}")))?;

        if !seen_ids.insert(reminder.id) {
            let fresh_id = new_reminder_id();
            log::warn!(
                "Duplicate reminder id {} in entry {}, assigning {}",
                reminder.id,
                index,
                fresh_id
            );
            reminder.id = fresh_id;
            seen_ids.insert(fresh_id);
            ids_assigned = true;
        }

        reminders.push(reminder);
    }

    Ok(LoadedDocument {
        reminders,
        ids_assigned,
    })
}

/// Writes the whole set to a sibling temporary file and renames it over the
/// document, so a crash never leaves a truncated document behind.
async fn write_document(path: &Path, reminders: &[Reminder]) -> Result<(), JsonReminderError> {
    let models: Vec<ReminderStorageModel> = reminders.iter().cloned().map(Into::into).collect();
    let json = serde_json::to_vec_pretty(&models)?;

    let io_error = |path: &Path| {
        let path = path.to_owned();
        move |source| JsonReminderError::Io { path, source }
    };

    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).await.map_err(io_error(parent))?;
    }

    let tmp_path = temporary_path(path);
    let result = write_and_sync(&tmp_path, &json)
        .await
        .map_err(io_error(&tmp_path));
    let result = match result {
        Ok(()) => fs::rename(&tmp_path, path).await.map_err(io_error(path)),
        Err(error) => Err(error),
    };

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path).await;
    }

    result
}

async fn write_and_sync(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(contents).await?;
    file.sync_all().await
}

fn temporary_path(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "reminders".to_owned());

    path.with_file_name(format!(".{file_name}.tmp"))
}
