//! Durable settings, consumed through a small interface.
//!
//! The model lifecycle manager only cares about the configured model
//! directory and the selected-model record; everything else the application
//! persists stays out of this trait. A JSON-file-backed implementation is
//! provided so the crate works standalone; the desktop shell may supply its
//! own store instead.

use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::models::types::{ModelState, ModelStatus};

/// Default model directory, relative to the user's home.
pub const DEFAULT_MODEL_DIRECTORY: &str = ".local/lka/models";

pub trait SettingsStore: Send + Sync {
    /// Configured model directory. May be relative; the manager resolves
    /// relative paths under the user's home directory.
    fn model_directory(&self) -> String;

    /// Replace the selected-model record wholesale.
    fn set_selected_model(&self, state: ModelState);

    fn selected_model(&self) -> Option<ModelState>;

    /// Patch only the status of the current record, if one exists.
    fn set_model_status(&self, status: ModelStatus);
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsData {
    #[serde(default)]
    model_directory: Option<String>,
    #[serde(default)]
    selected_model: Option<ModelState>,
}

/// Settings persisted as a single JSON file, rewritten on every mutation.
pub struct JsonSettingsStore {
    path: PathBuf,
    data: Mutex<SettingsData>,
}

impl JsonSettingsStore {
    /// Open the store, loading existing settings if the file is present.
    /// A missing or corrupt file starts from defaults rather than failing.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match std::fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                log::warn!(
                    "Settings file {} is corrupt ({}), starting fresh",
                    path.display(),
                    e
                );
                SettingsData::default()
            }),
            Err(_) => SettingsData::default(),
        };

        Self {
            path,
            data: Mutex::new(data),
        }
    }

    pub fn set_model_directory(&self, directory: impl Into<String>) {
        let mut data = self.data.lock().unwrap();
        data.model_directory = Some(directory.into());
        self.persist(&data);
    }

    fn persist(&self, data: &SettingsData) {
        let result = (|| -> std::io::Result<()> {
            if let Some(parent) = self.path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let raw = serde_json::to_string_pretty(data)?;
            std::fs::write(&self.path, raw)
        })();

        // Settings loss must not break a download in flight; log and move on.
        if let Err(e) = result {
            log::error!("Failed to write settings to {}: {}", self.path.display(), e);
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    fn model_directory(&self) -> String {
        self.data
            .lock()
            .unwrap()
            .model_directory
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL_DIRECTORY.to_string())
    }

    fn set_selected_model(&self, state: ModelState) {
        let mut data = self.data.lock().unwrap();
        data.selected_model = Some(state);
        self.persist(&data);
    }

    fn selected_model(&self) -> Option<ModelState> {
        self.data.lock().unwrap().selected_model.clone()
    }

    fn set_model_status(&self, status: ModelStatus) {
        let mut data = self.data.lock().unwrap();
        if let Some(current) = data.selected_model.take() {
            data.selected_model = Some(ModelState {
                status,
                ..current
            });
        }
        self.persist(&data);
    }
}
