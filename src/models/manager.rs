//! Model lifecycle manager: storage paths, disk truth, downloads, deletion,
//! and status reconciliation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{error, info, warn};

use crate::error::{Error, Result};
use crate::settings::SettingsStore;
use super::catalog::ModelCatalog;
use super::downloader;
use super::types::{ModelDescriptor, ModelState, ModelStatus, RequirementsCheck};

/// End-to-end budget for one model download; large models take a while.
const DOWNLOAD_TIMEOUT_SECS: u64 = 3600;

/// Owns the model directory and the persisted selected-model record.
///
/// Constructed once at startup and injected by reference into whoever needs
/// it; there is no global instance.
pub struct ModelLifecycleManager {
    catalog: ModelCatalog,
    settings: Arc<dyn SettingsStore>,
    models_dir: PathBuf,
    client: reqwest::Client,
}

impl ModelLifecycleManager {
    pub fn new(catalog: ModelCatalog, settings: Arc<dyn SettingsStore>) -> Result<Self> {
        let models_dir = resolve_model_directory(&settings.model_directory());
        info!("Using model directory: {}", models_dir.display());
        std::fs::create_dir_all(&models_dir)?;

        // Redirects are chased by hand in the downloader so the hop count
        // stays bounded.
        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .timeout(std::time::Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            catalog,
            settings,
            models_dir,
            client,
        })
    }

    pub fn models_dir(&self) -> &Path {
        &self.models_dir
    }

    /// All catalog descriptors.
    pub fn list_available(&self) -> &[ModelDescriptor] {
        self.catalog.list()
    }

    pub fn get(&self, id: &str) -> Option<&ModelDescriptor> {
        self.catalog.get(id)
    }

    /// Resolved on-disk path for a catalog model, downloaded or not.
    pub fn model_path(&self, id: &str) -> Option<PathBuf> {
        self.catalog.get(id).map(|m| self.descriptor_path(m))
    }

    fn descriptor_path(&self, model: &ModelDescriptor) -> PathBuf {
        self.models_dir.join(format!("{}.{}", model.id, model.format))
    }

    /// True iff the model file exists with content. Probe failures are logged
    /// and reported as false, never propagated.
    pub fn is_downloaded(&self, id: &str) -> bool {
        let Some(path) = self.model_path(id) else {
            return false;
        };

        match std::fs::metadata(&path) {
            Ok(meta) => meta.len() > 0,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                error!("Error checking if model {} is downloaded: {}", id, e);
                false
            }
        }
    }

    /// Download a model, reporting progress through `on_progress` (a float in
    /// [0, 100], throttled to whole-point advances). Returns the file path.
    pub async fn download<F>(&self, id: &str, on_progress: F) -> Result<PathBuf>
    where
        F: Fn(f32) + Send + Sync,
    {
        let model = self
            .catalog
            .get(id)
            .ok_or_else(|| Error::ModelNotFound(id.to_string()))?;
        let dest = self.descriptor_path(model);

        downloader::download_model(&self.client, self.settings.as_ref(), model, &dest, on_progress)
            .await
    }

    /// Remove the model file if present. Failures are logged and surface only
    /// as a false return.
    pub fn delete(&self, id: &str) -> bool {
        let Some(path) = self.model_path(id) else {
            warn!("Cannot delete unknown model {}", id);
            return false;
        };

        if !path.exists() {
            warn!("Model file not found for deletion: {}", path.display());
            return false;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted model file: {}", path.display());
                true
            }
            Err(e) => {
                error!("Error deleting model {}: {}", id, e);
                false
            }
        }
    }

    /// Current status of a model, reconciled against disk truth.
    ///
    /// The file on disk wins over the persisted record: a present file forces
    /// `ready`, a missing file demotes a stale `ready` to `not_downloaded`,
    /// and either correction is persisted. This call never fails; unknown ids
    /// return `NotFound`.
    pub fn status(&self, id: &str) -> ModelStatus {
        let Some(model) = self.catalog.get(id) else {
            warn!("Model {} not found in catalog", id);
            return ModelStatus::NotFound;
        };

        let downloaded = self.is_downloaded(id);
        let saved = self
            .settings
            .selected_model()
            .filter(|state| state.descriptor.id == id)
            .map(|state| state.status);

        if downloaded {
            if saved != Some(ModelStatus::Ready) {
                info!("Model {} is on disk, correcting status to ready", id);
                self.settings
                    .set_selected_model(ModelState::new(model, ModelStatus::Ready));
            }
            return ModelStatus::Ready;
        }

        if saved == Some(ModelStatus::Ready) {
            warn!("Model {} marked ready but file is missing, correcting", id);
            self.settings
                .set_selected_model(ModelState::new(model, ModelStatus::NotDownloaded));
            return ModelStatus::NotDownloaded;
        }

        saved.unwrap_or(ModelStatus::NotDownloaded)
    }

    /// Whether this host can run the model. Only the id lookup is real;
    /// the hardware probe is a stub.
    ///
    /// TODO: compare requirements.min_memory against detected system memory.
    pub fn check_requirements(&self, id: &str) -> RequirementsCheck {
        if self.catalog.get(id).is_none() {
            return RequirementsCheck {
                meets: false,
                reason: "Model not found".to_string(),
            };
        }

        RequirementsCheck {
            meets: true,
            reason: "System meets requirements".to_string(),
        }
    }
}

/// A relative configured directory lands under the user's home; absolute
/// paths are used as-is.
fn resolve_model_directory(configured: &str) -> PathBuf {
    let path = Path::new(configured);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(path)
    }
}
