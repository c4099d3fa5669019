//! Model lifecycle types.

use serde::{Deserialize, Serialize};

/// Memory needed to run a model locally, as human-readable strings ("8GB").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRequirements {
    pub min_memory: String,
    pub recommended_memory: String,
}

/// Immutable catalog entry describing a downloadable model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelDescriptor {
    /// Unique identifier, doubling as the on-disk file stem.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    pub description: String,
    /// Download source.
    pub url: String,
    /// Human-readable size ("1.1GB"); the download trusts Content-Length instead.
    pub size: String,
    /// File format, used as the on-disk extension ("safetensors", "gguf").
    pub format: String,
    pub requirements: MemoryRequirements,
}

/// Lifecycle status of a model.
///
/// `NotFound` is only ever returned from status queries for ids outside the
/// catalog; it is never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelStatus {
    NotDownloaded,
    Downloading,
    Ready,
    Error,
    NotFound,
}

/// Persisted selected-model record: a full descriptor copy plus its status.
///
/// Replaced wholesale on every transition so the persisted record never
/// aliases catalog data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelState {
    #[serde(flatten)]
    pub descriptor: ModelDescriptor,
    pub status: ModelStatus,
}

impl ModelState {
    pub fn new(descriptor: &ModelDescriptor, status: ModelStatus) -> Self {
        Self {
            descriptor: descriptor.clone(),
            status,
        }
    }
}

/// Result of a hardware requirements check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequirementsCheck {
    pub meets: bool,
    pub reason: String,
}
