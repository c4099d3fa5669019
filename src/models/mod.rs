//! Model lifecycle: catalog, storage, streaming download, deletion, and
//! status reconciliation.
//!
//! Module structure:
//! - types.rs: ModelDescriptor, ModelState, ModelStatus, RequirementsCheck
//! - catalog.rs: built-in model list and lookup
//! - downloader.rs: redirect-chasing streaming download with progress throttle
//! - manager.rs: ModelLifecycleManager

pub mod catalog;
pub mod manager;
pub mod types;

mod downloader;

pub use catalog::ModelCatalog;
pub use manager::ModelLifecycleManager;
pub use types::{MemoryRequirements, ModelDescriptor, ModelState, ModelStatus, RequirementsCheck};
