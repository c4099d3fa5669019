// LKA core - model lifecycle management and local inference supervision
//
// The desktop shell talks to exactly two services here:
// - ModelLifecycleManager: catalog lookup, downloads, deletion, status
// - InferenceSupervisor: local inference server lifecycle and queries
//
// Both are constructed once at startup and injected by reference into
// whatever consumes them; this crate holds no global state.

pub mod error;
pub mod inference;
pub mod models;
pub mod settings;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{Error, Result};
pub use inference::{InferenceSupervisor, QueryOptions, SupervisorConfig};
pub use models::{
    MemoryRequirements, ModelCatalog, ModelDescriptor, ModelLifecycleManager, ModelState,
    ModelStatus, RequirementsCheck,
};
pub use settings::{JsonSettingsStore, SettingsStore};

/// Initialize env_logger to output to stderr (reads RUST_LOG env var).
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}
