//! Local inference: server subprocess supervision and query proxying.
//!
//! Module structure:
//! - types.rs: query options and the completion wire format
//! - supervisor.rs: InferenceSupervisor

pub mod supervisor;
pub mod types;

pub use supervisor::{InferenceSupervisor, SupervisorConfig};
pub use types::QueryOptions;
