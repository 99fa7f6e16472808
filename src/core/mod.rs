// ============================================================================
// spark-propagate - Core Module
// Shared types, configuration, errors and diagnostic strings
// ============================================================================

pub mod config;
pub mod constants;
pub mod error;
pub mod types;

// Re-export commonly used items
pub use config::PropagationConfig;
pub use constants::*;
pub use error::{PropagateError, Result};
pub use types::{listener, same_listener, Delivery, Listener, ListenerId, ScopeId};
