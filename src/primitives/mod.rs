// ============================================================================
// spark-propagate - Primitives Module
// Listener registry, scopes, subscriptions and scope families
// ============================================================================

pub mod listen;
pub mod propagation;
pub mod registry;
pub mod scope;

// Re-export for convenience
pub use listen::Listen;
pub use propagation::{create_propagation, create_propagation_with, Propagation};
pub use registry::ListenerRegistry;
pub use scope::{PropagationScope, Propagator, Subscription};
