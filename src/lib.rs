// ============================================================================
// spark-propagate - Scope-Bounded Value Propagation for Rust
// ============================================================================
//
// A value propagated on a scope is delivered synchronously to every listener
// registered on that scope at call time. Nothing is stored: late subscribers
// never see earlier values. Scopes are isolated from each other, nesting
// included, and each carries a render-phase guard that drops broadcasts
// issued while a render/compute pass is reading.
//
// Single-threaded by construction (Rc + Cell/RefCell). Every handle is !Send.
// ============================================================================

pub mod core;
mod macros;
pub mod primitives;
pub mod reactivity;

// Re-export core items at crate root for ergonomic access
pub use crate::core::constants;
pub use crate::core::config::PropagationConfig;
pub use crate::core::error::{PropagateError, Result};
pub use crate::core::types::{listener, same_listener, Delivery, Listener, ListenerId, ScopeId};

// Re-export primitives at crate root
pub use primitives::listen::Listen;
pub use primitives::propagation::{create_propagation, create_propagation_with, Propagation};
pub use primitives::registry::ListenerRegistry;
pub use primitives::scope::{PropagationScope, Propagator, Subscription};

// Re-export render phase tracking
pub use reactivity::render_phase::{ComputePass, RenderPhase};

// =============================================================================
// TESTS
// =============================================================================
