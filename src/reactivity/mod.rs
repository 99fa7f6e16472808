// ============================================================================
// spark-propagate - Reactivity Module
// Render-phase tracking for the broadcast guard
// ============================================================================

pub mod render_phase;

pub use render_phase::{ComputePass, RenderPhase};
