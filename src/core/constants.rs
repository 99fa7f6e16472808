// ============================================================================
// spark-propagate - Constants
// Diagnostic strings shared by the scope engine and its tests
// ============================================================================

// =============================================================================
// DIAGNOSTICS
// =============================================================================

// Literal form so concat! can build on it
macro_rules! warning_prefix {
    () => {
        "use-propagate: "
    };
}

/// Prefix carried by every warning this crate emits.
pub const WARNING_PREFIX: &str = warning_prefix!();

/// Warning emitted when a broadcast is dropped because its scope is computing.
pub const RENDER_PHASE_WARNING: &str = concat!(
    warning_prefix!(),
    "The propagate callback function should not be called while rendering, ignoring the call."
);

/// Message carried by [`PropagateError::ScopeBoundaryViolation`].
///
/// [`PropagateError::ScopeBoundaryViolation`]: crate::PropagateError::ScopeBoundaryViolation
pub const SCOPE_BOUNDARY_MESSAGE: &str =
    "This hook can only be used under its corresponding scope provider.";

// =============================================================================
// TESTS
// =============================================================================
