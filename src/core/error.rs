// ============================================================================
// spark-propagate - Errors
// ============================================================================

use thiserror::Error;

use super::constants::SCOPE_BOUNDARY_MESSAGE;

/// Errors surfaced at the propagation API boundary.
///
/// A broadcast dropped by the render-phase guard is not an error; it shows up
/// as [`Delivery::Suppressed`](crate::Delivery::Suppressed) plus a warning.
/// A panicking listener is not caught either: the panic unwinds through
/// `broadcast` and the remaining listeners of that pass are skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PropagateError {
    /// No scope was provided and the family has no default scope.
    #[error("{}", SCOPE_BOUNDARY_MESSAGE)]
    ScopeBoundaryViolation,
}

/// Result alias for fallible propagation operations.
pub type Result<T> = std::result::Result<T, PropagateError>;
