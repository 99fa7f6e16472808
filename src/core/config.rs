// ============================================================================
// spark-propagate - Configuration
// Per-family options applied to every scope the family creates
// ============================================================================

/// Options for a propagation family and the scopes it creates.
///
/// # Example
///
/// ```
/// use spark_propagate::PropagationConfig;
///
/// let config = PropagationConfig::default().with_allow_propagate_during_render(true);
/// assert!(config.allow_propagate_during_render);
/// assert!(config.default_scope);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropagationConfig {
    /// Deliver broadcasts even while the scope is computing.
    ///
    /// Propagating during render is normally discouraged: a listener that
    /// stores the value into state forces another render pass. When this is
    /// `false` such broadcasts are dropped with a warning.
    pub allow_propagate_during_render: bool,

    /// Whether the family owns a lazily created fallback scope.
    ///
    /// When `false`, resolving the current scope outside of
    /// [`Propagation::provide`](crate::Propagation::provide) fails with
    /// [`PropagateError::ScopeBoundaryViolation`](crate::PropagateError::ScopeBoundaryViolation).
    pub default_scope: bool,
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            allow_propagate_during_render: false,
            default_scope: true,
        }
    }
}

impl PropagationConfig {
    /// Set `allow_propagate_during_render`.
    pub fn with_allow_propagate_during_render(mut self, allow: bool) -> Self {
        self.allow_propagate_during_render = allow;
        self
    }

    /// Set `default_scope`.
    pub fn with_default_scope(mut self, enabled: bool) -> Self {
        self.default_scope = enabled;
        self
    }

    /// Shorthand for a provider-only family with no fallback scope.
    pub fn strict() -> Self {
        Self::default().with_default_scope(false)
    }
}
