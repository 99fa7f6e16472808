// ============================================================================
// spark-propagate - Propagation Family
// One logical channel type: config, provider stack and fallback scope
// ============================================================================
//
// A Propagation<T> is what a UI binding layer hangs on to. It does not hold
// listeners itself. It hands out isolated scopes and answers "which scope is
// current here?" explicitly:
//
// 1. innermost scope entered with provide()
// 2. otherwise the family's default scope, created lazily on first use
// 3. otherwise Err(ScopeBoundaryViolation)
//
// The provider stack belongs to the family instance, not to a global, so two
// families never see each other's providers.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::config::PropagationConfig;
use crate::core::error::{PropagateError, Result};
use crate::core::types::Delivery;
use crate::primitives::listen::Listen;
use crate::primitives::scope::{PropagationScope, Propagator};

struct PropagationInner<T: 'static> {
    config: PropagationConfig,
    default_scope: RefCell<Option<PropagationScope<T>>>,
    providers: RefCell<Vec<PropagationScope<T>>>,
}

/// A family of isolated propagation scopes sharing one configuration.
///
/// # Example
///
/// ```
/// use spark_propagate::create_propagation;
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let propagation = create_propagation::<i32>();
/// let scope = propagation.scope();
/// let hits = Rc::new(Cell::new(0));
///
/// propagation.provide(&scope, || {
///     let hits = hits.clone();
///     let listen = propagation
///         .listen(move |v| hits.set(hits.get() + *v))
///         .unwrap();
///     listen.detach();
/// });
///
/// scope.broadcast(5);
/// assert_eq!(hits.get(), 5);
///
/// // The default scope is a different scope altogether
/// propagation.current().unwrap().broadcast(100);
/// assert_eq!(hits.get(), 5);
/// ```
pub struct Propagation<T: 'static> {
    inner: Rc<PropagationInner<T>>,
}

impl<T: 'static> Clone for Propagation<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for Propagation<T> {
    fn default() -> Self {
        Self::new(PropagationConfig::default())
    }
}

impl<T: 'static> fmt::Debug for Propagation<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Propagation")
            .field("config", &self.inner.config)
            .field("providers", &self.inner.providers.borrow().len())
            .field(
                "default_scope",
                &self.inner.default_scope.borrow().as_ref().map(PropagationScope::id),
            )
            .finish()
    }
}

impl<T: 'static> Propagation<T> {
    pub fn new(config: PropagationConfig) -> Self {
        Self {
            inner: Rc::new(PropagationInner {
                config,
                default_scope: RefCell::new(None),
                providers: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> PropagationConfig {
        self.inner.config
    }

    /// Create a fresh scope with this family's configuration.
    ///
    /// The scope is isolated from every other scope, including ones it is
    /// later provided inside of.
    pub fn scope(&self) -> PropagationScope<T> {
        PropagationScope::with_config(self.inner.config)
    }

    /// The fallback scope, created on first call.
    ///
    /// Fails when the family was configured without one.
    pub fn default_scope(&self) -> Result<PropagationScope<T>> {
        if !self.inner.config.default_scope {
            return Err(PropagateError::ScopeBoundaryViolation);
        }

        let mut slot = self.inner.default_scope.borrow_mut();
        let scope = slot.get_or_insert_with(|| PropagationScope::with_config(self.inner.config));
        Ok(scope.clone())
    }

    /// Run `f` with `scope` as the current scope.
    ///
    /// Calls nest; the previous current scope is restored when `f` returns
    /// or unwinds.
    pub fn provide<R>(&self, scope: &PropagationScope<T>, f: impl FnOnce() -> R) -> R {
        self.inner.providers.borrow_mut().push(scope.clone());

        // Pop on the way out, panics included
        struct ProviderGuard<'a, T: 'static> {
            providers: &'a RefCell<Vec<PropagationScope<T>>>,
        }

        impl<T: 'static> Drop for ProviderGuard<'_, T> {
            fn drop(&mut self) {
                let popped = self.providers.borrow_mut().pop();
                drop(popped);
            }
        }

        let _guard = ProviderGuard {
            providers: &self.inner.providers,
        };
        f()
    }

    /// Resolve the current scope.
    ///
    /// Innermost provided scope first, then the default scope. Outside of any
    /// provider in a family without a default scope this is
    /// [`PropagateError::ScopeBoundaryViolation`].
    pub fn current(&self) -> Result<PropagationScope<T>> {
        if let Some(scope) = self.inner.providers.borrow().last() {
            return Ok(scope.clone());
        }
        self.default_scope()
    }

    /// Whether some scope was provided around the caller.
    pub fn is_provided(&self) -> bool {
        !self.inner.providers.borrow().is_empty()
    }

    // =========================================================================
    // BINDING POINTS
    // =========================================================================

    /// Register `f` on the current scope behind a swappable handle.
    pub fn listen<F>(&self, f: F) -> Result<Listen<T>>
    where
        F: Fn(&T) + 'static,
    {
        Ok(self.current()?.listen(f))
    }

    /// Acquire the current scope's broadcast handle during a render pass.
    ///
    /// Marks that scope `Computing`; the renderer must call
    /// [`PropagationScope::on_commit`] once the pass commits.
    pub fn acquire_propagator(&self) -> Result<Propagator<T>> {
        Ok(self.current()?.acquire_propagator())
    }

    /// Broadcast handle for the current scope, phase untouched.
    pub fn propagator(&self) -> Result<Propagator<T>> {
        Ok(self.current()?.propagator())
    }

    /// Broadcast on the current scope.
    pub fn broadcast(&self, value: T) -> Result<Delivery> {
        Ok(self.current()?.broadcast(value))
    }
}

/// Create a family with the default configuration.
pub fn create_propagation<T: 'static>() -> Propagation<T> {
    Propagation::default()
}

/// Create a family with `config`.
///
/// # Example
///
/// ```
/// use spark_propagate::{create_propagation_with, PropagateError, PropagationConfig};
///
/// let propagation = create_propagation_with::<()>(PropagationConfig::strict());
/// assert_eq!(
///     propagation.current().unwrap_err(),
///     PropagateError::ScopeBoundaryViolation
/// );
/// ```
pub fn create_propagation_with<T: 'static>(config: PropagationConfig) -> Propagation<T> {
    Propagation::new(config)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn default_scope_is_lazy_and_stable() {
        let propagation = create_propagation::<i32>();
        assert!(propagation.inner.default_scope.borrow().is_none());

        let a = propagation.current().unwrap();
        let b = propagation.default_scope().unwrap();
        assert!(a.same_scope(&b));
    }

    #[test]
    fn strict_family_rejects_unprovided_use() {
        let propagation = create_propagation_with::<i32>(PropagationConfig::strict());

        assert_eq!(
            propagation.current().unwrap_err(),
            PropagateError::ScopeBoundaryViolation
        );
        assert!(propagation.listen(|_| {}).is_err());
        assert!(propagation.acquire_propagator().is_err());
        assert!(propagation.propagator().is_err());
        assert!(propagation.broadcast(1).is_err());
    }

    #[test]
    fn strict_family_works_inside_provider() {
        let propagation = create_propagation_with::<i32>(PropagationConfig::strict());
        let scope = propagation.scope();
        let hits = Rc::new(Cell::new(0));

        let hits_clone = hits.clone();
        let listen = propagation.provide(&scope, || {
            propagation
                .listen(move |_| hits_clone.set(hits_clone.get() + 1))
                .unwrap()
        });

        scope.broadcast(1);
        assert_eq!(hits.get(), 1);
        drop(listen);
    }

    #[test]
    fn provide_nests_and_restores() {
        let propagation = create_propagation::<i32>();
        let outer = propagation.scope();
        let inner = propagation.scope();

        propagation.provide(&outer, || {
            assert!(propagation.current().unwrap().same_scope(&outer));

            propagation.provide(&inner, || {
                assert!(propagation.current().unwrap().same_scope(&inner));
            });

            assert!(propagation.current().unwrap().same_scope(&outer));
        });

        assert!(!propagation.is_provided());
        assert!(!propagation.current().unwrap().same_scope(&outer));
    }

    #[test]
    fn provide_restores_after_panic() {
        let propagation = create_propagation_with::<i32>(PropagationConfig::strict());
        let scope = propagation.scope();

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            propagation.provide(&scope, || panic!("render failed"));
        }));

        assert!(result.is_err());
        assert!(!propagation.is_provided());
        assert!(propagation.current().is_err());
    }

    #[test]
    fn provide_returns_closure_value() {
        let propagation = create_propagation::<i32>();
        let scope = propagation.scope();
        assert_eq!(propagation.provide(&scope, || 42), 42);
    }

    #[test]
    fn scopes_inherit_family_config() {
        let config = PropagationConfig::default().with_allow_propagate_during_render(true);
        let propagation = create_propagation_with::<i32>(config);

        assert_eq!(propagation.scope().config(), config);
        assert_eq!(propagation.default_scope().unwrap().config(), config);
    }

    #[test]
    fn families_do_not_share_providers() {
        let a = create_propagation_with::<i32>(PropagationConfig::strict());
        let b = create_propagation_with::<i32>(PropagationConfig::strict());
        let scope = a.scope();

        a.provide(&scope, || {
            assert!(a.current().is_ok());
            assert!(b.current().is_err());
        });
    }

    #[test]
    fn acquire_propagator_marks_current_scope_only() {
        let propagation = create_propagation::<i32>();
        let outer = propagation.scope();
        let inner = propagation.scope();

        propagation.provide(&outer, || {
            propagation.provide(&inner, || {
                let _ = propagation.acquire_propagator().unwrap();
            });
        });

        assert!(inner.is_computing());
        assert!(!outer.is_computing());
        inner.on_commit();
    }

    #[test]
    fn clones_share_default_scope() {
        let propagation = create_propagation::<i32>();
        let other = propagation.clone();

        assert!(
            propagation
                .current()
                .unwrap()
                .same_scope(&other.current().unwrap())
        );
    }
}
