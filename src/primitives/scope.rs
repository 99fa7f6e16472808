// ============================================================================
// spark-propagate - Propagation Scope
//
// One isolated broadcast channel: a listener registry plus a render-phase
// flag, both owned by the scope instance.
// ============================================================================
//
// A PropagationScope is the unit of isolation. Scopes never inherit from or
// forward to each other, nesting included: a broadcast only reaches the
// listeners registered on the exact scope it was issued on.
//
// Key features:
// - subscribe(fn) / subscribe_listener(rc) - register, get a Subscription
// - unsubscribe(&listener) - remove by identity
// - broadcast(value) - synchronous fan-out, guarded while Computing
// - on_compute_start() / on_commit() - lifecycle hooks for the renderer
// - begin_compute() - RAII compute pass
// - propagator() / acquire_propagator() - broadcast handles
//
// Handles that outlive interest in the scope (Subscription, Propagator) hold
// it weakly, so a listener capturing a propagator of its own scope doesn't
// keep the scope alive forever.
// ============================================================================

use std::fmt;
use std::rc::{Rc, Weak};

use crate::core::config::PropagationConfig;
use crate::core::constants::RENDER_PHASE_WARNING;
use crate::core::types::{Delivery, Listener, ListenerId, ScopeId};
use crate::primitives::registry::ListenerRegistry;
use crate::reactivity::render_phase::{ComputePass, PhaseCell, RenderPhase};

// =============================================================================
// SCOPE INNER
// =============================================================================

pub(crate) struct ScopeInner<T> {
    id: ScopeId,
    config: PropagationConfig,
    registry: ListenerRegistry<T>,
    phase: PhaseCell,
}

impl<T> ScopeInner<T> {
    fn new(config: PropagationConfig) -> Self {
        let id = ScopeId::next();
        tracing::debug!(
            scope = id.as_u64(),
            allow_propagate_during_render = config.allow_propagate_during_render,
            "propagation scope created"
        );
        Self {
            id,
            config,
            registry: ListenerRegistry::new(),
            phase: PhaseCell::default(),
        }
    }

    fn guards_broadcast(&self) -> bool {
        self.phase.get().is_computing() && !self.config.allow_propagate_during_render
    }

    fn broadcast(&self, value: &T) -> Delivery {
        if self.guards_broadcast() {
            tracing::warn!(scope = self.id.as_u64(), "{}", RENDER_PHASE_WARNING);
            return Delivery::Suppressed;
        }

        Delivery::Delivered(self.registry.broadcast(value))
    }
}

impl<T> Drop for ScopeInner<T> {
    fn drop(&mut self) {
        tracing::trace!(
            scope = self.id.as_u64(),
            listeners = self.registry.len(),
            "propagation scope released"
        );
    }
}

// =============================================================================
// PROPAGATION SCOPE (Public handle)
// =============================================================================

/// An isolated registry + guard-flag pair.
///
/// Cloning the handle shares the scope. The scope and its listeners are
/// released when the last handle goes away; there is no explicit destroy.
///
/// # Example
///
/// ```
/// use spark_propagate::PropagationScope;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let scope = PropagationScope::new();
/// let seen = Rc::new(RefCell::new(Vec::new()));
///
/// let seen_clone = seen.clone();
/// let sub = scope.subscribe(move |v: &&'static str| seen_clone.borrow_mut().push(*v));
///
/// scope.broadcast("Hello, World!");
/// sub.unsubscribe();
/// scope.broadcast("ignored");
///
/// assert_eq!(*seen.borrow(), vec!["Hello, World!"]);
/// ```
pub struct PropagationScope<T: 'static> {
    inner: Rc<ScopeInner<T>>,
}

impl<T: 'static> Clone for PropagationScope<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Default for PropagationScope<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: 'static> fmt::Debug for PropagationScope<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropagationScope")
            .field("id", &self.inner.id)
            .field("phase", &self.inner.phase.get())
            .field("listeners", &self.inner.registry.len())
            .field("config", &self.inner.config)
            .finish()
    }
}

impl<T: 'static> PropagationScope<T> {
    /// Create a scope with the default configuration.
    pub fn new() -> Self {
        Self::with_config(PropagationConfig::default())
    }

    /// Create a scope with `config`.
    pub fn with_config(config: PropagationConfig) -> Self {
        Self {
            inner: Rc::new(ScopeInner::new(config)),
        }
    }

    pub fn id(&self) -> ScopeId {
        self.inner.id
    }

    pub fn config(&self) -> PropagationConfig {
        self.inner.config
    }

    /// Current render phase.
    pub fn phase(&self) -> RenderPhase {
        self.inner.phase.get()
    }

    pub fn is_computing(&self) -> bool {
        self.phase().is_computing()
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    /// Whether both handles refer to the same scope.
    pub fn same_scope(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    // =========================================================================
    // SUBSCRIPTION
    // =========================================================================

    /// Register a closure. Each call creates a new listener identity.
    pub fn subscribe<F>(&self, f: F) -> Subscription<T>
    where
        F: Fn(&T) + 'static,
    {
        self.subscribe_listener(Rc::new(f))
    }

    /// Register a shared listener by identity.
    ///
    /// Subscribing a listener that is already registered does not add a
    /// second delivery; both returned subscriptions refer to the same
    /// registration, and ending either one removes it.
    pub fn subscribe_listener(&self, listener: Listener<T>) -> Subscription<T> {
        let id = self.inner.registry.add(listener);
        tracing::trace!(scope = self.inner.id.as_u64(), listener = id.as_u64(), "subscribed");
        Subscription {
            scope: Rc::downgrade(&self.inner),
            scope_id: self.inner.id,
            id,
            detached: false,
        }
    }

    /// Whether `listener` is currently registered on this scope.
    pub fn is_subscribed(&self, listener: &Listener<T>) -> bool {
        self.inner.registry.contains(listener)
    }

    /// Remove `listener` by identity. Returns whether it was registered.
    pub fn unsubscribe(&self, listener: &Listener<T>) -> bool {
        let removed = self.inner.registry.remove(listener) > 0;
        if removed {
            tracing::trace!(scope = self.inner.id.as_u64(), "unsubscribed");
        }
        removed
    }

    // =========================================================================
    // BROADCAST
    // =========================================================================

    /// Deliver `value` to every listener registered right now.
    ///
    /// While the scope is computing and `allow_propagate_during_render` is
    /// off, nothing is delivered and a single `use-propagate:` warning is
    /// logged instead.
    pub fn broadcast(&self, value: T) -> Delivery {
        self.inner.broadcast(&value)
    }

    /// [`broadcast`](Self::broadcast) without taking ownership of the value.
    pub fn broadcast_ref(&self, value: &T) -> Delivery {
        self.inner.broadcast(value)
    }

    // =========================================================================
    // RENDER LIFECYCLE
    // =========================================================================

    /// Mark the scope `Computing`. Pair with [`on_commit`](Self::on_commit).
    pub fn on_compute_start(&self) {
        self.inner.phase.replace(RenderPhase::Computing);
    }

    /// Mark the scope `Idle`; side effects are safe again.
    ///
    /// A [`ComputePass`] still alive at this point will not put the scope
    /// back into `Computing` when it ends.
    pub fn on_commit(&self) {
        self.inner.phase.commit();
    }

    /// Start a compute pass that commits when dropped.
    pub fn begin_compute(&self) -> ComputePass<T> {
        ComputePass::begin(self)
    }

    /// Broadcast handle that leaves the phase alone.
    pub fn propagator(&self) -> Propagator<T> {
        Propagator {
            scope: Rc::downgrade(&self.inner),
        }
    }

    /// Acquire the broadcast handle for the current render pass.
    ///
    /// This is the render-time binding point: it marks the scope `Computing`
    /// until the renderer calls [`on_commit`](Self::on_commit).
    pub fn acquire_propagator(&self) -> Propagator<T> {
        self.on_compute_start();
        self.propagator()
    }

    pub(crate) fn phase_cell(&self) -> &PhaseCell {
        &self.inner.phase
    }
}

// =============================================================================
// SUBSCRIPTION
// =============================================================================

/// Registration token returned by [`PropagationScope::subscribe`].
///
/// Dropping the token unsubscribes, which maps onto unmount. Call
/// [`detach`](Self::detach) to keep the listener registered without holding
/// the token.
#[must_use = "dropping a Subscription unsubscribes its listener"]
pub struct Subscription<T: 'static> {
    scope: Weak<ScopeInner<T>>,
    scope_id: ScopeId,
    id: ListenerId,
    detached: bool,
}

impl<T: 'static> Subscription<T> {
    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn scope_id(&self) -> ScopeId {
        self.scope_id
    }

    /// Whether the listener is still registered on a live scope.
    pub fn is_active(&self) -> bool {
        self.scope
            .upgrade()
            .is_some_and(|scope| scope.registry.contains_id(self.id))
    }

    /// Remove the listener. Safe to call repeatedly or after the scope is gone.
    ///
    /// Returns whether this call removed it.
    pub fn unsubscribe(&self) -> bool {
        let Some(scope) = self.scope.upgrade() else {
            return false;
        };
        let removed = scope.registry.remove_id(self.id);
        if removed {
            tracing::trace!(scope = self.scope_id.as_u64(), listener = self.id.as_u64(), "unsubscribed");
        }
        removed
    }

    /// Give up the token but leave the listener registered.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl<T: 'static> Drop for Subscription<T> {
    fn drop(&mut self) {
        if !self.detached {
            self.unsubscribe();
        }
    }
}

impl<T: 'static> fmt::Debug for Subscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("scope", &self.scope_id)
            .field("id", &self.id)
            .field("active", &self.is_active())
            .finish()
    }
}

// =============================================================================
// PROPAGATOR
// =============================================================================

/// Cloneable broadcast handle for one scope.
///
/// Holds the scope weakly; once the scope is gone, propagating delivers to
/// nobody.
pub struct Propagator<T: 'static> {
    scope: Weak<ScopeInner<T>>,
}

impl<T: 'static> Clone for Propagator<T> {
    fn clone(&self) -> Self {
        Self {
            scope: Weak::clone(&self.scope),
        }
    }
}

impl<T: 'static> fmt::Debug for Propagator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Propagator")
            .field("scope", &self.scope.upgrade().map(|scope| scope.id))
            .finish()
    }
}

impl<T: 'static> Propagator<T> {
    /// Broadcast `value` on the scope, subject to its render-phase guard.
    pub fn propagate(&self, value: T) -> Delivery {
        self.propagate_ref(&value)
    }

    pub fn propagate_ref(&self, value: &T) -> Delivery {
        match self.scope.upgrade() {
            Some(scope) => scope.broadcast(value),
            None => Delivery::Delivered(0),
        }
    }

    /// Whether the scope behind this handle is still alive.
    pub fn is_connected(&self) -> bool {
        self.scope.strong_count() > 0
    }
}

// =============================================================================
// TESTS
// =============================================================================
