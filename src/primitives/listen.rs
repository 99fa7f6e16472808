// ============================================================================
// spark-propagate - Listen
// A stable registration whose callback can be swapped in place
// ============================================================================
//
// A component re-renders and hands in a fresh closure every time. Re-
// subscribing on each render would churn the registry and move the listener
// to the back of the delivery order. Instead, register one wrapper once and
// let it forward to whatever closure was handed in last.
// ============================================================================

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::core::types::{Listener, ListenerId};
use crate::primitives::scope::{PropagationScope, Subscription};

/// Listener registration that always calls the most recent closure.
///
/// Dropping it unsubscribes.
///
/// # Example
///
/// ```
/// use spark_propagate::PropagationScope;
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// let scope = PropagationScope::new();
/// let log = Rc::new(RefCell::new(Vec::new()));
///
/// let first = log.clone();
/// let listen = scope.listen(move |v: &i32| first.borrow_mut().push(format!("a{v}")));
/// scope.broadcast(1);
///
/// let second = log.clone();
/// listen.update(move |v: &i32| second.borrow_mut().push(format!("b{v}")));
/// scope.broadcast(2);
///
/// assert_eq!(*log.borrow(), vec!["a1", "b2"]);
/// assert_eq!(scope.listener_count(), 1);
/// ```
#[must_use = "dropping a Listen unsubscribes it"]
pub struct Listen<T: 'static> {
    current: Rc<RefCell<Listener<T>>>,
    subscription: Subscription<T>,
}

impl<T: 'static> Listen<T> {
    /// Register a forwarding listener on `scope`.
    pub fn new<F>(scope: &PropagationScope<T>, f: F) -> Self
    where
        F: Fn(&T) + 'static,
    {
        let current: Rc<RefCell<Listener<T>>> = Rc::new(RefCell::new(Rc::new(f)));

        let forward = current.clone();
        let subscription = scope.subscribe(move |value: &T| {
            // Clone out so the callback may call update() on us
            let callback = forward.borrow().clone();
            callback(value);
        });

        Self {
            current,
            subscription,
        }
    }

    /// Replace the callback. Takes effect from the next delivery.
    pub fn update<F>(&self, f: F)
    where
        F: Fn(&T) + 'static,
    {
        *self.current.borrow_mut() = Rc::new(f);
    }

    pub fn id(&self) -> ListenerId {
        self.subscription.id()
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_active()
    }

    /// Remove the registration early. Dropping does the same.
    pub fn unsubscribe(&self) -> bool {
        self.subscription.unsubscribe()
    }

    /// Keep the registration alive without holding this handle.
    pub fn detach(self) {
        self.subscription.detach();
    }
}

impl<T: 'static> fmt::Debug for Listen<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listen")
            .field("subscription", &self.subscription)
            .finish()
    }
}

impl<T: 'static> PropagationScope<T> {
    /// Register `f` behind a swappable [`Listen`] handle.
    pub fn listen<F>(&self, f: F) -> Listen<T>
    where
        F: Fn(&T) + 'static,
    {
        Listen::new(self, f)
    }
}

// =============================================================================
// TESTS
// =============================================================================
