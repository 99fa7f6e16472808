// ============================================================================
// spark-propagate - Listener Registry
// Ordered, identity-deduplicated listener set with snapshot fan-out
// ============================================================================
//
// One registry per scope. Membership is a Vec kept in registration order,
// which is also ascending id order, with set semantics on listener identity: adding a listener that is already
// present returns its existing id and does not create a second delivery.
//
// Fan-out never holds the RefCell borrow while a listener runs:
// - snapshot (id, listener) pairs when the broadcast starts
// - before each call, check the id is still a member
//
// So a listener may add, remove or broadcast from inside its own invocation.
// Listeners added during a pass wait for the next one. Listeners removed
// during a pass, before their turn, are skipped.
// ============================================================================

use std::cell::{Cell, RefCell};
use std::fmt;

use crate::core::types::{identity_of, Listener, ListenerId};

struct Entry<T> {
    id: ListenerId,
    listener: Listener<T>,
}

impl<T> Clone for Entry<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            listener: self.listener.clone(),
        }
    }
}

/// Ordered set of listeners for a single scope.
pub struct ListenerRegistry<T> {
    entries: RefCell<Vec<Entry<T>>>,
    next_id: Cell<u64>,
}

impl<T> Default for ListenerRegistry<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for ListenerRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("len", &self.len())
            .finish()
    }
}

impl<T> ListenerRegistry<T> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: RefCell::new(Vec::new()),
            next_id: Cell::new(1),
        }
    }

    /// Insert `listener`, returning its registration id.
    ///
    /// Re-adding a listener that is already a member is a no-op and returns
    /// the id of the existing entry.
    pub fn add(&self, listener: Listener<T>) -> ListenerId {
        if let Some(id) = self.id_of(&listener) {
            return id;
        }

        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.entries.borrow_mut().push(Entry { id, listener });
        id
    }

    /// Remove every entry whose identity equals `listener`.
    ///
    /// Returns the number of entries removed; removing a non-member returns 0.
    pub fn remove(&self, listener: &Listener<T>) -> usize {
        let target = identity_of(listener);
        self.retain(|entry| identity_of(&entry.listener) != target)
    }

    /// Remove the entry registered under `id`. Returns whether it was present.
    pub fn remove_id(&self, id: ListenerId) -> bool {
        self.retain(|entry| entry.id != id) > 0
    }

    /// Whether `listener` is currently a member.
    pub fn contains(&self, listener: &Listener<T>) -> bool {
        self.id_of(listener).is_some()
    }

    /// Whether `id` is currently a member.
    pub fn contains_id(&self, id: ListenerId) -> bool {
        // Ids are handed out increasing and removal keeps order
        self.entries
            .borrow()
            .binary_search_by_key(&id, |entry| entry.id)
            .is_ok()
    }

    /// Registration id of `listener`, if it is a member.
    pub fn id_of(&self, listener: &Listener<T>) -> Option<ListenerId> {
        let target = identity_of(listener);
        self.entries
            .borrow()
            .iter()
            .find(|entry| identity_of(&entry.listener) == target)
            .map(|entry| entry.id)
    }

    /// Number of listeners.
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Whether there are no listeners.
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Invoke every current listener with `value`, in registration order.
    ///
    /// Returns how many listeners were invoked. If a listener panics the
    /// panic propagates and the rest of the pass is skipped; the registry
    /// itself is left untouched.
    pub fn broadcast(&self, value: &T) -> usize {
        let snapshot: Vec<Entry<T>> = self.entries.borrow().clone();
        let mut delivered = 0;

        for entry in snapshot {
            if !self.contains_id(entry.id) {
                continue;
            }
            (entry.listener)(value);
            delivered += 1;
        }

        delivered
    }

    /// Filter-rebuild membership, returning how many entries were dropped.
    fn retain(&self, keep: impl Fn(&Entry<T>) -> bool) -> usize {
        let (kept, removed): (Vec<_>, Vec<_>) =
            self.entries.take().into_iter().partition(|entry| keep(entry));
        let count = removed.len();
        *self.entries.borrow_mut() = kept;
        // Removed listeners are dropped here, after the borrow is released
        drop(removed);
        count
    }
}

// =============================================================================
// TESTS
// =============================================================================
