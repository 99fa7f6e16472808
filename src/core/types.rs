// ============================================================================
// spark-propagate - Type Definitions
// Listener handles and identifiers shared across the scope engine
// ============================================================================

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

// =============================================================================
// LISTENER
// =============================================================================
//
// A listener is an opaque callable taking a reference to the propagated value.
// The registry never looks inside it; the only thing it cares about is
// identity, which is the address of the Rc allocation. Two clones of the same
// Listener<T> are the same listener. Two separately boxed closures are not,
// even if their code is identical.
// =============================================================================

/// A registered callback awaiting broadcast values.
pub type Listener<T> = Rc<dyn Fn(&T)>;

/// Wrap a closure into a shareable [`Listener`].
///
/// Keep a clone of the result around if you want to unsubscribe by identity.
///
/// # Example
///
/// ```
/// use spark_propagate::{listener, same_listener};
///
/// let a = listener(|v: &i32| println!("{v}"));
/// let b = a.clone();
/// let c = listener(|v: &i32| println!("{v}"));
///
/// assert!(same_listener(&a, &b));
/// assert!(!same_listener(&a, &c));
/// ```
pub fn listener<T, F>(f: F) -> Listener<T>
where
    F: Fn(&T) + 'static,
{
    Rc::new(f)
}

/// Whether two listener handles point at the same registration identity.
///
/// Compares the data address only; vtable pointers for the same closure type
/// are not guaranteed to be unique.
pub fn same_listener<T>(a: &Listener<T>, b: &Listener<T>) -> bool {
    identity_of(a) == identity_of(b)
}

pub(crate) fn identity_of<T>(listener: &Listener<T>) -> *const () {
    Rc::as_ptr(listener) as *const ()
}

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Registration handle for one listener within one registry.
///
/// Ids are never reused within a registry, so a stale id can't remove a
/// listener registered later.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub(crate) u64);

impl ListenerId {
    /// Raw numeric value, mainly for logging.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// Unique identifier of a [`PropagationScope`](crate::PropagationScope).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(u64);

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

impl ScopeId {
    pub(crate) fn next() -> Self {
        Self(NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw numeric value, mainly for logging.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "scope#{}", self.0)
    }
}

// =============================================================================
// DELIVERY
// =============================================================================

/// Outcome of a single broadcast call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// The value was handed to this many listeners.
    Delivered(usize),

    /// The scope was computing and the render-phase guard dropped the value.
    Suppressed,
}

impl Delivery {
    /// Number of listeners that received the value.
    pub fn count(self) -> usize {
        match self {
            Delivery::Delivered(n) => n,
            Delivery::Suppressed => 0,
        }
    }

    /// Whether the render-phase guard dropped the broadcast.
    pub fn is_suppressed(self) -> bool {
        matches!(self, Delivery::Suppressed)
    }
}

// =============================================================================
// TESTS
// =============================================================================
