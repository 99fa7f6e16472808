// ============================================================================
// spark-propagate - Ergonomic Macros
// ============================================================================

/// Helper macro to clone variables into a move closure.
///
/// This reduces the boilerplate of manually cloning `Rc` handles before
/// moving them into a listener.
///
/// # Usage
///
/// ```rust
/// use spark_propagate::{cloned, PropagationScope};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scope = PropagationScope::new();
/// let total = Rc::new(Cell::new(0));
///
/// let _sub = scope.subscribe(cloned!(total => move |v: &i32| total.set(total.get() + v)));
/// scope.broadcast(3);
/// assert_eq!(total.get(), 3);
/// ```
#[macro_export]
macro_rules! cloned {
    ($($n:ident),+ => $e:expr) => {
        {
            $( let $n = $n.clone(); )+
            $e
        }
    };
}

/// Subscribe a listener body with automatic variable capturing.
///
/// Wraps `scope.subscribe(cloned!(... => move |value| ...))`.
///
/// # Usage
///
/// ```rust
/// use spark_propagate::{subscribe, PropagationScope};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scope = PropagationScope::new();
/// let last = Rc::new(Cell::new(0));
///
/// let _sub = subscribe!(scope, last => |v: &i32| last.set(*v));
/// scope.broadcast(7);
/// assert_eq!(last.get(), 7);
/// ```
#[macro_export]
macro_rules! subscribe {
    // Case 1: With captures
    ($scope:expr, $($deps:ident),+ => |$v:ident $(: $t:ty)?| $body:expr) => {
        $scope.subscribe($crate::cloned!($($deps),+ => move |$v $(: $t)?| $body))
    };
    // Case 2: No captures
    ($scope:expr, |$v:ident $(: $t:ty)?| $body:expr) => {
        $scope.subscribe(move |$v $(: $t)?| $body)
    };
}
