// ============================================================================
// spark-propagate - Render Phase
// Idle/Computing state machine behind the render-phase guard
// ============================================================================
//
// Each scope carries one phase cell. The rendering collaborator moves it:
//
//   Idle --(compute start / propagator acquired)--> Computing
//   Computing --(commit)--> Idle
//
// While Computing, a broadcast is dropped with a warning unless the scope
// was configured with allow_propagate_during_render. The flag is per scope,
// never global, so independent scopes never see each other's phase.
// ============================================================================

use std::cell::Cell;
use std::fmt;

use crate::primitives::scope::PropagationScope;

// =============================================================================
// PHASE
// =============================================================================

/// Where a scope is in its render cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderPhase {
    /// Side effects are safe; broadcasts are delivered.
    #[default]
    Idle,

    /// A compute/render pass is reading; broadcasts are guarded.
    Computing,
}

impl RenderPhase {
    /// Whether this is [`RenderPhase::Computing`].
    pub fn is_computing(self) -> bool {
        matches!(self, RenderPhase::Computing)
    }
}

// =============================================================================
// PHASE CELL
// =============================================================================

/// Single-writer phase flag owned by one scope.
///
/// `commits` counts render commits. A compute pass only restores its saved
/// phase if no commit happened while it was alive.
#[derive(Debug, Default)]
pub(crate) struct PhaseCell {
    phase: Cell<RenderPhase>,
    commits: Cell<u64>,
}

impl PhaseCell {
    pub(crate) fn get(&self) -> RenderPhase {
        self.phase.get()
    }

    /// Set the phase, returning the previous one
    pub(crate) fn replace(&self, phase: RenderPhase) -> RenderPhase {
        self.phase.replace(phase)
    }

    /// Computing -> Idle at commit.
    pub(crate) fn commit(&self) {
        self.commits.set(self.commits.get().wrapping_add(1));
        self.phase.set(RenderPhase::Idle);
    }

    pub(crate) fn generation(&self) -> u64 {
        self.commits.get()
    }
}

// =============================================================================
// COMPUTE PASS
// =============================================================================

/// RAII marker for one compute/render pass over a scope.
///
/// Created by [`PropagationScope::begin_compute`]. The scope is `Computing`
/// while the pass is alive. Committing (or dropping, including during a
/// panic) restores the phase that was active before the pass began, so
/// nested passes unwind correctly. If the renderer called
/// [`PropagationScope::on_commit`] while the pass was alive, that commit
/// wins and the scope stays `Idle`.
///
/// # Example
///
/// ```
/// use spark_propagate::{Delivery, PropagationScope, RenderPhase};
/// use std::cell::Cell;
/// use std::rc::Rc;
///
/// let scope = PropagationScope::new();
/// let hits = Rc::new(Cell::new(0));
/// let hits_clone = hits.clone();
/// let _sub = scope.subscribe(move |_: &i32| hits_clone.set(hits_clone.get() + 1));
///
/// let pass = scope.begin_compute();
/// assert_eq!(scope.phase(), RenderPhase::Computing);
/// assert_eq!(pass.propagator().propagate(1), Delivery::Suppressed);
/// pass.commit();
///
/// assert_eq!(scope.broadcast(2), Delivery::Delivered(1));
/// assert_eq!(hits.get(), 1);
/// ```
#[must_use = "dropping a ComputePass commits it immediately"]
pub struct ComputePass<T: 'static> {
    scope: PropagationScope<T>,
    previous: RenderPhase,
    generation: u64,
}

impl<T: 'static> ComputePass<T> {
    pub(crate) fn begin(scope: &PropagationScope<T>) -> Self {
        let cell = scope.phase_cell();
        let previous = cell.replace(RenderPhase::Computing);
        Self {
            scope: scope.clone(),
            previous,
            generation: cell.generation(),
        }
    }

    /// Scope this pass is computing.
    pub fn scope(&self) -> &PropagationScope<T> {
        &self.scope
    }

    /// Broadcast handle for code running in this pass.
    pub fn propagator(&self) -> crate::primitives::scope::Propagator<T> {
        self.scope.propagator()
    }

    /// End the pass. Equivalent to dropping it.
    pub fn commit(self) {}
}

impl<T: 'static> Drop for ComputePass<T> {
    fn drop(&mut self) {
        let cell = self.scope.phase_cell();
        if cell.generation() == self.generation {
            cell.replace(self.previous);
        }
    }
}

impl<T: 'static> fmt::Debug for ComputePass<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComputePass")
            .field("scope", &self.scope.id())
            .field("previous", &self.previous)
            .field("generation", &self.generation)
            .finish()
    }
}

// =============================================================================
// TESTS
// =============================================================================
