//! Lazy type cells.
//!
//! A lazy type is allocated with a recipe (whatever the owner needs to
//! compute it later) and is computed the first time something forces it.
//! Each cell moves through three states:
//!
//! ```text
//! NotStarted --force--> InProgress --done--> Done(TypeId)
//! ```
//!
//! Forcing a cell that the *same* thread is already forcing is a cycle: the
//! computation of the cell needs its own result. That is reported as
//! [`ForceOutcome::Cycle`] and the caller degrades to an error type. Two
//! different threads may force one cell concurrently; both compute, the first
//! stored result wins and the other is discarded.

use crate::types::{LazyTypeId, TypeId};
use smallvec::SmallVec;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::thread::{self, ThreadId};
use tracing::{debug, trace};

/// Observable state of a lazy cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum LazyCellState {
    NotStarted,
    InProgress,
    Done(TypeId),
}

/// Result of forcing a lazy cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ForceOutcome {
    /// This call computed and stored the value.
    Computed(TypeId),
    /// The value was already available, or a racing thread stored first.
    Cached(TypeId),
    /// The current thread is already forcing this cell.
    Cycle,
    /// No such cell.
    Missing,
}

impl ForceOutcome {
    /// The forced type; cycles and missing cells degrade to the error type.
    pub fn type_or_error(self) -> TypeId {
        match self {
            ForceOutcome::Computed(ty) | ForceOutcome::Cached(ty) => ty,
            ForceOutcome::Cycle | ForceOutcome::Missing => TypeId::ERROR,
        }
    }
}

enum CellState {
    NotStarted,
    InProgress { forcing: SmallVec<[ThreadId; 1]> },
    Done(TypeId),
}

struct LazyCell<R> {
    recipe: R,
    state: Mutex<CellState>,
}

/// Removes the current thread from an in-progress cell if the computation
/// unwinds, so a later force on this thread is not mistaken for a cycle.
struct ForcingGuard<'a> {
    state: &'a Mutex<CellState>,
    thread: ThreadId,
    armed: bool,
}

impl Drop for ForcingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let CellState::InProgress { forcing } = &mut *state {
            forcing.retain(|t| *t != self.thread);
            if forcing.is_empty() {
                *state = CellState::NotStarted;
            }
        }
    }
}

/// Append-only table of lazy cells.
pub struct LazyTypeTable<R> {
    cells: RwLock<Vec<Arc<LazyCell<R>>>>,
}

impl<R> Default for LazyTypeTable<R> {
    fn default() -> Self {
        Self {
            cells: RwLock::new(Vec::new()),
        }
    }
}

impl<R: Clone> LazyTypeTable<R> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a new cell that will be computed from `recipe`.
    pub fn allocate(&self, recipe: R) -> LazyTypeId {
        let mut cells = self.cells.write().unwrap_or_else(PoisonError::into_inner);
        let id = LazyTypeId(cells.len() as u32);
        cells.push(Arc::new(LazyCell {
            recipe,
            state: Mutex::new(CellState::NotStarted),
        }));
        trace!(lazy_id = id.0, "LazyTypeTable::allocate");
        id
    }

    fn cell(&self, id: LazyTypeId) -> Option<Arc<LazyCell<R>>> {
        self.cells
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.0 as usize)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.cells.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn recipe(&self, id: LazyTypeId) -> Option<R> {
        self.cell(id).map(|cell| cell.recipe.clone())
    }

    pub fn state(&self, id: LazyTypeId) -> Option<LazyCellState> {
        let cell = self.cell(id)?;
        let state = cell.state.lock().unwrap_or_else(PoisonError::into_inner);
        Some(match &*state {
            CellState::NotStarted => LazyCellState::NotStarted,
            CellState::InProgress { .. } => LazyCellState::InProgress,
            CellState::Done(ty) => LazyCellState::Done(*ty),
        })
    }

    /// Compute the cell's value once. `compute` runs without any lock held,
    /// so it may force other cells, or this one (which reports a cycle).
    pub fn force(&self, id: LazyTypeId, compute: impl FnOnce(&R) -> TypeId) -> ForceOutcome {
        let Some(cell) = self.cell(id) else {
            return ForceOutcome::Missing;
        };
        let me = thread::current().id();
        {
            let mut state = cell.state.lock().unwrap_or_else(PoisonError::into_inner);
            match &mut *state {
                CellState::Done(ty) => return ForceOutcome::Cached(*ty),
                CellState::InProgress { forcing } if forcing.contains(&me) => {
                    debug!(lazy_id = id.0, "lazy type re-entered on the same thread");
                    return ForceOutcome::Cycle;
                }
                CellState::InProgress { forcing } => forcing.push(me),
                CellState::NotStarted => {
                    *state = CellState::InProgress {
                        forcing: SmallVec::from_elem(me, 1),
                    };
                }
            }
        }

        let mut guard = ForcingGuard {
            state: &cell.state,
            thread: me,
            armed: true,
        };
        let computed = compute(&cell.recipe);
        guard.armed = false;

        let mut state = cell.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            CellState::Done(first) => {
                trace!(lazy_id = id.0, "lazy type raced; keeping first result");
                ForceOutcome::Cached(*first)
            }
            _ => {
                *state = CellState::Done(computed);
                ForceOutcome::Computed(computed)
            }
        }
    }
}
