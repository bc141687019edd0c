//! Recursion guards for walks over type structure.
//!
//! Subtype checks, substitution and content forcing all recurse through
//! arguments, bounds and supertypes, and declarations are allowed to refer to
//! each other. `RecursionGuard` combines cycle detection (a visiting set),
//! depth limiting and iteration bounding; `DepthCounter` only limits depth.
//!
//! # Profiles
//!
//! [`RecursionProfile`] names the limit pair used at each call site:
//!
//! ```ignore
//! let mut guard = RecursionGuard::with_profile(RecursionProfile::SubtypeCheck);
//! ```
//!
//! In debug builds, dropping a guard with active entries panics, which
//! catches a forgotten `leave()`.

use kres_common::limits;
use rustc_hash::FxHashSet;
use std::hash::Hash;

// ---------------------------------------------------------------------------
// RecursionProfile
// ---------------------------------------------------------------------------

/// Named recursion limit presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionProfile {
    /// Nominal subtype checks through supertypes, arguments and bounds.
    ///
    /// depth = 100, iterations = 100,000
    SubtypeCheck,

    /// Nested type references resolved on one thread.
    ///
    /// depth = 500
    TypeReference,

    /// Forcing the contents of a resolved type.
    ///
    /// depth = 200, iterations = 100,000
    ForceContents,

    /// Substituting arguments into bounds and supertypes.
    ///
    /// depth = 100, iterations = 100,000
    Substitution,

    /// Custom limits for one-off or test scenarios.
    Custom { max_depth: u32, max_iterations: u32 },
}

impl RecursionProfile {
    pub const fn max_depth(self) -> u32 {
        match self {
            Self::SubtypeCheck => limits::MAX_SUBTYPE_DEPTH,
            Self::TypeReference => limits::MAX_TYPE_REFERENCE_DEPTH,
            Self::ForceContents => limits::MAX_FORCE_CONTENTS_DEPTH,
            Self::Substitution => limits::MAX_SUBTYPE_DEPTH,
            Self::Custom { max_depth, .. } => max_depth,
        }
    }

    pub const fn max_iterations(self) -> u32 {
        match self {
            Self::SubtypeCheck | Self::ForceContents | Self::Substitution => 100_000,
            Self::TypeReference => u32::MAX,
            Self::Custom { max_iterations, .. } => max_iterations,
        }
    }
}

// ---------------------------------------------------------------------------
// RecursionResult
// ---------------------------------------------------------------------------

/// Result of attempting to enter a recursive computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionResult {
    Entered,
    /// This key is already being visited.
    Cycle,
    DepthExceeded,
    IterationExceeded,
}

impl RecursionResult {
    #[inline]
    pub fn is_entered(self) -> bool {
        matches!(self, Self::Entered)
    }

    #[inline]
    pub fn is_cycle(self) -> bool {
        matches!(self, Self::Cycle)
    }

    #[inline]
    pub fn is_exceeded(self) -> bool {
        matches!(self, Self::DepthExceeded | Self::IterationExceeded)
    }
}

// ---------------------------------------------------------------------------
// RecursionGuard
// ---------------------------------------------------------------------------

/// Tracks recursion state for cycle detection, depth limiting,
/// and iteration bounding.
///
/// ```ignore
/// match guard.enter(key) {
///     RecursionResult::Entered => {
///         let result = do_work();
///         guard.leave(key);
///         result
///     }
///     RecursionResult::Cycle => assume_related(),
///     _ => give_up(),
/// }
/// ```
pub struct RecursionGuard<K: Hash + Eq + Copy> {
    visiting: FxHashSet<K>,
    depth: u32,
    iterations: u32,
    max_depth: u32,
    max_iterations: u32,
    exceeded: bool,
}

impl<K: Hash + Eq + Copy> RecursionGuard<K> {
    pub fn new(max_depth: u32, max_iterations: u32) -> Self {
        Self {
            visiting: FxHashSet::default(),
            depth: 0,
            iterations: 0,
            max_depth,
            max_iterations,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth(), profile.max_iterations())
    }

    /// Try to enter a recursive computation for `key`. On
    /// [`RecursionResult::Entered`] the caller must call [`leave`](Self::leave).
    pub fn enter(&mut self, key: K) -> RecursionResult {
        self.iterations = self.iterations.saturating_add(1);

        if self.iterations > self.max_iterations {
            self.exceeded = true;
            return RecursionResult::IterationExceeded;
        }
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return RecursionResult::DepthExceeded;
        }
        if !self.visiting.insert(key) {
            return RecursionResult::Cycle;
        }
        self.depth += 1;
        RecursionResult::Entered
    }

    pub fn leave(&mut self, key: K) {
        let was_present = self.visiting.remove(&key);
        debug_assert!(
            was_present,
            "RecursionGuard::leave() called with a key that is not being visited"
        );
        self.depth = self.depth.saturating_sub(1);
    }

    /// Run `f` between `enter(key)` and `leave(key)`, or report why entry
    /// was denied.
    pub fn scope<T>(&mut self, key: K, f: impl FnOnce() -> T) -> Result<T, RecursionResult> {
        match self.enter(key) {
            RecursionResult::Entered => {
                let result = f();
                self.leave(key);
                Ok(result)
            }
            denied => Err(denied),
        }
    }

    #[inline]
    pub fn is_visiting(&self, key: &K) -> bool {
        self.visiting.contains(key)
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Sticky: stays set once any limit was hit.
    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(debug_assertions)]
impl<K: Hash + Eq + Copy> Drop for RecursionGuard<K> {
    fn drop(&mut self) {
        if !std::thread::panicking() && !self.visiting.is_empty() {
            panic!(
                "RecursionGuard dropped with {} active entries still in the visiting set",
                self.visiting.len(),
            );
        }
    }
}

// ---------------------------------------------------------------------------
// DepthCounter
// ---------------------------------------------------------------------------

/// Depth-only guard, for walks that may legitimately revisit a key.
pub struct DepthCounter {
    depth: u32,
    max_depth: u32,
    exceeded: bool,
}

impl DepthCounter {
    pub fn new(max_depth: u32) -> Self {
        Self {
            depth: 0,
            max_depth,
            exceeded: false,
        }
    }

    pub fn with_profile(profile: RecursionProfile) -> Self {
        Self::new(profile.max_depth())
    }

    /// Returns `false` when the limit is reached; do not call `leave()` then.
    #[inline]
    pub fn enter(&mut self) -> bool {
        if self.depth >= self.max_depth {
            self.exceeded = true;
            return false;
        }
        self.depth += 1;
        true
    }

    #[inline]
    pub fn leave(&mut self) {
        debug_assert!(self.depth > 0, "DepthCounter::leave() called at depth 0");
        self.depth = self.depth.saturating_sub(1);
    }

    #[inline]
    pub fn depth(&self) -> u32 {
        self.depth
    }

    #[inline]
    pub fn is_exceeded(&self) -> bool {
        self.exceeded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_detected_on_reentry() {
        let mut guard = RecursionGuard::<u32>::new(10, 100);
        assert_eq!(guard.enter(1), RecursionResult::Entered);
        assert_eq!(guard.enter(1), RecursionResult::Cycle);
        assert!(guard.is_visiting(&1));
        guard.leave(1);
        assert_eq!(guard.depth(), 0);
        assert!(!guard.is_exceeded());
    }

    #[test]
    fn test_depth_limit_is_sticky() {
        let mut guard = RecursionGuard::<u32>::new(2, 100);
        assert!(guard.enter(1).is_entered());
        assert!(guard.enter(2).is_entered());
        assert_eq!(guard.enter(3), RecursionResult::DepthExceeded);
        guard.leave(2);
        guard.leave(1);
        assert!(guard.is_exceeded());
    }

    #[test]
    fn test_scope_leaves_on_success() {
        let mut guard = RecursionGuard::<u32>::with_profile(RecursionProfile::SubtypeCheck);
        let value = guard.scope(5, || 42);
        assert_eq!(value, Ok(42));
        assert!(!guard.is_visiting(&5));
    }

    #[test]
    fn test_depth_counter_limit() {
        let mut counter = DepthCounter::new(1);
        assert!(counter.enter());
        assert!(!counter.enter());
        counter.leave();
        assert!(counter.is_exceeded());
        assert_eq!(counter.depth(), 0);
    }
}
