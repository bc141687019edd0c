//! Candidate priority tiers.
//!
//! | condition                                              | tier        |
//! |--------------------------------------------------------|-------------|
//! | dynamic callable not reached through an explicit dispatch receiver | 0 |
//! | otherwise: visible and not low priority                | +2          |
//! | otherwise: not synthesized (and overrides nothing that is) | +1      |

use crate::candidates::ResolutionCandidate;
use crate::scope::ScopeId;
use crate::task_holder::PriorityProvider;
use crate::visibility::VisibilityChecker;
use kres_common::limits::PRIORITY_TIER_COUNT;
use kres_types::{CallableFlags, CallableInfo, TypeDatabase};

pub struct CandidatePriority<'a> {
    db: &'a TypeDatabase,
    visibility: VisibilityChecker<'a>,
    /// The calling scope; qualifier lookups still check visibility from here.
    scope: ScopeId,
    has_explicit_receiver: bool,
}

impl<'a> CandidatePriority<'a> {
    pub fn new(
        db: &'a TypeDatabase,
        visibility: VisibilityChecker<'a>,
        scope: ScopeId,
        has_explicit_receiver: bool,
    ) -> Self {
        Self {
            db,
            visibility,
            scope,
            has_explicit_receiver,
        }
    }

    fn has_implicit_dynamic_receiver(&self, candidate: &ResolutionCandidate, info: &CallableInfo) -> bool {
        (!candidate.explicit_receiver_kind.is_dispatch() || !self.has_explicit_receiver)
            && info.is_dynamic()
    }

    fn is_visible(&self, info: &CallableInfo) -> bool {
        info.flags.contains(CallableFlags::ERROR) || self.visibility.is_visible(self.scope, info)
    }
}

impl PriorityProvider for CandidatePriority<'_> {
    fn priority(&self, candidate: &ResolutionCandidate) -> u8 {
        let Some(info) = self.db.defs().callable(candidate.callable) else {
            return 0;
        };
        if self.has_implicit_dynamic_receiver(candidate, &info) {
            return 0;
        }
        let visibility = if self.is_visible(&info) && !info.flags.contains(CallableFlags::LOW_PRIORITY) {
            2
        } else {
            0
        };
        let synthesis = if self.db.defs().is_or_overrides_synthesized(candidate.callable) {
            0
        } else {
            1
        };
        visibility + synthesis
    }

    fn max_priority(&self) -> u8 {
        PRIORITY_TIER_COUNT - 1
    }
}
