//! Binding trace: the append-only record of what resolution found.
//!
//! Keyed by syntax node: the resolved type of each type reference, the
//! declaration each name segment refers to, the scope each type reference was
//! resolved in, and every diagnostic reported. Writes are idempotent: the
//! first value recorded for a key is kept and identical diagnostics are
//! stored once. The trace also owns the lazy type cells created while
//! resolving, since their recipes point back into the syntax it describes.

use crate::scope::ScopeId;
use crate::type_resolver::TypeResolutionContext;
use dashmap::DashMap;
use kres_common::{Diagnostic, NodeId};
use kres_types::{DefId, LazyTypeTable, TypeId};
use rustc_hash::FxHashSet;
use std::sync::{Mutex, PoisonError};
use tracing::trace;

/// What a lazy type cell needs to compute its contents.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct LazyTypeRecipe {
    pub type_reference: NodeId,
    pub context: TypeResolutionContext,
}

#[derive(Default)]
struct DiagnosticLog {
    ordered: Vec<Diagnostic>,
    seen: FxHashSet<Diagnostic>,
}

#[derive(Default)]
pub struct BindingTrace {
    types: DashMap<NodeId, TypeId>,
    reference_targets: DashMap<NodeId, DefId>,
    scopes: DashMap<NodeId, ScopeId>,
    diagnostics: Mutex<DiagnosticLog>,
    lazy_types: LazyTypeTable<LazyTypeRecipe>,
}

impl BindingTrace {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Types
    // =========================================================================

    /// Record the type of a type reference. Returns the type that is stored
    /// afterwards, which is an earlier writer's if there was one.
    pub fn record_type(&self, node: NodeId, ty: TypeId) -> TypeId {
        *self.types.entry(node).or_insert(ty)
    }

    pub fn get_type(&self, node: NodeId) -> Option<TypeId> {
        self.types.get(&node).map(|r| *r)
    }

    pub fn recorded_type_count(&self) -> usize {
        self.types.len()
    }

    // =========================================================================
    // References and scopes
    // =========================================================================

    pub fn record_reference_target(&self, name_node: NodeId, target: DefId) {
        self.reference_targets.entry(name_node).or_insert(target);
    }

    pub fn reference_target(&self, name_node: NodeId) -> Option<DefId> {
        self.reference_targets.get(&name_node).map(|r| *r)
    }

    pub fn record_scope(&self, node: NodeId, scope: ScopeId) {
        self.scopes.entry(node).or_insert(scope);
    }

    pub fn scope_of(&self, node: NodeId) -> Option<ScopeId> {
        self.scopes.get(&node).map(|r| *r)
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Report a diagnostic. Returns `false` if an identical one was already
    /// reported.
    pub fn report(&self, diagnostic: Diagnostic) -> bool {
        let mut log = self
            .diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if log.seen.contains(&diagnostic) {
            return false;
        }
        trace!(
            code = diagnostic.code,
            node = diagnostic.node.0,
            "BindingTrace::report"
        );
        log.seen.insert(diagnostic.clone());
        log.ordered.push(diagnostic);
        true
    }

    /// All diagnostics in report order.
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered
            .clone()
    }

    pub fn diagnostics_with_code(&self, code: u32) -> Vec<Diagnostic> {
        self.diagnostics()
            .into_iter()
            .filter(|d| d.code == code)
            .collect()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .ordered
            .iter()
            .filter(|d| d.is_error())
            .count()
    }

    // =========================================================================
    // Lazy types
    // =========================================================================

    pub fn lazy_types(&self) -> &LazyTypeTable<LazyTypeRecipe> {
        &self.lazy_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kres_common::diagnostics::diagnostic_codes;

    #[test]
    fn first_recorded_type_wins() {
        let trace = BindingTrace::new();
        assert_eq!(trace.record_type(NodeId(1), TypeId(7)), TypeId(7));
        assert_eq!(trace.record_type(NodeId(1), TypeId(9)), TypeId(7));
        assert_eq!(trace.get_type(NodeId(1)), Some(TypeId(7)));
    }

    #[test]
    fn identical_diagnostics_are_stored_once() {
        let trace = BindingTrace::new();
        let diag = Diagnostic::from_code(NodeId(2), diagnostic_codes::REDUNDANT_NULLABLE, &[]);
        assert!(trace.report(diag.clone()));
        assert!(!trace.report(diag));
        assert!(trace.report(Diagnostic::from_code(
            NodeId(3),
            diagnostic_codes::REDUNDANT_NULLABLE,
            &[]
        )));
        assert_eq!(trace.diagnostics().len(), 2);
        assert_eq!(trace.error_count(), 0);
    }
}
