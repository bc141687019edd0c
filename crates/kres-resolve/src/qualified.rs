//! Qualified name resolution for user types.
//!
//! `a.b.Outer<X>.Inner<Y>` is split into one part per segment, outermost
//! first. The first segment is looked up through the scope chain (a
//! classifier, else a top-level package); every later segment is a nested
//! classifier or subpackage of the previous one. Each segment keeps its own
//! type argument list, which the type resolver later matches against the
//! class chain of the result.

use crate::binding::BindingTrace;
use crate::scope::{ScopeArena, ScopeId};
use kres_common::diagnostics::diagnostic_codes;
use kres_common::{Atom, Diagnostic, NodeId};
use kres_syntax::NodeArena;
use kres_types::{DefId, DefKind, TypeDatabase};
use smallvec::SmallVec;
use tracing::trace;

/// One segment of a qualified user type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct QualifierPart {
    pub name: Atom,
    /// The segment's name reference, or the segment itself when the name is
    /// missing. Diagnostics about the segment are reported here.
    pub expression: NodeId,
    /// The `<...>` list node, if one was written.
    pub type_arguments: Option<NodeId>,
    pub projections: SmallVec<[NodeId; 2]>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeQualifierResolution {
    /// Outermost segment first.
    pub parts: SmallVec<[QualifierPart; 2]>,
    /// The classifier the whole name resolved to.
    pub classifier: Option<DefId>,
}

impl TypeQualifierResolution {
    /// Projections written on every segment, outermost segment first.
    pub fn all_projections(&self) -> SmallVec<[NodeId; 4]> {
        self.parts
            .iter()
            .flat_map(|part| part.projections.iter().copied())
            .collect()
    }
}

pub struct QualifiedNameResolver<'a> {
    db: &'a TypeDatabase,
    syntax: &'a NodeArena,
    scopes: &'a ScopeArena,
    trace: &'a BindingTrace,
}

impl<'a> QualifiedNameResolver<'a> {
    pub fn new(
        db: &'a TypeDatabase,
        syntax: &'a NodeArena,
        scopes: &'a ScopeArena,
        trace: &'a BindingTrace,
    ) -> Self {
        Self {
            db,
            syntax,
            scopes,
            trace,
        }
    }

    fn qualifier_parts(&self, user_type: NodeId) -> SmallVec<[QualifierPart; 2]> {
        self.syntax
            .user_type_segments(user_type)
            .into_iter()
            .map(|segment| {
                let data = self.syntax.get_user_type(segment);
                QualifierPart {
                    name: self.syntax.user_type_name(segment),
                    expression: data
                        .and_then(|d| d.reference_expression)
                        .unwrap_or(segment),
                    type_arguments: data.and_then(|d| d.type_arguments),
                    projections: self
                        .syntax
                        .user_type_arguments(segment)
                        .iter()
                        .copied()
                        .collect(),
                }
            })
            .collect()
    }

    /// Resolve `user_type` to a classifier. Every resolved segment records its
    /// target in the trace; the first segment that cannot be resolved is
    /// reported and ends the walk.
    pub fn resolve_for_type(&self, scope: ScopeId, user_type: NodeId) -> TypeQualifierResolution {
        let parts = self.qualifier_parts(user_type);
        let defs = self.db.defs();
        let mut current: Option<DefId> = None;

        for index in 0..parts.len() {
            let part = &parts[index];
            let found = match current {
                None if index == 0 => self
                    .scopes
                    .find_classifier(self.db, scope, part.name)
                    .or_else(|| self.scopes.find_package(self.db, part.name)),
                // Type parameters have no nested declarations.
                Some(container) if defs.kind(container) != Some(DefKind::TypeParameter) => {
                    defs.nested(container, part.name)
                }
                _ => None,
            };
            let Some(target) = found else {
                self.report_unresolved(part);
                return TypeQualifierResolution {
                    parts,
                    classifier: None,
                };
            };
            trace!(segment = index, target = target.0, "resolved qualifier segment");
            self.trace.record_reference_target(part.expression, target);
            current = Some(target);
        }

        let classifier = current.filter(|&def| defs.kind(def).is_some_and(DefKind::is_classifier));
        if classifier.is_none() {
            // A package is not a type.
            if let Some(last) = parts.last() {
                self.report_unresolved(last);
            }
        }
        TypeQualifierResolution { parts, classifier }
    }

    fn report_unresolved(&self, part: &QualifierPart) {
        let name = self.db.names().resolve(part.name);
        self.trace.report(Diagnostic::from_code(
            part.expression,
            diagnostic_codes::UNRESOLVED_REFERENCE,
            &[&*name],
        ));
    }
}
