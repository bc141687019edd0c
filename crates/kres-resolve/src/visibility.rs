//! Declaration visibility from a calling scope.

use crate::scope::{ScopeArena, ScopeId};
use kres_common::limits::MAX_SUPERTYPE_WALK;
use kres_types::{CallableInfo, DefId, LazyTypeResolver, TypeDatabase, Visibility};
use smallvec::SmallVec;

pub struct VisibilityChecker<'a> {
    db: &'a TypeDatabase,
    scopes: &'a ScopeArena,
    lazy: &'a dyn LazyTypeResolver,
}

impl<'a> VisibilityChecker<'a> {
    pub fn new(db: &'a TypeDatabase, scopes: &'a ScopeArena, lazy: &'a dyn LazyTypeResolver) -> Self {
        Self { db, scopes, lazy }
    }

    /// The declarations code in `scope` sits in: the innermost class, its
    /// enclosing classes, then the package.
    fn owner_chain(&self, scope: ScopeId) -> SmallVec<[DefId; 4]> {
        let mut chain = SmallVec::new();
        let mut current = self.scopes.owner_declaration(scope);
        while let Some(owner) = current {
            if chain.len() as u32 >= MAX_SUPERTYPE_WALK {
                break;
            }
            chain.push(owner);
            current = self.db.defs().container(owner);
        }
        chain
    }

    /// Whether `callable` may be referenced from code in `from`.
    ///
    /// Internal declarations are visible everywhere, since one analysis session
    /// covers a single module.
    pub fn is_visible(&self, from: ScopeId, callable: &CallableInfo) -> bool {
        let Some(container) = callable.container else {
            // Locals and synthesized descriptors.
            return true;
        };
        match callable.visibility {
            Visibility::Public | Visibility::Internal => true,
            Visibility::Private => self.owner_chain(from).contains(&container),
            Visibility::Protected => self
                .owner_chain(from)
                .iter()
                .any(|&owner| self.db.is_subclass(owner, container, self.lazy)),
        }
    }
}
