//! Lexical scopes.
//!
//! Scopes form a chain from the innermost block out to the file. Each scope
//! can declare classifiers (type parameters, local classes) and local
//! callables, and can contribute implicit receivers. Class scopes see the
//! class's nested classifiers; file scopes see the file's package, its
//! explicit imports and its star imports.
//!
//! Calls resolved against a qualifier (`Outer.foo()`) or a dynamic receiver
//! do not use a lexical scope at all; [`ScopeView`] covers those cases.

use crate::receivers::{ReceiverKind, ReceiverValue};
use kres_common::Atom;
use kres_types::{CallableId, DefId, DefKind, TypeDatabase};
use rustc_hash::FxHashMap;
use serde::Serialize;
use smallvec::SmallVec;

// =============================================================================
// Identifiers
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ScopeId(pub u32);

impl ScopeId {
    pub const NONE: ScopeId = ScopeId(u32::MAX);

    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ScopeKind {
    /// Top-level scope of a file; resolves through imports.
    File,
    Class,
    Function,
    Block,
    Lambda,
}

impl ScopeKind {
    /// Scopes whose declarations are local to a function body.
    pub const fn is_local(self) -> bool {
        matches!(self, ScopeKind::Function | ScopeKind::Block | ScopeKind::Lambda)
    }
}

/// The scope a lookup runs against.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ScopeView {
    Lexical(ScopeId),
    /// Members reachable through a package or classifier qualifier, with no
    /// enclosing scopes and no implicit receivers.
    Qualified(DefId),
    /// Synthesized members of a dynamic receiver. Properties are offered only
    /// when the call has no argument list.
    Dynamic { properties: bool },
}

// =============================================================================
// LexicalScope
// =============================================================================

#[derive(Clone, Debug)]
pub struct LexicalScope {
    pub parent: ScopeId,
    pub kind: ScopeKind,
    /// The class for class scopes, the package for file scopes.
    pub owner: Option<DefId>,
    /// Innermost first within this scope.
    pub implicit_receivers: SmallVec<[ReceiverValue; 1]>,
    classifiers: FxHashMap<Atom, DefId>,
    locals: FxHashMap<Atom, SmallVec<[CallableId; 1]>>,
    imports: FxHashMap<Atom, DefId>,
    star_imports: Vec<DefId>,
}

impl LexicalScope {
    fn new(parent: ScopeId, kind: ScopeKind, owner: Option<DefId>) -> Self {
        Self {
            parent,
            kind,
            owner,
            implicit_receivers: SmallVec::new(),
            classifiers: FxHashMap::default(),
            locals: FxHashMap::default(),
            imports: FxHashMap::default(),
            star_imports: Vec::new(),
        }
    }

    /// Local callables declared directly in this scope, in declaration order.
    pub fn locals_named(&self, name: Atom) -> &[CallableId] {
        self.locals.get(&name).map_or(&[], |l| l.as_slice())
    }

    pub fn declared_classifier(&self, name: Atom) -> Option<DefId> {
        self.classifiers.get(&name).copied()
    }

    pub fn imported(&self, name: Atom) -> Option<DefId> {
        self.imports.get(&name).copied()
    }

    pub fn star_imports(&self) -> &[DefId] {
        &self.star_imports
    }
}

// =============================================================================
// ScopeArena
// =============================================================================

/// Storage for the scope chains of one analysis session.
#[derive(Clone, Debug, Default)]
pub struct ScopeArena {
    scopes: Vec<LexicalScope>,
}

impl ScopeArena {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, scope: LexicalScope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    #[inline]
    pub fn get(&self, id: ScopeId) -> Option<&LexicalScope> {
        self.scopes.get(id.0 as usize)
    }

    fn get_mut(&mut self, id: ScopeId) -> Option<&mut LexicalScope> {
        self.scopes.get_mut(id.0 as usize)
    }

    // -------------------------------------------------------------------------
    // Building
    // -------------------------------------------------------------------------

    /// Top-level scope of a file in `package`.
    pub fn file_scope(&mut self, package: DefId) -> ScopeId {
        self.push(LexicalScope::new(ScopeId::NONE, ScopeKind::File, Some(package)))
    }

    /// Scope of a class or object body: its type parameters are visible and
    /// `this` (then the companion object, if any) is an implicit receiver.
    pub fn class_scope(&mut self, parent: ScopeId, class: DefId, db: &TypeDatabase) -> ScopeId {
        let mut scope = LexicalScope::new(parent, ScopeKind::Class, Some(class));
        for param in db.defs().type_params(class) {
            scope.classifiers.insert(db.defs().name(param), param);
        }
        scope
            .implicit_receivers
            .push(ReceiverValue::implicit_class(db, class));
        if let Some(companion) = db.defs().companion(class) {
            scope.implicit_receivers.push(ReceiverValue::new(
                ReceiverKind::ImplicitClass(companion),
                db.types().simple(companion),
            ));
        }
        self.push(scope)
    }

    /// Function body; an extension function passes its receiver.
    pub fn function_scope(&mut self, parent: ScopeId, receiver: Option<ReceiverValue>) -> ScopeId {
        let mut scope = LexicalScope::new(parent, ScopeKind::Function, None);
        scope.implicit_receivers.extend(receiver);
        self.push(scope)
    }

    pub fn block_scope(&mut self, parent: ScopeId) -> ScopeId {
        self.push(LexicalScope::new(parent, ScopeKind::Block, None))
    }

    pub fn lambda_scope(&mut self, parent: ScopeId, receiver: Option<ReceiverValue>) -> ScopeId {
        let mut scope = LexicalScope::new(parent, ScopeKind::Lambda, None);
        scope.implicit_receivers.extend(receiver);
        self.push(scope)
    }

    /// Declare a type parameter or local classifier.
    pub fn declare_classifier(&mut self, scope: ScopeId, name: Atom, classifier: DefId) {
        if let Some(s) = self.get_mut(scope) {
            s.classifiers.entry(name).or_insert(classifier);
        }
    }

    /// Declare a local function or variable.
    pub fn declare_local(&mut self, scope: ScopeId, name: Atom, callable: CallableId) {
        if let Some(s) = self.get_mut(scope) {
            s.locals.entry(name).or_default().push(callable);
        }
    }

    /// `import a.b.Name` of a classifier.
    pub fn add_import(&mut self, scope: ScopeId, name: Atom, classifier: DefId) {
        if let Some(s) = self.get_mut(scope) {
            s.imports.entry(name).or_insert(classifier);
        }
    }

    /// `import a.b.*`
    pub fn add_star_import(&mut self, scope: ScopeId, package: DefId) {
        if let Some(s) = self.get_mut(scope) {
            if !s.star_imports.contains(&package) {
                s.star_imports.push(package);
            }
        }
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    /// `scope` and its parents, innermost first.
    pub fn parents_with_self(&self, scope: ScopeId) -> impl Iterator<Item = (ScopeId, &LexicalScope)> {
        let mut current = scope;
        let mut remaining = self.scopes.len();
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            remaining -= 1;
            let id = current;
            let s = self.get(id)?;
            current = s.parent;
            Some((id, s))
        })
    }

    /// Implicit receivers visible from `view`, innermost first.
    pub fn implicit_receivers(&self, view: ScopeView) -> Vec<ReceiverValue> {
        match view {
            ScopeView::Lexical(scope) => self
                .parents_with_self(scope)
                .flat_map(|(_, s)| s.implicit_receivers.iter().copied())
                .collect(),
            ScopeView::Qualified(_) | ScopeView::Dynamic { .. } => Vec::new(),
        }
    }

    /// The declaration code in `scope` belongs to: the innermost class, or
    /// the file's package.
    pub fn owner_declaration(&self, scope: ScopeId) -> Option<DefId> {
        self.parents_with_self(scope)
            .find(|(_, s)| matches!(s.kind, ScopeKind::Class | ScopeKind::File))
            .and_then(|(_, s)| s.owner)
    }

    /// Find a classifier by simple name.
    ///
    /// Lexical declarations shadow nested classifiers of enclosing classes,
    /// which shadow file-level names: explicit imports, then the file's own
    /// package, then star imports.
    pub fn find_classifier(&self, db: &TypeDatabase, scope: ScopeId, name: Atom) -> Option<DefId> {
        let defs = db.defs();
        for (_, s) in self.parents_with_self(scope) {
            if let Some(found) = s.declared_classifier(name) {
                return Some(found);
            }
            match s.kind {
                ScopeKind::Class => {
                    let Some(class) = s.owner else { continue };
                    let nested = defs
                        .nested(class, name)
                        .or_else(|| defs.companion(class).and_then(|c| defs.nested(c, name)));
                    if nested.is_some() {
                        return nested;
                    }
                }
                ScopeKind::File => {
                    let found = s
                        .imported(name)
                        .or_else(|| s.owner.and_then(|pkg| classifier_in(db, pkg, name)))
                        .or_else(|| {
                            s.star_imports
                                .iter()
                                .find_map(|&pkg| classifier_in(db, pkg, name))
                        });
                    if found.is_some() {
                        return found;
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Find a top-level package by simple name, for the first segment of a
    /// qualified name.
    pub fn find_package(&self, db: &TypeDatabase, name: Atom) -> Option<DefId> {
        let defs = db.defs();
        defs.nested(defs.root_package(), name)
            .filter(|&p| defs.kind(p) == Some(DefKind::Package))
    }
}

/// Classifier (not subpackage) named `name` directly in `container`.
fn classifier_in(db: &TypeDatabase, container: DefId, name: Atom) -> Option<DefId> {
    let defs = db.defs();
    defs.nested(container, name)
        .filter(|&d| defs.kind(d).is_some_and(DefKind::is_classifier))
}
