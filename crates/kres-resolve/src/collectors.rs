//! Callable lookups by name.
//!
//! A [`CallableCollector`] answers "which callables named `n` are reachable
//! this way" for one family of callables: functions (including constructors)
//! or variables (including object values). Prioritization asks every
//! collector in a [`CallableCollectors`] set for every lookup step, so the
//! function group and the variable group of one step stay separate.

use crate::scope::{ScopeArena, ScopeKind, ScopeView};
use kres_common::Atom;
use kres_common::limits::MAX_SUPERTYPE_WALK;
use kres_types::{
    CallableId, CallableInfo, CallableKind, DefId, DefKind, LazyTypeResolver, TypeData, TypeDatabase,
    TypeId,
};
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Arc;

/// Conventions that never resolve against a dynamic receiver.
const AUGMENTED_ASSIGNMENT_NAMES: &[&str] = &[
    "plusAssign",
    "minusAssign",
    "timesAssign",
    "divAssign",
    "remAssign",
    "modAssign",
];

// =============================================================================
// LookupContext
// =============================================================================

/// Everything a lookup reads.
#[derive(Copy, Clone)]
pub struct LookupContext<'a> {
    pub db: &'a TypeDatabase,
    pub scopes: &'a ScopeArena,
    pub lazy: &'a dyn LazyTypeResolver,
}

impl<'a> LookupContext<'a> {
    pub fn new(db: &'a TypeDatabase, scopes: &'a ScopeArena, lazy: &'a dyn LazyTypeResolver) -> Self {
        Self { db, scopes, lazy }
    }

    fn info<R>(&self, id: CallableId, f: impl FnOnce(&CallableInfo) -> R) -> Option<R> {
        self.db.defs().with_callable(id, f)
    }

    fn is_extension(&self, id: CallableId) -> bool {
        self.info(id, CallableInfo::is_extension).unwrap_or(false)
    }

    /// Classifiers contributing members to a value of type `ty`: its own
    /// classifier, then supertypes breadth first, ending with `Any`. Type
    /// parameters contribute through their upper bounds.
    fn member_classifiers(&self, ty: TypeId) -> Vec<DefId> {
        let db = self.db;
        let defs = db.defs();
        let mut queue = VecDeque::from([ty]);
        let mut seen: FxHashSet<DefId> = FxHashSet::default();
        let mut order = Vec::new();
        let mut steps = 0u32;
        while let Some(current) = queue.pop_front() {
            steps += 1;
            if steps > MAX_SUPERTYPE_WALK {
                break;
            }
            let current = db.force(current, self.lazy);
            let Some(data) = db.types().lookup(current) else {
                continue;
            };
            match &*data {
                TypeData::Flexible { lower, .. } => queue.push_back(*lower),
                TypeData::Rigid(rigid) => {
                    let classifier = rigid.classifier;
                    if !seen.insert(classifier) {
                        continue;
                    }
                    if defs.kind(classifier) == Some(DefKind::TypeParameter) {
                        queue.extend(db.upper_bounds_or_default(classifier));
                    } else {
                        order.push(classifier);
                        queue.extend(defs.supertypes(classifier));
                    }
                }
                _ => {}
            }
        }
        let any = db.builtins().any;
        if !order.is_empty() && !order.contains(&any) {
            order.push(any);
        }
        order
    }

    /// Callables named `name` declared in the classifiers of `ty` and
    /// accepted by `keep`. Members overridden by one already found are
    /// skipped.
    fn declared_members(
        &self,
        ty: TypeId,
        name: Atom,
        keep: impl Fn(&CallableInfo) -> bool,
    ) -> Vec<CallableId> {
        let defs = self.db.defs();
        let mut found = Vec::new();
        let mut overridden: FxHashSet<CallableId> = FxHashSet::default();
        for classifier in self.member_classifiers(ty) {
            for id in defs.members_named(classifier, name) {
                let Some((accepted, overrides)) =
                    self.info(id, |info| (keep(info), info.overridden.clone()))
                else {
                    continue;
                };
                if !accepted || overridden.contains(&id) {
                    continue;
                }
                overridden.extend(overrides);
                found.push(id);
            }
        }
        found
    }

    /// Instance members of `ty`, plus constructors of inner classes and
    /// values of nested objects declared in its own classifier.
    pub fn members(&self, ty: TypeId, name: Atom) -> Vec<CallableId> {
        let mut found = self.declared_members(ty, name, |info| {
            !info.is_extension() && !info.is_static() && info.kind != CallableKind::Constructor
        });
        let forced = self.db.force(ty, self.lazy);
        let own = self.db.types().classifier_of(forced);
        if let Some(nested) = own.and_then(|class| self.db.defs().nested(class, name)) {
            if self.db.defs().is_inner(nested) {
                found.extend(self.constructors(nested));
            }
            found.extend(self.object_value(nested));
        }
        found
    }

    pub fn static_members(&self, ty: TypeId, name: Atom) -> Vec<CallableId> {
        self.declared_members(ty, name, CallableInfo::is_static)
    }

    /// Extensions declared as members of `ty`.
    pub fn member_extensions(&self, ty: TypeId, name: Atom) -> Vec<CallableId> {
        self.declared_members(ty, name, |info| info.is_extension() && !info.is_static())
    }

    /// Constructors of a class named `class`.
    fn constructors(&self, class: DefId) -> Vec<CallableId> {
        let defs = self.db.defs();
        if !defs.kind(class).is_some_and(DefKind::is_class_like) {
            return Vec::new();
        }
        defs.members_named(class, defs.name(class))
            .into_iter()
            .filter(|&id| self.info(id, |info| info.kind == CallableKind::Constructor) == Some(true))
            .collect()
    }

    /// The value an object or enum entry stands for when its name is used as
    /// an expression.
    fn object_value(&self, def: DefId) -> Option<CallableId> {
        let defs = self.db.defs();
        let value_type = match defs.kind(def)? {
            DefKind::EnumEntry => self.db.types().simple(defs.container(def)?),
            kind if kind.is_singleton() => self.db.types().simple(def),
            _ => return None,
        };
        defs.object_value(def, value_type)
    }

    /// What naming a classifier in call position can mean: calling one of
    /// its constructors, or using an object's value.
    fn classifier_callables(&self, classifier: DefId) -> Vec<CallableId> {
        let mut found = self.constructors(classifier);
        found.extend(self.object_value(classifier));
        found
    }

    fn package_members(&self, package: DefId, name: Atom, extensions: bool) -> Vec<CallableId> {
        let defs = self.db.defs();
        let mut found: Vec<CallableId> = defs
            .members_named(package, name)
            .into_iter()
            .filter(|&id| self.is_extension(id) == extensions)
            .collect();
        if !extensions {
            if let Some(classifier) = defs.nested(package, name) {
                found.extend(self.classifier_callables(classifier));
            }
        }
        found
    }

    /// Static members and nested classifiers reachable through a class name.
    fn class_statics(&self, class: DefId, name: Atom) -> Vec<CallableId> {
        let defs = self.db.defs();
        let mut found: Vec<CallableId> = defs
            .members_named(class, name)
            .into_iter()
            .filter(|&id| self.info(id, |info| info.is_static() && !info.is_extension()) == Some(true))
            .collect();
        if let Some(nested) = defs.nested(class, name) {
            found.extend(self.classifier_callables(nested));
        }
        found
    }

    /// Extensions visible without a qualifier.
    pub fn extensions(&self, view: ScopeView, name: Atom) -> Vec<CallableId> {
        let ScopeView::Lexical(scope) = view else {
            return Vec::new();
        };
        let mut found = Vec::new();
        for (_, s) in self.scopes.parents_with_self(scope) {
            if s.kind.is_local() {
                found.extend(s.locals_named(name).iter().copied().filter(|&id| self.is_extension(id)));
            } else if s.kind == ScopeKind::File {
                for &package in s.owner.iter().chain(s.star_imports()) {
                    found.extend(self.package_members(package, name, true));
                }
            }
        }
        dedup(found)
    }

    /// Non-extension callables declared in local scopes, innermost first.
    pub fn local_non_extensions(&self, view: ScopeView, name: Atom) -> Vec<CallableId> {
        let ScopeView::Lexical(scope) = view else {
            return Vec::new();
        };
        let found = self
            .scopes
            .parents_with_self(scope)
            .filter(|(_, s)| s.kind.is_local())
            .flat_map(|(_, s)| s.locals_named(name).iter().copied())
            .filter(|&id| !self.is_extension(id))
            .collect();
        dedup(found)
    }

    /// Every non-extension callable reachable by simple name from `view`.
    pub fn non_extensions(&self, view: ScopeView, name: Atom) -> Vec<CallableId> {
        let defs = self.db.defs();
        let mut found = Vec::new();
        match view {
            ScopeView::Lexical(scope) => {
                for (_, s) in self.scopes.parents_with_self(scope) {
                    match s.kind {
                        kind if kind.is_local() => found.extend(
                            s.locals_named(name).iter().copied().filter(|&id| !self.is_extension(id)),
                        ),
                        ScopeKind::Class => {
                            if let Some(class) = s.owner {
                                found.extend(self.class_statics(class, name));
                            }
                        }
                        ScopeKind::File => {
                            if let Some(imported) = s.imported(name) {
                                found.extend(self.classifier_callables(imported));
                            }
                            for &package in s.owner.iter().chain(s.star_imports()) {
                                found.extend(self.package_members(package, name, false));
                            }
                        }
                        _ => {}
                    }
                }
            }
            ScopeView::Qualified(def) => match defs.kind(def) {
                Some(DefKind::Package) => found.extend(self.package_members(def, name, false)),
                Some(kind) if kind.is_classifier() && kind != DefKind::TypeParameter => {
                    found.extend(self.class_statics(def, name));
                }
                _ => {}
            },
            ScopeView::Dynamic { properties } => {
                let text = self.db.names().resolve(name);
                if !AUGMENTED_ASSIGNMENT_NAMES.contains(&&*text) {
                    found.push(defs.dynamic_callable(name, CallableKind::Function));
                    if properties {
                        found.push(defs.dynamic_callable(name, CallableKind::Property));
                    }
                }
            }
        }
        dedup(found)
    }

    /// Static members inherited from supertypes of enclosing classes.
    pub fn static_inheritance(&self, view: ScopeView, name: Atom) -> Vec<CallableId> {
        let ScopeView::Lexical(scope) = view else {
            return Vec::new();
        };
        let defs = self.db.defs();
        let mut found = Vec::new();
        for (_, s) in self.scopes.parents_with_self(scope) {
            let (ScopeKind::Class, Some(class)) = (s.kind, s.owner) else {
                continue;
            };
            for supertype in self.member_classifiers(self.db.default_type(class)) {
                if supertype == class {
                    continue;
                }
                found.extend(
                    defs.members_named(supertype, name)
                        .into_iter()
                        .filter(|&id| self.info(id, CallableInfo::is_static) == Some(true)),
                );
            }
        }
        dedup(found)
    }
}

/// Drop repeated ids, keeping first occurrences in order.
fn dedup(ids: Vec<CallableId>) -> Vec<CallableId> {
    let mut seen: FxHashSet<CallableId> = FxHashSet::default();
    ids.into_iter().filter(|id| seen.insert(*id)).collect()
}

// =============================================================================
// Collectors
// =============================================================================

pub trait CallableCollector: Send + Sync {
    fn members_by_name(&self, cx: &LookupContext<'_>, receiver_type: TypeId, name: Atom) -> Vec<CallableId>;

    fn static_members_by_name(
        &self,
        cx: &LookupContext<'_>,
        receiver_type: TypeId,
        name: Atom,
    ) -> Vec<CallableId>;

    fn member_extensions_by_name(
        &self,
        cx: &LookupContext<'_>,
        dispatch_type: TypeId,
        name: Atom,
    ) -> Vec<CallableId>;

    fn extensions_by_name(&self, cx: &LookupContext<'_>, view: ScopeView, name: Atom) -> Vec<CallableId>;

    fn local_non_extensions_by_name(
        &self,
        cx: &LookupContext<'_>,
        view: ScopeView,
        name: Atom,
    ) -> Vec<CallableId>;

    fn non_extensions_by_name(&self, cx: &LookupContext<'_>, view: ScopeView, name: Atom) -> Vec<CallableId>;

    fn static_inheritance_by_name(
        &self,
        cx: &LookupContext<'_>,
        view: ScopeView,
        name: Atom,
    ) -> Vec<CallableId>;
}

/// Collects the callables of a fixed set of kinds.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct KindCollector {
    kinds: &'static [CallableKind],
}

impl KindCollector {
    /// Functions and constructors.
    pub const FUNCTIONS: Self = Self {
        kinds: &[CallableKind::Function, CallableKind::Constructor],
    };

    /// Properties and object values.
    pub const VARIABLES: Self = Self {
        kinds: &[CallableKind::Property, CallableKind::FakeObject],
    };

    pub const fn kinds(&self) -> &'static [CallableKind] {
        self.kinds
    }

    fn retain(&self, cx: &LookupContext<'_>, ids: Vec<CallableId>) -> Vec<CallableId> {
        ids.into_iter()
            .filter(|&id| cx.info(id, |info| self.kinds.contains(&info.kind)) == Some(true))
            .collect()
    }
}

impl CallableCollector for KindCollector {
    fn members_by_name(&self, cx: &LookupContext<'_>, receiver_type: TypeId, name: Atom) -> Vec<CallableId> {
        let forced = cx.db.force(receiver_type, cx.lazy);
        if cx.db.types().is_error(forced) {
            return vec![cx.db.defs().error_callable(name, self.kinds[0])];
        }
        self.retain(cx, cx.members(forced, name))
    }

    fn static_members_by_name(
        &self,
        cx: &LookupContext<'_>,
        receiver_type: TypeId,
        name: Atom,
    ) -> Vec<CallableId> {
        self.retain(cx, cx.static_members(receiver_type, name))
    }

    fn member_extensions_by_name(
        &self,
        cx: &LookupContext<'_>,
        dispatch_type: TypeId,
        name: Atom,
    ) -> Vec<CallableId> {
        self.retain(cx, cx.member_extensions(dispatch_type, name))
    }

    fn extensions_by_name(&self, cx: &LookupContext<'_>, view: ScopeView, name: Atom) -> Vec<CallableId> {
        self.retain(cx, cx.extensions(view, name))
    }

    fn local_non_extensions_by_name(
        &self,
        cx: &LookupContext<'_>,
        view: ScopeView,
        name: Atom,
    ) -> Vec<CallableId> {
        self.retain(cx, cx.local_non_extensions(view, name))
    }

    fn non_extensions_by_name(&self, cx: &LookupContext<'_>, view: ScopeView, name: Atom) -> Vec<CallableId> {
        self.retain(cx, cx.non_extensions(view, name))
    }

    fn static_inheritance_by_name(
        &self,
        cx: &LookupContext<'_>,
        view: ScopeView,
        name: Atom,
    ) -> Vec<CallableId> {
        self.retain(cx, cx.static_inheritance(view, name))
    }
}

pub type CallableFilter = Arc<dyn Fn(&CallableInfo) -> bool + Send + Sync>;

/// A collector whose every result must pass `filter`.
pub struct FilteredCollector {
    inner: Arc<dyn CallableCollector>,
    filter: CallableFilter,
}

impl FilteredCollector {
    pub fn new(inner: Arc<dyn CallableCollector>, filter: CallableFilter) -> Self {
        Self { inner, filter }
    }

    fn apply(&self, cx: &LookupContext<'_>, ids: Vec<CallableId>) -> Vec<CallableId> {
        ids.into_iter()
            .filter(|&id| cx.info(id, |info| (self.filter)(info)) == Some(true))
            .collect()
    }
}

impl CallableCollector for FilteredCollector {
    fn members_by_name(&self, cx: &LookupContext<'_>, receiver_type: TypeId, name: Atom) -> Vec<CallableId> {
        self.apply(cx, self.inner.members_by_name(cx, receiver_type, name))
    }

    fn static_members_by_name(
        &self,
        cx: &LookupContext<'_>,
        receiver_type: TypeId,
        name: Atom,
    ) -> Vec<CallableId> {
        self.apply(cx, self.inner.static_members_by_name(cx, receiver_type, name))
    }

    fn member_extensions_by_name(
        &self,
        cx: &LookupContext<'_>,
        dispatch_type: TypeId,
        name: Atom,
    ) -> Vec<CallableId> {
        self.apply(cx, self.inner.member_extensions_by_name(cx, dispatch_type, name))
    }

    fn extensions_by_name(&self, cx: &LookupContext<'_>, view: ScopeView, name: Atom) -> Vec<CallableId> {
        self.apply(cx, self.inner.extensions_by_name(cx, view, name))
    }

    fn local_non_extensions_by_name(
        &self,
        cx: &LookupContext<'_>,
        view: ScopeView,
        name: Atom,
    ) -> Vec<CallableId> {
        self.apply(cx, self.inner.local_non_extensions_by_name(cx, view, name))
    }

    fn non_extensions_by_name(&self, cx: &LookupContext<'_>, view: ScopeView, name: Atom) -> Vec<CallableId> {
        self.apply(cx, self.inner.non_extensions_by_name(cx, view, name))
    }

    fn static_inheritance_by_name(
        &self,
        cx: &LookupContext<'_>,
        view: ScopeView,
        name: Atom,
    ) -> Vec<CallableId> {
        self.apply(cx, self.inner.static_inheritance_by_name(cx, view, name))
    }
}

// =============================================================================
// CallableCollectors
// =============================================================================

/// An ordered set of collectors. Each lookup step yields one candidate group
/// per collector, in this order.
#[derive(Clone)]
pub struct CallableCollectors {
    collectors: Vec<Arc<dyn CallableCollector>>,
}

impl fmt::Debug for CallableCollectors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallableCollectors")
            .field("len", &self.collectors.len())
            .finish()
    }
}

impl Default for CallableCollectors {
    fn default() -> Self {
        Self::functions_and_variables()
    }
}

impl CallableCollectors {
    pub fn new(collectors: Vec<Arc<dyn CallableCollector>>) -> Self {
        Self { collectors }
    }

    /// Functions first, then variables.
    pub fn functions_and_variables() -> Self {
        Self::new(vec![
            Arc::new(KindCollector::FUNCTIONS),
            Arc::new(KindCollector::VARIABLES),
        ])
    }

    pub fn functions() -> Self {
        Self::new(vec![Arc::new(KindCollector::FUNCTIONS)])
    }

    pub fn variables() -> Self {
        Self::new(vec![Arc::new(KindCollector::VARIABLES)])
    }

    pub fn len(&self) -> usize {
        self.collectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collectors.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn CallableCollector> {
        self.collectors.iter().map(|c| &**c)
    }

    /// Every collector wrapped so its results must pass `filter`.
    pub fn filtered(&self, filter: CallableFilter) -> Self {
        Self::new(
            self.collectors
                .iter()
                .map(|inner| {
                    Arc::new(FilteredCollector::new(Arc::clone(inner), Arc::clone(&filter)))
                        as Arc<dyn CallableCollector>
                })
                .collect(),
        )
    }

    /// Only callables declared on a `dynamic` extension receiver.
    pub fn only_dynamic_receivers(&self) -> Self {
        self.filtered(Arc::new(|info: &CallableInfo| {
            info.extension_receiver == Some(TypeId::DYNAMIC)
        }))
    }
}
