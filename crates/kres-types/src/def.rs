//! Declaration identifiers and storage.
//!
//! The declaration table holds everything the resolution core reads but never
//! writes: packages, classifiers (classes, interfaces, objects, enum entries,
//! annotation classes, type parameters) and callables. It is populated by the
//! embedding front end before resolution starts. The only writes made during
//! resolution are get-or-create entries for synthesized descriptors (dynamic
//! callables, function classes), which are idempotent.

use crate::types::{TypeId, Variance};
use bitflags::bitflags;
use dashmap::DashMap;
use kres_common::Atom;
use kres_common::limits::MAX_SUPERTYPE_WALK;
use serde::Serialize;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::trace;

// =============================================================================
// DefId
// =============================================================================

/// Identifier of a package or classifier declaration.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DefId(pub u32);

impl DefId {
    /// Sentinel value for invalid `DefId`.
    pub const INVALID: Self = Self(0);

    /// First valid `DefId`.
    pub const FIRST_VALID: u32 = 1;

    pub const fn is_valid(self) -> bool {
        self.0 >= Self::FIRST_VALID
    }
}

// =============================================================================
// DefKind
// =============================================================================

/// Kind of declaration.
///
/// | Kind | Classifier | Has instances | Example |
/// |------|------------|---------------|---------|
/// | Package | no | no | `package a.b` |
/// | Class | yes | yes | `class List<T>` |
/// | Interface | yes | yes | `interface Comparable<T>` |
/// | Object | yes | single | `object Registry`, companion objects |
/// | EnumClass | yes | entries | `enum class Color` |
/// | EnumEntry | yes | single | `RED` in `Color` |
/// | AnnotationClass | yes | no | `annotation class Ann` |
/// | TypeParameter | yes | no | `T` in `class List<T>` |
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum DefKind {
    Package,
    Class,
    Interface,
    Object,
    EnumClass,
    EnumEntry,
    AnnotationClass,
    TypeParameter,
}

impl DefKind {
    /// Can anchor a type.
    pub const fn is_classifier(self) -> bool {
        !matches!(self, DefKind::Package)
    }

    /// Class, interface, object or enum: has a type constructor with its own
    /// parameters and participates in the nesting chain.
    pub const fn is_class_like(self) -> bool {
        !matches!(self, DefKind::Package | DefKind::TypeParameter)
    }

    /// Has exactly one instance that can be used as a value.
    pub const fn is_singleton(self) -> bool {
        matches!(self, DefKind::Object | DefKind::EnumEntry)
    }
}

/// Declaration that introduced a type parameter.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeParameterOwner {
    Classifier(DefId),
    Callable(CallableId),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeParameterData {
    pub variance: Variance,
    /// Declared bounds; empty means the nullable top type.
    pub upper_bounds: Vec<TypeId>,
    /// Position among the owner's declared parameters.
    pub index: u32,
    pub owner: TypeParameterOwner,
}

// =============================================================================
// DefinitionInfo
// =============================================================================

/// Complete information about a package or classifier.
#[derive(Clone, Debug, Serialize)]
pub struct DefinitionInfo {
    pub kind: DefKind,
    pub name: Atom,
    /// Enclosing package or classifier. `None` only for the root package.
    pub container: Option<DefId>,
    /// Captures an instance of the enclosing class (and its type parameters).
    pub is_inner: bool,
    /// Declared type parameters, in order.
    pub type_params: Vec<DefId>,
    /// Supertypes; may be lazy types while the declaration is being resolved.
    pub supertypes: Vec<TypeId>,
    pub companion: Option<DefId>,
    /// For platform classes: name of the built-in classifier to use instead.
    pub platform_builtin: Option<Atom>,
    pub type_parameter: Option<TypeParameterData>,
}

impl DefinitionInfo {
    fn with_kind(kind: DefKind, name: Atom, container: Option<DefId>) -> Self {
        Self {
            kind,
            name,
            container,
            is_inner: false,
            type_params: Vec::new(),
            supertypes: Vec::new(),
            companion: None,
            platform_builtin: None,
            type_parameter: None,
        }
    }

    pub fn package(name: Atom, parent: DefId) -> Self {
        Self::with_kind(DefKind::Package, name, Some(parent))
    }

    pub fn class(name: Atom, container: DefId) -> Self {
        Self::with_kind(DefKind::Class, name, Some(container))
    }

    pub fn interface(name: Atom, container: DefId) -> Self {
        Self::with_kind(DefKind::Interface, name, Some(container))
    }

    pub fn object(name: Atom, container: DefId) -> Self {
        Self::with_kind(DefKind::Object, name, Some(container))
    }

    pub fn enum_class(name: Atom, container: DefId) -> Self {
        Self::with_kind(DefKind::EnumClass, name, Some(container))
    }

    pub fn enum_entry(name: Atom, enum_class: DefId) -> Self {
        Self::with_kind(DefKind::EnumEntry, name, Some(enum_class))
    }

    pub fn annotation_class(name: Atom, container: DefId) -> Self {
        Self::with_kind(DefKind::AnnotationClass, name, Some(container))
    }

    pub fn type_parameter(name: Atom, variance: Variance, index: u32, owner: TypeParameterOwner) -> Self {
        let container = match owner {
            TypeParameterOwner::Classifier(def) => Some(def),
            TypeParameterOwner::Callable(_) => None,
        };
        Self {
            type_parameter: Some(TypeParameterData {
                variance,
                upper_bounds: Vec::new(),
                index,
                owner,
            }),
            ..Self::with_kind(DefKind::TypeParameter, name, container)
        }
    }

    pub const fn with_inner(mut self) -> Self {
        self.is_inner = true;
        self
    }

    pub const fn with_platform_builtin(mut self, builtin: Atom) -> Self {
        self.platform_builtin = Some(builtin);
        self
    }

    pub fn with_supertypes(mut self, supertypes: Vec<TypeId>) -> Self {
        self.supertypes = supertypes;
        self
    }
}

// =============================================================================
// Type constructor parameters
// =============================================================================

/// A parameter of a classifier's type constructor.
///
/// An inner class's type constructor has its own declared parameters followed
/// by the parameters of each enclosing class it captures. Those captured
/// parameters are not new declarations: they refer back to the outer class's
/// parameter and sit at a shifted index.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeParamRef {
    Declared(DefId),
    Captured {
        original: DefId,
        owner: DefId,
        index_offset: u32,
    },
}

impl TypeParamRef {
    /// The type parameter declaration this refers to.
    pub const fn declaration(self) -> DefId {
        match self {
            TypeParamRef::Declared(def) | TypeParamRef::Captured { original: def, .. } => def,
        }
    }

    pub const fn is_captured(self) -> bool {
        matches!(self, TypeParamRef::Captured { .. })
    }

    /// Position in the owner's type constructor.
    pub fn index(self, store: &DefinitionStore) -> u32 {
        let own = store.type_parameter_data(self.declaration()).map_or(0, |d| d.index);
        match self {
            TypeParamRef::Declared(_) => own,
            TypeParamRef::Captured { index_offset, .. } => own + index_offset,
        }
    }
}

// =============================================================================
// Callables
// =============================================================================

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CallableId(pub u32);

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum CallableKind {
    Function,
    Property,
    Constructor,
    /// An object or enum entry used as a value (`Registry()` via `invoke`,
    /// `Color.RED.foo`).
    FakeObject,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Visibility {
    #[default]
    Public,
    Internal,
    Protected,
    Private,
}

bitflags! {
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
    pub struct CallableFlags: u16 {
        const OPERATOR = 1 << 0;
        const INFIX = 1 << 1;
        /// Generated by the compiler rather than written by the user.
        const SYNTHESIZED = 1 << 2;
        /// Inherited member re-exposed on a subclass without a body.
        const FAKE_OVERRIDE = 1 << 3;
        /// Deprioritized by overload resolution.
        const LOW_PRIORITY = 1 << 4;
        /// Resolved against a dynamic receiver.
        const DYNAMIC = 1 << 5;
        /// Accessible through the class name without an instance.
        const STATIC = 1 << 6;
        /// Declared inside a function body or block.
        const LOCAL = 1 << 7;
        /// Placeholder for an unresolved callable.
        const ERROR = 1 << 8;
    }
}

impl Serialize for CallableFlags {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u16(self.bits())
    }
}

#[derive(Clone, Debug, Serialize)]
pub struct CallableInfo {
    pub kind: CallableKind,
    pub name: Atom,
    /// Declaring package or classifier. `None` for local declarations.
    pub container: Option<DefId>,
    /// Required type of the owner instance, for members.
    pub dispatch_receiver: Option<TypeId>,
    pub extension_receiver: Option<TypeId>,
    pub visibility: Visibility,
    pub flags: CallableFlags,
    pub overridden: SmallVec<[CallableId; 1]>,
    /// Declared type of the value (property) or result (function).
    pub return_type: Option<TypeId>,
}

impl CallableInfo {
    pub fn new(kind: CallableKind, name: Atom) -> Self {
        Self {
            kind,
            name,
            container: None,
            dispatch_receiver: None,
            extension_receiver: None,
            visibility: Visibility::Public,
            flags: CallableFlags::empty(),
            overridden: SmallVec::new(),
            return_type: None,
        }
    }

    pub fn function(name: Atom) -> Self {
        Self::new(CallableKind::Function, name)
    }

    pub fn property(name: Atom) -> Self {
        Self::new(CallableKind::Property, name)
    }

    pub const fn in_container(mut self, container: DefId) -> Self {
        self.container = Some(container);
        self
    }

    pub const fn with_dispatch_receiver(mut self, ty: TypeId) -> Self {
        self.dispatch_receiver = Some(ty);
        self
    }

    pub const fn with_extension_receiver(mut self, ty: TypeId) -> Self {
        self.extension_receiver = Some(ty);
        self
    }

    pub const fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn with_flags(mut self, flags: CallableFlags) -> Self {
        self.flags |= flags;
        self
    }

    pub const fn with_return_type(mut self, ty: TypeId) -> Self {
        self.return_type = Some(ty);
        self
    }

    pub fn overriding(mut self, overridden: CallableId) -> Self {
        self.overridden.push(overridden);
        self
    }

    #[inline]
    pub fn is_extension(&self) -> bool {
        self.extension_receiver.is_some()
    }

    #[inline]
    pub fn is_local(&self) -> bool {
        self.flags.contains(CallableFlags::LOCAL)
    }

    /// Dispatched through a dynamic receiver.
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        self.flags.contains(CallableFlags::DYNAMIC) || self.dispatch_receiver == Some(TypeId::DYNAMIC)
    }

    #[inline]
    pub fn is_static(&self) -> bool {
        self.flags.contains(CallableFlags::STATIC)
    }
}

// =============================================================================
// DefinitionStore
// =============================================================================

/// Thread-safe storage for declarations.
///
/// Uses `DashMap` for concurrent access from multiple analysis threads.
pub struct DefinitionStore {
    definitions: DashMap<DefId, DefinitionInfo>,
    /// `(container, name) -> nested classifier or subpackage`
    nested: DashMap<(DefId, Atom), DefId>,
    callables: DashMap<CallableId, CallableInfo>,
    /// `(container, name) -> callables declared directly in the container`
    members: DashMap<(DefId, Atom), SmallVec<[CallableId; 2]>>,
    dynamic_callables: DashMap<(Atom, CallableKind), CallableId>,
    error_callables: DashMap<(Atom, CallableKind), CallableId>,
    /// Object or enum entry -> its value descriptor.
    object_values: DashMap<DefId, CallableId>,
    next_id: AtomicU32,
    next_callable_id: AtomicU32,
    root_package: DefId,
}

impl Default for DefinitionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DefinitionStore {
    pub fn new() -> Self {
        let root_package = DefId(DefId::FIRST_VALID);
        let definitions = DashMap::new();
        definitions.insert(
            root_package,
            DefinitionInfo::with_kind(DefKind::Package, Atom::NONE, None),
        );
        Self {
            definitions,
            nested: DashMap::new(),
            callables: DashMap::new(),
            members: DashMap::new(),
            dynamic_callables: DashMap::new(),
            error_callables: DashMap::new(),
            object_values: DashMap::new(),
            next_id: AtomicU32::new(DefId::FIRST_VALID + 1),
            next_callable_id: AtomicU32::new(0),
            root_package,
        }
    }

    pub const fn root_package(&self) -> DefId {
        self.root_package
    }

    fn allocate(&self) -> DefId {
        DefId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Register a declaration and index it under its container.
    ///
    /// Type parameters are not indexed; they are found through scopes. When
    /// two declarations share a name in one container, the first one wins.
    pub fn register(&self, info: DefinitionInfo) -> DefId {
        let id = self.allocate();
        trace!(def_id = id.0, kind = ?info.kind, "DefinitionStore::register");
        if info.kind != DefKind::TypeParameter {
            if let Some(container) = info.container {
                self.nested.entry((container, info.name)).or_insert(id);
            }
        }
        self.definitions.insert(id, info);
        id
    }

    pub fn get(&self, id: DefId) -> Option<DefinitionInfo> {
        self.definitions.get(&id).map(|r| r.clone())
    }

    /// Read a declaration without cloning it.
    pub fn with_def<R>(&self, id: DefId, f: impl FnOnce(&DefinitionInfo) -> R) -> Option<R> {
        self.definitions.get(&id).map(|r| f(&r))
    }

    pub fn contains(&self, id: DefId) -> bool {
        self.definitions.contains_key(&id)
    }

    pub fn kind(&self, id: DefId) -> Option<DefKind> {
        self.with_def(id, |d| d.kind)
    }

    pub fn name(&self, id: DefId) -> Atom {
        self.with_def(id, |d| d.name).unwrap_or(Atom::NONE)
    }

    pub fn container(&self, id: DefId) -> Option<DefId> {
        self.with_def(id, |d| d.container).flatten()
    }

    pub fn is_inner(&self, id: DefId) -> bool {
        self.with_def(id, |d| d.is_inner).unwrap_or(false)
    }

    pub fn type_params(&self, id: DefId) -> Vec<DefId> {
        self.with_def(id, |d| d.type_params.clone()).unwrap_or_default()
    }

    pub fn declared_type_param_count(&self, id: DefId) -> usize {
        self.with_def(id, |d| d.type_params.len()).unwrap_or(0)
    }

    pub fn supertypes(&self, id: DefId) -> Vec<TypeId> {
        self.with_def(id, |d| d.supertypes.clone()).unwrap_or_default()
    }

    pub fn companion(&self, id: DefId) -> Option<DefId> {
        self.with_def(id, |d| d.companion).flatten()
    }

    pub fn platform_builtin(&self, id: DefId) -> Option<Atom> {
        self.with_def(id, |d| d.platform_builtin).flatten()
    }

    pub fn type_parameter_data(&self, id: DefId) -> Option<TypeParameterData> {
        self.with_def(id, |d| d.type_parameter.clone()).flatten()
    }

    pub fn variance(&self, type_param: DefId) -> Variance {
        self.with_def(type_param, |d| d.type_parameter.as_ref().map(|p| p.variance))
            .flatten()
            .unwrap_or_default()
    }

    pub fn upper_bounds(&self, type_param: DefId) -> Vec<TypeId> {
        self.with_def(type_param, |d| {
            d.type_parameter
                .as_ref()
                .map(|p| p.upper_bounds.clone())
                .unwrap_or_default()
        })
        .unwrap_or_default()
    }

    /// Nested classifier or subpackage of `container` named `name`.
    pub fn nested(&self, container: DefId, name: Atom) -> Option<DefId> {
        self.nested.get(&(container, name)).map(|r| *r)
    }

    /// The class-like declaration directly enclosing `id`, if any.
    pub fn containing_class(&self, id: DefId) -> Option<DefId> {
        let container = self.container(id)?;
        self.kind(container)
            .filter(|k| k.is_class_like())
            .map(|_| container)
    }

    /// Package at `path` below the root, created on demand.
    pub fn package(&self, path: &[Atom]) -> DefId {
        let mut current = self.root_package;
        for &segment in path {
            current = match self.nested(current, segment) {
                Some(existing) => existing,
                None => self.register(DefinitionInfo::package(segment, current)),
            };
        }
        current
    }

    // -------------------------------------------------------------------------
    // Late initialization
    // -------------------------------------------------------------------------
    // Declarations can mention each other (a class's supertypes may name its
    // own nested classes), so some fields are filled after registration.

    pub fn set_type_params(&self, id: DefId, type_params: Vec<DefId>) {
        if let Some(mut def) = self.definitions.get_mut(&id) {
            def.type_params = type_params;
        }
    }

    pub fn set_supertypes(&self, id: DefId, supertypes: Vec<TypeId>) {
        if let Some(mut def) = self.definitions.get_mut(&id) {
            def.supertypes = supertypes;
        }
    }

    pub fn set_upper_bounds(&self, type_param: DefId, bounds: Vec<TypeId>) {
        if let Some(mut def) = self.definitions.get_mut(&type_param) {
            if let Some(data) = def.type_parameter.as_mut() {
                data.upper_bounds = bounds;
            }
        }
    }

    pub fn set_companion(&self, id: DefId, companion: DefId) {
        if let Some(mut def) = self.definitions.get_mut(&id) {
            def.companion = Some(companion);
        }
    }

    // -------------------------------------------------------------------------
    // Type constructor parameters
    // -------------------------------------------------------------------------

    /// Parameters of the type constructor of `classifier`: its declared
    /// parameters followed, for inner classes, by the captured parameters of
    /// every enclosing class up to the first non-inner one.
    pub fn constructor_parameters(&self, classifier: DefId) -> Vec<TypeParamRef> {
        let mut result: Vec<TypeParamRef> = self
            .type_params(classifier)
            .into_iter()
            .map(TypeParamRef::Declared)
            .collect();

        let mut current = classifier;
        let mut offset = 0u32;
        let mut steps = 0u32;
        while self.is_inner(current) && steps < MAX_SUPERTYPE_WALK {
            let Some(outer) = self.containing_class(current) else {
                break;
            };
            offset += self.declared_type_param_count(current) as u32;
            result.extend(
                self.type_params(outer)
                    .into_iter()
                    .map(|original| TypeParamRef::Captured {
                        original,
                        owner: classifier,
                        index_offset: offset,
                    }),
            );
            current = outer;
            steps += 1;
        }
        result
    }

    // -------------------------------------------------------------------------
    // Callables
    // -------------------------------------------------------------------------

    pub fn register_callable(&self, info: CallableInfo) -> CallableId {
        let id = CallableId(self.next_callable_id.fetch_add(1, Ordering::SeqCst));
        trace!(callable_id = id.0, kind = ?info.kind, "DefinitionStore::register_callable");
        if let Some(container) = info.container {
            if !info.is_local() {
                self.members
                    .entry((container, info.name))
                    .or_default()
                    .push(id);
            }
        }
        self.callables.insert(id, info);
        id
    }

    pub fn callable(&self, id: CallableId) -> Option<CallableInfo> {
        self.callables.get(&id).map(|r| r.clone())
    }

    pub fn with_callable<R>(&self, id: CallableId, f: impl FnOnce(&CallableInfo) -> R) -> Option<R> {
        self.callables.get(&id).map(|r| f(&r))
    }

    pub fn callable_name(&self, id: CallableId) -> Atom {
        self.with_callable(id, |c| c.name).unwrap_or(Atom::NONE)
    }

    /// Callables declared directly in `container` under `name`, in
    /// registration order.
    pub fn members_named(&self, container: DefId, name: Atom) -> SmallVec<[CallableId; 2]> {
        self.members
            .get(&(container, name))
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Whether the callable is compiler-generated or overrides something that is.
    pub fn is_or_overrides_synthesized(&self, id: CallableId) -> bool {
        let mut stack: SmallVec<[CallableId; 4]> = SmallVec::new();
        stack.push(id);
        let mut visited = 0u32;
        while let Some(current) = stack.pop() {
            visited += 1;
            if visited > MAX_SUPERTYPE_WALK {
                return false;
            }
            let Some((flags, overridden)) =
                self.with_callable(current, |c| (c.flags, c.overridden.clone()))
            else {
                continue;
            };
            if flags.contains(CallableFlags::SYNTHESIZED) {
                return true;
            }
            if flags.contains(CallableFlags::FAKE_OVERRIDE) {
                stack.extend(overridden);
            }
        }
        false
    }

    /// Store a descriptor that is not indexed under any container.
    fn insert_unindexed(&self, info: CallableInfo) -> CallableId {
        let id = CallableId(self.next_callable_id.fetch_add(1, Ordering::SeqCst));
        self.callables.insert(id, info);
        id
    }

    /// Synthesized callable for member access on a dynamic receiver. One
    /// descriptor per name and kind, created on first request.
    pub fn dynamic_callable(&self, name: Atom, kind: CallableKind) -> CallableId {
        if let Some(existing) = self.dynamic_callables.get(&(name, kind)) {
            return *existing;
        }
        *self
            .dynamic_callables
            .entry((name, kind))
            .or_insert_with(|| {
                self.insert_unindexed(CallableInfo {
                    dispatch_receiver: Some(TypeId::DYNAMIC),
                    return_type: Some(TypeId::DYNAMIC),
                    ..CallableInfo::new(kind, name).with_flags(CallableFlags::DYNAMIC)
                })
            })
    }

    /// Placeholder returned by member lookups on an erroneous receiver type,
    /// so that the call still has something to bind to.
    pub fn error_callable(&self, name: Atom, kind: CallableKind) -> CallableId {
        if let Some(existing) = self.error_callables.get(&(name, kind)) {
            return *existing;
        }
        *self.error_callables.entry((name, kind)).or_insert_with(|| {
            self.insert_unindexed(CallableInfo {
                dispatch_receiver: Some(TypeId::ERROR),
                return_type: Some(TypeId::ERROR),
                ..CallableInfo::new(kind, name).with_flags(CallableFlags::ERROR)
            })
        })
    }

    /// The descriptor that stands for an object or enum entry used as a
    /// value. `None` for any other declaration.
    pub fn object_value(&self, def: DefId, value_type: TypeId) -> Option<CallableId> {
        let (kind, name, container) = self.with_def(def, |d| (d.kind, d.name, d.container))?;
        if !kind.is_singleton() {
            return None;
        }
        if let Some(existing) = self.object_values.get(&def) {
            return Some(*existing);
        }
        Some(*self.object_values.entry(def).or_insert_with(|| {
            let mut info =
                CallableInfo::new(CallableKind::FakeObject, name).with_return_type(value_type);
            info.container = container;
            self.insert_unindexed(info)
        }))
    }
}
