//! Type database: the shared tables one analysis session resolves against.

use crate::builtins::BuiltIns;
use crate::def::{DefId, DefinitionStore};
use crate::format::TypeFormatter;
use crate::intern::TypeInterner;
use crate::subtype::SubtypeChecker;
use crate::types::{LazyTypeId, TypeArgument, TypeArguments, TypeData, TypeId};
use kres_common::Interner;
use kres_common::limits::MAX_SUPERTYPE_WALK;
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;

/// Computes the contents of lazy types.
///
/// The type model only knows that a lazy type exists; whoever allocated it
/// knows how to compute it.
pub trait LazyTypeResolver: Send + Sync {
    fn resolve_lazy(&self, id: LazyTypeId, db: &TypeDatabase) -> TypeId;
}

/// For contexts in which no lazy types are allocated.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoLazyTypes;

impl LazyTypeResolver for NoLazyTypes {
    fn resolve_lazy(&self, _id: LazyTypeId, _db: &TypeDatabase) -> TypeId {
        TypeId::ERROR
    }
}

/// Maximum chain of lazy types resolving to lazy types.
const MAX_LAZY_CHAIN: u32 = 64;

pub struct TypeDatabase {
    names: Arc<Interner>,
    types: TypeInterner,
    defs: DefinitionStore,
    builtins: BuiltIns,
}

impl TypeDatabase {
    pub fn new(names: Arc<Interner>) -> Self {
        let types = TypeInterner::new();
        let defs = DefinitionStore::new();
        let builtins = BuiltIns::register(&names, &defs, &types);
        Self {
            names,
            types,
            defs,
            builtins,
        }
    }

    #[inline]
    pub fn names(&self) -> &Interner {
        &self.names
    }

    pub fn names_arc(&self) -> Arc<Interner> {
        self.names.clone()
    }

    #[inline]
    pub fn types(&self) -> &TypeInterner {
        &self.types
    }

    #[inline]
    pub fn defs(&self) -> &DefinitionStore {
        &self.defs
    }

    #[inline]
    pub fn builtins(&self) -> &BuiltIns {
        &self.builtins
    }

    // =========================================================================
    // Derived types
    // =========================================================================

    /// The type of a classifier used with its own parameters as arguments,
    /// e.g. `List<T>` inside `List`. For a type parameter, its own type.
    pub fn default_type(&self, classifier: DefId) -> TypeId {
        let arguments: TypeArguments = self
            .defs
            .constructor_parameters(classifier)
            .into_iter()
            .map(|param| TypeArgument::invariant(self.types.simple(param.declaration())))
            .collect();
        self.types.rigid(classifier, arguments, false)
    }

    pub fn any_type(&self) -> TypeId {
        self.types.simple(self.builtins.any)
    }

    pub fn nullable_any_type(&self) -> TypeId {
        self.types.with_nullability(self.any_type(), true)
    }

    pub fn unit_type(&self) -> TypeId {
        self.types.simple(self.builtins.unit)
    }

    /// Declared bounds of a type parameter, or the nullable top type.
    pub fn upper_bounds_or_default(&self, type_param: DefId) -> Vec<TypeId> {
        let bounds = self.defs.upper_bounds(type_param);
        if bounds.is_empty() {
            vec![self.nullable_any_type()]
        } else {
            bounds
        }
    }

    /// Type a star projection stands for at this parameter.
    pub fn star_upper_bound(&self, type_param: DefId) -> TypeId {
        self.defs
            .upper_bounds(type_param)
            .first()
            .copied()
            .unwrap_or_else(|| self.nullable_any_type())
    }

    pub fn function_class(&self, arity: usize) -> DefId {
        self.builtins
            .function_class(arity, &self.names, &self.defs, &self.types)
    }

    /// `R.(P...) -> T` as `FunctionN<R, P..., T>`, annotated as an extension
    /// function type when there is a receiver.
    pub fn function_type(
        &self,
        receiver: Option<TypeId>,
        parameters: &[TypeId],
        return_type: TypeId,
        annotations: &[DefId],
    ) -> TypeId {
        let arity = parameters.len() + usize::from(receiver.is_some());
        let class = self.function_class(arity);
        let arguments: TypeArguments = receiver
            .into_iter()
            .chain(parameters.iter().copied())
            .chain(std::iter::once(return_type))
            .map(TypeArgument::invariant)
            .collect();
        let mut all_annotations: SmallVec<[DefId; 1]> = annotations.iter().copied().collect();
        if receiver.is_some() && !all_annotations.contains(&self.builtins.extension_function_type) {
            all_annotations.push(self.builtins.extension_function_type);
        }
        let ty = self.types.rigid(class, arguments, false);
        self.types.with_annotations(ty, &all_annotations)
    }

    // =========================================================================
    // Lazy types and relations
    // =========================================================================

    /// Resolve lazy wrappers until a non-lazy type is reached.
    pub fn force(&self, ty: TypeId, lazy: &dyn LazyTypeResolver) -> TypeId {
        let mut current = ty;
        for _ in 0..MAX_LAZY_CHAIN {
            match self.types.lookup(current).as_deref() {
                Some(TypeData::Lazy(id)) => current = lazy.resolve_lazy(*id, self),
                _ => return current,
            }
        }
        TypeId::ERROR
    }

    pub fn is_subtype(&self, sub: TypeId, sup: TypeId, lazy: &dyn LazyTypeResolver) -> bool {
        SubtypeChecker::new(self, lazy).is_subtype(sub, sup)
    }

    /// Whether `sub` is `sup` or inherits from it, ignoring type arguments.
    pub fn is_subclass(&self, sub: DefId, sup: DefId, lazy: &dyn LazyTypeResolver) -> bool {
        let mut queue = VecDeque::from([sub]);
        let mut visited = FxHashSet::default();
        while let Some(current) = queue.pop_front() {
            if current == sup {
                return true;
            }
            if visited.len() as u32 >= MAX_SUPERTYPE_WALK || !visited.insert(current) {
                continue;
            }
            for supertype in self.defs.supertypes(current) {
                let supertype = self.force(supertype, lazy);
                if let Some(classifier) = self.types.classifier_of(supertype) {
                    queue.push_back(classifier);
                }
            }
        }
        false
    }

    pub fn format(&self, ty: TypeId) -> String {
        TypeFormatter::new(self).format(ty)
    }
}
