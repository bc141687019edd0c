//! Type interning for structural deduplication.
//!
//! Converts `TypeData` structures into `TypeId` handles. Equal structures
//! share an id, so type equality is an integer comparison and resolved types
//! can be cached per syntax node as plain `u32`s.
//!
//! Storage is split into shards selected by hash so that threads resolving
//! different files rarely contend on the same lock.

use crate::def::DefId;
use crate::types::*;
use kres_common::Atom;
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};
use std::sync::{Arc, PoisonError, RwLock};

const SHARD_BITS: u32 = 4;
const SHARD_COUNT: usize = 1 << SHARD_BITS;
const SHARD_MASK: u32 = (SHARD_COUNT as u32) - 1;

struct TypeShard {
    key_to_index: RwLock<FxHashMap<Arc<TypeData>, u32>>,
    index_to_key: RwLock<Vec<Arc<TypeData>>>,
}

impl TypeShard {
    fn new() -> Self {
        TypeShard {
            key_to_index: RwLock::new(FxHashMap::default()),
            index_to_key: RwLock::new(Vec::new()),
        }
    }
}

/// Thread-safe type interner.
pub struct TypeInterner {
    shards: Vec<TypeShard>,
    error: Arc<TypeData>,
    dynamic: Arc<TypeData>,
}

impl TypeInterner {
    pub fn new() -> Self {
        TypeInterner {
            shards: (0..SHARD_COUNT).map(|_| TypeShard::new()).collect(),
            error: Arc::new(TypeData::Error {
                name: Atom::NONE,
                arguments: TypeArguments::new(),
            }),
            dynamic: Arc::new(TypeData::Dynamic),
        }
    }

    fn make_id(local_index: u32, shard_idx: u32) -> TypeId {
        TypeId(TypeId::FIRST_USER + ((local_index << SHARD_BITS) | shard_idx))
    }

    fn intrinsic_id(data: &TypeData) -> Option<TypeId> {
        match data {
            TypeData::Dynamic => Some(TypeId::DYNAMIC),
            TypeData::Error { name, arguments } if name.is_none() && arguments.is_empty() => {
                Some(TypeId::ERROR)
            }
            _ => None,
        }
    }

    /// Intern a type and return its id. Equal data always yields the same id.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = Self::intrinsic_id(&data) {
            return id;
        }

        let mut hasher = FxHasher::default();
        data.hash(&mut hasher);
        let shard_idx = (hasher.finish() as usize) & (SHARD_COUNT - 1);
        let shard = &self.shards[shard_idx];

        {
            let map = shard
                .key_to_index
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(&local_index) = map.get(&data) {
                return Self::make_id(local_index, shard_idx as u32);
            }
        }

        let mut map = shard
            .key_to_index
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let mut storage = shard
            .index_to_key
            .write()
            .unwrap_or_else(PoisonError::into_inner);

        if let Some(&local_index) = map.get(&data) {
            return Self::make_id(local_index, shard_idx as u32);
        }

        let local_index = storage.len() as u32;
        if local_index > (u32::MAX >> SHARD_BITS) - TypeId::FIRST_USER {
            return TypeId::ERROR;
        }

        let data = Arc::new(data);
        storage.push(data.clone());
        map.insert(data, local_index);
        Self::make_id(local_index, shard_idx as u32)
    }

    /// Look up the structure behind a type id.
    pub fn lookup(&self, id: TypeId) -> Option<Arc<TypeData>> {
        match id {
            TypeId::ERROR => return Some(self.error.clone()),
            TypeId::DYNAMIC => return Some(self.dynamic.clone()),
            _ => {}
        }
        let raw = id.0.checked_sub(TypeId::FIRST_USER)?;
        let shard = self.shards.get((raw & SHARD_MASK) as usize)?;
        let storage = shard
            .index_to_key
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        storage.get((raw >> SHARD_BITS) as usize).cloned()
    }

    /// Number of interned types, intrinsics included.
    pub fn len(&self) -> usize {
        let user: usize = self
            .shards
            .iter()
            .map(|s| {
                s.index_to_key
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .len()
            })
            .sum();
        user + TypeId::FIRST_USER as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn rigid(&self, classifier: DefId, arguments: TypeArguments, nullable: bool) -> TypeId {
        self.intern(TypeData::Rigid(RigidType {
            classifier,
            arguments,
            nullable,
            annotations: SmallVec::new(),
        }))
    }

    /// A rigid type with no arguments, e.g. a type parameter type.
    pub fn simple(&self, classifier: DefId) -> TypeId {
        self.rigid(classifier, TypeArguments::new(), false)
    }

    pub fn error_type(&self, name: Atom, arguments: TypeArguments) -> TypeId {
        self.intern(TypeData::Error { name, arguments })
    }

    pub fn flexible(&self, lower: TypeId, upper: TypeId) -> TypeId {
        self.intern(TypeData::Flexible { lower, upper })
    }

    pub fn lazy(&self, id: LazyTypeId) -> TypeId {
        self.intern(TypeData::Lazy(id))
    }

    // =========================================================================
    // Queries and derived types
    // =========================================================================

    pub fn is_error(&self, ty: TypeId) -> bool {
        ty == TypeId::ERROR || self.lookup(ty).is_some_and(|d| d.is_error())
    }

    pub fn is_dynamic(&self, ty: TypeId) -> bool {
        ty == TypeId::DYNAMIC
    }

    /// Nullability as written; flexible types report their upper bound.
    pub fn is_nullable(&self, ty: TypeId) -> bool {
        match self.lookup(ty).as_deref() {
            Some(TypeData::Rigid(rigid)) => rigid.nullable,
            Some(TypeData::Flexible { upper, .. }) => self.is_nullable(*upper),
            Some(TypeData::Dynamic) => true,
            _ => false,
        }
    }

    pub fn classifier_of(&self, ty: TypeId) -> Option<DefId> {
        self.lookup(ty)?.as_rigid().map(|r| r.classifier)
    }

    /// Same type with the given nullability. Error, dynamic and lazy types are
    /// returned unchanged.
    pub fn with_nullability(&self, ty: TypeId, nullable: bool) -> TypeId {
        let Some(data) = self.lookup(ty) else {
            return ty;
        };
        match &*data {
            TypeData::Rigid(rigid) if rigid.nullable != nullable => {
                self.intern(TypeData::Rigid(RigidType {
                    nullable,
                    ..rigid.clone()
                }))
            }
            TypeData::Flexible { lower, upper } => {
                let lower = self.with_nullability(*lower, nullable);
                let upper = self.with_nullability(*upper, nullable);
                self.flexible(lower, upper)
            }
            _ => ty,
        }
    }

    /// Replace the annotations of a rigid type. Other types are unchanged.
    pub fn with_annotations(&self, ty: TypeId, annotations: &[DefId]) -> TypeId {
        let Some(data) = self.lookup(ty) else {
            return ty;
        };
        match &*data {
            TypeData::Rigid(rigid) if rigid.annotations.as_slice() != annotations => {
                self.intern(TypeData::Rigid(RigidType {
                    annotations: annotations.iter().copied().collect(),
                    ..rigid.clone()
                }))
            }
            _ => ty,
        }
    }
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn interning_deduplicates_structures() {
        let interner = TypeInterner::new();
        let a = interner.simple(DefId(7));
        let b = interner.simple(DefId(7));
        assert_eq!(a, b);
        assert!(!a.is_intrinsic());

        let list = interner.rigid(DefId(8), smallvec![TypeArgument::invariant(a)], false);
        let nullable_list = interner.with_nullability(list, true);
        assert_ne!(list, nullable_list);
        assert!(interner.is_nullable(nullable_list));
        assert_eq!(interner.with_nullability(nullable_list, false), list);
    }

    #[test]
    fn intrinsics_round_trip() {
        let interner = TypeInterner::new();
        assert_eq!(interner.intern(TypeData::Dynamic), TypeId::DYNAMIC);
        assert_eq!(interner.error_type(Atom::NONE, TypeArguments::new()), TypeId::ERROR);
        assert!(interner.is_error(interner.error_type(Atom(42), TypeArguments::new())));
        assert!(interner.is_nullable(TypeId::DYNAMIC));
    }

    #[test]
    fn flexible_nullability_applies_to_both_bounds() {
        let interner = TypeInterner::new();
        let lower = interner.simple(DefId(3));
        let upper = interner.with_nullability(lower, true);
        let flexible = interner.flexible(lower, upper);
        assert!(interner.is_nullable(flexible));
        let made_nullable = interner.with_nullability(flexible, true);
        assert_eq!(
            interner.lookup(made_nullable).as_deref(),
            Some(&TypeData::Flexible {
                lower: upper,
                upper
            })
        );
    }
}
