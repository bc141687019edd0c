//! Type parameter substitution.
//!
//! Used to read a declaration's bounds and supertypes in terms of the
//! arguments a particular type supplies, e.g. the bound `Comparable<T>` of
//! `class Box<T : Comparable<T>>` read for `Box<Int>` is `Comparable<Int>`.

use crate::db::TypeDatabase;
use crate::def::DefId;
use crate::recursion::{DepthCounter, RecursionProfile};
use crate::types::{RigidType, TypeArgument, TypeData, TypeId};
use rustc_hash::FxHashMap;

/// Mapping from type parameter declarations to arguments.
#[derive(Clone, Debug, Default)]
pub struct TypeSubstitution {
    map: FxHashMap<DefId, TypeArgument>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair the type constructor parameters of `classifier` with `arguments`.
    /// Extra entries on either side are ignored.
    pub fn for_arguments(db: &TypeDatabase, classifier: DefId, arguments: &[TypeArgument]) -> Self {
        let map = db
            .defs()
            .constructor_parameters(classifier)
            .into_iter()
            .zip(arguments.iter().copied())
            .map(|(param, arg)| (param.declaration(), arg))
            .collect();
        Self { map }
    }

    pub fn insert(&mut self, param: DefId, argument: TypeArgument) {
        self.map.insert(param, argument);
    }

    pub fn get(&self, param: DefId) -> Option<TypeArgument> {
        self.map.get(&param).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Apply the substitution. Lazy types are not forced and are returned as is.
    pub fn apply(&self, db: &TypeDatabase, ty: TypeId) -> TypeId {
        if self.is_empty() {
            return ty;
        }
        let mut depth = DepthCounter::with_profile(RecursionProfile::Substitution);
        self.apply_inner(db, ty, &mut depth)
    }

    fn apply_inner(&self, db: &TypeDatabase, ty: TypeId, depth: &mut DepthCounter) -> TypeId {
        if !depth.enter() {
            return ty;
        }
        let result = self.substitute_once(db, ty, depth);
        depth.leave();
        result
    }

    fn substitute_once(&self, db: &TypeDatabase, ty: TypeId, depth: &mut DepthCounter) -> TypeId {
        let types = db.types();
        let Some(data) = types.lookup(ty) else {
            return ty;
        };
        match &*data {
            TypeData::Rigid(rigid) => {
                if let Some(argument) = self.get(rigid.classifier) {
                    let replaced = argument.ty();
                    return if rigid.nullable {
                        types.with_nullability(replaced, true)
                    } else {
                        replaced
                    };
                }
                if rigid.arguments.is_empty() {
                    return ty;
                }
                let arguments = rigid
                    .arguments
                    .iter()
                    .map(|arg| match *arg {
                        TypeArgument::Star { upper_bound } => TypeArgument::Star {
                            upper_bound: self.apply_inner(db, upper_bound, depth),
                        },
                        TypeArgument::Projection { variance, ty } => TypeArgument::Projection {
                            variance,
                            ty: self.apply_inner(db, ty, depth),
                        },
                    })
                    .collect();
                types.intern(TypeData::Rigid(RigidType {
                    arguments,
                    ..rigid.clone()
                }))
            }
            TypeData::Flexible { lower, upper } => {
                let lower = self.apply_inner(db, *lower, depth);
                let upper = self.apply_inner(db, *upper, depth);
                types.flexible(lower, upper)
            }
            _ => ty,
        }
    }
}
