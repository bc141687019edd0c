//! Nominal subtype checks.
//!
//! Enough of the subtyping relation to validate type parameter bounds and to
//! bind implied receivers: supertype search with argument substitution,
//! declaration-site and use-site variance, nullability, flexible bounds and
//! type parameter bounds. Error and dynamic types are compatible with
//! everything so that one unresolved name does not cascade.

use crate::db::{LazyTypeResolver, TypeDatabase};
use crate::def::{DefId, DefKind};
use crate::recursion::{RecursionGuard, RecursionProfile, RecursionResult};
use crate::substitute::TypeSubstitution;
use crate::types::{RigidType, TypeArgument, TypeArguments, TypeData, TypeId, Variance};
use kres_common::limits::MAX_SUPERTYPE_WALK;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use tracing::trace;

pub struct SubtypeChecker<'a> {
    db: &'a TypeDatabase,
    lazy: &'a dyn LazyTypeResolver,
    guard: RecursionGuard<(TypeId, TypeId)>,
}

impl<'a> SubtypeChecker<'a> {
    pub fn new(db: &'a TypeDatabase, lazy: &'a dyn LazyTypeResolver) -> Self {
        Self {
            db,
            lazy,
            guard: RecursionGuard::with_profile(RecursionProfile::SubtypeCheck),
        }
    }

    pub fn is_subtype(&mut self, sub: TypeId, sup: TypeId) -> bool {
        if sub == sup {
            return true;
        }
        match self.guard.enter((sub, sup)) {
            RecursionResult::Entered => {
                let result = self.check(sub, sup);
                self.guard.leave((sub, sup));
                result
            }
            // Assume related while the same question is open further up.
            RecursionResult::Cycle => true,
            RecursionResult::DepthExceeded | RecursionResult::IterationExceeded => {
                trace!(sub = sub.0, sup = sup.0, "subtype check exceeded limits");
                false
            }
        }
    }

    fn check(&mut self, sub: TypeId, sup: TypeId) -> bool {
        let sub = self.db.force(sub, self.lazy);
        let sup = self.db.force(sup, self.lazy);
        if sub == sup {
            return true;
        }
        let types = self.db.types();
        if types.is_error(sub) || types.is_error(sup) {
            return true;
        }
        if sub == TypeId::DYNAMIC || sup == TypeId::DYNAMIC {
            return true;
        }
        let (Some(sub_data), Some(sup_data)) = (types.lookup(sub), types.lookup(sup)) else {
            return false;
        };
        match (&*sub_data, &*sup_data) {
            (TypeData::Flexible { lower, .. }, _) => self.is_subtype(*lower, sup),
            (_, TypeData::Flexible { upper, .. }) => self.is_subtype(sub, *upper),
            (TypeData::Rigid(a), TypeData::Rigid(b)) => self.rigid_subtype(sub, a, b),
            _ => false,
        }
    }

    fn rigid_subtype(&mut self, sub: TypeId, a: &RigidType, b: &RigidType) -> bool {
        let builtins = self.db.builtins();
        if a.nullable && !b.nullable {
            return false;
        }
        if a.classifier == builtins.nothing {
            return true;
        }

        let defs = self.db.defs();
        if defs.kind(a.classifier) == Some(DefKind::TypeParameter) {
            if a.classifier == b.classifier {
                return true;
            }
            let sup = self.db.types().intern(TypeData::Rigid(b.clone()));
            let bounds = self.db.upper_bounds_or_default(a.classifier);
            return bounds.into_iter().any(|bound| {
                let bound = if a.nullable {
                    self.db.types().with_nullability(bound, true)
                } else {
                    bound
                };
                self.is_subtype(bound, sup)
            });
        }
        if b.classifier == builtins.any {
            return true;
        }
        if defs.kind(b.classifier) == Some(DefKind::TypeParameter) {
            return false;
        }

        let Some(found) = self.find_supertype_arguments(sub, b.classifier) else {
            return false;
        };
        let params = defs.constructor_parameters(b.classifier);
        for (index, param) in params.iter().enumerate() {
            let (Some(sub_arg), Some(sup_arg)) = (found.get(index), b.arguments.get(index)) else {
                continue;
            };
            let declared = defs.variance(param.declaration());
            if !self.argument_contained(*sub_arg, *sup_arg, declared) {
                return false;
            }
        }
        true
    }

    fn argument_contained(&mut self, sub: TypeArgument, sup: TypeArgument, declared: Variance) -> bool {
        if sup.is_star() {
            return true;
        }
        let effective = if sup.variance().is_invariant() {
            declared
        } else {
            sup.variance()
        };
        match effective {
            Variance::Out => sub.variance().allows_out() && self.is_subtype(sub.ty(), sup.ty()),
            Variance::In => {
                !sub.is_star() && sub.variance().allows_in() && self.is_subtype(sup.ty(), sub.ty())
            }
            Variance::Invariant => {
                !sub.is_star()
                    && sub.variance() == sup.variance()
                    && self.is_subtype(sub.ty(), sup.ty())
                    && self.is_subtype(sup.ty(), sub.ty())
            }
        }
    }

    /// Arguments of `ty` viewed as an instance of `target`, found by walking
    /// supertypes breadth-first with substitution.
    fn find_supertype_arguments(&mut self, ty: TypeId, target: DefId) -> Option<TypeArguments> {
        let types = self.db.types();
        let mut queue = VecDeque::from([types.with_nullability(ty, false)]);
        let mut visited = FxHashSet::default();
        let mut steps = 0u32;
        while let Some(current) = queue.pop_front() {
            steps += 1;
            if steps > MAX_SUPERTYPE_WALK || !visited.insert(current) {
                continue;
            }
            let current = self.db.force(current, self.lazy);
            let Some(data) = types.lookup(current) else {
                continue;
            };
            let rigid = match &*data {
                TypeData::Rigid(rigid) => rigid,
                TypeData::Flexible { upper, .. } => {
                    queue.push_back(*upper);
                    continue;
                }
                _ => continue,
            };
            if rigid.classifier == target {
                return Some(rigid.arguments.clone());
            }
            let substitution =
                TypeSubstitution::for_arguments(self.db, rigid.classifier, &rigid.arguments);
            for supertype in self.db.defs().supertypes(rigid.classifier) {
                let supertype = self.db.force(supertype, self.lazy);
                queue.push_back(substitution.apply(self.db, supertype));
            }
        }
        None
    }
}
