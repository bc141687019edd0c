//! Built-in classifiers the resolver depends on.
//!
//! Only what type resolution itself needs is registered: the top and bottom
//! types, `Unit` for omitted function return types, function classes for
//! function type syntax, the annotation that marks extension function types,
//! and the internal marker class used to spell flexible types in tests.

use crate::def::*;
use crate::intern::TypeInterner;
use crate::types::{TypeArgument, TypeArguments, Variance};
use dashmap::DashMap;
use kres_common::{Interner, names};
use tracing::trace;

pub struct BuiltIns {
    pub core_package: DefId,
    pub any: DefId,
    pub nothing: DefId,
    pub unit: DefId,
    pub extension_function_type: DefId,
    /// `core.internal.flexible.ft<L, U>`
    pub flexible_marker: DefId,
    function_classes: DashMap<usize, DefId>,
    function_arity: DashMap<DefId, usize>,
}

impl BuiltIns {
    pub(crate) fn register(names: &Interner, defs: &DefinitionStore, types: &TypeInterner) -> Self {
        let core_package = defs.package(&[names::CORE]);
        let any = defs.register(DefinitionInfo::class(names::ANY, core_package));
        let nothing = defs.register(DefinitionInfo::class(names::NOTHING, core_package));
        let unit = defs.register(DefinitionInfo::object(names::UNIT, core_package));
        let any_type = types.simple(any);
        defs.set_supertypes(unit, vec![any_type]);
        let extension_function_type = defs.register(DefinitionInfo::annotation_class(
            names::EXTENSION_FUNCTION_TYPE,
            core_package,
        ));

        let flexible_package = defs.package(&[
            names::CORE,
            names.intern("internal"),
            names.intern("flexible"),
        ]);
        let flexible_marker =
            defs.register(DefinitionInfo::class(names::FLEXIBLE_MARKER, flexible_package));
        let params = ["L", "U"]
            .iter()
            .enumerate()
            .map(|(index, name)| {
                defs.register(DefinitionInfo::type_parameter(
                    names.intern(name),
                    Variance::Invariant,
                    index as u32,
                    TypeParameterOwner::Classifier(flexible_marker),
                ))
            })
            .collect();
        defs.set_type_params(flexible_marker, params);

        BuiltIns {
            core_package,
            any,
            nothing,
            unit,
            extension_function_type,
            flexible_marker,
            function_classes: DashMap::new(),
            function_arity: DashMap::new(),
        }
    }

    /// Arity of a function class, or `None` for any other classifier.
    pub fn function_arity(&self, classifier: DefId) -> Option<usize> {
        self.function_arity.get(&classifier).map(|r| *r)
    }

    /// `FunctionN<P1, ..., PN, R>` with an `invoke` operator member, created
    /// on first use.
    pub(crate) fn function_class(
        &self,
        arity: usize,
        names: &Interner,
        defs: &DefinitionStore,
        types: &TypeInterner,
    ) -> DefId {
        if let Some(existing) = self.function_classes.get(&arity) {
            return *existing;
        }
        let class = *self.function_classes.entry(arity).or_insert_with(|| {
            let name = names.intern(&format!("Function{arity}"));
            let class = defs.register(
                DefinitionInfo::interface(name, self.core_package)
                    .with_supertypes(vec![types.simple(self.any)]),
            );
            let params: Vec<DefId> = (0..=arity)
                .map(|index| {
                    let (name, variance) = if index == arity {
                        (names.intern("R"), Variance::Out)
                    } else {
                        (names.intern(&format!("P{}", index + 1)), Variance::In)
                    };
                    defs.register(DefinitionInfo::type_parameter(
                        name,
                        variance,
                        index as u32,
                        TypeParameterOwner::Classifier(class),
                    ))
                })
                .collect();
            let arguments: TypeArguments = params
                .iter()
                .map(|&p| TypeArgument::invariant(types.simple(p)))
                .collect();
            let return_type = types.simple(params[arity]);
            defs.set_type_params(class, params);

            defs.register_callable(
                CallableInfo::function(names::INVOKE)
                    .in_container(class)
                    .with_dispatch_receiver(types.rigid(class, arguments, false))
                    .with_flags(CallableFlags::OPERATOR)
                    .with_return_type(return_type),
            );
            trace!(arity, class = class.0, "registered function class");
            class
        });
        self.function_arity.entry(class).or_insert(arity);
        class
    }

    pub fn is_flexible_marker(&self, classifier: DefId) -> bool {
        classifier == self.flexible_marker
    }
}
