//! Tests for the declaration table and built-ins.

use kres_common::{Interner, names};
use kres_types::*;
use rayon::prelude::*;
use std::sync::Arc;

fn new_db() -> TypeDatabase {
    kres_common::tracing_config::init_tracing();
    TypeDatabase::new(Arc::new(Interner::new()))
}

#[test]
fn test_packages_are_created_once() {
    let db = new_db();
    let a = db.names().intern("a");
    let b = db.names().intern("b");
    let first = db.defs().package(&[a, b]);
    let second = db.defs().package(&[a, b]);
    assert_eq!(first, second);
    assert_eq!(db.defs().kind(first), Some(DefKind::Package));
    let parent = db.defs().container(first).expect("parent package");
    assert_eq!(db.defs().name(parent), a);
    assert_eq!(db.defs().nested(parent, b), Some(first));
}

#[test]
fn test_nested_lookup_first_declaration_wins() {
    let db = new_db();
    let pkg = db.defs().package(&[db.names().intern("p")]);
    let name = db.names().intern("Dup");
    let first = db.defs().register(DefinitionInfo::class(name, pkg));
    let second = db.defs().register(DefinitionInfo::interface(name, pkg));
    assert_ne!(first, second);
    assert_eq!(db.defs().nested(pkg, name), Some(first));
}

#[test]
fn test_type_parameters_are_not_nested_classifiers() {
    let db = new_db();
    let pkg = db.builtins().core_package;
    let list = db.defs().register(DefinitionInfo::class(db.names().intern("List"), pkg));
    let t_name = db.names().intern("T");
    let t = db.defs().register(DefinitionInfo::type_parameter(
        t_name,
        Variance::Out,
        0,
        TypeParameterOwner::Classifier(list),
    ));
    db.defs().set_type_params(list, vec![t]);
    assert_eq!(db.defs().nested(list, t_name), None);
    assert_eq!(db.defs().variance(t), Variance::Out);
    assert_eq!(db.defs().container(t), Some(list));
    assert_eq!(db.star_upper_bound(t), db.nullable_any_type());
}

#[test]
fn test_members_keep_registration_order() {
    let db = new_db();
    let pkg = db.builtins().core_package;
    let host = db.defs().register(DefinitionInfo::class(db.names().intern("Host"), pkg));
    let foo = db.names().intern("foo");
    let one = db.defs().register_callable(CallableInfo::function(foo).in_container(host));
    let two = db.defs().register_callable(CallableInfo::property(foo).in_container(host));
    let local = db.defs().register_callable(
        CallableInfo::function(foo)
            .in_container(host)
            .with_flags(CallableFlags::LOCAL),
    );
    let members = db.defs().members_named(host, foo);
    assert_eq!(members.as_slice(), &[one, two]);
    assert!(!members.contains(&local));
}

#[test]
fn test_synthesized_through_fake_overrides() {
    let db = new_db();
    let name = db.names().intern("component1");
    let synthesized = db
        .defs()
        .register_callable(CallableInfo::function(name).with_flags(CallableFlags::SYNTHESIZED));
    let fake = db.defs().register_callable(
        CallableInfo::function(name)
            .with_flags(CallableFlags::FAKE_OVERRIDE)
            .overriding(synthesized),
    );
    let declared = db
        .defs()
        .register_callable(CallableInfo::function(name).overriding(synthesized));
    assert!(db.defs().is_or_overrides_synthesized(synthesized));
    assert!(db.defs().is_or_overrides_synthesized(fake));
    assert!(!db.defs().is_or_overrides_synthesized(declared));
}

#[test]
fn test_dynamic_callables_are_interned_per_name() {
    let db = new_db();
    let name = db.names().intern("anything");
    let f1 = db.defs().dynamic_callable(name, CallableKind::Function);
    let f2 = db.defs().dynamic_callable(name, CallableKind::Function);
    let p = db.defs().dynamic_callable(name, CallableKind::Property);
    assert_eq!(f1, f2);
    assert_ne!(f1, p);
    let info = db.defs().callable(f1).expect("dynamic callable");
    assert!(info.is_dynamic());
    assert_eq!(info.dispatch_receiver, Some(TypeId::DYNAMIC));
}

#[test]
fn test_object_values_only_for_singletons() {
    let db = new_db();
    let pkg = db.builtins().core_package;
    let registry = db
        .defs()
        .register(DefinitionInfo::object(db.names().intern("Registry"), pkg));
    let plain = db
        .defs()
        .register(DefinitionInfo::class(db.names().intern("Plain"), pkg));
    let ty = db.types().simple(registry);
    let value = db.defs().object_value(registry, ty).expect("object value");
    assert_eq!(db.defs().object_value(registry, ty), Some(value));
    assert!(db.defs().object_value(plain, db.types().simple(plain)).is_none());
    let info = db.defs().callable(value).expect("value descriptor");
    assert_eq!(info.kind, CallableKind::FakeObject);
    assert_eq!(info.return_type, Some(ty));
    // Value descriptors are not members of the container.
    assert!(db.defs().members_named(pkg, info.name).is_empty());
}

#[test]
fn test_error_callables_are_flagged() {
    let db = new_db();
    let name = db.names().intern("missing");
    let id = db.defs().error_callable(name, CallableKind::Function);
    assert_eq!(db.defs().error_callable(name, CallableKind::Function), id);
    let info = db.defs().callable(id).expect("error callable");
    assert!(info.flags.contains(CallableFlags::ERROR));
    assert!(!info.is_dynamic());
}

#[test]
fn test_function_classes_have_invoke() {
    let db = new_db();
    let f2 = db.function_class(2);
    assert_eq!(db.function_class(2), f2);
    assert_eq!(db.builtins().function_arity(f2), Some(2));
    assert_eq!(db.defs().type_params(f2).len(), 3);
    let invoke = db.defs().members_named(f2, names::INVOKE);
    assert_eq!(invoke.len(), 1);
    let info = db.defs().callable(invoke[0]).expect("invoke");
    assert!(info.flags.contains(CallableFlags::OPERATOR));
    assert_eq!(info.dispatch_receiver, Some(db.default_type(f2)));
}

#[test]
fn test_flexible_marker_is_registered() {
    let db = new_db();
    let marker = db.builtins().flexible_marker;
    assert!(db.builtins().is_flexible_marker(marker));
    assert_eq!(db.defs().name(marker), names::FLEXIBLE_MARKER);
    assert_eq!(db.defs().type_params(marker).len(), 2);
}

#[test]
fn test_concurrent_registration_and_interning() {
    let db = new_db();
    let pkg = db.builtins().core_package;
    let ids: Vec<(DefId, TypeId)> = (0..64)
        .into_par_iter()
        .map(|i| {
            let def = db
                .defs()
                .register(DefinitionInfo::class(db.names().intern(&format!("C{i}")), pkg));
            (def, db.types().simple(def))
        })
        .collect();
    for (def, ty) in &ids {
        assert_eq!(db.types().simple(*def), *ty);
        assert_eq!(db.types().classifier_of(*ty), Some(*def));
    }
    let arities: Vec<DefId> = (0..16).into_par_iter().map(|_| db.function_class(3)).collect();
    assert!(arities.windows(2).all(|w| w[0] == w[1]));
}
