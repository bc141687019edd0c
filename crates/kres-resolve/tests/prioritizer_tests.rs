//! Candidate prioritization: lookup order, tiers and receiver binding.

use kres_common::tracing_config::init_tracing;
use kres_common::{Atom, CancellationToken, Cancelled, Interner, NeverCancelled, NodeId, names};
use kres_resolve::*;
use kres_types::{
    CallableFlags, CallableId, CallableInfo, CallableKind, DefId, DefinitionInfo, NoLazyTypes,
    TypeArgument, TypeDatabase, TypeId, TypeParameterOwner, Variance, Visibility,
};
use smallvec::smallvec;
use std::sync::Arc;

// =============================================================================
// Fixture
// =============================================================================

struct Fixture {
    db: TypeDatabase,
    scopes: ScopeArena,
    options: ResolverOptions,
    package: DefId,
    file: ScopeId,
    next_node: u32,
}

impl Fixture {
    fn new() -> Self {
        init_tracing();
        let db = TypeDatabase::new(Arc::new(Interner::new()));
        let package = db.defs().package(&[db.names().intern("app")]);
        let mut scopes = ScopeArena::new();
        let file = scopes.file_scope(package);
        scopes.add_star_import(file, db.builtins().core_package);
        Self {
            db,
            scopes,
            options: ResolverOptions::default(),
            package,
            file,
            next_node: 0,
        }
    }

    fn name(&self, text: &str) -> Atom {
        self.db.names().intern(text)
    }

    fn node(&mut self) -> NodeId {
        self.next_node += 1;
        NodeId(self.next_node)
    }

    fn class(&self, name: &str, container: DefId) -> DefId {
        self.db.defs().register(
            DefinitionInfo::class(self.name(name), container).with_supertypes(vec![self.db.any_type()]),
        )
    }

    fn ty(&self, classifier: DefId) -> TypeId {
        self.db.types().simple(classifier)
    }

    fn callable(&self, info: CallableInfo) -> CallableId {
        self.db.defs().register_callable(info)
    }

    /// A public member function of `class`.
    fn member(&self, class: DefId, name: &str) -> CallableInfo {
        CallableInfo::function(self.name(name))
            .in_container(class)
            .with_dispatch_receiver(self.db.default_type(class))
    }

    /// A top-level extension function on `receiver`.
    fn extension(&self, receiver: TypeId, name: &str) -> CallableInfo {
        CallableInfo::function(self.name(name))
            .in_container(self.package)
            .with_extension_receiver(receiver)
    }

    fn value(&mut self, ty: TypeId) -> ReceiverValue {
        let node = self.node();
        ReceiverValue::expression(node, ty)
    }

    fn prioritizer(&self) -> TaskPrioritizer<'_> {
        TaskPrioritizer::new(
            &self.db,
            &self.scopes,
            &NoLazyTypes,
            &NoSmartCasts,
            &NeverCancelled,
            &self.options,
        )
    }

    fn tasks(&self, call: &Call, name: &str, scope: ScopeId) -> Vec<ResolutionTask> {
        self.prioritizer()
            .compute_prioritized_tasks(call, self.name(name), scope, &CallableCollectors::default())
            .expect("not cancelled")
    }
}

fn flatten(tasks: &[ResolutionTask]) -> Vec<CallableId> {
    tasks.iter().flat_map(ResolutionTask::callables).collect()
}

fn tiers(tasks: &[ResolutionTask]) -> Vec<u8> {
    tasks.iter().map(|task| task.tier).collect()
}

// =============================================================================
// Lookup order
// =============================================================================

#[test]
fn test_member_before_extension() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let extension = f.callable(f.extension(f.ty(foo), "bar"));
    let member = f.callable(f.member(foo, "bar"));
    let receiver = f.value(f.ty(foo));
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "bar", f.file);
    assert_eq!(flatten(&tasks), vec![member, extension]);
    assert_eq!(tiers(&tasks), vec![3, 3]);

    let member_candidate = tasks[0].candidates[0];
    assert_eq!(member_candidate.dispatch_receiver, Some(receiver));
    assert_eq!(member_candidate.extension_receiver, None);
    assert_eq!(member_candidate.explicit_receiver_kind, ExplicitReceiverKind::DispatchReceiver);

    let extension_candidate = tasks[1].candidates[0];
    assert_eq!(extension_candidate.dispatch_receiver, None);
    assert_eq!(extension_candidate.extension_receiver, Some(receiver));
    assert_eq!(
        extension_candidate.explicit_receiver_kind,
        ExplicitReceiverKind::ExtensionReceiver
    );
}

#[test]
fn test_local_value_before_top_level_function() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let top_level = f.callable(CallableInfo::function(f.name("run")).in_container(f.package));
    let local = f.callable(
        CallableInfo::property(f.name("run"))
            .with_flags(CallableFlags::LOCAL)
            .with_return_type(f.ty(foo)),
    );
    let body = f.scopes.function_scope(f.file, None);
    f.scopes.declare_local(body, f.name("run"), local);
    let call = Call::new(f.node());

    let tasks = f.tasks(&call, "run", body);
    assert_eq!(flatten(&tasks), vec![local, top_level]);
    assert_eq!(tiers(&tasks), vec![3, 3]);
    assert_eq!(tasks, f.tasks(&call, "run", body), "same inputs, same tasks");
}

#[test]
fn test_invoke_on_local_value() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let invoke = f.callable(f.member(foo, "invoke").with_flags(CallableFlags::OPERATOR));
    let local = f.callable(
        CallableInfo::property(f.name("run"))
            .with_flags(CallableFlags::LOCAL)
            .with_return_type(f.ty(foo)),
    );
    let body = f.scopes.function_scope(f.file, None);
    f.scopes.declare_local(body, f.name("run"), local);

    let variable = ReceiverValue::variable(local, f.ty(foo));
    let call = Call::new(f.node()).invoking(variable);
    let tasks = f.tasks(&call, "invoke", body);

    assert_eq!(flatten(&tasks), vec![invoke]);
    let candidate = tasks[0].candidates[0];
    assert_eq!(candidate.dispatch_receiver, Some(variable));
    assert_eq!(candidate.explicit_receiver_kind, ExplicitReceiverKind::DispatchReceiver);
}

#[test]
fn test_convention_call_tries_operators_first() {
    let mut f = Fixture::new();
    let vector = f.class("Vector", f.package);
    let operator = f.callable(f.member(vector, "plus").with_flags(CallableFlags::OPERATOR));
    let plain = f.callable(f.member(vector, "plus"));
    let operator_extension =
        f.callable(f.extension(f.ty(vector), "plus").with_flags(CallableFlags::OPERATOR));
    let receiver = f.value(f.ty(vector));
    let call = Call::new(f.node())
        .with_receiver(receiver)
        .with_kind(CallKind::Convention);

    let tasks = f.tasks(&call, "plus", f.file);
    assert_eq!(tasks[0].callables().collect::<Vec<_>>(), vec![operator]);
    assert_eq!(tasks[1].callables().collect::<Vec<_>>(), vec![operator_extension]);
    assert_eq!(tasks[2].callables().collect::<Vec<_>>(), vec![operator, plain]);
}

#[test]
fn test_unary_operator_falls_back_to_legacy_name() {
    let mut f = Fixture::new();
    let number = f.class("Num", f.package);
    let plus = f.callable(f.member(number, "plus").with_flags(CallableFlags::OPERATOR));
    let receiver = f.value(f.ty(number));
    let call = Call::new(f.node())
        .with_receiver(receiver)
        .with_kind(CallKind::UnaryPrefix(UnaryOperator::Plus));

    let found = flatten(&f.tasks(&call, "unaryPlus", f.file));
    assert!(found.contains(&plus), "{found:?}");
    assert!(found.iter().all(|&id| id == plus));

    f.options.unary_operator_migration = false;
    assert!(f.tasks(&call, "unaryPlus", f.file).is_empty());
}

#[test]
fn test_cancelled_lookup_returns_no_tasks() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    f.callable(f.member(foo, "bar"));
    let receiver = f.value(f.ty(foo));
    let call = Call::new(f.node()).with_receiver(receiver);
    let token = CancellationToken::new();
    token.cancel();

    let prioritizer = TaskPrioritizer::new(
        &f.db,
        &f.scopes,
        &NoLazyTypes,
        &NoSmartCasts,
        &token,
        &f.options,
    );
    let result = prioritizer.compute_prioritized_tasks(
        &call,
        f.name("bar"),
        f.file,
        &CallableCollectors::default(),
    );
    assert_eq!(result, Err(Cancelled));
}

// =============================================================================
// Tiers
// =============================================================================

/// `Foo` with four `go` overloads, one per tier when called from outside.
fn overloads(f: &Fixture, foo: DefId) -> [CallableId; 4] {
    [
        f.callable(f.member(foo, "go")),
        f.callable(f.member(foo, "go").with_flags(CallableFlags::SYNTHESIZED)),
        f.callable(f.member(foo, "go").with_visibility(Visibility::Private)),
        f.callable(
            f.member(foo, "go")
                .with_flags(CallableFlags::SYNTHESIZED | CallableFlags::LOW_PRIORITY),
        ),
    ]
}

#[test]
fn test_tiers_from_visibility_and_synthesis() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let [public, synthesized, private, low] = overloads(&f, foo);
    let receiver = f.value(f.ty(foo));
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "go", f.file);
    assert_eq!(tiers(&tasks), vec![3, 2, 1, 0]);
    assert_eq!(flatten(&tasks), vec![public, synthesized, private, low]);
}

#[test]
fn test_private_member_visible_inside_its_class() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let [public, synthesized, private, low] = overloads(&f, foo);
    let body = f.scopes.class_scope(f.file, foo, &f.db);
    let receiver = f.value(f.ty(foo));
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "go", body);
    assert_eq!(tiers(&tasks), vec![3, 2, 0]);
    assert_eq!(tasks[0].callables().collect::<Vec<_>>(), vec![public, private]);
    assert_eq!(tasks[1].callables().collect::<Vec<_>>(), vec![synthesized]);
    assert_eq!(tasks[2].callables().collect::<Vec<_>>(), vec![low]);
}

#[test]
fn test_fake_override_of_synthesized_member() {
    let mut f = Fixture::new();
    let base = f.class("Base", f.package);
    let [public, synthesized, _, _] = overloads(&f, base);
    let sub = f.db.defs().register(
        DefinitionInfo::class(f.name("Sub"), f.package).with_supertypes(vec![f.ty(base)]),
    );
    let inherited = f.callable(
        f.member(sub, "go")
            .with_flags(CallableFlags::FAKE_OVERRIDE)
            .overriding(synthesized),
    );
    let receiver = f.value(f.ty(sub));
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "go", f.file);
    let found = flatten(&tasks);
    assert!(!found.contains(&synthesized), "overridden member is hidden");
    assert_eq!(tasks[0].tier, 3);
    assert_eq!(tasks[0].callables().collect::<Vec<_>>(), vec![public]);
    assert_eq!(tasks[1].tier, 2);
    assert_eq!(tasks[1].callables().collect::<Vec<_>>(), vec![inherited]);
}

#[test]
fn test_protected_member_visible_from_subclass() {
    let mut f = Fixture::new();
    let base = f.class("Base", f.package);
    let sub = f.db.defs().register(
        DefinitionInfo::class(f.name("Sub"), f.package).with_supertypes(vec![f.ty(base)]),
    );
    let protected = f.callable(f.member(base, "hook").with_visibility(Visibility::Protected));
    let sub_body = f.scopes.class_scope(f.file, sub, &f.db);
    let candidate = ResolutionCandidate::new(protected, ExplicitReceiverKind::NoExplicitReceiver);
    let call = Call::new(f.node());
    let prioritizer = f.prioritizer();

    let inside = prioritizer.compute_prioritized_tasks_from_candidates(&call, sub_body, [candidate]);
    assert_eq!(tiers(&inside), vec![3]);
    let outside = prioritizer.compute_prioritized_tasks_from_candidates(&call, f.file, [candidate]);
    assert_eq!(tiers(&outside), vec![1]);
}

#[test]
fn test_candidates_from_elsewhere_form_one_group() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let private = f.callable(f.member(foo, "go").with_visibility(Visibility::Private));
    let public = f.callable(f.member(foo, "go"));
    let call = Call::new(f.node());
    let candidates = [private, public]
        .map(|id| ResolutionCandidate::new(id, ExplicitReceiverKind::NoExplicitReceiver));

    let tasks = f
        .prioritizer()
        .compute_prioritized_tasks_from_candidates(&call, f.file, candidates);
    assert_eq!(tiers(&tasks), vec![3, 1]);
    assert_eq!(flatten(&tasks), vec![public, private]);
}

// =============================================================================
// Receivers
// =============================================================================

#[test]
fn test_error_receiver_binds_error_callables() {
    let mut f = Fixture::new();
    let receiver = f.value(TypeId::ERROR);
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "anything", f.file);
    assert_eq!(tiers(&tasks), vec![3, 3]);
    let kinds: Vec<CallableKind> = flatten(&tasks)
        .into_iter()
        .map(|id| {
            let info = f.db.defs().callable(id).expect("registered");
            assert!(info.flags.contains(CallableFlags::ERROR));
            info.kind
        })
        .collect();
    assert_eq!(kinds, vec![CallableKind::Function, CallableKind::Property]);
}

#[test]
fn test_explicit_dynamic_receiver() {
    let mut f = Fixture::new();
    let foo = f.class("Foo", f.package);
    let on_dynamic = f.callable(f.extension(TypeId::DYNAMIC, "poke"));
    let on_foo = f.callable(f.extension(f.ty(foo), "poke"));
    let receiver = f.value(TypeId::DYNAMIC);
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "poke", f.file);
    let found = flatten(&tasks);
    assert!(!found.contains(&on_foo));
    assert_eq!(found[0], on_dynamic);
    assert_eq!(tiers(&tasks), vec![3, 3]);

    let dynamic = &tasks[1].candidates;
    let kinds: Vec<CallableKind> = dynamic
        .iter()
        .map(|c| f.db.defs().callable(c.callable).expect("registered").kind)
        .collect();
    assert_eq!(kinds, vec![CallableKind::Function, CallableKind::Property]);
    assert!(dynamic.iter().all(|c| c.dispatch_receiver == Some(receiver)));
}

#[test]
fn test_implicit_dynamic_receiver_is_last_resort() {
    let mut f = Fixture::new();
    let top_level = f.callable(CallableInfo::function(f.name("poke")).in_container(f.package));
    let receiver_node = f.node();
    let lambda = f.scopes.lambda_scope(
        f.file,
        Some(ReceiverValue::new(ReceiverKind::ImplicitExtension(receiver_node), TypeId::DYNAMIC)),
    );
    let call = Call::new(f.node());

    let tasks = f.tasks(&call, "poke", lambda);
    assert_eq!(tiers(&tasks), vec![3, 0]);
    assert_eq!(tasks[0].callables().collect::<Vec<_>>(), vec![top_level]);
    let fallback = &tasks[1].candidates;
    assert_eq!(fallback.len(), 2);
    assert!(
        fallback
            .iter()
            .all(|c| c.explicit_receiver_kind == ExplicitReceiverKind::NoExplicitReceiver)
    );
}

#[test]
fn test_augmented_assignment_never_dynamic() {
    let mut f = Fixture::new();
    let receiver = f.value(TypeId::DYNAMIC);
    let call = Call::new(f.node())
        .with_receiver(receiver)
        .with_kind(CallKind::Convention);
    assert!(f.tasks(&call, "plusAssign", f.file).is_empty());
}

#[test]
fn test_companion_through_class_qualifier() {
    let mut f = Fixture::new();
    let registry = f.class("Registry", f.package);
    let companion = f
        .db
        .defs()
        .register(DefinitionInfo::object(names::COMPANION, registry));
    f.db.defs().set_companion(registry, companion);
    // A nested object of the companion is reached through the qualifier's own
    // scope, never as a member of the companion value.
    f.db
        .defs()
        .register(DefinitionInfo::object(f.name("create"), companion));
    let static_create = f.callable(
        CallableInfo::function(f.name("create"))
            .in_container(registry)
            .with_flags(CallableFlags::STATIC),
    );
    let companion_create = f.callable(f.member(companion, "create"));
    let qualifier = QualifierReceiver {
        node: f.node(),
        target: registry,
    };
    let call = Call::new(f.node()).with_qualifier(qualifier);

    let tasks = f.tasks(&call, "create", f.file);
    assert_eq!(flatten(&tasks), vec![static_create, companion_create]);
    let through_companion = tasks[1].candidates[0];
    assert_eq!(
        through_companion.dispatch_receiver.map(|r| r.kind),
        Some(ReceiverKind::ClassObject(companion))
    );
    assert_eq!(
        through_companion.explicit_receiver_kind,
        ExplicitReceiverKind::DispatchReceiver
    );
}

#[test]
fn test_implied_this_binds_innermost_matching_receiver() {
    let mut f = Fixture::new();
    let outer = f.class("Outer", f.package);
    let t = f.db.defs().register(DefinitionInfo::type_parameter(
        f.name("T"),
        Variance::Invariant,
        0,
        TypeParameterOwner::Classifier(outer),
    ));
    f.db.defs().set_type_params(outer, vec![t]);
    let inner = f
        .db
        .defs()
        .register(DefinitionInfo::class(f.name("Inner"), outer).with_supertypes(vec![f.db.any_type()]));
    let unrelated = f.class("Unrelated", f.package);
    let outer_body = f.scopes.class_scope(f.file, outer, &f.db);
    let inner_body = f.scopes.class_scope(outer_body, inner, &f.db);

    let any = f.db.any_type();
    let outer_of_any = f
        .db
        .types()
        .rigid(outer, smallvec![TypeArgument::invariant(any)], false);
    let on_outer = f.callable(CallableInfo::function(f.name("a")).with_dispatch_receiver(outer_of_any));
    let on_any = f.callable(CallableInfo::function(f.name("b")).with_dispatch_receiver(any));
    let on_unrelated =
        f.callable(CallableInfo::function(f.name("c")).with_dispatch_receiver(f.ty(unrelated)));
    let free = f.callable(CallableInfo::function(f.name("d")));

    let candidates = f.prioritizer().convert_with_implied_this(
        ScopeView::Lexical(inner_body),
        None,
        &[on_outer, on_any, on_unrelated, free],
        ExplicitReceiverKind::NoExplicitReceiver,
    );
    let bound: Vec<(CallableId, Option<ReceiverKind>)> = candidates
        .iter()
        .map(|c| (c.callable, c.dispatch_receiver.map(|r| r.kind)))
        .collect();
    assert_eq!(
        bound,
        vec![
            (on_outer, Some(ReceiverKind::ImplicitClass(outer))),
            (on_any, Some(ReceiverKind::ImplicitClass(inner))),
            (free, None),
        ]
    );
}

#[test]
fn test_smart_cast_members_use_cast_receiver() {
    let mut f = Fixture::new();
    let shape = f.class("Shape", f.package);
    let circle = f.db.defs().register(
        DefinitionInfo::class(f.name("Circle"), f.package).with_supertypes(vec![f.ty(shape)]),
    );
    let radius = f.callable(
        CallableInfo::property(f.name("radius"))
            .in_container(circle)
            .with_dispatch_receiver(f.ty(circle)),
    );
    let body = f.scopes.class_scope(f.file, shape, &f.db);
    let mut casts = SmartCastMap::new();
    casts.record(ReceiverKind::ImplicitClass(shape), f.ty(circle));
    let call = Call::new(f.node()).without_arguments();

    let prioritizer =
        TaskPrioritizer::new(&f.db, &f.scopes, &NoLazyTypes, &casts, &NeverCancelled, &f.options);
    let tasks = prioritizer
        .compute_prioritized_tasks(&call, f.name("radius"), body, &CallableCollectors::variables())
        .expect("not cancelled");
    assert_eq!(flatten(&tasks), vec![radius]);
    assert_eq!(
        tasks[0].candidates[0].dispatch_receiver,
        Some(ReceiverValue::new(ReceiverKind::CastClass(shape), f.ty(circle)))
    );
}

// =============================================================================
// Enum entries
// =============================================================================

/// `enum class Color { RED; fun describe() }` with a nested `object Default`.
fn color(f: &Fixture) -> (DefId, DefId) {
    let color = f.db.defs().register(
        DefinitionInfo::enum_class(f.name("Color"), f.package).with_supertypes(vec![f.db.any_type()]),
    );
    let red = f
        .db
        .defs()
        .register(DefinitionInfo::enum_entry(f.name("RED"), color));
    f.db
        .defs()
        .register(DefinitionInfo::object(f.name("Default"), color));
    (color, red)
}

#[test]
fn test_enum_entry_qualifier_reaches_enum_class_members() {
    let mut f = Fixture::new();
    let (color, red) = color(&f);
    let describe = f.callable(f.member(color, "describe"));
    let qualifier = QualifierReceiver {
        node: f.node(),
        target: red,
    };
    let call = Call::new(f.node()).with_qualifier(qualifier);

    let tasks = f.tasks(&call, "describe", f.file);
    assert_eq!(flatten(&tasks), vec![describe]);
    let candidate = tasks[0].candidates[0];
    assert_eq!(
        candidate.dispatch_receiver,
        Some(ReceiverValue::new(ReceiverKind::ClassObject(red), f.db.default_type(color)))
    );
    assert_eq!(candidate.explicit_receiver_kind, ExplicitReceiverKind::DispatchReceiver);
}

#[test]
fn test_enum_entry_qualifier_skips_nested_objects() {
    let mut f = Fixture::new();
    let (color, red) = color(&f);
    let through_entry = Call::new(f.node()).with_qualifier(QualifierReceiver {
        node: f.node(),
        target: red,
    });
    assert!(f.tasks(&through_entry, "Default", f.file).is_empty());

    // Through the enum class itself the nested object is a value.
    let through_class = Call::new(f.node()).with_qualifier(QualifierReceiver {
        node: f.node(),
        target: color,
    });
    let found = flatten(&f.tasks(&through_class, "Default", f.file));
    assert_eq!(found.len(), 1);
    assert_eq!(
        f.db.defs().with_callable(found[0], |info| info.kind),
        Some(CallableKind::FakeObject)
    );
}

// =============================================================================
// Member extensions
// =============================================================================

#[test]
fn test_member_extension_pairs_implicit_dispatch_with_explicit_receiver() {
    let mut f = Fixture::new();
    let ctx = f.class("Ctx", f.package);
    let text = f.class("Text", f.package);
    let shout = f.callable(f.member(ctx, "shout").with_extension_receiver(f.ty(text)));
    let body = f.scopes.class_scope(f.file, ctx, &f.db);
    let receiver = f.value(f.ty(text));
    let call = Call::new(f.node()).with_receiver(receiver);

    let tasks = f.tasks(&call, "shout", body);
    assert_eq!(flatten(&tasks), vec![shout]);
    assert_eq!(tiers(&tasks), vec![3]);
    let candidate = tasks[0].candidates[0];
    assert_eq!(candidate.dispatch_receiver.map(|r| r.kind), Some(ReceiverKind::ImplicitClass(ctx)));
    assert_eq!(candidate.extension_receiver, Some(receiver));
    assert_eq!(candidate.explicit_receiver_kind, ExplicitReceiverKind::ExtensionReceiver);
}

/// `class Handler { operator fun Ctx.invoke() }` and a local `handler`.
fn handler(f: &Fixture) -> (DefId, DefId, CallableId, ReceiverValue) {
    let ctx = f.class("Ctx", f.package);
    let handler = f.class("Handler", f.package);
    let invoke = f.callable(
        f.member(handler, "invoke")
            .with_extension_receiver(f.ty(ctx))
            .with_flags(CallableFlags::OPERATOR),
    );
    let local = f.callable(
        CallableInfo::property(f.name("handler"))
            .with_flags(CallableFlags::LOCAL)
            .with_return_type(f.ty(handler)),
    );
    (ctx, handler, invoke, ReceiverValue::variable(local, f.ty(handler)))
}

#[test]
fn test_invoke_member_extension_takes_implicit_extension_receiver() {
    let mut f = Fixture::new();
    let (ctx, _, invoke, variable) = handler(&f);
    let class_body = f.scopes.class_scope(f.file, ctx, &f.db);
    let body = f.scopes.function_scope(class_body, None);
    let call = Call::new(f.node()).invoking(variable);

    let tasks = f.tasks(&call, "invoke", body);
    assert_eq!(flatten(&tasks), vec![invoke]);
    let candidate = tasks[0].candidates[0];
    assert_eq!(candidate.dispatch_receiver, Some(variable));
    assert_eq!(candidate.extension_receiver.map(|r| r.kind), Some(ReceiverKind::ImplicitClass(ctx)));
    assert_eq!(candidate.explicit_receiver_kind, ExplicitReceiverKind::DispatchReceiver);
}

#[test]
fn test_invoke_with_explicit_receiver_binds_both_receivers() {
    let mut f = Fixture::new();
    let (ctx, _, invoke, variable) = handler(&f);
    let receiver = f.value(f.ty(ctx));
    let call = Call::new(f.node()).with_receiver(receiver).invoking(variable);

    let tasks = f.tasks(&call, "invoke", f.file);
    assert_eq!(flatten(&tasks), vec![invoke]);
    let candidate = tasks[0].candidates[0];
    assert_eq!(candidate.dispatch_receiver, Some(variable));
    assert_eq!(candidate.extension_receiver, Some(receiver));
    assert_eq!(candidate.explicit_receiver_kind, ExplicitReceiverKind::BothReceivers);
}
