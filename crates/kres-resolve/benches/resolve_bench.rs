//! Type resolution and candidate prioritization benchmarks.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use kres_common::{Interner, NeverCancelled, NodeId};
use kres_resolve::{
    BindingTrace, Call, CallableCollectors, NoSmartCasts, ReceiverValue, ResolverOptions, ScopeArena,
    ScopeId, TaskPrioritizer, TypeResolver,
};
use kres_syntax::{NodeArena, SyntaxBuilder};
use kres_types::{
    CallableFlags, CallableInfo, DefId, DefinitionInfo, NoLazyTypes, TypeDatabase, TypeParameterOwner,
    Variance,
};
use std::sync::Arc;

/// `core.Box<T>` and `core.String`, seen from a file in package `bench`.
fn setup() -> (TypeDatabase, ScopeArena, ScopeId) {
    let db = TypeDatabase::new(Arc::new(Interner::new()));
    let core = db.builtins().core_package;
    let names = db.names();
    let any = db.any_type();
    db.defs()
        .register(DefinitionInfo::class(names.intern("String"), core).with_supertypes(vec![any]));
    let boxed = db
        .defs()
        .register(DefinitionInfo::class(names.intern("Box"), core).with_supertypes(vec![any]));
    let t = db.defs().register(DefinitionInfo::type_parameter(
        names.intern("T"),
        Variance::Out,
        0,
        TypeParameterOwner::Classifier(boxed),
    ));
    db.defs().set_type_params(boxed, vec![t]);

    let package = db.defs().package(&[names.intern("bench")]);
    let mut scopes = ScopeArena::new();
    let file = scopes.file_scope(package);
    scopes.add_star_import(file, core);
    (db, scopes, file)
}

/// `Box<Box<...<String>...>>` nested `depth` times.
fn nested_box(syntax: &mut NodeArena, names: &Interner, depth: usize) -> NodeId {
    let mut b = SyntaxBuilder::new(syntax, names);
    let mut reference = b.simple("String");
    for _ in 0..depth {
        reference = b.generic("Box", &[reference]);
    }
    reference
}

fn bench_type_resolution(c: &mut Criterion) {
    let mut group = c.benchmark_group("type_resolution");
    let (db, scopes, file) = setup();

    for &depth in &[1usize, 8, 32] {
        let mut syntax = NodeArena::new();
        let reference = nested_box(&mut syntax, db.names(), depth);

        for (label, options) in [("eager", ResolverOptions::eager()), ("lazy", ResolverOptions::default())] {
            group.bench_with_input(BenchmarkId::new(label, depth), &reference, |b, &reference| {
                b.iter(|| {
                    // A fresh trace per iteration; a reused one would hit the cache.
                    let trace = BindingTrace::new();
                    let resolver = TypeResolver::new(&db, &syntax, &scopes, &trace, &options);
                    let ty = resolver.resolve_type(file, reference, true);
                    black_box(db.force(ty, &resolver))
                })
            });
        }
    }

    group.finish();
}

/// `depth` classes `C0 : C1 : ... : Cn`, each declaring `overloads` members
/// named `run`, plus one extension per class.
fn hierarchy(db: &TypeDatabase, package: DefId, depth: usize, overloads: usize) -> DefId {
    let names = db.names();
    let run = names.intern("run");
    let mut supertype = db.any_type();
    let mut class = db.builtins().any;
    for level in (0..depth).rev() {
        class = db.defs().register(
            DefinitionInfo::class(names.intern(&format!("C{level}")), package)
                .with_supertypes(vec![supertype]),
        );
        let this = db.types().simple(class);
        for index in 0..overloads {
            let flags = if index % 3 == 0 {
                CallableFlags::SYNTHESIZED
            } else {
                CallableFlags::empty()
            };
            db.defs().register_callable(
                CallableInfo::function(run)
                    .in_container(class)
                    .with_dispatch_receiver(this)
                    .with_flags(flags),
            );
        }
        db.defs().register_callable(
            CallableInfo::function(run)
                .in_container(package)
                .with_extension_receiver(this),
        );
        supertype = this;
    }
    class
}

fn bench_prioritization(c: &mut Criterion) {
    let mut group = c.benchmark_group("prioritization");
    let options = ResolverOptions::default();

    for &(depth, overloads) in &[(1usize, 4usize), (8, 4), (8, 32)] {
        let (db, scopes, file) = setup();
        let package = db.defs().package(&[db.names().intern("bench")]);
        let leaf = hierarchy(&db, package, depth, overloads);
        let receiver = ReceiverValue::expression(NodeId(0), db.types().simple(leaf));
        let call = Call::new(NodeId(1)).with_receiver(receiver);
        let run = db.names().intern("run");
        let collectors = CallableCollectors::default();
        let prioritizer =
            TaskPrioritizer::new(&db, &scopes, &NoLazyTypes, &NoSmartCasts, &NeverCancelled, &options);

        group.bench_function(BenchmarkId::new("members", format!("{depth}x{overloads}")), |b| {
            b.iter(|| {
                let tasks = prioritizer
                    .compute_prioritized_tasks(&call, run, file, &collectors)
                    .unwrap_or_default();
                black_box(tasks.len())
            })
        });
    }

    group.finish();
}

criterion_group!(resolve_benches, bench_type_resolution, bench_prioritization);
criterion_main!(resolve_benches);
