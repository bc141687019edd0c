//! Call candidate prioritization.
//!
//! For a call site and a name, [`TaskPrioritizer`] enumerates every callable
//! the call could bind to, pairs each with the receivers it would use, and
//! orders the result into [`ResolutionTask`]s. Lookup steps run in a fixed
//! order, so ties inside a priority tier go to the earlier step:
//!
//! - explicit receiver: members (operator/infix-filtered first), member
//!   extensions of implicit receivers, then scope extensions
//! - no receiver: locals, then each implicit receiver as above, static
//!   inheritance, top-level and imported callables, then static members of
//!   implicit receivers
//! - qualifier: the qualifier's own scope, then its class object
//! - `invoke`: the invoked value as dispatch receiver
//!
//! The result is deterministic for a given store and scope chain.

use crate::candidates::{ExplicitReceiverKind, ResolutionCandidate, ResolutionTask};
use crate::collectors::{CallableCollector, CallableCollectors, CallableFilter, LookupContext};
use crate::options::ResolverOptions;
use crate::priority::CandidatePriority;
use crate::receivers::{Call, ExplicitReceiver, QualifierReceiver, ReceiverKind, ReceiverValue, SmartCastProvider};
use crate::scope::{ScopeArena, ScopeId, ScopeView};
use crate::task_holder::ResolutionTaskHolder;
use crate::visibility::VisibilityChecker;
use kres_common::{Atom, CancellationSignal, Cancelled};
use kres_types::{
    CallableFlags, CallableId, CallableInfo, CallableKind, DefKind, LazyTypeResolver, TypeArgument,
    TypeArguments, TypeData, TypeDatabase, TypeId,
};
use smallvec::SmallVec;
use std::sync::Arc;
use tracing::{debug, trace};

type Holder<'a> = ResolutionTaskHolder<CandidatePriority<'a>>;

/// A receiver with every type it is known to have at the call site.
#[derive(Clone, Debug)]
struct ReceiverWithTypes {
    value: ReceiverValue,
    types: SmallVec<[TypeId; 2]>,
}

/// What one prioritization run looks up.
#[derive(Clone)]
struct Lookup<'c> {
    call: &'c Call,
    name: Atom,
    view: ScopeView,
    collectors: CallableCollectors,
}

impl Lookup<'_> {
    fn with_view(&self, view: ScopeView) -> Self {
        Self { view, ..self.clone() }
    }

    fn with_name(&self, name: Atom) -> Self {
        Self { name, ..self.clone() }
    }

    fn with_collectors(&self, collectors: CallableCollectors) -> Self {
        Self {
            collectors,
            ..self.clone()
        }
    }
}

/// `kind` for a receiver slot, downgraded when the receiver was implicit.
const fn receiver_kind(kind: ExplicitReceiverKind, is_explicit: bool) -> ExplicitReceiverKind {
    if is_explicit {
        kind
    } else {
        ExplicitReceiverKind::NoExplicitReceiver
    }
}

fn operator_filter() -> CallableFilter {
    Arc::new(|info: &CallableInfo| {
        info.kind == CallableKind::Function && info.flags.contains(CallableFlags::OPERATOR)
    })
}

fn infix_filter() -> CallableFilter {
    Arc::new(|info: &CallableInfo| {
        info.kind == CallableKind::Function && info.flags.contains(CallableFlags::INFIX)
    })
}

pub struct TaskPrioritizer<'a> {
    db: &'a TypeDatabase,
    scopes: &'a ScopeArena,
    lazy: &'a dyn LazyTypeResolver,
    smart_casts: &'a dyn SmartCastProvider,
    cancel: &'a dyn CancellationSignal,
    options: &'a ResolverOptions,
}

impl<'a> TaskPrioritizer<'a> {
    pub fn new(
        db: &'a TypeDatabase,
        scopes: &'a ScopeArena,
        lazy: &'a dyn LazyTypeResolver,
        smart_casts: &'a dyn SmartCastProvider,
        cancel: &'a dyn CancellationSignal,
        options: &'a ResolverOptions,
    ) -> Self {
        Self {
            db,
            scopes,
            lazy,
            smart_casts,
            cancel,
            options,
        }
    }

    fn lookup_context(&self) -> LookupContext<'a> {
        LookupContext::new(self.db, self.scopes, self.lazy)
    }

    fn holder(&self, call: &Call, scope: ScopeId) -> Holder<'a> {
        let visibility = VisibilityChecker::new(self.db, self.scopes, self.lazy);
        ResolutionTaskHolder::new(CandidatePriority::new(
            self.db,
            visibility,
            scope,
            call.explicit_receiver.exists(),
        ))
    }

    // =========================================================================
    // Entry points
    // =========================================================================

    /// Prioritized tasks for calling `name` at `call` from `scope`.
    ///
    /// Returns `Err(Cancelled)` if the cancellation signal fires before the
    /// lookup finishes; no partial result is returned.
    pub fn compute_prioritized_tasks(
        &self,
        call: &Call,
        name: Atom,
        scope: ScopeId,
        collectors: &CallableCollectors,
    ) -> Result<Vec<ResolutionTask>, Cancelled> {
        let mut holder = self.holder(call, scope);
        let lookup = Lookup {
            call,
            name,
            view: ScopeView::Lexical(scope),
            collectors: collectors.clone(),
        };
        debug!(
            name = %self.db.names().resolve(name),
            scope = scope.0,
            receiver = ?call.explicit_receiver,
            "compute_prioritized_tasks"
        );

        match call.explicit_receiver {
            ExplicitReceiver::Qualifier(qualifier) => {
                self.do_compute_tasks(&mut holder, None, &lookup.with_view(ScopeView::Qualified(qualifier.target)))?;
                self.compute_tasks_for_class_object(&mut holder, qualifier, &lookup)?;
            }
            explicit => {
                let receiver = explicit.value();
                self.do_compute_tasks(&mut holder, receiver, &lookup)?;
                if self.options.unary_operator_migration {
                    if let Some(legacy) = call.legacy_unary_name(name) {
                        trace!(legacy = %self.db.names().resolve(legacy), "unary operator fallback");
                        self.do_compute_tasks(&mut holder, receiver, &lookup.with_name(legacy))?;
                    }
                }
            }
        }
        Ok(holder.into_tasks())
    }

    /// Prioritize candidates that were found elsewhere, as a single group.
    pub fn compute_prioritized_tasks_from_candidates(
        &self,
        call: &Call,
        scope: ScopeId,
        candidates: impl IntoIterator<Item = ResolutionCandidate>,
    ) -> Vec<ResolutionTask> {
        let mut holder = self.holder(call, scope);
        holder.add_candidates(candidates);
        holder.into_tasks()
    }

    /// Pair each descriptor with the innermost implicit receiver of `view`
    /// that can dispatch it. Descriptors with a dispatch receiver that no
    /// implicit receiver satisfies are dropped.
    pub fn convert_with_implied_this(
        &self,
        view: ScopeView,
        extension_receiver: Option<ReceiverValue>,
        descriptors: &[CallableId],
        kind: ExplicitReceiverKind,
    ) -> Vec<ResolutionCandidate> {
        let implicit = self.scopes.implicit_receivers(view);
        descriptors
            .iter()
            .filter_map(|&id| {
                let required = self.db.defs().with_callable(id, |info| info.dispatch_receiver)?;
                let dispatch = match required {
                    None => None,
                    Some(required) => {
                        let erased = self.erase_arguments(required);
                        let bound = implicit
                            .iter()
                            .find(|receiver| self.db.is_subtype(receiver.ty, erased, self.lazy));
                        if bound.is_none() {
                            trace!(callable = id.0, "no implicit receiver for member");
                        }
                        Some(*bound?)
                    }
                };
                Some(
                    ResolutionCandidate::new(id, kind)
                        .with_dispatch_receiver(dispatch)
                        .with_extension_receiver(extension_receiver),
                )
            })
            .collect()
    }

    /// `C<A, B>` as `C<*, *>`.
    fn erase_arguments(&self, ty: TypeId) -> TypeId {
        let forced = self.db.force(ty, self.lazy);
        let types = self.db.types();
        let Some(data) = types.lookup(forced) else {
            return forced;
        };
        let TypeData::Rigid(rigid) = &*data else {
            return forced;
        };
        if rigid.arguments.is_empty() {
            return forced;
        }
        let arguments: TypeArguments = self
            .db
            .defs()
            .constructor_parameters(rigid.classifier)
            .into_iter()
            .map(|param| TypeArgument::Star {
                upper_bound: self.db.star_upper_bound(param.declaration()),
            })
            .collect();
        types.rigid(rigid.classifier, arguments, rigid.nullable)
    }

    fn with_types(&self, value: ReceiverValue) -> ReceiverWithTypes {
        ReceiverWithTypes {
            value,
            types: self.smart_casts.smart_cast_variants(&value),
        }
    }

    // =========================================================================
    // Qualifiers
    // =========================================================================

    /// The value a qualifier denotes when used as a receiver: the companion
    /// of a class, or the object or enum entry itself. An enum entry's value
    /// has the type of its enum class.
    fn class_object_receiver(&self, qualifier: QualifierReceiver) -> Option<ReceiverValue> {
        let defs = self.db.defs();
        let target = qualifier.target;
        let kind = defs.kind(target)?;
        let object = if kind.is_singleton() {
            target
        } else if kind.is_class_like() {
            defs.companion(target)?
        } else {
            return None;
        };
        let ty = if kind == DefKind::EnumEntry {
            self.db.default_type(defs.container(object)?)
        } else {
            self.db.types().simple(object)
        };
        Some(ReceiverValue::new(ReceiverKind::ClassObject(object), ty))
    }

    fn compute_tasks_for_class_object(
        &self,
        holder: &mut Holder<'a>,
        qualifier: QualifierReceiver,
        lookup: &Lookup<'_>,
    ) -> Result<(), Cancelled> {
        let Some(receiver) = self.class_object_receiver(qualifier) else {
            return Ok(());
        };
        let defs = self.db.defs();
        let kind = defs.kind(qualifier.target);
        // Through a companion, constructors and nested objects of the class
        // were already found by the qualifier's own scope.
        let filter: Option<CallableFilter> = if defs.companion(qualifier.target).is_some() {
            Some(Arc::new(|info: &CallableInfo| {
                !matches!(info.kind, CallableKind::Constructor | CallableKind::FakeObject)
            }))
        } else if kind == Some(DefKind::EnumEntry) {
            Some(Arc::new(|info: &CallableInfo| info.kind != CallableKind::FakeObject))
        } else {
            None
        };
        let lookup = match filter {
            Some(filter) => lookup.with_collectors(lookup.collectors.filtered(filter)),
            None => lookup.clone(),
        };
        self.do_compute_tasks(holder, Some(receiver), &lookup)
    }

    // =========================================================================
    // Lookup steps
    // =========================================================================

    fn do_compute_tasks(
        &self,
        holder: &mut Holder<'a>,
        receiver: Option<ReceiverValue>,
        lookup: &Lookup<'_>,
    ) -> Result<(), Cancelled> {
        self.cancel.check_cancelled()?;
        let explicit = receiver.map(|value| self.with_types(value));
        let implicit = self.scopes.implicit_receivers(lookup.view);

        if let Some(variable) = lookup.call.dispatch_receiver {
            self.add_candidates_for_invoke(holder, variable, explicit.as_ref(), &implicit, lookup);
            return Ok(());
        }
        match explicit {
            Some(explicit) => {
                self.add_candidates_for_explicit_receiver(holder, &explicit, &implicit, lookup, true);
                self.add_members(holder, &explicit, lookup, true, true, None);
            }
            None => self.add_candidates_for_no_receiver(holder, &implicit, lookup),
        }
        Ok(())
    }

    fn add_candidates_for_explicit_receiver(
        &self,
        holder: &mut Holder<'a>,
        explicit: &ReceiverWithTypes,
        implicit: &[ReceiverValue],
        lookup: &Lookup<'_>,
        is_explicit: bool,
    ) {
        let is_dynamic = self.db.types().is_dynamic(explicit.value.ty);
        if lookup.call.kind.is_convention() {
            self.add_filtered_candidates(holder, explicit, implicit, lookup, is_explicit, &operator_filter());
        }
        if lookup.call.kind.is_infix() {
            self.add_filtered_candidates(holder, explicit, implicit, lookup, is_explicit, &infix_filter());
        }
        self.add_members(holder, explicit, lookup, false, is_explicit, None);
        if is_dynamic {
            self.add_candidates_for_dynamic_receiver(holder, explicit, implicit, lookup, is_explicit);
        } else {
            self.add_extension_candidates(holder, explicit, implicit, lookup, is_explicit, None);
        }
    }

    /// Operator or infix members and extensions, ahead of everything else.
    /// Skipped when a receiver type failed to resolve.
    fn add_filtered_candidates(
        &self,
        holder: &mut Holder<'a>,
        explicit: &ReceiverWithTypes,
        implicit: &[ReceiverValue],
        lookup: &Lookup<'_>,
        is_explicit: bool,
        filter: &CallableFilter,
    ) {
        let types = self.db.types();
        if explicit
            .types
            .iter()
            .any(|&ty| types.is_error(self.db.force(ty, self.lazy)))
        {
            return;
        }
        self.add_members(holder, explicit, lookup, false, is_explicit, Some(filter));
        if !types.is_dynamic(explicit.value.ty) {
            self.add_extension_candidates(holder, explicit, implicit, lookup, is_explicit, Some(filter));
        }
    }

    fn apply_filter(&self, ids: Vec<CallableId>, filter: Option<&CallableFilter>) -> Vec<CallableId> {
        let Some(filter) = filter else {
            return ids;
        };
        ids.into_iter()
            .filter(|&id| self.db.defs().with_callable(id, |info| filter(info)) == Some(true))
            .collect()
    }

    /// Members of every known type of `explicit`, one group per collector.
    fn add_members(
        &self,
        holder: &mut Holder<'a>,
        explicit: &ReceiverWithTypes,
        lookup: &Lookup<'_>,
        static_members: bool,
        is_explicit: bool,
        filter: Option<&CallableFilter>,
    ) {
        let cx = self.lookup_context();
        let kind = receiver_kind(ExplicitReceiverKind::DispatchReceiver, is_explicit);
        for collector in lookup.collectors.iter() {
            let mut group = Vec::new();
            for &ty in &explicit.types {
                let found = if static_members {
                    collector.static_members_by_name(&cx, ty, lookup.name)
                } else {
                    collector.members_by_name(&cx, ty, lookup.name)
                };
                let dispatch = match explicit.value.class_receiver() {
                    Some(class) if ty != explicit.value.ty => {
                        ReceiverValue::new(ReceiverKind::CastClass(class), ty)
                    }
                    _ => explicit.value,
                };
                group.extend(
                    self.apply_filter(found, filter)
                        .into_iter()
                        .map(|id| ResolutionCandidate::new(id, kind).with_dispatch_receiver(Some(dispatch))),
                );
            }
            holder.add_candidates(group);
        }
    }

    /// Member extensions of each implicit receiver, then scope extensions,
    /// with `explicit` as the extension receiver.
    fn add_extension_candidates(
        &self,
        holder: &mut Holder<'a>,
        explicit: &ReceiverWithTypes,
        implicit: &[ReceiverValue],
        lookup: &Lookup<'_>,
        is_explicit: bool,
        filter: Option<&CallableFilter>,
    ) {
        let cx = self.lookup_context();
        let kind = receiver_kind(ExplicitReceiverKind::ExtensionReceiver, is_explicit);
        for collector in lookup.collectors.iter() {
            for &dispatch in implicit {
                self.add_member_extension_candidates(holder, dispatch, explicit, collector, lookup, kind);
            }
            let extensions = self.apply_filter(collector.extensions_by_name(&cx, lookup.view, lookup.name), filter);
            holder.add_candidates(self.convert_with_implied_this(
                lookup.view,
                Some(explicit.value),
                &extensions,
                kind,
            ));
        }
    }

    fn add_member_extension_candidates(
        &self,
        holder: &mut Holder<'a>,
        dispatch: ReceiverValue,
        receiver_parameter: &ReceiverWithTypes,
        collector: &dyn CallableCollector,
        lookup: &Lookup<'_>,
        kind: ExplicitReceiverKind,
    ) {
        let cx = self.lookup_context();
        let found = collector.member_extensions_by_name(&cx, dispatch.ty, lookup.name);
        holder.add_candidates(found.into_iter().map(|id| {
            ResolutionCandidate::new(id, kind)
                .with_dispatch_receiver(Some(dispatch))
                .with_extension_receiver(Some(receiver_parameter.value))
        }));
    }

    /// Extensions declared on `dynamic`, then the synthesized dynamic
    /// members.
    fn add_candidates_for_dynamic_receiver(
        &self,
        holder: &mut Holder<'a>,
        explicit: &ReceiverWithTypes,
        implicit: &[ReceiverValue],
        lookup: &Lookup<'_>,
        is_explicit: bool,
    ) {
        let only_dynamic = lookup.with_collectors(lookup.collectors.only_dynamic_receivers());
        self.add_extension_candidates(holder, explicit, implicit, &only_dynamic, is_explicit, None);

        let cx = self.lookup_context();
        let call = lookup.call;
        // `invoke` looked up on a dynamic value without arguments never
        // means a property.
        let properties = !(call.dispatch_receiver.is_some() && !call.has_argument_list);
        let view = ScopeView::Dynamic { properties };
        let kind = receiver_kind(ExplicitReceiverKind::DispatchReceiver, is_explicit);
        let group: Vec<ResolutionCandidate> = lookup
            .collectors
            .iter()
            .flat_map(|collector| collector.non_extensions_by_name(&cx, view, lookup.name))
            .map(|id| ResolutionCandidate::new(id, kind).with_dispatch_receiver(Some(explicit.value)))
            .collect();
        holder.add_candidates(group);
    }

    fn add_candidates_for_no_receiver(
        &self,
        holder: &mut Holder<'a>,
        implicit: &[ReceiverValue],
        lookup: &Lookup<'_>,
    ) {
        let cx = self.lookup_context();
        let kind = ExplicitReceiverKind::NoExplicitReceiver;

        for collector in lookup.collectors.iter() {
            let locals = collector.local_non_extensions_by_name(&cx, lookup.view, lookup.name);
            holder.add_candidates(self.convert_with_implied_this(lookup.view, None, &locals, kind));
        }

        let implicit_with_types: Vec<ReceiverWithTypes> =
            implicit.iter().map(|&receiver| self.with_types(receiver)).collect();
        for receiver in &implicit_with_types {
            self.add_candidates_for_explicit_receiver(holder, receiver, implicit, lookup, false);
        }

        for collector in lookup.collectors.iter() {
            let inherited = collector.static_inheritance_by_name(&cx, lookup.view, lookup.name);
            holder.add_candidates(self.convert_with_implied_this(lookup.view, None, &inherited, kind));
        }

        // Locals were added first; anything else reachable by simple name
        // comes here.
        let qualified = matches!(lookup.view, ScopeView::Qualified(_));
        for collector in lookup.collectors.iter() {
            let found: Vec<CallableId> = collector
                .non_extensions_by_name(&cx, lookup.view, lookup.name)
                .into_iter()
                .filter(|&id| {
                    qualified || self.db.defs().with_callable(id, |info| !info.is_local()) == Some(true)
                })
                .collect();
            holder.add_candidates(self.convert_with_implied_this(lookup.view, None, &found, kind));
        }

        for receiver in &implicit_with_types {
            self.add_members(holder, receiver, lookup, true, false, None);
        }
    }

    /// `foo()` where `foo` is a value: look up `invoke` with the value as
    /// dispatch receiver.
    fn add_candidates_for_invoke(
        &self,
        holder: &mut Holder<'a>,
        variable: ReceiverValue,
        explicit: Option<&ReceiverWithTypes>,
        implicit: &[ReceiverValue],
        lookup: &Lookup<'_>,
    ) {
        match explicit {
            // `a.foo()`: `a` is the extension receiver of a member extension
            // `invoke` on `foo`.
            Some(explicit) => {
                for collector in lookup.collectors.iter() {
                    self.add_member_extension_candidates(
                        holder,
                        variable,
                        explicit,
                        collector,
                        lookup,
                        ExplicitReceiverKind::BothReceivers,
                    );
                }
            }
            None => {
                let variable_with_types = self.with_types(variable);
                self.add_candidates_for_explicit_receiver(holder, &variable_with_types, implicit, lookup, true);
                for &receiver in implicit {
                    let receiver = self.with_types(receiver);
                    for collector in lookup.collectors.iter() {
                        self.add_member_extension_candidates(
                            holder,
                            variable,
                            &receiver,
                            collector,
                            lookup,
                            ExplicitReceiverKind::DispatchReceiver,
                        );
                    }
                }
            }
        }
    }
}
