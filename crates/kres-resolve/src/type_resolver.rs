//! Type reference resolution.
//!
//! Turns a type reference node into a [`TypeId`], given the lexical scope it
//! appears in. Resolution never fails outright: every problem is reported to
//! the [`BindingTrace`] and the result degrades to an error type, so the rest
//! of the declaration can still be analyzed.
//!
//! # Laziness
//!
//! Declarations may mention each other in any order (`class A : Base<A.B>`
//! names its own nested class in its supertype list). When lazy resolution is
//! enabled, a reference resolved outside a bare-type or forced context
//! allocates a lazy cell and returns immediately; the reference is resolved
//! the first time the lazy type is forced through [`LazyTypeResolver`].
//! Forcing a cell from inside its own computation is a cycle and yields the
//! error type.
//!
//! # Argument shape
//!
//! A resolved rigid class type always has exactly one argument per type
//! constructor parameter. Arguments of an inner class that come from the
//! enclosing class and were not written are filled with the enclosing
//! class's own parameters.

use crate::binding::{BindingTrace, LazyTypeRecipe};
use crate::options::ResolverOptions;
use crate::qualified::{QualifiedNameResolver, TypeQualifierResolution};
use crate::scope::{ScopeArena, ScopeId, ScopeKind};
use kres_common::diagnostics::diagnostic_codes;
use kres_common::{Atom, Diagnostic, NodeId};
use kres_syntax::{FunctionTypeData, NodeArena, NodeData, ProjectionKind, node_text};
use kres_types::{
    DefId, DefKind, DepthCounter, ForceOutcome, LazyTypeId, LazyTypeResolver, RecursionProfile,
    TypeArgument, TypeArguments, TypeData, TypeDatabase, TypeId, TypeParameterOwner,
    TypeSubstitution, Variance,
};
use smallvec::SmallVec;
use std::cell::Cell;
use tracing::{debug, trace, warn};

// =============================================================================
// Context and results
// =============================================================================

/// How a type reference is resolved.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeResolutionContext {
    pub scope: ScopeId,
    /// Validate written arguments against declared bounds.
    pub check_bounds: bool,
    /// A class written without arguments may stay bare (supertype lists).
    pub allow_bare_types: bool,
    /// Resolve now even when lazy resolution is enabled.
    pub force_resolve_lazy_types: bool,
}

impl TypeResolutionContext {
    pub const fn new(scope: ScopeId, check_bounds: bool) -> Self {
        Self {
            scope,
            check_bounds,
            allow_bare_types: false,
            force_resolve_lazy_types: false,
        }
    }

    pub const fn allowing_bare_types(mut self) -> Self {
        self.allow_bare_types = true;
        self
    }

    pub const fn forcing_lazy_types(mut self) -> Self {
        self.force_resolve_lazy_types = true;
        self
    }

    /// Context for nested references (arguments, function type parts), where
    /// bare types are never allowed.
    pub const fn no_bare_types(mut self) -> Self {
        self.allow_bare_types = false;
        self
    }
}

/// A resolved type, or a classifier whose arguments are still to be
/// inferred by the caller.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PossiblyBareType {
    Type(TypeId),
    Bare { classifier: DefId, nullable: bool },
}

impl PossiblyBareType {
    pub const fn is_bare(self) -> bool {
        matches!(self, PossiblyBareType::Bare { .. })
    }

    /// The resolved type.
    ///
    /// # Panics
    ///
    /// On a bare type. Bare results only come out of contexts that allow
    /// them, and their callers must complete them first.
    pub fn actual_type(self) -> TypeId {
        match self {
            PossiblyBareType::Type(ty) => ty,
            PossiblyBareType::Bare { classifier, .. } => {
                panic!("bare type of {classifier:?} used where an actual type is required")
            }
        }
    }

    pub fn is_nullable(self, db: &TypeDatabase) -> bool {
        match self {
            PossiblyBareType::Type(ty) => db.types().is_nullable(ty),
            PossiblyBareType::Bare { nullable, .. } => nullable,
        }
    }

    pub fn make_nullable(self, db: &TypeDatabase) -> Self {
        match self {
            PossiblyBareType::Type(ty) => PossiblyBareType::Type(db.types().with_nullability(ty, true)),
            PossiblyBareType::Bare { classifier, .. } => PossiblyBareType::Bare {
                classifier,
                nullable: true,
            },
        }
    }
}

// =============================================================================
// Nesting limit
// =============================================================================

thread_local! {
    static REFERENCE_DEPTH: Cell<u32> = const { Cell::new(0) };
}

/// Counts type references being resolved on the current thread, including
/// those entered through lazy cells.
struct ReferenceDepth;

impl ReferenceDepth {
    fn enter() -> Option<Self> {
        REFERENCE_DEPTH.with(|depth| {
            let current = depth.get();
            if current >= RecursionProfile::TypeReference.max_depth() {
                return None;
            }
            depth.set(current + 1);
            Some(ReferenceDepth)
        })
    }
}

impl Drop for ReferenceDepth {
    fn drop(&mut self) {
        REFERENCE_DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}

// =============================================================================
// TypeResolver
// =============================================================================

pub struct TypeResolver<'a> {
    db: &'a TypeDatabase,
    syntax: &'a NodeArena,
    scopes: &'a ScopeArena,
    trace: &'a BindingTrace,
    options: &'a ResolverOptions,
}

impl<'a> TypeResolver<'a> {
    pub fn new(
        db: &'a TypeDatabase,
        syntax: &'a NodeArena,
        scopes: &'a ScopeArena,
        trace: &'a BindingTrace,
        options: &'a ResolverOptions,
    ) -> Self {
        Self {
            db,
            syntax,
            scopes,
            trace,
            options,
        }
    }

    #[inline]
    pub fn db(&self) -> &'a TypeDatabase {
        self.db
    }

    #[inline]
    pub fn trace(&self) -> &'a BindingTrace {
        self.trace
    }

    // -------------------------------------------------------------------------
    // Entry points
    // -------------------------------------------------------------------------

    /// Resolve a type reference where bare types are not allowed.
    pub fn resolve_type(&self, scope: ScopeId, type_reference: NodeId, check_bounds: bool) -> TypeId {
        self.resolve_type_in(TypeResolutionContext::new(scope, check_bounds), type_reference)
    }

    pub fn resolve_type_in(&self, c: TypeResolutionContext, type_reference: NodeId) -> TypeId {
        assert!(
            !c.allow_bare_types,
            "use resolve_possibly_bare_type when bare types are allowed"
        );
        self.resolve_possibly_bare_type(c, type_reference).actual_type()
    }

    pub fn resolve_possibly_bare_type(
        &self,
        c: TypeResolutionContext,
        type_reference: NodeId,
    ) -> PossiblyBareType {
        if let Some(cached) = self.trace.get_type(type_reference) {
            debug!(node = type_reference.0, "type reference already resolved");
            return PossiblyBareType::Type(cached);
        }

        // Bare types only occur inside expressions, where nothing is lazy.
        if !c.allow_bare_types && !c.force_resolve_lazy_types && self.options.lazy_type_resolution {
            let id = self.trace.lazy_types().allocate(LazyTypeRecipe {
                type_reference,
                context: c,
            });
            let lazy = self.db.types().lazy(id);
            trace!(node = type_reference.0, lazy_id = id.0, "deferred type reference");
            return PossiblyBareType::Type(self.trace.record_type(type_reference, lazy));
        }

        match self.do_resolve(c, type_reference) {
            PossiblyBareType::Type(ty) => {
                PossiblyBareType::Type(self.trace.record_type(type_reference, ty))
            }
            bare => bare,
        }
    }

    /// Resolve only the classifier a user type names.
    pub fn resolve_class(&self, scope: ScopeId, user_type: NodeId) -> Option<DefId> {
        self.resolve_descriptor_for_type(scope, user_type).classifier
    }

    fn do_resolve(&self, c: TypeResolutionContext, type_reference: NodeId) -> PossiblyBareType {
        let Some(_depth) = ReferenceDepth::enter() else {
            warn!(node = type_reference.0, "type reference nested too deeply");
            return PossiblyBareType::Type(TypeId::ERROR);
        };
        let Some(reference) = self.syntax.get_type_reference(type_reference) else {
            return PossiblyBareType::Type(self.named_error_type("No type element"));
        };

        let annotations = self.resolve_annotations(c.scope, &reference.annotations);
        let result = self.resolve_type_element(c, &annotations, reference.type_element);
        self.trace.record_scope(type_reference, c.scope);

        if let PossiblyBareType::Type(ty) = result {
            for argument in self.arguments_of(ty) {
                if !argument.is_star() {
                    self.force_resolve_type_contents(argument.ty());
                }
            }
        }
        result
    }

    fn resolve_annotations(&self, scope: ScopeId, entries: &[NodeId]) -> SmallVec<[DefId; 1]> {
        let c = TypeResolutionContext::new(scope, true).forcing_lazy_types();
        entries
            .iter()
            .filter_map(|&entry| {
                let type_reference = self.syntax.get_annotation_entry(entry)?.type_reference;
                let ty = self.resolve_type_in(c, type_reference);
                let classifier = self.db.types().classifier_of(ty)?;
                (self.db.defs().kind(classifier) == Some(DefKind::AnnotationClass))
                    .then_some(classifier)
            })
            .collect()
    }

    // -------------------------------------------------------------------------
    // Forcing
    // -------------------------------------------------------------------------

    /// Force every lazy type nested in `ty`'s arguments and flexible bounds.
    ///
    /// Only the type's own structure is forced; the declarations its
    /// classifiers belong to are left alone, and so are star projections,
    /// whose bound belongs to the parameter's declaration.
    pub fn force_resolve_type_contents(&self, ty: TypeId) {
        let mut depth = DepthCounter::with_profile(RecursionProfile::ForceContents);
        self.force_contents(ty, &mut depth);
    }

    fn force_contents(&self, ty: TypeId, depth: &mut DepthCounter) {
        if !depth.enter() {
            warn!(ty = ty.0, "type contents nested too deeply to force");
            return;
        }
        let forced = self.db.force(ty, self);
        if let Some(data) = self.db.types().lookup(forced) {
            match &*data {
                TypeData::Flexible { lower, upper } => {
                    self.force_contents(*lower, depth);
                    self.force_contents(*upper, depth);
                }
                other => {
                    for argument in other.arguments() {
                        if !argument.is_star() {
                            self.force_contents(argument.ty(), depth);
                        }
                    }
                }
            }
        }
        depth.leave();
    }

    fn arguments_of(&self, ty: TypeId) -> TypeArguments {
        self.db
            .types()
            .lookup(ty)
            .map(|data| data.arguments().iter().copied().collect())
            .unwrap_or_default()
    }

    /// Resolve a nested reference and force it, so that stored arguments are
    /// never lazy.
    fn resolve_nested(&self, c: TypeResolutionContext, type_reference: NodeId) -> TypeId {
        let ty = self.resolve_type_in(c.no_bare_types(), type_reference);
        self.db.force(ty, self)
    }

    // -------------------------------------------------------------------------
    // Type elements
    // -------------------------------------------------------------------------

    fn resolve_type_element(
        &self,
        c: TypeResolutionContext,
        annotations: &[DefId],
        element: Option<NodeId>,
    ) -> PossiblyBareType {
        let Some(element) = element else {
            return PossiblyBareType::Type(self.named_error_type("No type element"));
        };
        let Some(data) = self.syntax.get(element) else {
            return PossiblyBareType::Type(self.named_error_type("No type element"));
        };

        match data {
            NodeData::UserType(_) => self.resolve_user_type(c, annotations, element),
            NodeData::NullableType(nullable) => {
                let inner = nullable.inner;
                let base = self.resolve_type_element(c, annotations, inner);
                if base.is_nullable(self.db)
                    || inner.is_some_and(|inner| self.syntax.is_nullable_or_dynamic(inner))
                {
                    self.report(element, diagnostic_codes::REDUNDANT_NULLABLE, &[]);
                }
                base.make_nullable(self.db)
            }
            NodeData::FunctionType(function) => {
                PossiblyBareType::Type(self.resolve_function_type(c, annotations, function))
            }
            NodeData::DynamicType => {
                if !self.options.dynamic_types_allowed {
                    self.report(
                        element,
                        diagnostic_codes::UNSUPPORTED,
                        &["Dynamic types are not supported in this context"],
                    );
                }
                PossiblyBareType::Type(TypeId::DYNAMIC)
            }
            NodeData::SelfType => {
                self.report(element, diagnostic_codes::UNSUPPORTED, &["Self-types are not supported"]);
                PossiblyBareType::Type(self.error_type_for(element))
            }
            _ => {
                self.report(
                    element,
                    diagnostic_codes::UNSUPPORTED,
                    &["This syntax is not supported as a type"],
                );
                PossiblyBareType::Type(self.error_type_for(element))
            }
        }
    }

    fn resolve_user_type(
        &self,
        c: TypeResolutionContext,
        annotations: &[DefId],
        user_type: NodeId,
    ) -> PossiblyBareType {
        let resolution = self.resolve_descriptor_for_type(c.scope, user_type);
        let Some(classifier) = resolution.classifier else {
            let arguments = self.resolve_type_projections(c, &[], None, &resolution.all_projections());
            let name = self.text_atom(user_type);
            return PossiblyBareType::Type(self.db.types().error_type(name, arguments));
        };

        if self.db.defs().kind(classifier) == Some(DefKind::TypeParameter) {
            debug_assert_eq!(
                resolution.parts.len(),
                1,
                "a type parameter can only be referenced by its simple name"
            );
            PossiblyBareType::Type(self.resolve_type_for_type_parameter(
                c,
                annotations,
                classifier,
                &resolution,
            ))
        } else {
            self.resolve_type_for_class(c, annotations, classifier, &resolution)
        }
    }

    fn resolve_type_for_type_parameter(
        &self,
        c: TypeResolutionContext,
        annotations: &[DefId],
        type_param: DefId,
        resolution: &TypeQualifierResolution,
    ) -> TypeId {
        let types = self.db.types();
        if let Some(part) = resolution.parts.last() {
            let arguments = self.resolve_type_projections(c, &[], None, &part.projections);
            if !arguments.is_empty() {
                let node = part.type_arguments.unwrap_or(part.expression);
                self.report(node, diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS, &["0"]);
            }
            if let Some(TypeParameterOwner::Classifier(owner)) =
                self.db.defs().type_parameter_data(type_param).map(|d| d.owner)
            {
                self.check_has_outer_class_instance(c.scope, part.expression, owner);
            }
        }

        // With bound checking the bounds are needed now; otherwise they are
        // left for whoever reads the parameter's member scope.
        if c.check_bounds
            && self
                .db
                .upper_bounds_or_default(type_param)
                .into_iter()
                .any(|bound| types.is_error(self.db.force(bound, self)))
        {
            return self.named_error_type("?");
        }
        // Declared parameters have no lower bound, so the parameter type is
        // not nullable unless `?` is written.
        types.with_annotations(types.simple(type_param), annotations)
    }

    fn resolve_type_for_class(
        &self,
        c: TypeResolutionContext,
        annotations: &[DefId],
        class: DefId,
        resolution: &TypeQualifierResolution,
    ) -> PossiblyBareType {
        let types = self.db.types();
        let defs = self.db.defs();
        let all_projections = resolution.all_projections();
        if all_projections.is_empty() && c.allow_bare_types {
            return PossiblyBareType::Bare {
                classifier: class,
                nullable: false,
            };
        }

        let Some(collected) = self.collect_arguments_for_class(class, resolution) else {
            let arguments = self.resolve_type_projections(c, &[], None, &all_projections);
            return PossiblyBareType::Type(types.error_type(defs.name(class), arguments));
        };

        let parameters: SmallVec<[DefId; 4]> = defs
            .constructor_parameters(class)
            .into_iter()
            .map(|param| param.declaration())
            .collect();
        assert!(
            collected.len() <= parameters.len(),
            "collected {} type arguments for {} parameters",
            collected.len(),
            parameters.len()
        );

        let mut arguments = self.resolve_type_projections(c, &parameters, Some(class), &collected);
        // Parameters of enclosing classes used implicitly inside an inner class.
        let written = arguments.len();
        arguments.extend(
            parameters[written..]
                .iter()
                .map(|&param| TypeArgument::invariant(types.simple(param))),
        );
        assert_eq!(arguments.len(), parameters.len(), "argument count after padding");

        if self.db.builtins().is_flexible_marker(class) && arguments.len() == 2 {
            return PossiblyBareType::Type(types.flexible(arguments[0].ty(), arguments[1].ty()));
        }

        let ty = types.with_annotations(types.rigid(class, arguments.clone(), false), annotations);
        if c.check_bounds {
            self.check_bounds(class, &parameters, &arguments, &collected);
        }
        PossiblyBareType::Type(ty)
    }

    /// Match the written argument lists against the class chain, innermost
    /// segment against the referenced class. Returns the projection nodes in
    /// type constructor order, or `None` after reporting a mismatch.
    fn collect_arguments_for_class(
        &self,
        class: DefId,
        resolution: &TypeQualifierResolution,
    ) -> Option<SmallVec<[NodeId; 4]>> {
        let defs = self.db.defs();
        let mut chain: SmallVec<[DefId; 2]> = SmallVec::new();
        let mut current = Some(class);
        while let Some(link) = current {
            chain.push(link);
            current = defs.containing_class(link);
        }

        let reversed: SmallVec<[_; 2]> = resolution.parts.iter().rev().collect();
        let matched = chain.len().min(reversed.len());
        let mut was_static = false;
        let mut result = SmallVec::new();

        for (link, part) in chain.iter().zip(reversed.iter()).take(matched) {
            let declared = defs.declared_type_param_count(*link);
            let expected = if was_static { 0 } else { declared };
            let node = part.type_arguments.unwrap_or(part.expression);

            if was_static && !part.projections.is_empty() && declared > 0 {
                self.report(
                    node,
                    diagnostic_codes::TYPE_ARGUMENTS_FOR_OUTER_CLASS_WHEN_NESTED_REFERENCED,
                    &[],
                );
                return None;
            }
            if part.projections.len() != expected {
                self.report(
                    node,
                    diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS,
                    &[expected.to_string().as_str()],
                );
                return None;
            }
            result.extend(part.projections.iter().copied());
            was_static = was_static || !defs.is_inner(*link);
        }

        // Package segments cannot take arguments.
        for part in &reversed[matched..] {
            if let Some(list) = part.type_arguments {
                self.report(list, diagnostic_codes::WRONG_NUMBER_OF_TYPE_ARGUMENTS, &["0"]);
                return None;
            }
        }
        Some(result)
    }

    fn resolve_type_projections(
        &self,
        c: TypeResolutionContext,
        parameters: &[DefId],
        owner: Option<DefId>,
        projections: &[NodeId],
    ) -> TypeArguments {
        projections
            .iter()
            .enumerate()
            .map(|(index, &node)| {
                let Some(projection) = self.syntax.get_type_projection(node) else {
                    return TypeArgument::invariant(TypeId::ERROR);
                };
                let parameter = parameters.get(index).copied();
                let variance = match projection.kind {
                    ProjectionKind::Star => {
                        return match parameter {
                            Some(param) => TypeArgument::Star {
                                upper_bound: self.db.star_upper_bound(param),
                            },
                            None => TypeArgument::Projection {
                                variance: Variance::Out,
                                ty: self.named_error_type("*"),
                            },
                        };
                    }
                    ProjectionKind::None => Variance::Invariant,
                    ProjectionKind::In => Variance::In,
                    ProjectionKind::Out => Variance::Out,
                };

                let ty = projection
                    .type_reference
                    .map_or(TypeId::ERROR, |reference| self.resolve_nested(c, reference));
                if let (Some(param), Some(owner)) = (parameter, owner) {
                    let declared = self.db.defs().variance(param);
                    if !variance.is_invariant() && !declared.is_invariant() {
                        let code = if variance == declared {
                            diagnostic_codes::REDUNDANT_PROJECTION
                        } else {
                            diagnostic_codes::CONFLICTING_PROJECTION
                        };
                        let owner_name = self.db.names().resolve(self.db.defs().name(owner));
                        self.report(node, code, &[&*owner_name]);
                    }
                }
                TypeArgument::Projection { variance, ty }
            })
            .collect()
    }

    fn check_bounds(
        &self,
        class: DefId,
        parameters: &[DefId],
        arguments: &[TypeArgument],
        projections: &[NodeId],
    ) {
        let substitution = TypeSubstitution::for_arguments(self.db, class, arguments);
        for (index, (&param, argument)) in parameters.iter().zip(arguments).enumerate() {
            // Padded and star arguments were not written as types.
            let Some(type_reference) = projections
                .get(index)
                .and_then(|&node| self.syntax.get_type_projection(node))
                .and_then(|projection| projection.type_reference)
            else {
                continue;
            };
            let argument = argument.ty();
            for bound in self.db.defs().upper_bounds(param) {
                let bound = substitution.apply(self.db, self.db.force(bound, self));
                if !self.db.is_subtype(argument, bound, self) {
                    let expected = self.db.format(bound);
                    let found = self.db.format(argument);
                    self.report(
                        type_reference,
                        diagnostic_codes::UPPER_BOUND_VIOLATED,
                        &[expected.as_str(), found.as_str()],
                    );
                }
            }
        }
    }

    // -------------------------------------------------------------------------
    // Function types
    // -------------------------------------------------------------------------

    fn resolve_function_type(
        &self,
        c: TypeResolutionContext,
        annotations: &[DefId],
        function: &FunctionTypeData,
    ) -> TypeId {
        let receiver = function
            .receiver
            .map(|reference| self.resolve_nested(c, reference));

        for &parameter in &function.parameters {
            self.check_parameter_in_function_type(parameter);
        }
        let parameters: SmallVec<[TypeId; 4]> = function
            .parameters
            .iter()
            .map(|&parameter| {
                self.syntax
                    .get_function_type_parameter(parameter)
                    .and_then(|data| data.type_reference)
                    .map_or(TypeId::ERROR, |reference| self.resolve_nested(c, reference))
            })
            .collect();

        let return_type = function
            .return_type
            .map_or_else(|| self.db.unit_type(), |reference| self.resolve_nested(c, reference));
        self.db
            .function_type(receiver, &parameters, return_type, annotations)
    }

    /// Only the type of a function type parameter means anything.
    fn check_parameter_in_function_type(&self, parameter: NodeId) {
        let Some(data) = self.syntax.get_function_type_parameter(parameter) else {
            return;
        };
        if let Some(default_value) = data.default_value {
            self.report(
                default_value,
                diagnostic_codes::UNSUPPORTED,
                &["default value of parameter in function type"],
            );
        }
        if data.name.is_some() {
            for &annotation in &data.annotations {
                self.report(
                    annotation,
                    diagnostic_codes::UNSUPPORTED,
                    &["annotation on parameter in function type"],
                );
            }
        }
        for &modifier in &data.modifiers {
            self.report(
                modifier,
                diagnostic_codes::UNSUPPORTED,
                &["modifier on parameter in function type"],
            );
        }
        if let Some(keyword) = data.val_or_var {
            self.report(
                keyword,
                diagnostic_codes::UNSUPPORTED,
                &["val or var on parameter in function type"],
            );
        }
    }

    // -------------------------------------------------------------------------
    // Names
    // -------------------------------------------------------------------------

    fn resolve_descriptor_for_type(&self, scope: ScopeId, user_type: NodeId) -> TypeQualifierResolution {
        // Arguments on qualifier segments are resolved up front so that their
        // own errors are reported even if the name does not resolve.
        let segments = self.syntax.user_type_segments(user_type);
        if let Some((_, qualifiers)) = segments.split_last() {
            for &segment in qualifiers {
                for &projection in self.syntax.user_type_arguments(segment) {
                    if let Some(reference) = self
                        .syntax
                        .get_type_projection(projection)
                        .and_then(|p| p.type_reference)
                    {
                        let ty = self.resolve_type(scope, reference, true);
                        self.force_resolve_type_contents(ty);
                    }
                }
            }
        }

        let result = QualifiedNameResolver::new(self.db, self.syntax, self.scopes, self.trace)
            .resolve_for_type(scope, user_type);
        if let Some(classifier) = result.classifier {
            self.report_platform_class_mapped_to_builtin(user_type, classifier);
        }
        result
    }

    fn report_platform_class_mapped_to_builtin(&self, node: NodeId, classifier: DefId) {
        if !self.options.platform_class_mapping_check {
            return;
        }
        if let Some(builtin) = self.db.defs().platform_builtin(classifier) {
            let builtin = self.db.names().resolve(builtin);
            self.report(
                node,
                diagnostic_codes::PLATFORM_CLASS_MAPPED_TO_BUILTIN,
                &[&*builtin],
            );
        }
    }

    /// A class's type parameter can only be used where an instance of that
    /// class is in scope: not from a static nested class.
    fn check_has_outer_class_instance(&self, scope: ScopeId, reference: NodeId, target: DefId) -> bool {
        let defs = self.db.defs();
        let Some(mut class) = self
            .scopes
            .parents_with_self(scope)
            .find(|(_, s)| s.kind == ScopeKind::Class)
            .and_then(|(_, s)| s.owner)
        else {
            return true;
        };
        if !self.is_inside_outer_class_or_subclass(class, target) {
            return true;
        }
        loop {
            if self.db.is_subclass(class, target, self) {
                return true;
            }
            let outer = defs.containing_class(class);
            if outer.is_some() && !defs.is_inner(class) {
                let name = self.db.names().resolve(defs.name(class));
                self.report(
                    reference,
                    diagnostic_codes::INACCESSIBLE_OUTER_CLASS_EXPRESSION,
                    &[&*name],
                );
                return false;
            }
            match outer {
                Some(next) => class = next,
                None => return true,
            }
        }
    }

    fn is_inside_outer_class_or_subclass(&self, nested: DefId, outer: DefId) -> bool {
        let mut current = Some(nested);
        while let Some(class) = current {
            if self.db.is_subclass(class, outer, self) {
                return true;
            }
            current = self.db.defs().containing_class(class);
        }
        false
    }

    // -------------------------------------------------------------------------
    // Helpers
    // -------------------------------------------------------------------------

    fn report(&self, node: NodeId, code: u32, args: &[&str]) {
        self.trace.report(Diagnostic::from_code(node, code, args));
    }

    fn named_error_type(&self, name: &str) -> TypeId {
        self.db
            .types()
            .error_type(self.db.names().intern(name), TypeArguments::new())
    }

    fn text_atom(&self, node: NodeId) -> Atom {
        self.db
            .names()
            .intern(&node_text(self.syntax, self.db.names(), node))
    }

    fn error_type_for(&self, node: NodeId) -> TypeId {
        self.db
            .types()
            .error_type(self.text_atom(node), TypeArguments::new())
    }
}

impl LazyTypeResolver for TypeResolver<'_> {
    fn resolve_lazy(&self, id: LazyTypeId, _db: &TypeDatabase) -> TypeId {
        let outcome = self.trace.lazy_types().force(id, |recipe| {
            self.do_resolve(recipe.context, recipe.type_reference)
                .actual_type()
        });
        match outcome {
            ForceOutcome::Computed(ty) | ForceOutcome::Cached(ty) => ty,
            ForceOutcome::Cycle => {
                warn!(lazy_id = id.0, "type reference depends on its own resolution");
                TypeId::ERROR
            }
            ForceOutcome::Missing => {
                warn!(lazy_id = id.0, "lazy type allocated by another trace");
                TypeId::ERROR
            }
        }
    }
}
