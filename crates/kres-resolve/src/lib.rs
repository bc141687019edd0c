//! Type reference resolution and call candidate prioritization.
//!
//! This crate provides:
//! - Lexical scopes, receivers and call sites (`ScopeArena`, `ReceiverValue`, `Call`)
//! - The binding trace that records resolution results and diagnostics
//! - `TypeResolver`: syntax type references to interned types, with lazy
//!   resolution, bound checks and projection checks
//! - `TaskPrioritizer`: every callable a call could bind to, grouped into
//!   ordered resolution tasks
//!
//! The crate emits `tracing` events but never installs a subscriber.

pub mod options;
pub use options::{OptionsError, ResolverOptions};

pub mod scope;
pub use scope::{LexicalScope, ScopeArena, ScopeId, ScopeKind, ScopeView};

pub mod receivers;
pub use receivers::{
    Call, CallKind, ExplicitReceiver, NoSmartCasts, QualifierReceiver, ReceiverKind, ReceiverValue,
    SmartCastMap, SmartCastProvider, UnaryOperator,
};

pub mod binding;
pub use binding::{BindingTrace, LazyTypeRecipe};

pub mod qualified;
pub use qualified::{QualifiedNameResolver, QualifierPart, TypeQualifierResolution};

pub mod type_resolver;
pub use type_resolver::{PossiblyBareType, TypeResolutionContext, TypeResolver};

pub mod candidates;
pub use candidates::{ExplicitReceiverKind, ResolutionCandidate, ResolutionTask};

pub mod task_holder;
pub use task_holder::{PriorityProvider, ResolutionTaskHolder};

pub mod visibility;
pub use visibility::VisibilityChecker;

pub mod priority;
pub use priority::CandidatePriority;

pub mod collectors;
pub use collectors::{
    CallableCollector, CallableCollectors, CallableFilter, FilteredCollector, KindCollector, LookupContext,
};

pub mod prioritizer;
pub use prioritizer::TaskPrioritizer;
