//! Semantic type model for the kres resolution core.
//!
//! This crate provides:
//! - Interned types (`TypeId`, `TypeData`, `TypeInterner`)
//! - The declaration table (`DefinitionStore`: packages, classifiers, type
//!   parameters, callables) and the built-in classifiers
//! - Lazy type cells with same-thread cycle detection (`LazyTypeTable`)
//! - Recursion guards, type substitution, nominal subtyping and formatting
//!
//! Resolution of syntax into these values lives in `kres-resolve`.

pub mod types;
pub use types::*;

pub mod intern;
pub use intern::TypeInterner;

pub mod def;
pub use def::{
    CallableFlags, CallableId, CallableInfo, CallableKind, DefId, DefKind, DefinitionInfo,
    DefinitionStore, TypeParamRef, TypeParameterData, TypeParameterOwner, Visibility,
};

pub mod builtins;
pub use builtins::BuiltIns;

pub mod lazy;
pub use lazy::{ForceOutcome, LazyCellState, LazyTypeTable};

pub mod recursion;
pub use recursion::{DepthCounter, RecursionGuard, RecursionProfile, RecursionResult};

pub mod substitute;
pub use substitute::TypeSubstitution;

pub mod subtype;
pub use subtype::SubtypeChecker;

pub mod format;
pub use format::TypeFormatter;

pub mod db;
pub use db::{LazyTypeResolver, NoLazyTypes, TypeDatabase};

#[cfg(test)]
#[path = "../tests/subtype_tests.rs"]
mod subtype_tests;

#[cfg(test)]
#[path = "../tests/lazy_tests.rs"]
mod lazy_tests;
