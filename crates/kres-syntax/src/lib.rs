//! Syntax model for type references.
//!
//! The resolution core does not parse source text. A front end lowers its
//! tree into a [`NodeArena`] holding the handful of node shapes the type
//! resolver reads: type references, user types, nullable and function types,
//! type argument lists, projections, annotation entries and function type
//! parameters. Every node is addressed by a [`NodeId`] so that resolved
//! types, reference targets and diagnostics can be keyed by it.

pub mod node;
pub use node::*;

pub mod arena;
pub use arena::NodeArena;

pub mod builder;
pub use builder::SyntaxBuilder;

pub mod printer;
pub use printer::node_text;

pub use kres_common::NodeId;
