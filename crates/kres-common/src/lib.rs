//! Common types and utilities for the kres resolution core.
//!
//! This crate provides foundational types used across all kres crates:
//! - String interning (`Atom`, `Interner`) with pre-interned well-known names
//! - Syntax node identity (`NodeId`)
//! - Diagnostics (`Diagnostic`, codes, message templates)
//! - Centralized limits and thresholds
//! - Cooperative cancellation (`CancellationToken`, `Cancelled`)

// String interning for identifier deduplication
pub mod interner;
pub use interner::{Atom, Interner, names};

// Syntax node identity shared by the syntax model and the binding trace
pub mod node;
pub use node::NodeId;

// Diagnostic data model, codes and message templates
pub mod diagnostics;
pub use diagnostics::{Diagnostic, DiagnosticCategory, DiagnosticRelatedInformation};

// Centralized limits and thresholds
pub mod limits;

// Cooperative cancellation
pub mod cancellation;
pub use cancellation::{CancellationSignal, CancellationToken, Cancelled, NeverCancelled};

// Subscriber setup for test binaries
#[cfg(feature = "test-support")]
pub mod tracing_config;
