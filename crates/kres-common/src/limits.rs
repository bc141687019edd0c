//! Centralized limits for the resolution core.
//!
//! Recursive walks over type structure and declaration hierarchies are all
//! bounded. When a limit is hit the walk gives up conservatively: type
//! resolution yields an error type, subtype checks answer "not a subtype"
//! and content forcing stops descending.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting of type references resolved on one thread.
///
/// Each nested type argument, nullable wrapper or function parameter type
/// re-enters the resolver. A reference nested this deep is treated as
/// malformed and resolves to the error type.
///
/// ```text
/// List<List<List<List< /* ... 500 levels ... */ >>>>
/// ```
pub const MAX_TYPE_REFERENCE_DEPTH: u32 = 500;

/// Maximum depth of a structural subtype check.
///
/// Bounds are allowed to mention the type being checked, so a check such as
/// `T : Comparable<T>` can loop through supertypes and arguments. At this
/// depth the check answers `false`.
pub const MAX_SUBTYPE_DEPTH: u32 = 100;

/// Maximum number of supertype edges walked when searching a class
/// hierarchy for a given classifier.
pub const MAX_SUPERTYPE_WALK: u32 = 1_000;

/// Maximum depth for forcing the contents of a resolved type.
///
/// Forcing visits arguments and flexible bounds. Lazy cells that are already
/// being forced are skipped, so this only guards against pathological
/// nesting of already-resolved types.
pub const MAX_FORCE_CONTENTS_DEPTH: u32 = 200;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Initial capacity of per-call candidate groups.
pub const CANDIDATE_GROUP_CAPACITY: usize = 8;

/// Number of priority tiers a candidate can be placed in (0 through 3).
pub const PRIORITY_TIER_COUNT: u8 = 4;
