//! String interner for identifier deduplication.
//!
//! Names are interned into a shared pool and passed around as `u32` handles
//! (`Atom`). Comparisons become integer comparisons instead of string
//! comparisons, and descriptors, scopes and syntax nodes can all refer to the
//! same name without owning a copy of it.
//!
//! A fixed set of well-known names is interned first, in a fixed order, so
//! that their atoms are compile-time constants (see [`names`]).

use rustc_hash::FxHashMap;
use serde::Serialize;
use std::sync::{Arc, PoisonError, RwLock};

/// An interned string identifier.
///
/// Atoms are cheap to copy (just a u32) and can be compared with == in O(1).
/// To get the actual string, use `Interner::resolve(atom)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Default, PartialOrd, Ord)]
pub struct Atom(pub u32);

impl Atom {
    /// A sentinel value representing no atom / empty string.
    pub const NONE: Atom = Atom(0);

    /// Check if this is the empty/none atom.
    #[inline]
    pub fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Get the raw index value.
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Well-known names with stable atoms.
///
/// The order of `WELL_KNOWN` must match the constant values below; the
/// interner asserts this in debug builds when it is constructed.
pub mod names {
    use super::Atom;

    pub const INVOKE: Atom = Atom(1);
    pub const PLUS: Atom = Atom(2);
    pub const MINUS: Atom = Atom(3);
    pub const UNARY_PLUS: Atom = Atom(4);
    pub const UNARY_MINUS: Atom = Atom(5);
    pub const ANY: Atom = Atom(6);
    pub const NOTHING: Atom = Atom(7);
    pub const UNIT: Atom = Atom(8);
    pub const EXTENSION_FUNCTION_TYPE: Atom = Atom(9);
    pub const FLEXIBLE_MARKER: Atom = Atom(10);
    pub const CORE: Atom = Atom(11);
    pub const COMPANION: Atom = Atom(12);
    pub const ERROR: Atom = Atom(13);

    pub(super) const WELL_KNOWN: &[&str] = &[
        "invoke",
        "plus",
        "minus",
        "unaryPlus",
        "unaryMinus",
        "Any",
        "Nothing",
        "Unit",
        "ExtensionFunctionType",
        "ft",
        "core",
        "Companion",
        "<error>",
    ];
}

#[derive(Default)]
struct InternerState {
    map: FxHashMap<Arc<str>, Atom>,
    strings: Vec<Arc<str>>,
}

/// Thread-safe string interner.
///
/// Index 0 is the empty string; the well-known names follow it.
pub struct Interner {
    state: RwLock<InternerState>,
}

impl Interner {
    /// Create a new interner with the empty string and the well-known names
    /// pre-interned.
    pub fn new() -> Self {
        let mut state = InternerState {
            map: FxHashMap::default(),
            strings: Vec::with_capacity(256),
        };
        let empty: Arc<str> = Arc::from("");
        state.strings.push(empty.clone());
        state.map.insert(empty, Atom::NONE);

        for name in names::WELL_KNOWN {
            let atom = Atom(state.strings.len() as u32);
            let owned: Arc<str> = Arc::from(*name);
            state.strings.push(owned.clone());
            state.map.insert(owned, atom);
        }
        debug_assert_eq!(
            state.map.get("invoke").copied(),
            Some(names::INVOKE),
            "well-known names must be interned in declaration order"
        );

        Interner {
            state: RwLock::new(state),
        }
    }

    /// Intern a string, returning its Atom handle.
    /// If the string was already interned, returns the existing Atom.
    pub fn intern(&self, s: &str) -> Atom {
        if s.is_empty() {
            return Atom::NONE;
        }
        {
            let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(&atom) = state.map.get(s) {
                return atom;
            }
        }

        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        // Another thread may have interned it between the two locks.
        if let Some(&atom) = state.map.get(s) {
            return atom;
        }
        let atom = Atom(state.strings.len() as u32);
        let owned: Arc<str> = Arc::from(s);
        state.strings.push(owned.clone());
        state.map.insert(owned, atom);
        atom
    }

    /// Look up an already interned string without interning it.
    pub fn lookup(&self, s: &str) -> Option<Atom> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state.map.get(s).copied()
    }

    /// Resolve an Atom back to its string value.
    /// Returns the empty string if the atom is out of bounds.
    pub fn resolve(&self, atom: Atom) -> Arc<str> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        state
            .strings
            .get(atom.0 as usize)
            .cloned()
            .unwrap_or_else(|| Arc::from(""))
    }

    /// Get the number of interned strings.
    pub fn len(&self) -> usize {
        self.state.read().unwrap_or_else(PoisonError::into_inner).strings.len()
    }

    /// Check if the interner holds nothing beyond the pre-interned names.
    pub fn is_empty(&self) -> bool {
        self.len() <= names::WELL_KNOWN.len() + 1
    }
}

impl Default for Interner {
    fn default() -> Self {
        Self::new()
    }
}
