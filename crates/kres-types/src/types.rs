//! Semantic type values.
//!
//! Types are interned: a `TypeId` is a handle into the [`TypeInterner`] and
//! two structurally equal types always share one id. A type is either rigid
//! (classifier plus arguments), flexible (a lower/upper bound pair), an error
//! type, the dynamic type, or a lazy type whose contents are computed on
//! first use.
//!
//! [`TypeInterner`]: crate::intern::TypeInterner

use crate::def::DefId;
use kres_common::Atom;
use serde::Serialize;
use smallvec::SmallVec;

/// Interned type handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The error type with no name and no arguments.
    pub const ERROR: TypeId = TypeId(0);
    /// The single dynamic type.
    pub const DYNAMIC: TypeId = TypeId(1);

    /// First id handed out for user types.
    pub const FIRST_USER: u32 = 2;

    #[inline]
    pub const fn is_intrinsic(self) -> bool {
        self.0 < Self::FIRST_USER
    }
}

/// Identifies a lazy type cell in a lazy type table.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct LazyTypeId(pub u32);

/// Declaration-site or use-site variance.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Default)]
pub enum Variance {
    #[default]
    Invariant,
    In,
    Out,
}

impl Variance {
    /// Keyword as written in source; empty for invariant.
    pub const fn label(self) -> &'static str {
        match self {
            Variance::Invariant => "",
            Variance::In => "in",
            Variance::Out => "out",
        }
    }

    #[inline]
    pub const fn is_invariant(self) -> bool {
        matches!(self, Variance::Invariant)
    }

    /// Whether a use-site projection may produce values (read positions).
    #[inline]
    pub const fn allows_out(self) -> bool {
        !matches!(self, Variance::In)
    }

    /// Whether a use-site projection may consume values (write positions).
    #[inline]
    pub const fn allows_in(self) -> bool {
        !matches!(self, Variance::Out)
    }
}

/// One entry of a type's argument list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeArgument {
    /// `*`: any type, read as the parameter's upper bound.
    Star { upper_bound: TypeId },
    /// `T`, `in T` or `out T`.
    Projection { variance: Variance, ty: TypeId },
}

impl TypeArgument {
    pub const fn invariant(ty: TypeId) -> Self {
        TypeArgument::Projection {
            variance: Variance::Invariant,
            ty,
        }
    }

    /// The projected type; for a star projection its upper bound.
    pub const fn ty(self) -> TypeId {
        match self {
            TypeArgument::Star { upper_bound } => upper_bound,
            TypeArgument::Projection { ty, .. } => ty,
        }
    }

    pub const fn is_star(self) -> bool {
        matches!(self, TypeArgument::Star { .. })
    }

    /// Use-site variance; a star projection reads like `out`.
    pub const fn variance(self) -> Variance {
        match self {
            TypeArgument::Star { .. } => Variance::Out,
            TypeArgument::Projection { variance, .. } => variance,
        }
    }
}

pub type TypeArguments = SmallVec<[TypeArgument; 2]>;

/// A type anchored by a classifier (class, interface, object or type parameter).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RigidType {
    pub classifier: DefId,
    /// One entry per type constructor parameter once resolution completes.
    pub arguments: TypeArguments,
    pub nullable: bool,
    /// Annotation classifiers, in source order.
    pub annotations: SmallVec<[DefId; 1]>,
}

/// Structural content of an interned type.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum TypeData {
    Rigid(RigidType),
    /// Platform type: anything between `lower` and `upper`.
    Flexible { lower: TypeId, upper: TypeId },
    /// Degraded value for anything that failed to resolve. Keeps the written
    /// name and any arguments that did resolve.
    Error { name: Atom, arguments: TypeArguments },
    Dynamic,
    /// Contents computed on first access.
    Lazy(LazyTypeId),
}

impl TypeData {
    pub fn as_rigid(&self) -> Option<&RigidType> {
        match self {
            TypeData::Rigid(rigid) => Some(rigid),
            _ => None,
        }
    }

    pub const fn is_error(&self) -> bool {
        matches!(self, TypeData::Error { .. })
    }

    pub const fn is_flexible(&self) -> bool {
        matches!(self, TypeData::Flexible { .. })
    }

    /// Argument list of a rigid or error type.
    pub fn arguments(&self) -> &[TypeArgument] {
        match self {
            TypeData::Rigid(rigid) => &rigid.arguments,
            TypeData::Error { arguments, .. } => arguments,
            _ => &[],
        }
    }
}
