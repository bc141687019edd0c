//! Receivers and call sites.

use kres_common::{Atom, NodeId};
use kres_types::{CallableId, DefId, TypeDatabase, TypeId};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

/// Where a receiver value comes from.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ReceiverKind {
    /// An expression written at the call site.
    Expression(NodeId),
    /// `this` of an enclosing class or object.
    ImplicitClass(DefId),
    /// `this` of an enclosing extension function or lambda with receiver.
    ImplicitExtension(NodeId),
    /// An implicit class receiver seen through one of its smart cast types.
    CastClass(DefId),
    /// Companion object, object or enum entry reached through its qualifier.
    ClassObject(DefId),
    /// The variable whose value is invoked, in `foo()` where `foo` is a value.
    Variable(CallableId),
}

/// A receiver together with its static type.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ReceiverValue {
    pub kind: ReceiverKind,
    pub ty: TypeId,
}

impl ReceiverValue {
    pub const fn new(kind: ReceiverKind, ty: TypeId) -> Self {
        Self { kind, ty }
    }

    pub const fn expression(node: NodeId, ty: TypeId) -> Self {
        Self::new(ReceiverKind::Expression(node), ty)
    }

    pub fn implicit_class(db: &TypeDatabase, class: DefId) -> Self {
        Self::new(ReceiverKind::ImplicitClass(class), db.default_type(class))
    }

    pub const fn variable(variable: CallableId, ty: TypeId) -> Self {
        Self::new(ReceiverKind::Variable(variable), ty)
    }

    /// An implicit class receiver, which member lookups may view through a
    /// cast receiver.
    pub const fn class_receiver(&self) -> Option<DefId> {
        match self.kind {
            ReceiverKind::ImplicitClass(class) => Some(class),
            _ => None,
        }
    }
}

/// A package or classifier name used as the receiver of a call:
/// `Color.RED`, `Registry.lookup()`, `kotlinx.foo()`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct QualifierReceiver {
    pub node: NodeId,
    pub target: DefId,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub enum ExplicitReceiver {
    #[default]
    None,
    Value(ReceiverValue),
    Qualifier(QualifierReceiver),
}

impl ExplicitReceiver {
    pub const fn exists(&self) -> bool {
        !matches!(self, ExplicitReceiver::None)
    }

    pub const fn value(&self) -> Option<ReceiverValue> {
        match self {
            ExplicitReceiver::Value(value) => Some(*value),
            _ => None,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    Plus,
    Minus,
}

impl UnaryOperator {
    /// The convention name and its spelling before the rename.
    pub const fn convention_names(self) -> (Atom, Atom) {
        use kres_common::names;
        match self {
            UnaryOperator::Plus => (names::UNARY_PLUS, names::PLUS),
            UnaryOperator::Minus => (names::UNARY_MINUS, names::MINUS),
        }
    }
}

/// Syntactic shape of the call, as far as candidate filtering cares.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Default)]
pub enum CallKind {
    /// `foo(x)`, `a.foo(x)`, `a.foo`
    #[default]
    Ordinary,
    /// An operator written as a symbol: `a + b`, `a[i]`, `a += b`.
    Convention,
    /// `a foo b`
    Infix,
    /// `+a` or `-a`
    UnaryPrefix(UnaryOperator),
}

impl CallKind {
    pub const fn is_convention(self) -> bool {
        matches!(self, CallKind::Convention | CallKind::UnaryPrefix(_))
    }

    pub const fn is_infix(self) -> bool {
        matches!(self, CallKind::Infix)
    }
}

/// A call site as seen by candidate prioritization.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Call {
    pub node: NodeId,
    pub explicit_receiver: ExplicitReceiver,
    /// Set for `invoke` convention calls: the value being invoked.
    pub dispatch_receiver: Option<ReceiverValue>,
    pub kind: CallKind,
    /// Whether a value argument list was written; `a.foo` has none.
    pub has_argument_list: bool,
}

impl Call {
    /// `foo(...)` with no receiver.
    pub const fn new(node: NodeId) -> Self {
        Self {
            node,
            explicit_receiver: ExplicitReceiver::None,
            dispatch_receiver: None,
            kind: CallKind::Ordinary,
            has_argument_list: true,
        }
    }

    pub const fn with_receiver(mut self, receiver: ReceiverValue) -> Self {
        self.explicit_receiver = ExplicitReceiver::Value(receiver);
        self
    }

    pub const fn with_qualifier(mut self, qualifier: QualifierReceiver) -> Self {
        self.explicit_receiver = ExplicitReceiver::Qualifier(qualifier);
        self
    }

    /// Turn this into the `invoke` call on the value of `variable`.
    pub const fn invoking(mut self, variable: ReceiverValue) -> Self {
        self.dispatch_receiver = Some(variable);
        self
    }

    pub const fn with_kind(mut self, kind: CallKind) -> Self {
        self.kind = kind;
        self
    }

    /// Property-style access without an argument list.
    pub const fn without_arguments(mut self) -> Self {
        self.has_argument_list = false;
        self
    }

    /// For `+a`/`-a`: the operator name used before the unary conventions
    /// were renamed.
    pub fn legacy_unary_name(&self, name: Atom) -> Option<Atom> {
        let CallKind::UnaryPrefix(operator) = self.kind else {
            return None;
        };
        let (current, legacy) = operator.convention_names();
        (name == current).then_some(legacy)
    }
}

// =============================================================================
// Smart casts
// =============================================================================

/// Supplies the types a receiver is known to have at the call site: its
/// declared type first, then any smart cast types from data flow.
pub trait SmartCastProvider: Send + Sync {
    fn smart_cast_variants(&self, receiver: &ReceiverValue) -> SmallVec<[TypeId; 2]>;
}

/// No data flow information: every receiver has only its declared type.
#[derive(Copy, Clone, Debug, Default)]
pub struct NoSmartCasts;

impl SmartCastProvider for NoSmartCasts {
    fn smart_cast_variants(&self, receiver: &ReceiverValue) -> SmallVec<[TypeId; 2]> {
        SmallVec::from_elem(receiver.ty, 1)
    }
}

/// Smart cast types recorded per receiver by an earlier data flow pass.
#[derive(Clone, Debug, Default)]
pub struct SmartCastMap {
    casts: FxHashMap<ReceiverKind, SmallVec<[TypeId; 2]>>,
}

impl SmartCastMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, receiver: ReceiverKind, ty: TypeId) {
        let entry = self.casts.entry(receiver).or_default();
        if !entry.contains(&ty) {
            entry.push(ty);
        }
    }
}

impl SmartCastProvider for SmartCastMap {
    fn smart_cast_variants(&self, receiver: &ReceiverValue) -> SmallVec<[TypeId; 2]> {
        let mut variants = SmallVec::from_elem(receiver.ty, 1);
        if let Some(casts) = self.casts.get(&receiver.kind) {
            variants.extend(casts.iter().copied().filter(|&ty| ty != receiver.ty));
        }
        variants
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kres_common::names;

    fn unary(operator: UnaryOperator) -> Call {
        Call::new(NodeId(1)).with_kind(CallKind::UnaryPrefix(operator))
    }

    #[test]
    fn legacy_name_follows_the_written_operator() {
        assert_eq!(unary(UnaryOperator::Plus).legacy_unary_name(names::UNARY_PLUS), Some(names::PLUS));
        assert_eq!(unary(UnaryOperator::Minus).legacy_unary_name(names::UNARY_MINUS), Some(names::MINUS));
    }

    #[test]
    fn legacy_name_needs_matching_operator() {
        assert_eq!(unary(UnaryOperator::Minus).legacy_unary_name(names::UNARY_PLUS), None);
        assert_eq!(unary(UnaryOperator::Plus).legacy_unary_name(names::PLUS), None);
        assert_eq!(Call::new(NodeId(1)).legacy_unary_name(names::UNARY_PLUS), None);
    }
}
