//! Node data shapes.

use kres_common::{Atom, NodeId};
use serde::Serialize;
use smallvec::SmallVec;

/// Child lists are usually short (type arguments, parameters, annotations).
pub type NodeList = SmallVec<[NodeId; 4]>;

/// `@A @B Foo<Bar>` : annotations followed by the type element.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TypeReferenceData {
    pub annotations: NodeList,
    /// `None` when the source was malformed and no element was parsed.
    pub type_element: Option<NodeId>,
}

/// `a.b.Foo<T>`. The qualifier is itself a user type node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UserTypeData {
    pub qualifier: Option<NodeId>,
    /// Simple-name reference expression naming this segment.
    pub reference_expression: Option<NodeId>,
    /// `TypeArgumentList` node, if `<...>` was written on this segment.
    pub type_arguments: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct NullableTypeData {
    pub inner: Option<NodeId>,
}

/// `R.(P1, P2) -> T`
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FunctionTypeData {
    pub receiver: Option<NodeId>,
    pub parameters: NodeList,
    pub return_type: Option<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TypeArgumentListData {
    pub arguments: NodeList,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum ProjectionKind {
    None,
    In,
    Out,
    Star,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeProjectionData {
    pub kind: ProjectionKind,
    /// Absent for `*` and for malformed projections.
    pub type_reference: Option<NodeId>,
}

/// A parameter of a function type. Only the type is meaningful there; every
/// other piece of syntax is reported as unsupported.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct FunctionTypeParameterData {
    pub name: Option<Atom>,
    pub type_reference: Option<NodeId>,
    pub default_value: Option<NodeId>,
    pub annotations: NodeList,
    pub modifiers: NodeList,
    /// `val` / `var` keyword node.
    pub val_or_var: Option<NodeId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotationEntryData {
    pub type_reference: NodeId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ReferenceExpressionData {
    pub name: Atom,
}

/// All node shapes stored in the arena.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub enum NodeData {
    TypeReference(TypeReferenceData),
    UserType(UserTypeData),
    NullableType(NullableTypeData),
    FunctionType(FunctionTypeData),
    DynamicType,
    SelfType,
    TypeArgumentList(TypeArgumentListData),
    TypeProjection(TypeProjectionData),
    FunctionTypeParameter(FunctionTypeParameterData),
    AnnotationEntry(AnnotationEntryData),
    ReferenceExpression(ReferenceExpressionData),
    /// A keyword or modifier token (`val`, `vararg`, ...).
    Keyword(Atom),
    /// Any syntax the resolver does not interpret: expressions used as
    /// default values, or type elements of an unknown shape. Keeps the
    /// source text for messages.
    Opaque(String),
}

impl NodeData {
    /// Whether this node can stand as the element of a type reference.
    pub fn is_type_element(&self) -> bool {
        matches!(
            self,
            NodeData::UserType(_)
                | NodeData::NullableType(_)
                | NodeData::FunctionType(_)
                | NodeData::DynamicType
                | NodeData::SelfType
                | NodeData::Opaque(_)
        )
    }
}
