//! Node storage and typed access.

use crate::node::*;
use kres_common::{Atom, NodeId};

/// Flat storage for syntax nodes. A node's `NodeId` is its index.
#[derive(Clone, Debug, Default)]
pub struct NodeArena {
    nodes: Vec<NodeData>,
}

impl NodeArena {
    pub fn new() -> NodeArena {
        NodeArena::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    // ============================================================================
    // Node Creation Methods
    // ============================================================================

    /// Add a node and return its id.
    pub fn add(&mut self, data: NodeData) -> NodeId {
        let index = self.nodes.len() as u32;
        self.nodes.push(data);
        NodeId(index)
    }

    pub fn add_type_reference(&mut self, data: TypeReferenceData) -> NodeId {
        self.add(NodeData::TypeReference(data))
    }

    pub fn add_user_type(&mut self, data: UserTypeData) -> NodeId {
        self.add(NodeData::UserType(data))
    }

    pub fn add_nullable_type(&mut self, inner: Option<NodeId>) -> NodeId {
        self.add(NodeData::NullableType(NullableTypeData { inner }))
    }

    pub fn add_function_type(&mut self, data: FunctionTypeData) -> NodeId {
        self.add(NodeData::FunctionType(data))
    }

    pub fn add_type_argument_list(&mut self, arguments: NodeList) -> NodeId {
        self.add(NodeData::TypeArgumentList(TypeArgumentListData { arguments }))
    }

    pub fn add_type_projection(
        &mut self,
        kind: ProjectionKind,
        type_reference: Option<NodeId>,
    ) -> NodeId {
        self.add(NodeData::TypeProjection(TypeProjectionData {
            kind,
            type_reference,
        }))
    }

    pub fn add_function_type_parameter(&mut self, data: FunctionTypeParameterData) -> NodeId {
        self.add(NodeData::FunctionTypeParameter(data))
    }

    pub fn add_annotation_entry(&mut self, type_reference: NodeId) -> NodeId {
        self.add(NodeData::AnnotationEntry(AnnotationEntryData { type_reference }))
    }

    pub fn add_reference_expression(&mut self, name: Atom) -> NodeId {
        self.add(NodeData::ReferenceExpression(ReferenceExpressionData { name }))
    }

    /// Replace a node in place. Used by builders that create a node before its
    /// children are known.
    pub fn replace(&mut self, id: NodeId, data: NodeData) {
        if let Some(slot) = self.nodes.get_mut(id.index()) {
            *slot = data;
        }
    }

    // ============================================================================
    // Node Access Methods
    // ============================================================================

    #[inline]
    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(id.index())
    }

    pub fn get_type_reference(&self, id: NodeId) -> Option<&TypeReferenceData> {
        match self.get(id)? {
            NodeData::TypeReference(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_user_type(&self, id: NodeId) -> Option<&UserTypeData> {
        match self.get(id)? {
            NodeData::UserType(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_nullable_type(&self, id: NodeId) -> Option<&NullableTypeData> {
        match self.get(id)? {
            NodeData::NullableType(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_function_type(&self, id: NodeId) -> Option<&FunctionTypeData> {
        match self.get(id)? {
            NodeData::FunctionType(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_type_argument_list(&self, id: NodeId) -> Option<&TypeArgumentListData> {
        match self.get(id)? {
            NodeData::TypeArgumentList(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_type_projection(&self, id: NodeId) -> Option<&TypeProjectionData> {
        match self.get(id)? {
            NodeData::TypeProjection(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_function_type_parameter(&self, id: NodeId) -> Option<&FunctionTypeParameterData> {
        match self.get(id)? {
            NodeData::FunctionTypeParameter(data) => Some(data),
            _ => None,
        }
    }

    pub fn get_annotation_entry(&self, id: NodeId) -> Option<&AnnotationEntryData> {
        match self.get(id)? {
            NodeData::AnnotationEntry(data) => Some(data),
            _ => None,
        }
    }

    /// Name of a reference expression node.
    pub fn reference_name(&self, id: NodeId) -> Option<Atom> {
        match self.get(id)? {
            NodeData::ReferenceExpression(data) => Some(data.name),
            _ => None,
        }
    }

    /// Referenced name of a user type segment, or `Atom::NONE`.
    pub fn user_type_name(&self, id: NodeId) -> Atom {
        self.get_user_type(id)
            .and_then(|u| u.reference_expression)
            .and_then(|r| self.reference_name(r))
            .unwrap_or(Atom::NONE)
    }

    /// Projection nodes of a user type segment; empty when no `<...>` was written.
    pub fn user_type_arguments(&self, id: NodeId) -> &[NodeId] {
        self.get_user_type(id)
            .and_then(|u| u.type_arguments)
            .and_then(|list| self.get_type_argument_list(list))
            .map(|list| list.arguments.as_slice())
            .unwrap_or(&[])
    }

    /// Segments of a qualified user type, outermost qualifier first.
    pub fn user_type_segments(&self, id: NodeId) -> Vec<NodeId> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(segment) = current {
            if segments.len() > self.nodes.len() {
                break;
            }
            segments.push(segment);
            current = self.get_user_type(segment).and_then(|u| u.qualifier);
        }
        segments.reverse();
        segments
    }

    /// The element of a type reference.
    pub fn type_element_of(&self, type_reference: NodeId) -> Option<NodeId> {
        self.get_type_reference(type_reference)?.type_element
    }

    /// Whether the element is nullable or dynamic, the two shapes that make
    /// an enclosing `?` redundant.
    pub fn is_nullable_or_dynamic(&self, element: NodeId) -> bool {
        matches!(
            self.get(element),
            Some(NodeData::NullableType(_) | NodeData::DynamicType)
        )
    }
}
