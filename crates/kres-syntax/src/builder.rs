//! Convenience construction of type syntax.
//!
//! Front ends that lower their own tree, and tests, use this instead of
//! filling node structs by hand.

use crate::arena::NodeArena;
use crate::node::*;
use kres_common::{Interner, NodeId};

/// One segment of a qualified user type: name plus optional `<...>` projections.
pub type Segment<'s> = (&'s str, Option<&'s [NodeId]>);

pub struct SyntaxBuilder<'a> {
    arena: &'a mut NodeArena,
    interner: &'a Interner,
}

impl<'a> SyntaxBuilder<'a> {
    pub fn new(arena: &'a mut NodeArena, interner: &'a Interner) -> Self {
        Self { arena, interner }
    }

    pub fn arena(&self) -> &NodeArena {
        self.arena
    }

    // =========================================================================
    // Type references
    // =========================================================================

    /// Wrap a type element in a type reference with no annotations.
    pub fn type_ref(&mut self, element: NodeId) -> NodeId {
        self.arena.add_type_reference(TypeReferenceData {
            annotations: NodeList::new(),
            type_element: Some(element),
        })
    }

    /// `@A @B element`
    pub fn annotated(&mut self, annotations: &[NodeId], element: NodeId) -> NodeId {
        self.arena.add_type_reference(TypeReferenceData {
            annotations: annotations.iter().copied().collect(),
            type_element: Some(element),
        })
    }

    /// A type reference whose element failed to parse.
    pub fn empty_ref(&mut self) -> NodeId {
        self.arena.add_type_reference(TypeReferenceData::default())
    }

    /// `Name`
    pub fn simple(&mut self, name: &str) -> NodeId {
        let element = self.user_type(None, name, None);
        self.type_ref(element)
    }

    /// `Name<A, B>` with invariant projections of the given type references.
    pub fn generic(&mut self, name: &str, arguments: &[NodeId]) -> NodeId {
        let projections: Vec<NodeId> = arguments
            .iter()
            .map(|&arg| self.projection(ProjectionKind::None, Some(arg)))
            .collect();
        let element = self.user_type(None, name, Some(&projections));
        self.type_ref(element)
    }

    /// `a.B<...>.C<...>` from outermost to innermost segment.
    pub fn qualified(&mut self, segments: &[Segment<'_>]) -> NodeId {
        let element = self.qualified_element(segments);
        self.type_ref(element)
    }

    /// Same as [`Self::qualified`] but returns the innermost user type node.
    pub fn qualified_element(&mut self, segments: &[Segment<'_>]) -> NodeId {
        let mut qualifier = None;
        for &(name, projections) in segments {
            qualifier = Some(self.user_type(qualifier, name, projections));
        }
        qualifier.unwrap_or_else(|| self.opaque(""))
    }

    /// `T?` where `inner` is a type element.
    pub fn nullable(&mut self, inner: NodeId) -> NodeId {
        let element = self.arena.add_nullable_type(Some(inner));
        self.type_ref(element)
    }

    /// `R.(P...) -> T`; parameters are function type parameter nodes.
    pub fn function_type(
        &mut self,
        receiver: Option<NodeId>,
        parameters: &[NodeId],
        return_type: Option<NodeId>,
    ) -> NodeId {
        let element = self.arena.add_function_type(FunctionTypeData {
            receiver,
            parameters: parameters.iter().copied().collect(),
            return_type,
        });
        self.type_ref(element)
    }

    pub fn dynamic(&mut self) -> NodeId {
        let element = self.arena.add(NodeData::DynamicType);
        self.type_ref(element)
    }

    pub fn self_type(&mut self) -> NodeId {
        let element = self.arena.add(NodeData::SelfType);
        self.type_ref(element)
    }

    // =========================================================================
    // Elements and pieces
    // =========================================================================

    pub fn user_type(
        &mut self,
        qualifier: Option<NodeId>,
        name: &str,
        projections: Option<&[NodeId]>,
    ) -> NodeId {
        let reference = self.arena.add_reference_expression(self.interner.intern(name));
        let type_arguments = projections
            .map(|list| self.arena.add_type_argument_list(list.iter().copied().collect()));
        self.arena.add_user_type(UserTypeData {
            qualifier,
            reference_expression: Some(reference),
            type_arguments,
        })
    }

    /// Element of an existing type reference, for nesting under `?`.
    pub fn element_of(&self, type_reference: NodeId) -> NodeId {
        self.arena
            .type_element_of(type_reference)
            .unwrap_or(type_reference)
    }

    pub fn projection(&mut self, kind: ProjectionKind, type_reference: Option<NodeId>) -> NodeId {
        self.arena.add_type_projection(kind, type_reference)
    }

    pub fn star(&mut self) -> NodeId {
        self.projection(ProjectionKind::Star, None)
    }

    /// A function type parameter carrying only a type.
    pub fn parameter(&mut self, type_reference: NodeId) -> NodeId {
        self.arena
            .add_function_type_parameter(FunctionTypeParameterData {
                type_reference: Some(type_reference),
                ..FunctionTypeParameterData::default()
            })
    }

    pub fn parameter_with(&mut self, data: FunctionTypeParameterData) -> NodeId {
        self.arena.add_function_type_parameter(data)
    }

    /// `@Name`
    pub fn annotation(&mut self, name: &str) -> NodeId {
        let type_reference = self.simple(name);
        self.arena.add_annotation_entry(type_reference)
    }

    pub fn keyword(&mut self, text: &str) -> NodeId {
        self.arena.add(NodeData::Keyword(self.interner.intern(text)))
    }

    pub fn opaque(&mut self, text: &str) -> NodeId {
        self.arena.add(NodeData::Opaque(text.to_string()))
    }
}
