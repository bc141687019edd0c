//! Source-like rendering of type syntax, used in diagnostic messages and
//! debug output.

use crate::arena::NodeArena;
use crate::node::*;
use kres_common::{Interner, NodeId};

/// Render a node back to source-like text.
pub fn node_text(arena: &NodeArena, interner: &Interner, id: NodeId) -> String {
    let mut out = String::new();
    write_node(arena, interner, id, &mut out, 0);
    out
}

const MAX_PRINT_DEPTH: u32 = 64;

fn write_node(arena: &NodeArena, interner: &Interner, id: NodeId, out: &mut String, depth: u32) {
    if depth > MAX_PRINT_DEPTH {
        out.push_str("...");
        return;
    }
    let Some(data) = arena.get(id) else {
        return;
    };
    let next = depth + 1;
    match data {
        NodeData::TypeReference(data) => {
            for &annotation in &data.annotations {
                write_node(arena, interner, annotation, out, next);
                out.push(' ');
            }
            if let Some(element) = data.type_element {
                write_node(arena, interner, element, out, next);
            }
        }
        NodeData::UserType(data) => {
            if let Some(qualifier) = data.qualifier {
                write_node(arena, interner, qualifier, out, next);
                out.push('.');
            }
            if let Some(reference) = data.reference_expression {
                write_node(arena, interner, reference, out, next);
            }
            if let Some(arguments) = data.type_arguments {
                write_node(arena, interner, arguments, out, next);
            }
        }
        NodeData::NullableType(data) => {
            if let Some(inner) = data.inner {
                write_node(arena, interner, inner, out, next);
            }
            out.push('?');
        }
        NodeData::FunctionType(data) => {
            if let Some(receiver) = data.receiver {
                write_node(arena, interner, receiver, out, next);
                out.push('.');
            }
            out.push('(');
            write_list(arena, interner, &data.parameters, out, next);
            out.push_str(") -> ");
            match data.return_type {
                Some(ret) => write_node(arena, interner, ret, out, next),
                None => out.push_str("Unit"),
            }
        }
        NodeData::DynamicType => out.push_str("dynamic"),
        NodeData::SelfType => out.push_str("Self"),
        NodeData::TypeArgumentList(data) => {
            out.push('<');
            write_list(arena, interner, &data.arguments, out, next);
            out.push('>');
        }
        NodeData::TypeProjection(data) => match data.kind {
            ProjectionKind::Star => out.push('*'),
            kind => {
                match kind {
                    ProjectionKind::In => out.push_str("in "),
                    ProjectionKind::Out => out.push_str("out "),
                    _ => {}
                }
                if let Some(type_reference) = data.type_reference {
                    write_node(arena, interner, type_reference, out, next);
                }
            }
        },
        NodeData::FunctionTypeParameter(data) => {
            for &modifier in data.annotations.iter().chain(&data.modifiers) {
                write_node(arena, interner, modifier, out, next);
                out.push(' ');
            }
            if let Some(keyword) = data.val_or_var {
                write_node(arena, interner, keyword, out, next);
                out.push(' ');
            }
            if let Some(name) = data.name {
                out.push_str(&interner.resolve(name));
                out.push_str(": ");
            }
            if let Some(type_reference) = data.type_reference {
                write_node(arena, interner, type_reference, out, next);
            }
            if let Some(default_value) = data.default_value {
                out.push_str(" = ");
                write_node(arena, interner, default_value, out, next);
            }
        }
        NodeData::AnnotationEntry(data) => {
            out.push('@');
            write_node(arena, interner, data.type_reference, out, next);
        }
        NodeData::ReferenceExpression(data) => out.push_str(&interner.resolve(data.name)),
        NodeData::Keyword(atom) => out.push_str(&interner.resolve(*atom)),
        NodeData::Opaque(text) => out.push_str(text),
    }
}

fn write_list(
    arena: &NodeArena,
    interner: &Interner,
    items: &[NodeId],
    out: &mut String,
    depth: u32,
) {
    for (i, &item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_node(arena, interner, item, out, depth);
    }
}
