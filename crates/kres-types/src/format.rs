//! Rendering types for diagnostic messages.

use crate::db::TypeDatabase;
use crate::types::{TypeArgument, TypeData, TypeId};

const MAX_FORMAT_DEPTH: u32 = 32;

pub struct TypeFormatter<'a> {
    db: &'a TypeDatabase,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a TypeDatabase) -> Self {
        Self { db }
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(ty, &mut out, 0);
        out
    }

    fn write_type(&self, ty: TypeId, out: &mut String, depth: u32) {
        if depth > MAX_FORMAT_DEPTH {
            out.push_str("...");
            return;
        }
        let names = self.db.names();
        let Some(data) = self.db.types().lookup(ty) else {
            out.push_str("<unknown>");
            return;
        };
        match &*data {
            TypeData::Rigid(rigid) => {
                if let Some(arity) = self.db.builtins().function_arity(rigid.classifier) {
                    self.write_function(rigid.arguments.as_slice(), arity, &rigid.annotations, out, depth);
                } else {
                    out.push_str(&names.resolve(self.db.defs().name(rigid.classifier)));
                    self.write_arguments(&rigid.arguments, out, depth);
                }
                if rigid.nullable {
                    out.push('?');
                }
            }
            TypeData::Flexible { lower, upper } => {
                out.push('(');
                self.write_type(*lower, out, depth + 1);
                out.push_str("..");
                self.write_type(*upper, out, depth + 1);
                out.push(')');
            }
            TypeData::Error { name, arguments } => {
                out.push_str("[Error type: ");
                if name.is_none() {
                    out.push_str("<unknown>");
                } else {
                    out.push_str(&names.resolve(*name));
                }
                self.write_arguments(arguments, out, depth);
                out.push(']');
            }
            TypeData::Dynamic => out.push_str("dynamic"),
            TypeData::Lazy(id) => {
                out.push_str("<lazy #");
                out.push_str(&id.0.to_string());
                out.push('>');
            }
        }
    }

    fn write_arguments(&self, arguments: &[TypeArgument], out: &mut String, depth: u32) {
        if arguments.is_empty() {
            return;
        }
        out.push('<');
        for (i, arg) in arguments.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_argument(*arg, out, depth);
        }
        out.push('>');
    }

    fn write_argument(&self, arg: TypeArgument, out: &mut String, depth: u32) {
        match arg {
            TypeArgument::Star { .. } => out.push('*'),
            TypeArgument::Projection { variance, ty } => {
                if !variance.is_invariant() {
                    out.push_str(variance.label());
                    out.push(' ');
                }
                self.write_type(ty, out, depth + 1);
            }
        }
    }

    fn write_function(
        &self,
        arguments: &[TypeArgument],
        arity: usize,
        annotations: &[crate::def::DefId],
        out: &mut String,
        depth: u32,
    ) {
        if arguments.len() != arity + 1 {
            out.push_str("Function");
            out.push_str(&arity.to_string());
            self.write_arguments(arguments, out, depth);
            return;
        }
        let has_receiver = annotations.contains(&self.db.builtins().extension_function_type);
        let (receiver, rest) = if has_receiver && arity > 0 {
            (Some(arguments[0]), &arguments[1..])
        } else {
            (None, arguments)
        };
        if let Some(receiver) = receiver {
            self.write_argument(receiver, out, depth);
            out.push('.');
        }
        out.push('(');
        let (params, ret) = rest.split_at(rest.len() - 1);
        for (i, param) in params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_argument(*param, out, depth);
        }
        out.push_str(") -> ");
        self.write_argument(ret[0], out, depth);
    }
}
