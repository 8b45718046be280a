//! Text rendering of a compiled schema (debugging, golden output).
//!
//! ```text
//! namespace h
//!   struct p
//!     field id: varint
//!     variant a
//!       field id: varint
//!       constraint id = 0
//! ```

use crate::namespace::{Decl, Item, Schema, ScopeId, ScopeKind};
use crate::types::TypeRef;
use std::fmt::Write;

/// Render the whole namespace tree.
pub fn dump(schema: &Schema) -> String {
    let mut out = String::new();
    dump_names(schema, schema.root(), 0, &mut out);
    out
}

/// Render one scope and everything below it.
pub fn dump_scope(schema: &Schema, id: ScopeId) -> String {
    let mut out = String::new();
    dump_entry(schema, id, schema.scope(id).name.as_deref().unwrap_or("_"), 0, &mut out);
    out
}

fn indent(out: &mut String, depth: usize) {
    for _ in 0..depth {
        out.push_str("  ");
    }
}

fn dump_names(schema: &Schema, id: ScopeId, depth: usize, out: &mut String) {
    for (name, item) in schema.scope(id).own_names() {
        match *item {
            Item::Namespace(child) => dump_entry(schema, child, name, depth, out),
            Item::Type(TypeRef::Struct(child)) if schema.scope(child).name.as_deref() == Some(name.as_str()) => {
                // Variants are listed under their base's branches.
                if schema.scope(child).path().is_none() {
                    dump_entry(schema, child, name, depth, out)
                }
            }
            Item::Type(ty) => {
                indent(out, depth);
                let _ = writeln!(out, "type {} = {}", name, schema.type_name(ty));
            }
        }
    }
}

fn dump_entry(schema: &Schema, id: ScopeId, name: &str, depth: usize, out: &mut String) {
    let scope = schema.scope(id);
    indent(out, depth);
    let keyword = match scope.kind {
        ScopeKind::Namespace => "namespace",
        ScopeKind::Struct(_) => "struct",
        ScopeKind::Variant { .. } => "variant",
        ScopeKind::Proxy { .. } => "proxy",
    };
    let _ = writeln!(out, "{} {}", keyword, name);

    if let Some(body) = scope.body() {
        for field in body.fields.values() {
            indent(out, depth + 1);
            let _ = writeln!(out, "field {}: {}", field.name, schema.type_name(field.ty));
        }
        for (constrained, value) in &body.constraints {
            indent(out, depth + 1);
            let _ = writeln!(out, "constraint {} = {}", constrained, value);
        }
    }
    dump_names(schema, id, depth + 1, out);
    if let Some(body) = scope.body() {
        for decl in &body.order {
            if let Decl::Branch(path, branch) = decl {
                dump_entry(schema, *branch, path, depth + 1, out);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;

    #[test]
    fn dump_end_to_end_tree() {
        let src = "namespace h { type p { id : varint; variant a { id = 0; }; variant b { id = 1; x : byte; }; }; };";
        let schema = compile("t", src).unwrap();
        let expected = "\
namespace h
  struct p
    field id: varint
    variant a
      field id: varint
      constraint id = 0
    variant b
      field id: varint
      field x: byte
      constraint id = 1
";
        assert_eq!(dump(&schema), expected);
    }

    #[test]
    fn dump_keeps_aliases_of_variants() {
        let schema = compile("t", "type p { k : byte; variant a { k = 1; }; }; type b : p.a;").unwrap();
        let out = dump(&schema);
        assert!(out.ends_with("type b = p.a\n"), "{}", out);
        assert_eq!(out.matches("variant a").count(), 1);
    }

    #[test]
    fn dump_aliases_and_params() {
        let schema = compile("t", "type s : string 16 utf16; type n : varint;").unwrap();
        assert_eq!(dump(&schema), "type s = string 16 utf16\ntype n = varint\n");
    }
}
