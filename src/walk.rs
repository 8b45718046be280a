//! Type-graph walk over a compiled [`Schema`].
//!
//! The walk is a depth-first traversal from the root namespace. Each node kind
//! declares which links lead to its children ([`links`]); the walker follows
//! them in declaration order and yields every distinct type or struct once,
//! paired with the path of names that first reached it. Namespaces are
//! traversed but not yielded.
//!
//! Because parameterized instances are shared through the type cache, a type
//! such as `array 3 byte` used by ten fields is still yielded once, under the
//! path of the first field that used it. Generators can therefore derive
//! stable identifiers for anonymous types from the path.
//!
//! ```ignore
//! for (path, ty) in walk(&schema) {
//!     println!("{} -> {}", path.join("."), schema.type_name(ty));
//! }
//! ```

use crate::namespace::{Item, Schema, ScopeId, ScopeKind};
use crate::types::{Length, TypeRef};
use std::collections::HashSet;

/// A node in the type graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Node {
    Namespace(ScopeId),
    Type(TypeRef),
}

impl From<Item> for Node {
    fn from(item: Item) -> Self {
        match item {
            Item::Namespace(id) => Node::Namespace(id),
            Item::Type(ty) => Node::Type(ty),
        }
    }
}

/// How a node reaches its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Link {
    /// Field mapping: one child per field, keyed by field name.
    Fields,
    /// General name table: one child per bound name.
    Names,
    /// Ordered list of branches, keyed by branch path.
    Branches,
    /// Single direct child reference.
    Child(&'static str),
}

const NAMESPACE_LINKS: &[Link] = &[Link::Names];
const STRUCT_LINKS: &[Link] = &[Link::Fields, Link::Names, Link::Branches];
const PARAM_LINKS: &[Link] = &[Link::Child("length"), Link::Child("elem")];

/// Link table for a node.
pub fn links(schema: &Schema, node: Node) -> &'static [Link] {
    match node {
        Node::Namespace(_) => NAMESPACE_LINKS,
        Node::Type(TypeRef::Struct(id)) => match schema.scope(id).kind {
            ScopeKind::Namespace => NAMESPACE_LINKS,
            _ => STRUCT_LINKS,
        },
        Node::Type(TypeRef::Param(_)) => PARAM_LINKS,
        Node::Type(TypeRef::Builtin(_)) => &[],
    }
}

/// Children of `node` reached through `link`, in declaration order.
pub fn follow(schema: &Schema, node: Node, link: Link) -> Vec<(String, Node)> {
    let scope = match node {
        Node::Namespace(id) | Node::Type(TypeRef::Struct(id)) => Some(id),
        _ => None,
    };
    match (link, scope) {
        (Link::Names, Some(id)) => schema
            .scope(id)
            .own_names()
            .iter()
            .map(|(name, item)| (name.clone(), Node::from(*item)))
            .collect(),
        (Link::Fields, Some(id)) => schema
            .body(id)
            .map(|body| {
                body.fields
                    .values()
                    .map(|field| (field.name.clone(), Node::Type(field.ty)))
                    .collect()
            })
            .unwrap_or_default(),
        (Link::Branches, Some(id)) => schema
            .body(id)
            .map(|body| {
                body.branches
                    .iter()
                    .map(|(path, branch)| (path.clone(), Node::Type(TypeRef::Struct(*branch))))
                    .collect()
            })
            .unwrap_or_default(),
        (Link::Child(name), None) => {
            let Node::Type(TypeRef::Param(id)) = node else {
                return Vec::new();
            };
            let param = schema.param(id);
            let child = match name {
                "length" => match param.length() {
                    Some(Length::Prefixed(b)) => Some(TypeRef::Builtin(b)),
                    _ => None,
                },
                "elem" => param.elem(),
                _ => None,
            };
            child.map(|ty| vec![(name.to_string(), Node::Type(ty))]).unwrap_or_default()
        }
        _ => Vec::new(),
    }
}

/// Depth-first iterator yielding `(path, type)` for each distinct type once.
pub struct TypeWalker<'s> {
    schema: &'s Schema,
    stack: Vec<(Vec<String>, Node)>,
    visited: HashSet<Node>,
}

impl<'s> TypeWalker<'s> {
    pub fn new(schema: &'s Schema) -> Self {
        Self::from_node(schema, Node::Namespace(schema.root()))
    }

    /// Walk starting at an arbitrary node, e.g. a single struct.
    pub fn from_node(schema: &'s Schema, start: Node) -> Self {
        TypeWalker {
            schema,
            stack: vec![(Vec::new(), start)],
            visited: HashSet::new(),
        }
    }
}

impl Iterator for TypeWalker<'_> {
    type Item = (Vec<String>, TypeRef);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((path, node)) = self.stack.pop() {
            if !self.visited.insert(node) {
                continue;
            }
            let children: Vec<_> = links(self.schema, node)
                .iter()
                .flat_map(|link| follow(self.schema, node, *link))
                .collect();
            // Reverse so the first declared child is popped first.
            for (name, child) in children.into_iter().rev() {
                if self.visited.contains(&child) {
                    continue;
                }
                let mut child_path = path.clone();
                child_path.push(name);
                self.stack.push((child_path, child));
            }
            if let Node::Type(ty) = node {
                return Some((path, ty));
            }
        }
        None
    }
}

/// Walk every type and struct reachable from the root namespace.
pub fn walk(schema: &Schema) -> TypeWalker<'_> {
    TypeWalker::new(schema)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compile;
    use crate::types::Builtin;

    fn paths(schema: &Schema) -> Vec<String> {
        walk(schema).map(|(path, _)| path.join(".")).collect()
    }

    #[test]
    fn shared_param_yielded_once_under_first_path() {
        let schema = compile("t", "type p { a : array 3 byte; b : array 3 byte; };").unwrap();
        let arrays: Vec<_> = walk(&schema)
            .filter(|(_, ty)| matches!(ty, TypeRef::Param(_)))
            .collect();
        assert_eq!(arrays.len(), 1);
        assert_eq!(arrays[0].0, vec!["p", "a"]);
    }

    #[test]
    fn param_children_follow_length_then_elem() {
        let schema = compile("t", "type p { s : array varint int; };").unwrap();
        assert_eq!(paths(&schema), vec!["p", "p.s", "p.s.length", "p.s.elem"]);
    }

    #[test]
    fn fixed_length_has_no_length_child() {
        let schema = compile("t", "type p { s : bytes remaining; };").unwrap();
        assert_eq!(paths(&schema), vec!["p", "p.s"]);
    }

    #[test]
    fn namespaces_are_not_yielded() {
        let schema = compile("t", "namespace a { namespace b { type t : int; }; };").unwrap();
        let items: Vec<_> = walk(&schema).collect();
        assert_eq!(items, vec![(vec!["a".to_string(), "b".into(), "t".into()], TypeRef::Builtin(Builtin::Int))]);
    }

    #[test]
    fn walk_from_single_struct() {
        let schema = compile("t", "type p { x : byte; }; type q { y : int; };").unwrap();
        let q = schema.get_struct("q").unwrap();
        let items: Vec<_> = TypeWalker::from_node(&schema, Node::Type(TypeRef::Struct(q)))
            .map(|(_, ty)| ty)
            .collect();
        assert_eq!(items, vec![TypeRef::Struct(q), TypeRef::Builtin(Builtin::Int)]);
    }
}
