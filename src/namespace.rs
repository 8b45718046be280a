//! Compiled namespace tree.
//!
//! All namespaces, structs, variants and proxies live in one arena owned by
//! [`Schema`] and are addressed by [`ScopeId`]. Children hold their parent as
//! a plain id; dropping the schema frees the whole tree.
//!
//! A proxy (anonymous `variant { ... }` block) owns no names: every name
//! binding and lookup on it is forwarded to its parent, so the named variants
//! declared inside it land in the enclosing struct.

use crate::ast::Literal;
use crate::lexer::Position;
use crate::lint::LintMessage;
use crate::types::{Length, ParamId, ParamType, TypeCache, TypeRef};
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ScopeId(pub(crate) u32);

impl ScopeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// What a name is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Item {
    Namespace(ScopeId),
    Type(TypeRef),
}

impl Item {
    /// The scope to descend into for dotted lookups, if any.
    pub fn scope(self) -> Option<ScopeId> {
        match self {
            Item::Namespace(id) | Item::Type(TypeRef::Struct(id)) => Some(id),
            Item::Type(_) => None,
        }
    }

    pub fn as_type(self) -> Option<TypeRef> {
        match self {
            Item::Type(ty) => Some(ty),
            Item::Namespace(_) => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: TypeRef,
    pub pos: Position,
}

/// One entry of a struct's declaration sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Field(String),
    Constraint(String, Literal),
    Branch(String, ScopeId),
}

/// Fields, constraints and branches of a struct-like scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Struct {
    pub fields: IndexMap<String, Field>,
    pub constraints: IndexMap<String, Literal>,
    pub branches: IndexMap<String, ScopeId>,
    /// Own fields, constraints and branches in source order.
    pub order: Vec<Decl>,
}

impl Struct {
    /// Point-in-time copy of fields and constraints for a new variant.
    pub fn snapshot(&self) -> Struct {
        Struct {
            fields: self.fields.clone(),
            constraints: self.constraints.clone(),
            branches: IndexMap::new(),
            order: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScopeKind {
    Namespace,
    Struct(Struct),
    /// Named arm of a tagged union, registered under `path` in `base`.
    Variant { body: Struct, base: ScopeId, path: String },
    /// Anonymous grouping of arms; names are forwarded to the parent.
    Proxy { body: Struct, base: ScopeId },
}

#[derive(Debug, Clone)]
pub struct Scope {
    pub name: Option<String>,
    pub parent: Option<ScopeId>,
    pub pos: Option<Position>,
    pub kind: ScopeKind,
    names: IndexMap<String, Item>,
}

impl Scope {
    pub fn new(name: Option<String>, parent: Option<ScopeId>, pos: Option<Position>, kind: ScopeKind) -> Self {
        Scope {
            name,
            parent,
            pos,
            kind,
            names: IndexMap::new(),
        }
    }

    /// Names bound directly on this scope. Always empty for a proxy.
    pub fn own_names(&self) -> &IndexMap<String, Item> {
        &self.names
    }

    pub fn body(&self) -> Option<&Struct> {
        match &self.kind {
            ScopeKind::Namespace => None,
            ScopeKind::Struct(body) | ScopeKind::Variant { body, .. } | ScopeKind::Proxy { body, .. } => Some(body),
        }
    }

    pub(crate) fn body_mut(&mut self) -> Option<&mut Struct> {
        match &mut self.kind {
            ScopeKind::Namespace => None,
            ScopeKind::Struct(body) | ScopeKind::Variant { body, .. } | ScopeKind::Proxy { body, .. } => Some(body),
        }
    }

    pub fn is_struct(&self) -> bool {
        self.body().is_some()
    }

    pub fn is_proxy(&self) -> bool {
        matches!(self.kind, ScopeKind::Proxy { .. })
    }

    /// Struct a variant or proxy branches from.
    pub fn base(&self) -> Option<ScopeId> {
        match self.kind {
            ScopeKind::Variant { base, .. } | ScopeKind::Proxy { base, .. } => Some(base),
            _ => None,
        }
    }

    /// Branch key of a variant.
    pub fn path(&self) -> Option<&str> {
        match &self.kind {
            ScopeKind::Variant { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// A compiled schema: the namespace tree, its parameterized types, and any
/// lint warnings produced while compiling.
#[derive(Debug, Clone)]
pub struct Schema {
    scopes: Vec<Scope>,
    types: TypeCache,
    warnings: Vec<LintMessage>,
    root: ScopeId,
}

impl Default for Schema {
    fn default() -> Self {
        Self::new()
    }
}

impl Schema {
    pub fn new() -> Self {
        Schema {
            scopes: vec![Scope::new(None, None, None, ScopeKind::Namespace)],
            types: TypeCache::new(),
            warnings: Vec::new(),
            root: ScopeId(0),
        }
    }

    pub fn root(&self) -> ScopeId {
        self.root
    }

    /// Panics if `id` does not belong to this schema.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.index()]
    }

    pub(crate) fn scope_mut(&mut self, id: ScopeId) -> &mut Scope {
        &mut self.scopes[id.index()]
    }

    pub fn scopes(&self) -> impl Iterator<Item = (ScopeId, &Scope)> {
        self.scopes
            .iter()
            .enumerate()
            .map(|(i, scope)| (ScopeId(i as u32), scope))
    }

    pub fn types(&self) -> &TypeCache {
        &self.types
    }

    pub(crate) fn types_mut(&mut self) -> &mut TypeCache {
        &mut self.types
    }

    pub fn param(&self, id: ParamId) -> &ParamType {
        self.types.get(id)
    }

    pub fn warnings(&self) -> &[LintMessage] {
        &self.warnings
    }

    pub(crate) fn warn(&mut self, message: LintMessage) {
        self.warnings.push(message);
    }

    pub(crate) fn alloc(&mut self, scope: Scope) -> ScopeId {
        let id = ScopeId(self.scopes.len() as u32);
        self.scopes.push(scope);
        id
    }

    pub fn body(&self, id: ScopeId) -> Option<&Struct> {
        self.scope(id).body()
    }

    pub(crate) fn body_mut(&mut self, id: ScopeId) -> Option<&mut Struct> {
        self.scope_mut(id).body_mut()
    }

    /// The scope whose name table `id` uses: itself, or for a proxy the
    /// first non-proxy ancestor.
    pub fn names_owner(&self, id: ScopeId) -> ScopeId {
        let mut cur = id;
        while self.scope(cur).is_proxy() {
            match self.scope(cur).parent {
                Some(parent) => cur = parent,
                None => break,
            }
        }
        cur
    }

    pub fn names(&self, id: ScopeId) -> &IndexMap<String, Item> {
        self.scope(self.names_owner(id)).own_names()
    }

    /// Single-segment lookup in `id` only.
    pub fn get_local(&self, id: ScopeId, name: &str) -> Option<Item> {
        self.names(id).get(name).copied()
    }

    pub(crate) fn bind(&mut self, id: ScopeId, name: String, item: Item) {
        let owner = self.names_owner(id);
        self.scope_mut(owner).names.insert(name, item);
    }

    /// Resolve a dotted path entirely within `id`.
    pub fn lookup_local(&self, id: ScopeId, path: &str) -> Option<Item> {
        let mut container = id;
        let mut found = None;
        for segment in path.split('.') {
            if let Some(item) = found {
                container = Item::scope(item)?;
            }
            found = Some(self.get_local(container, segment)?);
        }
        found
    }

    /// Resolve a dotted path from `id`, retrying the whole path in each
    /// enclosing scope until the root. A path is never split across scopes.
    pub fn lookup(&self, id: ScopeId, path: &str) -> Option<Item> {
        let mut scope = Some(id);
        while let Some(cur) = scope {
            if let Some(item) = self.lookup_local(cur, path) {
                return Some(item);
            }
            scope = self.scope(cur).parent;
        }
        None
    }

    /// Resolve a dotted path from the root namespace.
    pub fn get(&self, path: &str) -> Option<Item> {
        self.lookup_local(self.root, path)
    }

    /// The struct-like scope bound at `path` from the root.
    pub fn get_struct(&self, path: &str) -> Option<ScopeId> {
        match self.get(path)? {
            Item::Type(TypeRef::Struct(id)) => Some(id),
            _ => None,
        }
    }

    /// Dotted name of a scope from the root, skipping anonymous levels.
    pub fn qualified_name(&self, id: ScopeId) -> String {
        let mut parts = Vec::new();
        let mut cur = Some(id);
        while let Some(scope_id) = cur {
            let scope = self.scope(scope_id);
            if let Some(name) = &scope.name {
                parts.push(name.as_str());
            }
            cur = scope.parent;
        }
        parts.reverse();
        parts.join(".")
    }

    /// Human-readable type name, e.g. `array 3 byte` or `h.p`.
    pub fn type_name(&self, ty: TypeRef) -> String {
        match ty {
            TypeRef::Builtin(b) => b.name().to_string(),
            TypeRef::Struct(id) => {
                let name = self.qualified_name(id);
                if name.is_empty() {
                    format!("<struct #{}>", id.index())
                } else {
                    name
                }
            }
            TypeRef::Param(id) => match self.param(id) {
                ParamType::String { length, encoding } => {
                    format!("string {} {}", length_name(*length), encoding.name())
                }
                ParamType::Bytes { length } => format!("bytes {}", length_name(*length)),
                ParamType::Uuid { encoding } => format!("uuid {}", encoding.name()),
                ParamType::Array { length, elem } => {
                    format!("array {} ({})", length_name(*length), self.type_name(*elem))
                }
                ParamType::BoolOptional { elem } => format!("bool_optional ({})", self.type_name(*elem)),
            },
        }
    }
}

fn length_name(length: Length) -> String {
    match length {
        Length::Fixed(n) => n.to_string(),
        Length::Prefixed(b) => b.name().to_string(),
        Length::Remaining => crate::types::REMAINING.to_string(),
    }
}
