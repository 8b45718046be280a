//! Scope and type resolution: AST to compiled [`Schema`].
//!
//! The compiler walks each [`Body`] against a destination scope and handles
//! statements in source order:
//!
//! - `namespace n { ... }` builds a child namespace.
//! - `type t : spec` binds `t` to a builtin, a cached parameterized instance or
//!   a user type; `type t { ... }` binds `t` to an inline struct.
//! - `variant v { ... }` builds a struct arm. It finds its base (the nearest
//!   enclosing struct, looking through anonymous proxies and prefixing the
//!   names of plain namespaces in between onto its path), copies the fields and
//!   constraints visible at that moment, compiles its body and registers itself
//!   in the base's branches. Later additions to the base are not inherited.
//! - `variant { ... }` builds a proxy whose named arms register as branches of
//!   the enclosing struct.
//! - `a, b : spec` resolves the type once and adds one field per name.
//! - `name = literal` checks and records a constraint.
//!
//! Type names resolve against the builtin registry first, then the lexical
//! scope with parent fallback. The first error aborts the compilation.

use crate::ast::*;
use crate::error::CompileError;
use crate::lexer::Position;
use crate::lint::LintMessage;
use crate::namespace::{Decl, Field, Item, Schema, Scope, ScopeId, ScopeKind, Struct};
use crate::parser::parse;
use crate::types::{Builtin, ParamType, TypeCache, TypeRef, TypeResolver};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

/// Compiler settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileOptions {
    /// Check constraint literals against the constrained field's type.
    pub typed_constraints: bool,
    /// Warn when a struct gains fields after one of its variants was declared.
    pub lint_late_fields: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            typed_constraints: true,
            lint_late_fields: true,
        }
    }
}

/// One compilation: owns the namespace tree and its type cache.
///
/// ```ignore
/// let schema = Compiler::new()
///     .compile("handshake.mcproto", HANDSHAKE)?
///     .compile("status.mcproto", STATUS)?
///     .finish();
/// ```
#[derive(Debug, Default)]
pub struct Compiler {
    schema: Schema,
    options: CompileOptions,
    /// Scopes whose fields have been copied into a variant.
    snapshotted: HashSet<ScopeId>,
}

impl Compiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: CompileOptions) -> Self {
        Compiler {
            options,
            ..Self::default()
        }
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Compile one source into the root namespace. On error the compiler is
    /// dropped, so no partially built tree is observable.
    pub fn compile(mut self, name: impl Into<Arc<str>>, source: &str) -> Result<Self, CompileError> {
        let name = name.into();
        log::debug!("compiling {}", name);
        let body = parse(name, source)?;
        let root = self.schema.root();
        self.build_body(&body, root)?;
        Ok(self)
    }

    /// Read `path` and compile it, using the path as the source name.
    pub fn compile_file(self, path: impl AsRef<Path>) -> Result<Self, CompileError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| CompileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.compile(path.display().to_string(), &source)
    }

    pub fn finish(self) -> Schema {
        self.schema
    }

    fn build_body(&mut self, body: &Body, dest: ScopeId) -> Result<(), CompileError> {
        for statement in &body.statements {
            match statement {
                Statement::Namespace(def) => self.build_namespace(def, dest)?,
                Statement::Type(def) => self.build_type_def(def, dest)?,
                Statement::Variant(def) => self.build_variant(def, dest)?,
                Statement::Field(def) => {
                    let ty = self.resolve_expr(&def.field_type, dest)?;
                    for name in &def.names {
                        self.add_field(dest, name, ty)?;
                    }
                }
                Statement::Constraint(def) => self.add_constraint(dest, def)?,
            }
        }
        Ok(())
    }

    fn check_free(&self, dest: ScopeId, name: &Identifier) -> Result<(), CompileError> {
        if self.schema.get_local(dest, &name.name).is_some() {
            return Err(CompileError::Duplicate {
                pos: name.pos.clone(),
                what: "name",
                name: name.name.clone(),
            });
        }
        Ok(())
    }

    fn build_namespace(&mut self, def: &NamespaceDef, dest: ScopeId) -> Result<(), CompileError> {
        self.check_free(dest, &def.name)?;
        log::debug!("{}: namespace {}", def.pos, def.name);
        let id = self.schema.alloc(Scope::new(
            Some(def.name.name.clone()),
            Some(dest),
            Some(def.pos.clone()),
            ScopeKind::Namespace,
        ));
        if let Some(body) = &def.body {
            self.build_body(body, id)?;
        }
        self.schema.bind(dest, def.name.name.clone(), Item::Namespace(id));
        Ok(())
    }

    fn build_type_def(&mut self, def: &TypeDef, dest: ScopeId) -> Result<(), CompileError> {
        self.check_free(dest, &def.name)?;
        log::debug!("{}: type {}", def.pos, def.name);
        let name = Some(def.name.name.clone());
        let ty = match &def.spec {
            None => TypeRef::Struct(self.build_struct(None, name, dest, &def.pos)?),
            Some(TypeExpr::Body(body)) => TypeRef::Struct(self.build_struct(Some(body), name, dest, &def.pos)?),
            Some(TypeExpr::Spec(spec)) => self.resolve_spec(spec, dest)?,
        };
        self.schema.bind(dest, def.name.name.clone(), Item::Type(ty));
        Ok(())
    }

    fn build_struct(
        &mut self,
        body: Option<&Body>,
        name: Option<String>,
        parent: ScopeId,
        pos: &Position,
    ) -> Result<ScopeId, CompileError> {
        let id = self.schema.alloc(Scope::new(
            name,
            Some(parent),
            Some(pos.clone()),
            ScopeKind::Struct(Struct::default()),
        ));
        if let Some(body) = body {
            self.build_body(body, id)?;
        }
        Ok(id)
    }

    /// Find where a variant declared in `dest` branches from.
    ///
    /// Returns `(base, source, path)`: the struct that receives the branch, the
    /// struct-like scope whose fields are copied (a proxy if one is nearer), and
    /// the branch key (`None` for a proxy).
    fn find_base(
        &self,
        dest: ScopeId,
        name: Option<&str>,
        pos: &Position,
    ) -> Result<(ScopeId, ScopeId, Option<String>), CompileError> {
        let unresolved = || CompileError::UnresolvedBranch {
            pos: pos.clone(),
            name: name.map(str::to_string),
        };
        let mut path = name.map(str::to_string);
        let mut source = None;
        let mut cur = dest;
        loop {
            let scope = self.schema.scope(cur);
            match &scope.kind {
                ScopeKind::Struct(_) | ScopeKind::Variant { .. } => {
                    return Ok((cur, source.unwrap_or(cur), path));
                }
                ScopeKind::Proxy { .. } => {
                    source.get_or_insert(cur);
                }
                ScopeKind::Namespace => {
                    let (Some(ns), Some(p)) = (scope.name.as_deref(), path.as_deref()) else {
                        return Err(unresolved());
                    };
                    path = Some(format!("{}.{}", ns, p));
                }
            }
            cur = scope.parent.ok_or_else(unresolved)?;
        }
    }

    fn build_variant(&mut self, def: &VariantDef, dest: ScopeId) -> Result<(), CompileError> {
        if let Some(name) = &def.name {
            self.check_free(dest, name)?;
        }
        let name = def.name.as_ref().map(|n| n.name.clone());
        let (base, source, path) = self.find_base(dest, name.as_deref(), &def.pos)?;

        let body = self.schema.body(source).map(Struct::snapshot).unwrap_or_default();
        self.snapshotted.insert(source);
        let kind = match &path {
            Some(path) => ScopeKind::Variant {
                body,
                base,
                path: path.clone(),
            },
            None => ScopeKind::Proxy { body, base },
        };
        log::debug!(
            "{}: variant {} of {}",
            def.pos,
            path.as_deref().unwrap_or("<proxy>"),
            self.schema.qualified_name(base)
        );
        let id = self.schema.alloc(Scope::new(name.clone(), Some(dest), Some(def.pos.clone()), kind));
        if let Some(body) = &def.body {
            self.build_body(body, id)?;
        }

        if let (Some(name), Some(path)) = (name, path) {
            self.schema.bind(dest, name, Item::Type(TypeRef::Struct(id)));
            self.register_branch(base, path, id, &def.pos)?;
        }
        Ok(())
    }

    fn register_branch(&mut self, base: ScopeId, path: String, id: ScopeId, pos: &Position) -> Result<(), CompileError> {
        let Some(body) = self.schema.body_mut(base) else {
            return Err(CompileError::UnresolvedBranch {
                pos: pos.clone(),
                name: Some(path),
            });
        };
        if body.branches.contains_key(&path) {
            return Err(CompileError::Duplicate {
                pos: pos.clone(),
                what: "branch",
                name: path,
            });
        }
        body.branches.insert(path.clone(), id);
        body.order.push(Decl::Branch(path, id));
        Ok(())
    }

    fn add_field(&mut self, dest: ScopeId, name: &Identifier, ty: TypeRef) -> Result<(), CompileError> {
        let late = self.options.lint_late_fields && self.snapshotted.contains(&dest);
        let Some(body) = self.schema.body_mut(dest) else {
            return Err(CompileError::Misplaced {
                pos: name.pos.clone(),
                what: "field",
            });
        };
        if body.fields.contains_key(&name.name) {
            return Err(CompileError::Duplicate {
                pos: name.pos.clone(),
                what: "field",
                name: name.name.clone(),
            });
        }
        body.fields.insert(
            name.name.clone(),
            Field {
                name: name.name.clone(),
                ty,
                pos: name.pos.clone(),
            },
        );
        body.order.push(Decl::Field(name.name.clone()));
        log::debug!("{}: field {}", name.pos, name.name);

        if late {
            let message = LintMessage::field_after_variant(&name.pos, &name.name, &self.schema.qualified_name(dest));
            log::warn!("{}: {}", name.pos, message.message);
            self.schema.warn(message);
        }
        Ok(())
    }

    fn add_constraint(&mut self, dest: ScopeId, def: &ConstraintDef) -> Result<(), CompileError> {
        if !self.schema.scope(dest).is_struct() {
            return Err(CompileError::Misplaced {
                pos: def.pos.clone(),
                what: "constraint",
            });
        }
        let name = match &def.left {
            Operand::Name(id) if id.is_local() => id.name.clone(),
            other => return Err(CompileError::syntax(other.pos(), "local name on the left of `=`")),
        };
        let value = match &def.right {
            Operand::Value(v) => v.literal.clone(),
            other => return Err(CompileError::syntax(other.pos(), "literal on the right of `=`")),
        };

        let field_ty = self
            .schema
            .body(dest)
            .and_then(|body| body.fields.get(&name))
            .map(|field| field.ty);
        if let Some(ty) = field_ty.filter(|_| self.options.typed_constraints) {
            if !self.literal_fits(ty, &value) {
                return Err(CompileError::ConstraintType {
                    pos: def.pos.clone(),
                    name,
                    value,
                    type_name: self.schema.type_name(ty),
                });
            }
        }

        let Some(body) = self.schema.body_mut(dest) else {
            return Err(CompileError::Misplaced {
                pos: def.pos.clone(),
                what: "constraint",
            });
        };
        if let Some(existing) = body.constraints.get(&name) {
            if *existing != value {
                return Err(CompileError::InconsistentConstraint {
                    pos: def.pos.clone(),
                    name,
                    existing: existing.clone(),
                    found: value,
                });
            }
        }
        log::debug!("{}: constraint {} = {}", def.pos, name, value);
        body.constraints.insert(name.clone(), value.clone());
        body.order.push(Decl::Constraint(name, value));
        Ok(())
    }

    fn literal_fits(&self, ty: TypeRef, value: &Literal) -> bool {
        match (ty, value) {
            (TypeRef::Builtin(b), Literal::Number(_)) if b.is_float() => true,
            (TypeRef::Builtin(b), Literal::Number(n)) => b.int_range().is_some_and(|range| range.contains(n)),
            (TypeRef::Param(id), Literal::String(_)) => matches!(self.schema.param(id), ParamType::String { .. }),
            _ => false,
        }
    }

    fn resolve_expr(&mut self, expr: &TypeExpr, scope: ScopeId) -> Result<TypeRef, CompileError> {
        match expr {
            TypeExpr::Spec(spec) => self.resolve_spec(spec, scope),
            TypeExpr::Body(body) => Ok(TypeRef::Struct(self.build_struct(Some(body), None, scope, &body.pos)?)),
        }
    }

    fn resolve_spec(&mut self, spec: &TypeSpec, scope: ScopeId) -> Result<TypeRef, CompileError> {
        let params = spec.params();
        match spec.head() {
            Some(TypeArg::Name(id)) => self.resolve_name(id, params, &spec.pos, scope),
            Some(head) if params.is_empty() => self.resolve_arg(head, scope),
            Some(head) => Err(CompileError::syntax(head.pos(), "type name before type arguments")),
            None => Err(CompileError::syntax(&spec.pos, "a type")),
        }
    }

    fn resolve_arg(&mut self, arg: &TypeArg, scope: ScopeId) -> Result<TypeRef, CompileError> {
        match arg {
            TypeArg::Name(id) => self.resolve_name(id, &[], &id.pos, scope),
            TypeArg::Spec(spec) => self.resolve_spec(spec, scope),
            TypeArg::Body(body) => Ok(TypeRef::Struct(self.build_struct(Some(body), None, scope, &body.pos)?)),
            TypeArg::Value(value) => Err(CompileError::syntax(&value.pos, "a type")),
        }
    }

    /// Builtins first, then the lexical scope. User types take no arguments.
    fn resolve_name(
        &mut self,
        id: &Identifier,
        params: &[TypeArg],
        pos: &Position,
        scope: ScopeId,
    ) -> Result<TypeRef, CompileError> {
        if let Some(builtin) = Builtin::from_name(&id.name) {
            let mut resolver = ScopeResolver { compiler: self, scope };
            return builtin.construct(params, pos, &mut resolver);
        }
        match self.schema.lookup(scope, &id.name).and_then(Item::as_type) {
            Some(ty) if params.is_empty() => Ok(ty),
            Some(_) => Err(CompileError::arity(pos, &id.name, "user-defined types take no arguments")),
            None => Err(CompileError::UnknownType {
                pos: id.pos.clone(),
                name: id.name.clone(),
            }),
        }
    }
}

/// Type arguments are resolved in the scope of the enclosing type spec.
struct ScopeResolver<'c> {
    compiler: &'c mut Compiler,
    scope: ScopeId,
}

impl TypeResolver for ScopeResolver<'_> {
    fn resolve_arg(&mut self, arg: &TypeArg) -> Result<TypeRef, CompileError> {
        self.compiler.resolve_arg(arg, self.scope)
    }

    fn cache(&mut self) -> &mut TypeCache {
        self.compiler.schema.types_mut()
    }
}

/// Compile a single source into a fresh schema.
pub fn compile(name: impl Into<Arc<str>>, source: &str) -> Result<Schema, CompileError> {
    Ok(Compiler::new().compile(name, source)?.finish())
}

/// Read and compile a schema file.
pub fn compile_file(path: impl AsRef<Path>) -> Result<Schema, CompileError> {
    Ok(Compiler::new().compile_file(path)?.finish())
}
