//! Abstract Syntax Tree for protocol schemas.
//!
//! Nodes are plain data tagged with the [`Position`] of their first token.

use crate::lexer::Position;
use std::fmt;

/// A possibly dotted name (`a`, `a.b.c`).
#[derive(Debug, Clone, PartialEq)]
pub struct Identifier {
    pub name: String,
    pub pos: Position,
}

impl Identifier {
    /// True when the name has a single segment.
    pub fn is_local(&self) -> bool {
        !self.name.contains('.')
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.name.split('.')
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Literal {
    Number(i64),
    String(String),
}

impl Literal {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Literal::Number(n) => Some(*n),
            Literal::String(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::String(s) => Some(s),
            Literal::Number(_) => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "{:?}", s),
        }
    }
}

/// A literal together with the token it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct Value {
    pub literal: Literal,
    pub token: String,
    pub pos: Position,
}

/// Either side of a constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Name(Identifier),
    Value(Value),
}

impl Operand {
    pub fn pos(&self) -> &Position {
        match self {
            Operand::Name(id) => &id.pos,
            Operand::Value(v) => &v.pos,
        }
    }
}

/// One argument of a type application.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeArg {
    Name(Identifier),
    Value(Value),
    Spec(TypeSpec),
    Body(Body),
}

impl TypeArg {
    pub fn pos(&self) -> &Position {
        match self {
            TypeArg::Name(id) => &id.pos,
            TypeArg::Value(v) => &v.pos,
            TypeArg::Spec(spec) => &spec.pos,
            TypeArg::Body(body) => &body.pos,
        }
    }
}

/// Type application: a head name followed by arguments, e.g. `array 3 byte`.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeSpec {
    pub args: Vec<TypeArg>,
    pub pos: Position,
}

impl TypeSpec {
    pub fn head(&self) -> Option<&TypeArg> {
        self.args.first()
    }

    /// Arguments after the head.
    pub fn params(&self) -> &[TypeArg] {
        self.args.get(1..).unwrap_or_default()
    }
}

/// What a `typespec` production yields: a type application or an inline struct body.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeExpr {
    Spec(TypeSpec),
    Body(Body),
}

impl From<TypeExpr> for TypeArg {
    fn from(expr: TypeExpr) -> Self {
        match expr {
            TypeExpr::Spec(spec) => TypeArg::Spec(spec),
            TypeExpr::Body(body) => TypeArg::Body(body),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: Identifier,
    pub spec: Option<TypeExpr>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariantDef {
    pub name: Option<Identifier>,
    pub body: Option<Body>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NamespaceDef {
    pub name: Identifier,
    pub body: Option<Body>,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub left: Operand,
    pub right: Operand,
    pub pos: Position,
}

/// One or more local field names sharing a type.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub names: Vec<Identifier>,
    pub field_type: TypeExpr,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Namespace(NamespaceDef),
    Type(TypeDef),
    Variant(VariantDef),
    Constraint(ConstraintDef),
    Field(FieldDef),
}

impl Statement {
    pub fn pos(&self) -> &Position {
        match self {
            Statement::Namespace(n) => &n.pos,
            Statement::Type(t) => &t.pos,
            Statement::Variant(v) => &v.pos,
            Statement::Constraint(c) => &c.pos,
            Statement::Field(f) => &f.pos,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Body {
    pub statements: Vec<Statement>,
    pub pos: Position,
}

impl Body {
    pub fn is_empty(&self) -> bool {
        self.statements.is_empty()
    }
}
