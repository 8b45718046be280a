//! Recursive-descent parser: schema source to AST.
//!
//! ```text
//! body         := (namespacedef | typedef | variantdef | field_or_constraint)? ';' ...
//! namespacedef := 'namespace' IDENT ('{' body '}')?
//! typedef      := 'type' IDENT ((':' typespec) | ('{' body '}'))?
//! variantdef   := 'variant' IDENT? ('{' body '}')?
//! typespec     := (dottedname | literal | '(' typespec ')' | '{' body '}')+
//! field_or_constraint := dottedname '=' (dottedname | literal)
//!                      | IDENT (',' IDENT)* ':' typespec
//! ```
//!
//! One token of lookahead (the lexer's current token). Every node records the
//! position of its first token.

use crate::ast::*;
use crate::error::CompileError;
use crate::lexer::{Lexer, Position, TokenKind};
use std::sync::Arc;

/// Parse a whole schema source into its top-level body.
pub fn parse(name: impl Into<Arc<str>>, source: &str) -> Result<Body, CompileError> {
    let mut parser = Parser::new(Lexer::new(name, source));
    let body = parser.body()?;
    if !parser.lex.at_eof()? {
        let pos = parser.lex.pos()?;
        return Err(CompileError::syntax(&pos, "a declaration"));
    }
    Ok(body)
}

pub struct Parser<'src> {
    lex: Lexer<'src>,
}

impl<'src> Parser<'src> {
    pub fn new(lex: Lexer<'src>) -> Self {
        Parser { lex }
    }

    pub fn body(&mut self) -> Result<Body, CompileError> {
        let pos = self.lex.pos()?;
        let mut statements = Vec::new();
        loop {
            if self.lex.at("variant")? {
                statements.push(Statement::Variant(self.variantdef()?));
            } else if self.lex.at("namespace")? {
                statements.push(Statement::Namespace(self.namespacedef()?));
            } else if self.lex.at("type")? {
                statements.push(Statement::Type(self.typedef()?));
            } else if self.lex.at(";")? {
                // empty statement
            } else if self.lex.at_literal()? || self.lex.at_kind(TokenKind::Ident)? {
                statements.push(self.field_or_constraint()?);
            } else {
                break;
            }
            self.lex.expect(";")?;
        }
        Ok(Body { statements, pos })
    }

    fn identifier(&mut self) -> Result<Option<Identifier>, CompileError> {
        if !self.lex.at_kind(TokenKind::Ident)? {
            return Ok(None);
        }
        Ok(self.lex.advance()?.map(|tok| Identifier {
            name: tok.text,
            pos: tok.pos,
        }))
    }

    fn required_identifier(&mut self, what: &str) -> Result<Identifier, CompileError> {
        match self.identifier()? {
            Some(id) => Ok(id),
            None => {
                let pos = self.lex.pos()?;
                Err(CompileError::syntax(&pos, what))
            }
        }
    }

    /// Dotted name: `a.b.c`.
    fn name(&mut self) -> Result<Option<Identifier>, CompileError> {
        let Some(first) = self.identifier()? else {
            return Ok(None);
        };
        let mut path = first.name;
        while self.lex.accept(".")? {
            let next = self.required_identifier("identifier after `.`")?;
            path.push('.');
            path.push_str(&next.name);
        }
        Ok(Some(Identifier {
            name: path,
            pos: first.pos,
        }))
    }

    fn value(&mut self) -> Result<Option<Value>, CompileError> {
        if !self.lex.at_literal()? {
            return Ok(None);
        }
        let Some(tok) = self.lex.advance()? else {
            return Ok(None);
        };
        let literal = parse_literal(tok.kind, &tok.text, &tok.pos)?;
        Ok(Some(Value {
            literal,
            token: tok.text,
            pos: tok.pos,
        }))
    }

    fn operand(&mut self) -> Result<Option<Operand>, CompileError> {
        if let Some(id) = self.name()? {
            return Ok(Some(Operand::Name(id)));
        }
        Ok(self.value()?.map(Operand::Value))
    }

    pub fn typespec(&mut self) -> Result<Option<TypeExpr>, CompileError> {
        let pos = self.lex.pos()?;
        let mut args: Vec<TypeArg> = Vec::new();
        loop {
            if self.lex.accept("(")? {
                let inner = match self.typespec()? {
                    Some(inner) => inner,
                    None => {
                        let pos = self.lex.pos()?;
                        return Err(CompileError::syntax(&pos, "type inside `(` `)`"));
                    }
                };
                self.lex.expect(")")?;
                if args.is_empty() {
                    return Ok(Some(inner));
                }
                args.push(inner.into());
            } else if self.lex.accept("{")? {
                let body = self.body()?;
                self.lex.expect("}")?;
                if args.is_empty() {
                    return Ok(Some(TypeExpr::Body(body)));
                }
                args.push(TypeArg::Body(body));
            } else if let Some(id) = self.name()? {
                args.push(TypeArg::Name(id));
            } else if let Some(value) = self.value()? {
                args.push(TypeArg::Value(value));
            } else {
                break;
            }
        }
        if args.is_empty() {
            return Ok(None);
        }
        Ok(Some(TypeExpr::Spec(TypeSpec { args, pos })))
    }

    fn braced_body(&mut self) -> Result<Option<Body>, CompileError> {
        if !self.lex.accept("{")? {
            return Ok(None);
        }
        let body = self.body()?;
        self.lex.expect("}")?;
        Ok(Some(body))
    }

    fn variantdef(&mut self) -> Result<VariantDef, CompileError> {
        let pos = self.lex.pos()?;
        self.lex.expect("variant")?;
        let name = self.identifier()?;
        let body = self.braced_body()?;
        Ok(VariantDef { name, body, pos })
    }

    fn namespacedef(&mut self) -> Result<NamespaceDef, CompileError> {
        let pos = self.lex.pos()?;
        self.lex.expect("namespace")?;
        let name = self.required_identifier("namespace name")?;
        let body = self.braced_body()?;
        Ok(NamespaceDef { name, body, pos })
    }

    fn typedef(&mut self) -> Result<TypeDef, CompileError> {
        let pos = self.lex.pos()?;
        self.lex.expect("type")?;
        let name = self.required_identifier("type name")?;
        let spec = if self.lex.accept(":")? {
            match self.typespec()? {
                Some(spec) => Some(spec),
                None => {
                    let pos = self.lex.pos()?;
                    return Err(CompileError::syntax(&pos, "type after `:`"));
                }
            }
        } else if self.lex.at("{")? {
            self.typespec()?
        } else {
            None
        };
        Ok(TypeDef { name, spec, pos })
    }

    fn field_or_constraint(&mut self) -> Result<Statement, CompileError> {
        let pos = self.lex.pos()?;
        let Some(left) = self.operand()? else {
            return Err(CompileError::syntax(&pos, "field name or constraint"));
        };

        if self.lex.accept("=")? {
            let Some(right) = self.operand()? else {
                let pos = self.lex.pos()?;
                return Err(CompileError::syntax(&pos, "value after `=`"));
            };
            return Ok(Statement::Constraint(ConstraintDef { left, right, pos }));
        }

        let first = match left {
            Operand::Name(id) if id.is_local() => id,
            other => return Err(CompileError::syntax(other.pos(), "local field name")),
        };
        let mut names = vec![first];
        loop {
            if self.lex.accept(":")? {
                break;
            }
            if !self.lex.accept(",")? {
                let pos = self.lex.pos()?;
                return Err(CompileError::syntax(&pos, "`:` or `,` after field name"));
            }
            names.push(self.required_identifier("field name")?);
        }

        let Some(field_type) = self.typespec()? else {
            let pos = self.lex.pos()?;
            return Err(CompileError::syntax(&pos, "field type"));
        };
        Ok(Statement::Field(FieldDef {
            names,
            field_type,
            pos,
        }))
    }
}

/// Convert a literal token to its value.
pub fn parse_literal(kind: TokenKind, text: &str, pos: &Position) -> Result<Literal, CompileError> {
    match kind {
        TokenKind::Number => parse_number(text)
            .map(Literal::Number)
            .ok_or_else(|| CompileError::Lexical {
                pos: pos.clone(),
                message: format!("number {} out of range", text),
            }),
        TokenKind::Str => Ok(Literal::String(unescape(text))),
        _ => Err(CompileError::syntax(pos, "a literal")),
    }
}

fn parse_number(text: &str) -> Option<i64> {
    let (negative, digits) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    let lower = digits.to_ascii_lowercase();
    let (radix, digits) = if let Some(d) = lower.strip_prefix("0x") {
        (16, d)
    } else if let Some(d) = lower.strip_prefix("0o") {
        (8, d)
    } else if let Some(d) = lower.strip_prefix("0b") {
        (2, d)
    } else {
        (10, lower.as_str())
    };
    let magnitude = i128::from_str_radix(digits, radix).ok()?;
    let value = if negative { -magnitude } else { magnitude };
    i64::try_from(value).ok()
}

fn unescape(token: &str) -> String {
    let inner = &token[1..token.len().saturating_sub(1).max(1)];
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('\'') => out.push('\''),
            Some('x') => {
                let hex: String = chars.clone().take(2).collect();
                match u8::from_str_radix(&hex, 16) {
                    Ok(byte) if hex.len() == 2 => {
                        out.push(char::from(byte));
                        chars.nth(1);
                    }
                    _ => out.push_str("\\x"),
                }
            }
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers_in_every_radix() {
        assert_eq!(parse_number("42"), Some(42));
        assert_eq!(parse_number("-0x10"), Some(-16));
        assert_eq!(parse_number("0o17"), Some(15));
        assert_eq!(parse_number("0B101"), Some(5));
        assert_eq!(parse_number("-9223372036854775808"), Some(i64::MIN));
        assert_eq!(parse_number("9223372036854775808"), None);
    }

    #[test]
    fn string_escapes() {
        assert_eq!(unescape(r#""a\"b""#), "a\"b");
        assert_eq!(unescape(r"'tab\there'"), "tab\there");
        assert_eq!(unescape(r#""\x41\q""#), "A\\q");
        assert_eq!(unescape(r#""""#), "");
    }

    #[test]
    fn parenthesized_spec_collapses() {
        let a = parse("t", "type foo: (bar);").expect("parse");
        let b = parse("t", "type foo: bar;").expect("parse");
        let spec = |body: &Body| match &body.statements[0] {
            Statement::Type(TypeDef {
                spec: Some(TypeExpr::Spec(spec)),
                ..
            }) => spec.args.clone(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(spec(&a).len(), 1);
        assert!(matches!(&spec(&a)[0], TypeArg::Name(id) if id.name == "bar"));
        assert!(matches!(&spec(&b)[0], TypeArg::Name(id) if id.name == "bar"));
    }

    #[test]
    fn braced_type_is_a_body() {
        let body = parse("t", "type p { a : int; };").expect("parse");
        match &body.statements[0] {
            Statement::Type(TypeDef {
                spec: Some(TypeExpr::Body(inner)),
                ..
            }) => assert_eq!(inner.statements.len(), 1),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn dotted_field_name_rejected() {
        let err = parse("t", "a.b : int;").unwrap_err();
        assert!(matches!(err, CompileError::Syntax { .. }));
    }

    #[test]
    fn missing_semicolon_rejected() {
        let err = parse("t", "namespace a {} namespace b {};").unwrap_err();
        match err {
            CompileError::Syntax { pos, expected } => {
                assert_eq!(expected, "`;`");
                assert_eq!(pos.column, 16);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn trailing_garbage_rejected() {
        assert!(parse("t", "x : int; }").is_err());
    }
}
