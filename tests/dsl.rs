//! Schema syntax tests: parse success/failure and the shape of the AST.

use mcproto::ast::{Operand, Statement, TypeArg, TypeExpr};
use mcproto::{parse, CompileError, Literal};

// ==================== Syntax: valid programs ====================

#[test]
fn parse_empty_source() {
    let body = parse("t", "").expect("empty source parses");
    assert!(body.is_empty());
}

#[test]
fn parse_only_comments_and_blank_statements() {
    let body = parse("t", "# header\n;;\n  # trailing\n").expect("parse");
    assert!(body.is_empty());
}

#[test]
fn parse_namespace_with_type() {
    let src = r#"
namespace h {
	type p {
		id : varint;
	};
};
"#;
    let body = parse("t", src).expect("parse");
    assert_eq!(body.statements.len(), 1);
    let Statement::Namespace(ns) = &body.statements[0] else {
        panic!("expected namespace, got {:?}", body.statements[0]);
    };
    assert_eq!(ns.name.name, "h");
    assert_eq!(ns.pos.line, 2);
    let inner = ns.body.as_ref().expect("namespace body");
    let Statement::Type(def) = &inner.statements[0] else {
        panic!("expected type");
    };
    assert_eq!(def.name.name, "p");
    assert!(matches!(def.spec, Some(TypeExpr::Body(_))));
}

#[test]
fn parse_type_forms() {
    let body = parse("t", "type a; type b : varint; type c : { x : int; }; type d { };").expect("parse");
    let specs: Vec<_> = body
        .statements
        .iter()
        .map(|s| match s {
            Statement::Type(def) => def.spec.clone(),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert!(specs[0].is_none());
    assert!(matches!(specs[1], Some(TypeExpr::Spec(_))));
    assert!(matches!(specs[2], Some(TypeExpr::Body(_))));
    assert!(matches!(specs[3], Some(TypeExpr::Body(_))));
}

#[test]
fn parse_multi_name_field() {
    let body = parse("t", "x, y, z : double;").expect("parse");
    let Statement::Field(field) = &body.statements[0] else {
        panic!("expected field");
    };
    let names: Vec<_> = field.names.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["x", "y", "z"]);
    assert_eq!(field.names[2].pos.column, 7);
}

#[test]
fn parse_nested_type_arguments() {
    let body = parse("t", "items : array varint (array 3 (string 16));").expect("parse");
    let Statement::Field(field) = &body.statements[0] else {
        panic!("expected field");
    };
    let TypeExpr::Spec(spec) = &field.field_type else {
        panic!("expected spec");
    };
    assert_eq!(spec.args.len(), 3);
    let TypeArg::Spec(inner) = &spec.args[2] else {
        panic!("expected nested spec, got {:?}", spec.args[2]);
    };
    assert_eq!(inner.args.len(), 3);
    assert!(matches!(inner.args[2], TypeArg::Spec(_)));
}

#[test]
fn parse_constraints() {
    let body = parse("t", "kind = 0x10; name = 'abc'; tag = other.name;").expect("parse");
    let rights: Vec<_> = body
        .statements
        .iter()
        .map(|s| match s {
            Statement::Constraint(c) => c.right.clone(),
            other => panic!("unexpected {:?}", other),
        })
        .collect();
    assert!(matches!(&rights[0], Operand::Value(v) if v.literal == Literal::Number(16)));
    assert!(matches!(&rights[1], Operand::Value(v) if v.literal == Literal::String("abc".into())));
    assert!(matches!(&rights[2], Operand::Name(id) if id.name == "other.name"));
}

#[test]
fn parse_variants_named_and_anonymous() {
    let body = parse("t", "type p { variant a { }; variant { variant b; }; };").expect("parse");
    let Statement::Type(def) = &body.statements[0] else {
        panic!("expected type");
    };
    let Some(TypeExpr::Body(inner)) = &def.spec else {
        panic!("expected body");
    };
    let Statement::Variant(a) = &inner.statements[0] else {
        panic!("expected variant");
    };
    assert_eq!(a.name.as_ref().map(|n| n.name.as_str()), Some("a"));
    let Statement::Variant(proxy) = &inner.statements[1] else {
        panic!("expected variant");
    };
    assert!(proxy.name.is_none());
    assert_eq!(proxy.body.as_ref().map(|b| b.statements.len()), Some(1));
}

#[test]
fn keywords_and_identifiers_are_case_insensitive() {
    let body = parse("t", "NAMESPACE Foo { TYPE Bar : VarInt; };").expect("parse");
    let Statement::Namespace(ns) = &body.statements[0] else {
        panic!("expected namespace");
    };
    assert_eq!(ns.name.name, "foo");
}

// ==================== Syntax: invalid programs ====================

fn syntax_error(src: &str) -> (u32, u32, String) {
    match parse("t", src) {
        Err(CompileError::Syntax { pos, expected }) => (pos.line, pos.column, expected),
        other => panic!("expected syntax error for {:?}, got {:?}", src, other),
    }
}

#[test]
fn missing_semicolon() {
    let (line, column, expected) = syntax_error("type a : int\ntype b : int;");
    assert_eq!((line, column), (2, 1));
    assert_eq!(expected, "`;`");
}

#[test]
fn unclosed_brace() {
    let (line, _, expected) = syntax_error("type p {\n\tx : int;\n");
    assert_eq!(line, 3);
    assert_eq!(expected, "`}`");
}

#[test]
fn field_without_type() {
    let (_, _, expected) = syntax_error("x : ;");
    assert_eq!(expected, "field type");
}

#[test]
fn type_colon_without_spec() {
    let (_, _, expected) = syntax_error("type a : ;");
    assert_eq!(expected, "type after `:`");
}

#[test]
fn namespace_without_name() {
    let (_, column, expected) = syntax_error("namespace { };");
    assert_eq!(column, 11);
    assert_eq!(expected, "namespace name");
}

#[test]
fn dotted_field_name_rejected() {
    let (_, _, expected) = syntax_error("a.b : int;");
    assert_eq!(expected, "local field name");
}

#[test]
fn stray_closing_brace() {
    let (_, column, expected) = syntax_error("type a; }");
    assert_eq!(column, 9);
    assert_eq!(expected, "a declaration");
}

#[test]
fn lexical_error_reports_position() {
    match parse("t", "type a : int;\n  @") {
        Err(CompileError::Lexical { pos, .. }) => assert_eq!((pos.line, pos.column), (2, 3)),
        other => panic!("expected lexical error, got {:?}", other),
    }
}

#[test]
fn error_display_includes_source_name() {
    let err = parse("schema.mcproto", "type").unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("schema.mcproto:1:5:"), "{}", text);
}
