use mcproto::lexer::{Lexer, TokenKind, KEYWORDS};
use mcproto::parser::parse_literal;
use mcproto::{compile, Literal, Position};
use proptest::prelude::*;

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        .. ProptestConfig::default()
    })]

    #[test]
    fn never_panics_and_positions_advance(s in ".*") {
        let mut last = (1u32, 0u32);
        let max_steps = s.len() + 1;
        for (steps, item) in Lexer::new("prop", &s).enumerate() {
            prop_assert!(steps <= max_steps, "too many tokens for input {s:?}");
            let Ok(tok) = item else { break };
            let here = (tok.pos.line, tok.pos.column);
            prop_assert!(here > last, "position went backwards: {here:?} after {last:?} input={s:?}");
            last = here;
        }
        // Compilation may fail, but must not panic.
        let _ = compile("prop", &s);
    }

    #[test]
    fn identifiers_fold_to_lowercase(name in "[A-Za-z_][A-Za-z0-9_]{0,12}") {
        let toks: Vec<_> = Lexer::new("prop", &name).collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(toks.len(), 1);
        let folded = name.to_ascii_lowercase();
        prop_assert_eq!(&toks[0].text, &folded);
        let expected = if KEYWORDS.contains(&folded.as_str()) {
            TokenKind::Keyword
        } else {
            TokenKind::Ident
        };
        prop_assert_eq!(toks[0].kind, expected);
    }

    #[test]
    fn numbers_parse_in_every_radix(n in any::<i64>()) {
        let sign = if n < 0 { "-" } else { "" };
        let abs = n.unsigned_abs();
        let pos = Position::new("prop", 1, 1);
        for text in [
            n.to_string(),
            format!("{sign}0x{abs:x}"),
            format!("{sign}0o{abs:o}"),
            format!("{sign}0b{abs:b}"),
        ] {
            let toks: Vec<_> = Lexer::new("prop", &text).collect::<Result<_, _>>().unwrap();
            prop_assert_eq!(toks.len(), 1, "{}", text);
            prop_assert_eq!(toks[0].kind, TokenKind::Number);
            let literal = parse_literal(toks[0].kind, &toks[0].text, &pos).unwrap();
            prop_assert_eq!(literal, Literal::Number(n));
        }
    }

    #[test]
    fn tokens_report_line_and_column(lines in prop::collection::vec(("[ \t]{0,4}", "[a-z]{1,8}"), 1..8)) {
        let src: String = lines
            .iter()
            .map(|(indent, word)| format!("{indent}x{word}"))
            .collect::<Vec<_>>()
            .join("\n");
        let toks: Vec<_> = Lexer::new("prop", &src).collect::<Result<_, _>>().unwrap();
        prop_assert_eq!(toks.len(), lines.len());
        for (i, (tok, (indent, _))) in toks.iter().zip(&lines).enumerate() {
            prop_assert_eq!(tok.pos.line as usize, i + 1);
            prop_assert_eq!(tok.pos.column as usize, indent.chars().count() + 1);
        }
    }
}
