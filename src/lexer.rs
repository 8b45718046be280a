//! Tokenizer for schema source text.
//!
//! Tokens are matched one at a time with the PEG rules in `grammar.pest`, at
//! the current byte offset. Comments, whitespace and newline runs are skipped
//! (newlines still advance line tracking). Identifiers, keywords and symbols
//! are ASCII case-folded; string and number literals keep their exact text.
//!
//! The lexer is lazy: nothing is scanned until [`Lexer::peek`] asks for the
//! current token. Input that matches no token rule is reported as a
//! [`CompileError::Lexical`], so callers can tell a clean end of input
//! (`Ok(None)`) from garbage.

use crate::error::CompileError;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::fmt;
use std::sync::Arc;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct TokenGrammar;

/// Reserved words. Matched after case-folding.
pub const KEYWORDS: [&str; 3] = ["type", "namespace", "variant"];

/// Source location: source name, 1-based line, 1-based column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Position {
    pub source: Arc<str>,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(source: impl Into<Arc<str>>, line: u32, column: u32) -> Self {
        Position {
            source: source.into(),
            line,
            column,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.source, self.line, self.column)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Symbol,
    Ident,
    Keyword,
    Str,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Case-folded for symbols, identifiers and keywords; verbatim for literals.
    pub text: String,
    pub pos: Position,
}

impl Token {
    pub fn is_literal(&self) -> bool {
        matches!(self.kind, TokenKind::Str | TokenKind::Number)
    }

    pub fn is(&self, text: &str) -> bool {
        !self.is_literal() && self.text == text
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'src> {
    name: Arc<str>,
    src: &'src str,
    offset: usize,
    line: u32,
    column: u32,
    current: Option<Token>,
}

impl<'src> Lexer<'src> {
    pub fn new(name: impl Into<Arc<str>>, src: &'src str) -> Self {
        Lexer {
            name: name.into(),
            src,
            offset: 0,
            line: 1,
            column: 1,
            current: None,
        }
    }

    pub fn source_name(&self) -> &Arc<str> {
        &self.name
    }

    /// Rewind to the start of the source.
    pub fn restart(&mut self) {
        self.offset = 0;
        self.line = 1;
        self.column = 1;
        self.current = None;
    }

    /// Position of the next unscanned character.
    pub fn here(&self) -> Position {
        Position::new(self.name.clone(), self.line, self.column)
    }

    /// Position of the current token, or of the end of input.
    pub fn pos(&mut self) -> Result<Position, CompileError> {
        Ok(match self.peek()? {
            Some(tok) => tok.pos.clone(),
            None => self.here(),
        })
    }

    /// The current token, scanning it if needed. `Ok(None)` at end of input.
    pub fn peek(&mut self) -> Result<Option<&Token>, CompileError> {
        if self.current.is_none() {
            self.current = self.scan()?;
        }
        Ok(self.current.as_ref())
    }

    /// Consume and return the current token.
    pub fn advance(&mut self) -> Result<Option<Token>, CompileError> {
        self.peek()?;
        Ok(self.current.take())
    }

    /// Consume the current token if it is the non-literal `text`.
    pub fn accept(&mut self, text: &str) -> Result<bool, CompileError> {
        let matched = matches!(self.peek()?, Some(tok) if tok.is(text));
        if matched {
            self.current = None;
        }
        Ok(matched)
    }

    /// Like [`accept`](Self::accept), but a mismatch is a syntax error.
    pub fn expect(&mut self, text: &str) -> Result<(), CompileError> {
        if self.accept(text)? {
            return Ok(());
        }
        let pos = self.pos()?;
        Err(CompileError::syntax(&pos, format!("`{}`", text)))
    }

    pub fn at(&mut self, text: &str) -> Result<bool, CompileError> {
        Ok(matches!(self.peek()?, Some(tok) if tok.is(text)))
    }

    pub fn at_kind(&mut self, kind: TokenKind) -> Result<bool, CompileError> {
        Ok(matches!(self.peek()?, Some(tok) if tok.kind == kind))
    }

    pub fn at_literal(&mut self) -> Result<bool, CompileError> {
        Ok(matches!(self.peek()?, Some(tok) if tok.is_literal()))
    }

    pub fn at_eof(&mut self) -> Result<bool, CompileError> {
        Ok(self.peek()?.is_none())
    }

    fn scan(&mut self) -> Result<Option<Token>, CompileError> {
        loop {
            if self.offset >= self.src.len() {
                return Ok(None);
            }
            let src = self.src;
            let rest = &src[self.offset..];
            let pair = TokenGrammar::parse(Rule::token, rest)
                .ok()
                .and_then(|mut pairs| pairs.next())
                .and_then(|token| token.into_inner().next())
                .filter(|pair| !pair.as_str().is_empty());
            let Some(pair) = pair else {
                let found = rest.chars().next().unwrap_or_default();
                return Err(CompileError::Lexical {
                    pos: self.here(),
                    message: format!("unexpected character {:?}", found),
                });
            };
            let text = pair.as_str();
            let pos = self.here();
            let kind = match pair.as_rule() {
                Rule::comment | Rule::whitespace | Rule::newline => None,
                Rule::symbol => Some(TokenKind::Symbol),
                Rule::ident => Some(TokenKind::Ident),
                Rule::string => Some(TokenKind::Str),
                Rule::number => Some(TokenKind::Number),
                other => {
                    return Err(CompileError::Lexical {
                        pos,
                        message: format!("unclassified token rule {:?}", other),
                    })
                }
            };
            self.consume(text);
            let Some(kind) = kind else {
                continue;
            };
            let token = match kind {
                TokenKind::Str | TokenKind::Number => Token {
                    kind,
                    text: text.to_string(),
                    pos,
                },
                _ => {
                    let folded = text.to_ascii_lowercase();
                    let kind = if KEYWORDS.contains(&folded.as_str()) {
                        TokenKind::Keyword
                    } else {
                        kind
                    };
                    Token {
                        kind,
                        text: folded,
                        pos,
                    }
                }
            };
            return Ok(Some(token));
        }
    }

    fn consume(&mut self, text: &str) {
        self.offset += text.len();
        match text.rfind('\n') {
            Some(last) => {
                self.line += text.matches('\n').count() as u32;
                self.column = text[last + 1..].chars().count() as u32 + 1;
            }
            None => self.column += text.chars().count() as u32,
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<Token, CompileError>;

    /// Ends after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        let item = self.advance().transpose();
        if matches!(item, Some(Err(_))) {
            self.offset = self.src.len();
        }
        item
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<Token> {
        Lexer::new("test", src)
            .collect::<Result<Vec<_>, _>>()
            .expect("lex")
    }

    #[test]
    fn classifies_tokens() {
        let toks = tokens("type Foo : array 0x10 \"Bar\";");
        let kinds: Vec<_> = toks.iter().map(|t| t.kind).collect();
        assert_eq!(
            kinds,
            vec![
                TokenKind::Keyword,
                TokenKind::Ident,
                TokenKind::Symbol,
                TokenKind::Ident,
                TokenKind::Number,
                TokenKind::Str,
                TokenKind::Symbol,
            ]
        );
        assert_eq!(toks[1].text, "foo");
        assert_eq!(toks[5].text, "\"Bar\"");
    }

    #[test]
    fn skips_comments_and_tracks_lines() {
        let toks = tokens("# header\nnamespace a {\n\tx : int;\n}");
        assert_eq!(toks[0].text, "namespace");
        assert_eq!((toks[0].pos.line, toks[0].pos.column), (2, 1));
        let x = toks.iter().find(|t| t.text == "x").expect("x");
        assert_eq!((x.pos.line, x.pos.column), (3, 2));
    }

    #[test]
    fn keywords_fold_case() {
        let toks = tokens("VARIANT Namespace");
        assert!(toks.iter().all(|t| t.kind == TokenKind::Keyword));
        assert_eq!(toks[0].text, "variant");
    }

    #[test]
    fn accept_only_advances_on_match() {
        let mut lex = Lexer::new("test", "a ; b");
        assert!(!lex.accept(";").unwrap());
        assert!(lex.accept("a").unwrap());
        assert!(lex.accept(";").unwrap());
        assert!(lex.at("b").unwrap());
    }

    #[test]
    fn string_literal_does_not_match_keyword() {
        let mut lex = Lexer::new("test", "\"type\"");
        assert!(!lex.accept("\"type\"").unwrap());
        assert!(lex.at_literal().unwrap());
    }

    #[test]
    fn expect_reports_position() {
        let mut lex = Lexer::new("test", "\n  foo");
        let err = lex.expect(";").unwrap_err();
        match err {
            CompileError::Syntax { pos, expected } => {
                assert_eq!((pos.line, pos.column), (2, 3));
                assert_eq!(expected, "`;`");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn here_tracks_scan_position() {
        let mut lex = Lexer::new("test", "ab\n  cd");
        assert_eq!(lex.here(), Position::new("test", 1, 1));
        assert_eq!(lex.advance().unwrap().unwrap().text, "ab");
        assert_eq!(lex.pos().unwrap(), Position::new("test", 2, 3));
        assert!(lex.advance().unwrap().is_some());
        assert_eq!(lex.pos().unwrap(), Position::new("test", 2, 5));
    }

    #[test]
    fn garbage_is_a_lexical_error() {
        let mut lex = Lexer::new("test", "a @");
        assert!(lex.accept("a").unwrap());
        assert!(matches!(lex.peek(), Err(CompileError::Lexical { .. })));
    }

    #[test]
    fn clean_eof_is_none() {
        let mut lex = Lexer::new("test", "  # trailing comment\n");
        assert!(lex.peek().unwrap().is_none());
    }

    #[test]
    fn restart_rescans() {
        let mut lex = Lexer::new("test", "a b");
        assert_eq!(lex.by_ref().count(), 2);
        lex.restart();
        assert_eq!(lex.next().unwrap().unwrap().text, "a");
    }
}
