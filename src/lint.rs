//! Linter for protocol schemas.
//!
//! ## Style rules (source text)
//!
//! - **Indentation**: exactly one tab per depth level, no spaces. Depth increases after `{` and
//!   decreases at `}`; a line starting with `}` is indented at the outer depth.
//! - **One statement per line**: at most one `;` per line (warning, since one-line arms such as
//!   `variant a { kind = 1; };` are common).
//! - **No trailing whitespace**.
//!
//! ## Compile rules
//!
//! - **Field after variant**: a struct gains a field after its first variant was declared. The
//!   variant's snapshot of the struct does not include that field. Reported by the compiler into
//!   [`Schema::warnings`](crate::Schema::warnings).
//!
//! Run via the `lint_schema` binary: `lint_schema file.mcproto` or `lint_schema < file.mcproto`.

use crate::lexer::Position;

/// Severity of a lint finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// Identifies which rule produced the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LintRule {
    /// Indentation must use tabs only (no spaces).
    IndentationTabsOnly,
    /// Indentation must be exactly N tabs at depth N.
    IndentationDepth,
    /// At most one statement per line.
    OneStatementPerLine,
    /// Trailing whitespace is not allowed.
    NoTrailingWhitespace,
    /// Field declared in a struct after one of its variants.
    FieldAfterVariant,
}

impl LintRule {
    pub fn id(self) -> &'static str {
        match self {
            LintRule::IndentationTabsOnly => "indentation-tabs-only",
            LintRule::IndentationDepth => "indentation-depth",
            LintRule::OneStatementPerLine => "one-statement-per-line",
            LintRule::NoTrailingWhitespace => "no-trailing-whitespace",
            LintRule::FieldAfterVariant => "field-after-variant",
        }
    }
}

/// A single lint message with location.
#[derive(Debug, Clone, PartialEq)]
pub struct LintMessage {
    pub line: usize,
    pub column: usize,
    pub rule: LintRule,
    pub severity: Severity,
    pub message: String,
}

impl LintMessage {
    pub(crate) fn field_after_variant(pos: &Position, field: &str, structure: &str) -> Self {
        LintMessage {
            line: pos.line as usize,
            column: pos.column as usize,
            rule: LintRule::FieldAfterVariant,
            severity: Severity::Warning,
            message: format!(
                "field `{}` added to `{}` after its first variant; existing variants do not inherit it",
                field, structure
            ),
        }
    }
}

/// Characters of `line` outside quoted literals, with their byte offsets.
fn code_chars(line: &str) -> impl Iterator<Item = (usize, char)> + '_ {
    let mut quote = None;
    let mut escaped = false;
    line.char_indices().filter(move |&(_, c)| match quote {
        Some(q) => {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            false
        }
        None => {
            if c == '"' || c == '\'' {
                quote = Some(c);
                return false;
            }
            true
        }
    })
}

fn strip_comment(line: &str) -> &str {
    match code_chars(line).find(|&(_, c)| c == '#') {
        Some((i, _)) => line[..i].trim_end(),
        None => line,
    }
}

fn count_code(content: &str, target: char) -> usize {
    code_chars(content).filter(|&(_, c)| c == target).count()
}

fn brace_delta(content: &str) -> i32 {
    count_code(content, '{') as i32 - count_code(content, '}') as i32
}

fn leading_closers(content: &str) -> i32 {
    content
        .chars()
        .take_while(|c| *c == '}' || c.is_whitespace())
        .filter(|c| *c == '}')
        .count() as i32
}

/// Run all style rules on schema source. Returns messages in line order.
pub fn lint(source: &str) -> Vec<LintMessage> {
    let mut out = Vec::new();
    let mut depth: i32 = 0;

    for (i, line) in source.lines().enumerate() {
        let line_no = i + 1;

        if line != line.trim_end() {
            out.push(LintMessage {
                line: line_no,
                column: line.trim_end().len() + 1,
                rule: LintRule::NoTrailingWhitespace,
                severity: Severity::Warning,
                message: "trailing whitespace not allowed".to_string(),
            });
        }

        let trimmed = line.trim_start();
        let leading = &line[..line.len() - trimmed.len()];
        let content = strip_comment(trimmed);

        if leading.contains(' ') {
            out.push(LintMessage {
                line: line_no,
                column: 1,
                rule: LintRule::IndentationTabsOnly,
                severity: Severity::Error,
                message: "indentation must use tabs only (no spaces)".to_string(),
            });
        }

        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            let tab_count = leading.chars().filter(|&c| c == '\t').count();
            let expected = (depth - leading_closers(content)).max(0) as usize;
            if tab_count != expected {
                out.push(LintMessage {
                    line: line_no,
                    column: 1,
                    rule: LintRule::IndentationDepth,
                    severity: Severity::Error,
                    message: format!("expected {} tab(s) at depth {} (found {})", expected, expected, tab_count),
                });
            }
        }

        let semicolons = count_code(content, ';');
        if semicolons > 1 {
            out.push(LintMessage {
                line: line_no,
                column: 1,
                rule: LintRule::OneStatementPerLine,
                severity: Severity::Warning,
                message: format!("one statement per line (found {} semicolons)", semicolons),
            });
        }

        depth += brace_delta(content);
    }

    out
}

/// Re-indent schema source with tabs by depth and drop trailing whitespace.
pub fn lint_fix(source: &str) -> String {
    let mut depth: i32 = 0;
    let mut out_lines: Vec<String> = Vec::new();
    for line in source.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            out_lines.push(String::new());
            continue;
        }
        let content = strip_comment(trimmed);
        let indent = (depth - leading_closers(content)).max(0) as usize;
        out_lines.push(format!("{}{}", "\t".repeat(indent), trimmed));
        depth += brace_delta(content);
    }
    out_lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lint_tabs_only() {
        let src = "type p {\n  x : byte;\n};";
        let msgs = lint(src);
        assert!(msgs.iter().any(|m| m.rule == LintRule::IndentationTabsOnly));
    }

    #[test]
    fn lint_one_statement_per_line_is_a_warning() {
        let src = "type p {\n\tx : byte; y : byte;\n};";
        let msgs = lint(src);
        let found: Vec<_> = msgs.iter().filter(|m| m.rule == LintRule::OneStatementPerLine).collect();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
    }

    #[test]
    fn lint_clean_source_passes() {
        let src = "namespace h {\n\ttype p {\n\t\tid : varint;  # comment\n\t};\n};\n";
        let msgs = lint(src);
        let errors: Vec<_> = msgs.iter().filter(|m| m.severity == Severity::Error).collect();
        assert!(errors.is_empty(), "clean source should have no errors: {:?}", msgs);
    }

    #[test]
    fn lint_trailing_whitespace() {
        let msgs = lint("x : int; \n");
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].rule, LintRule::NoTrailingWhitespace);
        assert_eq!(msgs[0].column, 9);
    }

    #[test]
    fn lint_ignores_markers_inside_strings() {
        let src = "type p {\n\ttag = 'a#b{;';\n\tname = \"x;\\\"}\";  # real comment {\n};\n";
        let msgs = lint(src);
        assert!(msgs.is_empty(), "{:?}", msgs);
        assert_eq!(strip_comment("tag = 'a#b'; # c"), "tag = 'a#b';");
        assert_eq!(lint_fix(src), src);
    }

    #[test]
    fn lint_fix_reindents() {
        let fixed = lint_fix("type p {\n    x : byte;   \n  };\n");
        assert_eq!(fixed, "type p {\n\tx : byte;\n};\n");
        assert!(lint(&fixed).is_empty());
    }
}
