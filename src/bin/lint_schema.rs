//! Lint and compile schema files.
//!
//! Usage:
//!   lint_schema [OPTIONS] [FILE.mcproto ...]
//!   lint_schema < file.mcproto
//!
//! Each source is checked against the style rules, then compiled. Compile errors and
//! compile-time warnings (such as a field declared after a variant) are reported in the
//! same format as style findings.
//!
//! Options:
//!   --fix, -f       With stdin: print fixed source to stdout. With files: rewrite them in place.
//!   --human, -H     Human-readable output
//!   --no-compile    Style rules only
//!
//! Exits with status 1 if any error was reported.

use mcproto::lint::{lint, lint_fix, LintMessage, Severity};
use mcproto::Compiler;
use std::io::{self, Read, Write};
use std::path::Path;

#[derive(Clone, Copy)]
enum OutputStyle {
    Compact,
    Human,
}

#[derive(Default)]
struct Totals {
    errors: usize,
    warnings: usize,
}

impl Totals {
    fn count(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.errors += 1,
            Severity::Warning => self.warnings += 1,
        }
    }
}

fn print_message(path: &str, m: &LintMessage, style: OutputStyle) {
    let severity_str = match m.severity {
        Severity::Error => "error",
        Severity::Warning => "warning",
    };
    match style {
        OutputStyle::Compact => {
            println!(
                "{}:{}:{}: {}: {} [{}]",
                path,
                m.line,
                m.column,
                severity_str,
                m.message,
                m.rule.id()
            );
        }
        OutputStyle::Human => {
            println!("  {} {}:{}: {}", path, m.line, m.column, m.message);
            println!("    rule: {}", m.rule.id());
        }
    }
}

fn take_flag(args: &mut Vec<String>, names: &[&str]) -> bool {
    match args.iter().position(|a| names.contains(&a.as_str())) {
        Some(pos) => {
            args.remove(pos);
            true
        }
        None => false,
    }
}

/// Style-lint and compile one source, tallying findings into `totals`.
fn check(name: &str, src: &str, compile: bool, style: OutputStyle, totals: &mut Totals) {
    for m in &lint(src) {
        totals.count(m.severity);
        print_message(name, m, style);
    }
    if !compile {
        return;
    }
    match Compiler::new().compile(name, src) {
        Ok(compiler) => {
            for m in compiler.schema().warnings() {
                totals.count(m.severity);
                print_message(name, m, style);
            }
        }
        Err(e) => {
            totals.count(Severity::Error);
            match style {
                OutputStyle::Compact => println!("{}", e),
                OutputStyle::Human => println!("  {}", e),
            }
        }
    }
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let fix = take_flag(&mut args, &["--fix", "-f"]);
    let style = if take_flag(&mut args, &["--human", "-H"]) {
        OutputStyle::Human
    } else {
        OutputStyle::Compact
    };
    let compile = !take_flag(&mut args, &["--no-compile"]);

    let mut has_error = false;
    let mut totals = Totals::default();

    if args.is_empty() {
        let mut src = String::new();
        io::stdin().read_to_string(&mut src)?;
        if fix {
            io::stdout().write_all(lint_fix(&src).as_bytes())?;
            return Ok(());
        }
        check("<stdin>", &src, compile, style, &mut totals);
    } else {
        for path in &args {
            let path = Path::new(path);
            let src = match std::fs::read_to_string(path) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("{}: {}", path.display(), e);
                    has_error = true;
                    continue;
                }
            };
            let src = if fix {
                let fixed = lint_fix(&src);
                if fixed != src {
                    if let Err(e) = std::fs::write(path, &fixed) {
                        eprintln!("{}: write failed: {}", path.display(), e);
                        has_error = true;
                        continue;
                    }
                    eprintln!("{}: fixed", path.display());
                }
                fixed
            } else {
                src
            };
            check(&path.display().to_string(), &src, compile, style, &mut totals);
        }
    }

    if totals.errors > 0 || totals.warnings > 0 {
        eprintln!("lint: {} error(s), {} warning(s)", totals.errors, totals.warnings);
    }
    if has_error || totals.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}
