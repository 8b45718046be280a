//! Compiler fuzz target: feed arbitrary text through lexer, parser and resolver.
//! Every input must produce a schema or a `CompileError`, never a panic.
//! Build with: cargo fuzz run compile_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    let s = match std::str::from_utf8(data) {
        Ok(x) => x,
        Err(_) => return,
    };
    if let Ok(schema) = mcproto::compile("fuzz", s) {
        let _ = mcproto::walk(&schema).count();
        let _ = mcproto::dump(&schema);
    }
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run compile_fuzz");
}
