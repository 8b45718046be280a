//! # mcproto: protocol schema compiler
//!
//! A small declarative language for describing packet layouts, and a compiler
//! that turns schema text into a resolved tree of namespaces, structs and
//! tagged-union variants with shared, deduplicated type instances.
//!
//! ## Schema structure
//!
//! - **Namespaces**: `namespace name { ... };` group declarations; lookups fall
//!   back to enclosing namespaces.
//! - **Types**: `type name : spec;` aliases a builtin, a parameterized builtin or
//!   another user type; `type name { ... };` declares a struct.
//! - **Fields**: `a, b : spec;` inside a struct.
//! - **Variants**: `variant name { ... };` inside a struct declares one arm of a
//!   tagged union. The arm copies the struct's fields and constraints as they
//!   are at that point and adds its own. `variant { ... };` groups arms that
//!   share extra fields.
//! - **Constraints**: `field = literal;` fixes a value for an arm.
//!
//! ## Builtins
//!
//! `bool varint varlong byte ubyte short ushort int uint long ulong float
//! double position angle metadata nbt slot`, plus the parameterized
//! `string [length] [utf8|utf16]`, `bytes [length|remaining]`,
//! `uuid [binary|hex|hyphenated]`, `array <length> <elem>` and
//! `bool_optional <elem>`.
//!
//! ## Example schema
//!
//! ```text
//! namespace handshake {
//!     type packet {
//!         id : varint;
//!         variant hello {
//!             id = 0;
//!             protocol : varint;
//!             host : string 255;
//!         };
//!         variant ping { id = 1; payload : long; };
//!     };
//! };
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let schema = mcproto::compile("handshake.mcproto", source)?;
//! let packet = schema.get_struct("handshake.packet").unwrap();
//! for (path, ty) in mcproto::walk(&schema) {
//!     println!("{}: {}", path.join("."), schema.type_name(ty));
//! }
//! ```
//!
//! See `tests/integration.rs` for more.

pub mod ast;
pub mod compiler;
pub mod dump;
pub mod error;
pub mod lexer;
pub mod lint;
pub mod namespace;
pub mod parser;
pub mod types;
pub mod walk;

pub use ast::{Body, Literal, Statement};
pub use compiler::{compile, compile_file, CompileOptions, Compiler};
pub use dump::dump;
pub use error::CompileError;
pub use lexer::{Lexer, Position, Token, TokenKind};
pub use lint::{lint, lint_fix, LintMessage, LintRule, Severity};
pub use namespace::{Item, Schema, Scope, ScopeId, ScopeKind, Struct};
pub use parser::parse;
pub use types::{Builtin, Length, ParamId, ParamType, TypeCache, TypeRef};
pub use walk::{walk, Node, TypeWalker};
