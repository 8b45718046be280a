//! Compile errors. Every error carries the source position of the offending
//! token or declaration; compilation stops at the first one.

use crate::ast::Literal;
use crate::lexer::Position;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum CompileError {
    /// No token pattern matches at the current offset.
    #[error("{pos}: lexical error: {message}")]
    Lexical { pos: Position, message: String },

    #[error("{pos}: syntax error: expected {expected}")]
    Syntax { pos: Position, expected: String },

    #[error("{pos}: duplicate {what} `{name}`")]
    Duplicate {
        pos: Position,
        what: &'static str,
        name: String,
    },

    #[error("{pos}: unknown type `{name}`")]
    UnknownType { pos: Position, name: String },

    /// A builtin or user type received the wrong number or kind of arguments.
    #[error("{pos}: bad arguments for `{type_name}`: {message}")]
    Arity {
        pos: Position,
        type_name: String,
        message: String,
    },

    #[error("{pos}: inconsistent constraint `{name}`: already {existing}, got {found}")]
    InconsistentConstraint {
        pos: Position,
        name: String,
        existing: Literal,
        found: Literal,
    },

    #[error("{pos}: constraint `{name} = {value}` does not fit field type `{type_name}`")]
    ConstraintType {
        pos: Position,
        name: String,
        value: Literal,
        type_name: String,
    },

    #[error("{pos}: variant {} has no enclosing struct", .name.as_deref().unwrap_or("<anonymous>"))]
    UnresolvedBranch { pos: Position, name: Option<String> },

    /// Fields and constraints only make sense inside a struct.
    #[error("{pos}: {what} declared outside of a struct")]
    Misplaced { pos: Position, what: &'static str },

    #[error("{}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CompileError {
    /// Source position of the error, if it came from schema text.
    pub fn pos(&self) -> Option<&Position> {
        match self {
            CompileError::Lexical { pos, .. }
            | CompileError::Syntax { pos, .. }
            | CompileError::Duplicate { pos, .. }
            | CompileError::UnknownType { pos, .. }
            | CompileError::Arity { pos, .. }
            | CompileError::InconsistentConstraint { pos, .. }
            | CompileError::ConstraintType { pos, .. }
            | CompileError::UnresolvedBranch { pos, .. }
            | CompileError::Misplaced { pos, .. } => Some(pos),
            CompileError::Io { .. } => None,
        }
    }

    pub(crate) fn syntax(pos: &Position, expected: impl Into<String>) -> Self {
        CompileError::Syntax {
            pos: pos.clone(),
            expected: expected.into(),
        }
    }

    pub(crate) fn arity(pos: &Position, type_name: &str, message: impl Into<String>) -> Self {
        CompileError::Arity {
            pos: pos.clone(),
            type_name: type_name.to_string(),
            message: message.into(),
        }
    }
}
