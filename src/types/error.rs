use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::parse::ParseError;

/// Fatal problems that abort loading a script.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read storyboard file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storyboard file name '{name}' is not defined")]
    EmptyPath { name: String },

    #[error("invalid command '{command}' at line {line} of {file}")]
    InvalidCommand {
        command: String,
        line: usize,
        file: Arc<str>,
    },

    #[error("invalid state '{name}' at line {line} of {file}")]
    UnknownCondition {
        name: String,
        line: usize,
        file: Arc<str>,
    },

    #[error("invalid message number '{value}' at line {line} of {file}")]
    InvalidNumber {
        value: String,
        line: usize,
        file: Arc<str>,
    },

    #[error("reserved word used as function name '{name}' at line {line} of {file}")]
    ReservedName {
        name: String,
        line: usize,
        file: Arc<str>,
    },

    #[error("too many functions, limit reached at line {line} of {file}")]
    TooManyFunctions { line: usize, file: Arc<str> },

    #[error("instruction outside a function at line {line} of {file}")]
    OutsideFunction { line: usize, file: Arc<str> },

    #[error("{source} at line {line} of {file}")]
    Syntax {
        #[source]
        source: ParseError,
        line: usize,
        file: Arc<str>,
    },

    #[error("include nesting too deep at '{}'", .path.display())]
    IncludeDepth { path: PathBuf },

    #[error("{} unresolved reference(s); first: {}", .diagnostics.len(), .diagnostics[0])]
    Unresolved { diagnostics: Vec<Diagnostic> },
}

/// Non-fatal problems found while linking. The script still loads, with the
/// affected instruction degraded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// No list of an acceptable type has this name; the instruction never matches.
    UndefinedList {
        list: String,
        line: usize,
        file: Arc<str>,
    },
    /// No built-in or function has this name; the action is a no-op.
    UndefinedAction {
        action: String,
        line: usize,
        file: Arc<str>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UndefinedList { list, line, file } => {
                write!(f, "undefined list '{list}' used at line {line} of {file}")
            }
            Diagnostic::UndefinedAction { action, line, file } => {
                write!(f, "action not defined '{action}' at line {line} of {file}")
            }
        }
    }
}
