//! Diagnostics produced while parsing or executing a script.
//!
//! Every error carries the 1-based source line that triggered it and renders
//! as a single human-readable message, e.g. `[Line 3]: Command "foo" not found.`

use thiserror::Error;

/// Result type alias used by the parser and interpreter.
pub type Result<T> = std::result::Result<T, ScriptError>;

/// Errors that abort a script evaluation.
#[derive(Error, Clone, Debug, PartialEq, Eq)]
pub enum ScriptError {
    /// Malformed line, bad indentation, or indentation outside a function.
    #[error("[Line {line}]: {message}")]
    Syntax { line: usize, message: String },

    /// A command received the wrong number of arguments.
    #[error("[Line {line}]: {command} needs {expected}, e.g. '{usage}'")]
    Arity {
        line: usize,
        command: String,
        expected: String,
        usage: String,
    },

    /// An argument is present but cannot be used (bad number, colour, group id...).
    #[error("[Line {line}]: {command}: {message}")]
    ArgumentValue {
        line: usize,
        command: String,
        message: String,
    },

    /// The command name is neither a built-in nor a defined function.
    #[error("[Line {line}]: Command \"{command}\" not found.")]
    CommandNotFound { line: usize, command: String },

    /// User functions called each other deeper than the configured limit.
    #[error("[Line {line}]: {command} exceeded the maximum call depth of {limit}.")]
    CallDepth {
        line: usize,
        command: String,
        limit: usize,
    },
}

/// Coarse classification of a [`ScriptError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    Arity,
    ArgumentValue,
    CommandNotFound,
    CallDepth,
}

impl ScriptError {
    pub(crate) fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub(crate) fn argument(line: usize, command: &str, message: impl Into<String>) -> Self {
        Self::ArgumentValue {
            line,
            command: command.to_string(),
            message: message.into(),
        }
    }

    /// The source line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            Self::Syntax { line, .. }
            | Self::Arity { line, .. }
            | Self::ArgumentValue { line, .. }
            | Self::CommandNotFound { line, .. }
            | Self::CallDepth { line, .. } => *line,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Syntax { .. } => ErrorKind::Syntax,
            Self::Arity { .. } => ErrorKind::Arity,
            Self::ArgumentValue { .. } => ErrorKind::ArgumentValue,
            Self::CommandNotFound { .. } => ErrorKind::CommandNotFound,
            Self::CallDepth { .. } => ErrorKind::CallDepth,
        }
    }
}
