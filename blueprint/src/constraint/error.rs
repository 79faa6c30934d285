//! Errors raised while compiling constraint sources or resolving paths.

use std::fmt;

use thiserror::Error;

/// One-based line and column of a source location.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Position {
    /// Line number, starting at 1.
    pub line: usize,
    /// Column number in characters, starting at 1.
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Failure to turn source text into a value.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum CompileError {
    /// The source is not valid UTF-8.
    #[error("source is not valid UTF-8: {0}")]
    Encoding(#[from] std::str::Utf8Error),

    /// Malformed source text.
    #[error("{position}: {message}")]
    Syntax {
        /// Where the problem was detected.
        position: Position,
        /// What was expected or found.
        message: String,
    },

    /// A language construct outside the supported subset.
    #[error("{position}: {construct} is not supported")]
    Unsupported {
        /// Where the construct appears.
        position: Position,
        /// Description of the construct.
        construct: String,
    },

    /// An identifier that names no field in scope.
    #[error("{position}: reference \"{name}\" not found")]
    UnresolvedReference {
        /// Where the reference appears.
        position: Position,
        /// The identifier.
        name: String,
    },

    /// A selector naming a field the selected struct does not have.
    #[error("{position}: undefined field: {label}")]
    UndefinedField {
        /// Where the selector appears.
        position: Position,
        /// The selected label.
        label: String,
    },

    /// A reference that depends on its own value.
    #[error("{position}: structural cycle in \"{label}\"")]
    Cycle {
        /// Where the cyclic reference appears.
        position: Position,
        /// Label being evaluated when the cycle was detected.
        label: String,
    },

    /// An operator applied to an operand it does not accept.
    #[error("{position}: invalid operand for {operator}: {message}")]
    InvalidOperand {
        /// Where the operator appears.
        position: Position,
        /// The operator symbol.
        operator: String,
        /// Why the operand was rejected.
        message: String,
    },

    /// A `=~` or `!~` operand that is not a valid regular expression.
    #[error("{position}: invalid regular expression: {message}")]
    InvalidRegex {
        /// Where the expression appears.
        position: Position,
        /// Message from the regex engine.
        message: String,
    },
}

/// Failure to resolve or apply a [`Path`](super::Path).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum PathError {
    /// The path text is malformed.
    #[error("invalid path '{path}': {reason}")]
    Invalid {
        /// The offending text.
        path: String,
        /// What is wrong with it.
        reason: String,
    },
    /// Nothing exists at the path.
    #[error("path '{path}' does not exist")]
    NotFound {
        /// The missing path.
        path: String,
    },
}
