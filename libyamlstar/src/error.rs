//! Error types for YAML loading.

use std::fmt;
use thiserror::Error;

/// Result type for YAML loading operations.
pub type Result<T> = std::result::Result<T, LoadError>;

/// A location in the source text.
///
/// `offset` counts bytes from the start of the input; `line` and `column`
/// are one-based, with columns counted in characters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub offset: usize,
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// The position of the first character of the input.
    pub const fn start() -> Self {
        Self {
            offset: 0,
            line: 1,
            column: 1,
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::start()
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Malformed tokens found by the scanner.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum LexErrorKind {
    #[error("unterminated quoted scalar")]
    UnterminatedQuote,
    #[error("bad indentation")]
    BadIndentation,
    #[error("bad escape sequence")]
    BadEscape,
    #[error("unexpected character")]
    UnexpectedCharacter,
}

/// Malformed structure found by the parser.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("unexpected token")]
    UnexpectedToken,
    #[error("unclosed collection")]
    UnclosedCollection,
    #[error("mixed indicators")]
    MixedIndicators,
    #[error("undefined tag handle")]
    UndefinedTagHandle,
}

/// Failures while building the node graph.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ComposeErrorKind {
    #[error("undefined alias")]
    UndefinedAlias,
    #[error("invalid tagged scalar")]
    InvalidTaggedScalar,
}

/// Failures while projecting a document to JSON.
#[derive(Error, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProjectionErrorKind {
    #[error("cyclic reference")]
    CyclicReference,
    #[error("nesting too deep")]
    NestingTooDeep,
}

/// Error type for YAML loading.
///
/// Every variant produced from source text carries the position of the
/// offending input.
#[derive(Error, Debug)]
pub enum LoadError {
    /// Malformed token: bad indentation, unterminated quote, bad escape.
    #[error("{message} at {position}")]
    Lex {
        kind: LexErrorKind,
        message: String,
        position: Position,
    },

    /// Malformed structure: unexpected token, unclosed collection.
    #[error("{message} at {position}")]
    Parse {
        kind: ParseErrorKind,
        message: String,
        position: Position,
    },

    /// Undefined alias or a scalar that does not fit its explicit tag.
    #[error("{message} at {position}")]
    Compose {
        kind: ComposeErrorKind,
        message: String,
        position: Position,
    },

    /// `load_one` on a stream without exactly one document.
    #[error("expected a single document but found {found} at {position}")]
    EmptyOrMultipleDocuments { found: usize, position: Position },

    /// A document that cannot be represented as JSON.
    #[error("{message} at {position}")]
    Projection {
        kind: ProjectionErrorKind,
        message: String,
        position: Position,
    },

    /// The document stream was used again after it was exhausted.
    #[error("document stream already consumed")]
    StreamExhausted,

    /// The projected data did not fit the requested type.
    #[error("failed to deserialize loaded data: {0}")]
    Deserialize(#[from] serde_json::Error),
}

impl LoadError {
    pub(crate) fn lex(kind: LexErrorKind, message: impl Into<String>, position: Position) -> Self {
        LoadError::Lex {
            kind,
            message: message.into(),
            position,
        }
    }

    pub(crate) fn parse(
        kind: ParseErrorKind,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        LoadError::Parse {
            kind,
            message: message.into(),
            position,
        }
    }

    pub(crate) fn compose(
        kind: ComposeErrorKind,
        message: impl Into<String>,
        position: Position,
    ) -> Self {
        LoadError::Compose {
            kind,
            message: message.into(),
            position,
        }
    }

    /// The source position of the error, if it has one.
    pub fn position(&self) -> Option<Position> {
        match self {
            LoadError::Lex { position, .. }
            | LoadError::Parse { position, .. }
            | LoadError::Compose { position, .. }
            | LoadError::EmptyOrMultipleDocuments { position, .. }
            | LoadError::Projection { position, .. } => Some(*position),
            LoadError::StreamExhausted | LoadError::Deserialize(_) => None,
        }
    }

    /// The stable name of the error class, as reported across the boundary.
    pub fn kind_name(&self) -> &'static str {
        match self {
            LoadError::Lex { .. } => "LexError",
            LoadError::Parse { .. } => "ParseError",
            LoadError::Compose { .. } => "ComposeError",
            LoadError::EmptyOrMultipleDocuments { .. } => "EmptyOrMultipleDocumentsError",
            LoadError::Projection { .. } => "ProjectionError",
            LoadError::StreamExhausted => "StreamExhaustedError",
            LoadError::Deserialize(_) => "DeserializeError",
        }
    }

    /// The error message without the position suffix.
    pub fn message(&self) -> String {
        match self {
            LoadError::Lex { message, .. }
            | LoadError::Parse { message, .. }
            | LoadError::Compose { message, .. }
            | LoadError::Projection { message, .. } => message.clone(),
            LoadError::EmptyOrMultipleDocuments { found, .. } => {
                format!("expected a single document but found {}", found)
            }
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(line: usize, column: usize) -> Position {
        Position {
            offset: 0,
            line,
            column,
        }
    }

    #[test]
    fn test_display_includes_position() {
        let err = LoadError::lex(
            LexErrorKind::UnterminatedQuote,
            "unterminated double-quoted scalar",
            at(3, 7),
        );
        assert_eq!(
            err.to_string(),
            "unterminated double-quoted scalar at line 3, column 7"
        );
        assert_eq!(err.message(), "unterminated double-quoted scalar");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(
            LoadError::parse(ParseErrorKind::UnexpectedToken, "x", at(1, 1)).kind_name(),
            "ParseError"
        );
        assert_eq!(
            LoadError::compose(ComposeErrorKind::UndefinedAlias, "x", at(1, 1)).kind_name(),
            "ComposeError"
        );
        assert_eq!(
            LoadError::EmptyOrMultipleDocuments {
                found: 0,
                position: at(1, 1)
            }
            .kind_name(),
            "EmptyOrMultipleDocumentsError"
        );
        assert_eq!(LoadError::StreamExhausted.kind_name(), "StreamExhaustedError");
    }

    #[test]
    fn test_position_accessor() {
        let err = LoadError::compose(ComposeErrorKind::UndefinedAlias, "x", at(2, 5));
        assert_eq!(err.position(), Some(at(2, 5)));
        assert_eq!(LoadError::StreamExhausted.position(), None);
    }

    #[test]
    fn test_document_count_message() {
        let err = LoadError::EmptyOrMultipleDocuments {
            found: 2,
            position: at(4, 1),
        };
        assert_eq!(err.message(), "expected a single document but found 2");
        assert_eq!(
            err.to_string(),
            "expected a single document but found 2 at line 4, column 1"
        );
    }
}
