//! Error types for vssort

use std::fmt;
use thiserror::Error;

/// Position in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Pos {
    pub offset: usize,
    pub line: u32,
    pub col: u32,
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.col)
    }
}

impl Pos {
    pub const fn new(offset: usize, line: u32, col: u32) -> Self {
        Self { offset, line, col }
    }
}

/// Span representing a range in source text
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Span {
    pub start: Pos,
    pub end: Pos,
}

impl Span {
    pub const fn new(start: Pos, end: Pos) -> Self {
        Self { start, end }
    }

    pub const fn at(pos: Pos) -> Self {
        Self::new(pos, pos)
    }

    pub const fn empty() -> Self {
        Self {
            start: Pos::new(0, 0, 0),
            end: Pos::new(0, 0, 0),
        }
    }
}

/// Error kind for detailed categorization
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    InvalidToken,
    UnexpectedEof,
    MismatchedTag { expected: String, found: String },
    DuplicateAttribute { name: String },
    InvalidEntity { entity: String },
    InvalidUtf8,
    UnsupportedEncoding { encoding: String },
    MissingRoot,
    MaxDepthExceeded { max: u16 },
    MaxSizeExceeded { max: usize },
    /// The tree cannot be written back as well-formed XML
    UnsupportedStructure { reason: String },
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidToken => write!(f, "invalid token"),
            Self::UnexpectedEof => write!(f, "unexpected end of input"),
            Self::MismatchedTag { expected, found } => {
                write!(f, "mismatched closing tag: expected </{expected}>, found </{found}>")
            }
            Self::DuplicateAttribute { name } => write!(f, "duplicate attribute: {name}"),
            Self::InvalidEntity { entity } => write!(f, "invalid entity reference: &{entity};"),
            Self::InvalidUtf8 => write!(f, "invalid utf-8"),
            Self::UnsupportedEncoding { encoding } => {
                write!(f, "unsupported encoding: {encoding}")
            }
            Self::MissingRoot => write!(f, "document has no root element"),
            Self::MaxDepthExceeded { max } => write!(f, "max depth exceeded: {max}"),
            Self::MaxSizeExceeded { max } => write!(f, "max size exceeded: {max}"),
            Self::UnsupportedStructure { reason } => write!(f, "unsupported structure: {reason}"),
        }
    }
}

/// Main error type for vssort
#[derive(Error, Clone, Debug, PartialEq)]
pub struct Error {
    kind: ErrorKind,
    span: Span,
    message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, span: Span) -> Self {
        let message = kind.to_string();
        Self {
            kind,
            span,
            message,
        }
    }

    pub fn with_message(kind: ErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    /// Create error at specific position
    pub fn at(kind: ErrorKind, pos: Pos) -> Self {
        Self::new(kind, Span::at(pos))
    }

    /// Serializer-side error for a tree that cannot be written
    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::new(
            ErrorKind::UnsupportedStructure {
                reason: reason.into(),
            },
            Span::empty(),
        )
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether this error came from reading malformed input
    pub fn is_parse_error(&self) -> bool {
        !matches!(self.kind, ErrorKind::UnsupportedStructure { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_parse_error() {
            write!(f, "error at {}: {}", self.span.start, self.message)
        } else {
            write!(f, "{}", self.message)
        }
    }
}

/// Result type alias for vssort
pub type Result<T> = std::result::Result<T, Error>;
