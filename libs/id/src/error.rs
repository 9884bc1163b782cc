//! Error types for ID parsing and name validation.

use thiserror::Error;

/// Errors that can occur when parsing generated IDs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    /// The ID string is empty.
    #[error("ID cannot be empty")]
    Empty,

    /// The ID has an invalid prefix.
    #[error("invalid ID prefix: expected '{expected}', got '{actual}'")]
    InvalidPrefix {
        expected: &'static str,
        actual: String,
    },

    /// The ID is missing the underscore separator.
    #[error("ID missing underscore separator")]
    MissingSeparator,

    /// The ULID portion of the ID is invalid.
    #[error("invalid ULID: {0}")]
    InvalidUlid(String),
}

impl IdError {
    /// Returns true if this error indicates the input was empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, IdError::Empty)
    }

    /// Returns true if this error indicates a prefix mismatch.
    pub fn is_prefix_error(&self) -> bool {
        matches!(self, IdError::InvalidPrefix { .. })
    }
}

/// Errors produced by RFC 1123 name validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NameError {
    /// The name is empty.
    #[error("name cannot be empty")]
    Empty,

    /// The whole name exceeds the maximum length.
    #[error("name is {len} characters, maximum is {max}")]
    TooLong { len: usize, max: usize },

    /// Two dots in a row, or a leading/trailing dot.
    #[error("name contains an empty segment")]
    EmptySegment,

    /// A dot-separated segment exceeds 63 characters.
    #[error("segment '{segment}' is {len} characters, maximum is {max}")]
    SegmentTooLong {
        segment: String,
        len: usize,
        max: usize,
    },

    /// A character outside `[a-z0-9-]`.
    #[error("invalid character '{ch}' in segment '{segment}'")]
    InvalidCharacter { ch: char, segment: String },

    /// A segment starts or ends with a hyphen.
    #[error("segment '{segment}' must start and end with an alphanumeric character")]
    HyphenBoundary { segment: String },

    /// A dotted name was given where a single label is required.
    #[error("'{0}' must be a single label without dots")]
    NotSingleLabel(String),
}
