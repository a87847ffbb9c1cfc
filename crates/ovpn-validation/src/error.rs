//! Validation error types with detailed rejection reasons.

use std::fmt;
use thiserror::Error;

/// The kind of validation error that occurred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Input was empty when a value was required.
    Empty,
    /// Input exceeded maximum allowed length.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length of input.
        actual: usize,
    },
    /// Input contained dangerous shell metacharacters or line breaks.
    ShellInjection {
        /// The dangerous character found.
        found: char,
    },
    /// Input contained path traversal sequences.
    PathTraversal {
        /// The traversal pattern found.
        pattern: String,
    },
    /// Input did not match expected format.
    InvalidFormat {
        /// Expected format description.
        expected: String,
        /// What was actually provided.
        actual: String,
    },
    /// Input contained null bytes.
    NullByte,
    /// Input contained control characters.
    ControlCharacters,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "input cannot be empty"),
            Self::TooLong { max, actual } => {
                write!(f, "input too long: {actual} chars exceeds max of {max}")
            }
            Self::ShellInjection { found } => {
                write!(f, "character {found:?} not allowed")
            }
            Self::PathTraversal { pattern } => {
                write!(f, "path traversal pattern '{pattern}' detected")
            }
            Self::InvalidFormat { expected, actual } => {
                write!(f, "invalid format: expected {expected}, got '{actual}'")
            }
            Self::NullByte => write!(f, "input contains null byte"),
            Self::ControlCharacters => write!(f, "input contains control characters"),
        }
    }
}

/// Error returned when validation fails.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed for '{field}': {kind}")]
pub struct ValidationError {
    /// The name of the field that failed validation.
    pub field: String,
    /// The kind of validation error.
    pub kind: ValidationErrorKind,
}

impl ValidationError {
    /// Create a new validation error.
    #[must_use]
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Create an "empty" validation error.
    #[must_use]
    pub fn empty(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::Empty)
    }

    /// Create a "too long" validation error.
    #[must_use]
    pub fn too_long(field: impl Into<String>, max: usize, actual: usize) -> Self {
        Self::new(field, ValidationErrorKind::TooLong { max, actual })
    }

    /// Create a "shell injection" validation error.
    #[must_use]
    pub fn shell_injection(field: impl Into<String>, found: char) -> Self {
        Self::new(field, ValidationErrorKind::ShellInjection { found })
    }

    /// Create a "path traversal" validation error.
    #[must_use]
    pub fn path_traversal(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(
            field,
            ValidationErrorKind::PathTraversal {
                pattern: pattern.into(),
            },
        )
    }

    /// Create an "invalid format" validation error.
    #[must_use]
    pub fn invalid_format(
        field: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field,
            ValidationErrorKind::InvalidFormat {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    /// Create a "null byte" validation error.
    #[must_use]
    pub fn null_byte(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::NullByte)
    }

    /// Create a "control characters" validation error.
    #[must_use]
    pub fn control_characters(field: impl Into<String>) -> Self {
        Self::new(field, ValidationErrorKind::ControlCharacters)
    }

    /// Check if this is an empty error.
    #[must_use]
    pub fn is_empty_error(&self) -> bool {
        matches!(self.kind, ValidationErrorKind::Empty)
    }

    /// Check if this is a security-related error (injection, traversal).
    #[must_use]
    pub fn is_security_error(&self) -> bool {
        matches!(
            self.kind,
            ValidationErrorKind::ShellInjection { .. }
                | ValidationErrorKind::PathTraversal { .. }
                | ValidationErrorKind::NullByte
                | ValidationErrorKind::ControlCharacters
        )
    }
}
