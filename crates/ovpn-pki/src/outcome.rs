//! Success/message view of an operation result.

use serde::Serialize;

use crate::error::Result;

/// What a request layer reports back for a mutating operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Outcome {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable summary or error.
    pub message: String,
}

impl Outcome {
    /// A successful outcome.
    #[must_use]
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    /// A failed outcome.
    #[must_use]
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }

    /// Fold a result, describing the success value with `describe`.
    pub fn from_result<T>(result: Result<T>, describe: impl FnOnce(T) -> String) -> Self {
        match result {
            Ok(value) => Self::ok(describe(value)),
            Err(e) => Self::failure(e.to_string()),
        }
    }
}

impl From<Result<()>> for Outcome {
    fn from(result: Result<()>) -> Self {
        Self::from_result(result, |()| "ok".to_string())
    }
}
