//! Error types for value access and extraction.

use thiserror::Error;

use crate::path::PathError;

/// Errors raised while reading, writing or extracting a [`Value`](crate::Value).
///
/// All of them are recoverable at the call site; nothing in this crate panics
/// on a bad access.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValueError {
    /// The stored variant cannot be converted to the requested type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    /// Indexing into a value that is not a container, or a structurally
    /// impossible write (wrong key kind, self-insertion).
    #[error("invalid access: {message}")]
    InvalidAccess { message: String },

    /// A textual path failed validation.
    #[error("path error: {0}")]
    Path(#[from] PathError),
}

impl ValueError {
    pub(crate) fn mismatch(expected: &'static str, found: impl ToString) -> Self {
        ValueError::TypeMismatch {
            expected,
            found: found.to_string(),
        }
    }

    pub(crate) fn invalid_access(message: impl Into<String>) -> Self {
        ValueError::InvalidAccess {
            message: message.into(),
        }
    }
}
