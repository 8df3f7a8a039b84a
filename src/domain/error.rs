//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent violations of the notation grammar or of the
/// tree's naming contract. None of them are retriable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("malformed notation at offset {position}: {reason}")]
    MalformedNotation { position: usize, reason: String },

    #[error("duplicate category name in tree: {0}")]
    DuplicateNameInTree(String),

    #[error("unknown category: {0}")]
    UnknownCategory(String),
}

impl DomainError {
    pub(crate) fn malformed(position: usize, reason: impl Into<String>) -> Self {
        Self::MalformedNotation {
            position,
            reason: reason.into(),
        }
    }
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
