//! Domain error model.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// Failures decided by domain rules alone, without consulting storage.
///
/// Missing records are a storage question and are reported by the store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Input rejected before anything is written (blank name, quantities that do not add up).
    #[error("validation failed: {0}")]
    Validation(String),

    /// Stock accounting would break, e.g. drawing more than a batch holds.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    /// Identifier with the wrong prefix or a malformed numeric suffix.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Lifecycle change the state machine does not allow.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn transition(msg: impl Into<String>) -> Self {
        Self::InvalidTransition(msg.into())
    }
}
