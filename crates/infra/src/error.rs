//! Errors reported by the inventory services.

use serde::Serialize;
use thiserror::Error;

use fleetstock_core::DomainError;
use fleetstock_events::PublishError;
use fleetstock_inventory::PlanError;

use crate::store::StoreError;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InventoryError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u64 },

    #[error("batch {0} has not expired")]
    NotExpired(String),

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("storage error: {0}")]
    Store(String),
}

impl InventoryError {
    pub fn not_found(what: impl core::fmt::Display) -> Self {
        Self::NotFound(what.to_string())
    }

    /// Stable machine-readable code used in API payloads and bulk reports.
    pub fn code(&self) -> &'static str {
        match self {
            InventoryError::Validation(_) => "validation",
            InventoryError::NotFound(_) => "not_found",
            InventoryError::InsufficientStock { .. } => "insufficient_stock",
            InventoryError::NotExpired(_) => "not_expired",
            InventoryError::InvalidTransition(_) => "invalid_transition",
            InventoryError::Conflict(_) => "conflict",
            InventoryError::Store(_) => "storage",
        }
    }
}

impl From<DomainError> for InventoryError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => InventoryError::Validation(msg),
            DomainError::InvariantViolation(msg) => InventoryError::Conflict(msg),
            DomainError::InvalidTransition(msg) => InventoryError::InvalidTransition(msg),
        }
    }
}

impl From<StoreError> for InventoryError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound(msg) => InventoryError::NotFound(msg),
            StoreError::Conflict(msg) => InventoryError::Conflict(msg),
            StoreError::Invalid(msg) => InventoryError::Validation(msg),
            StoreError::Backend(msg) => InventoryError::Store(msg),
        }
    }
}

impl From<PlanError> for InventoryError {
    fn from(value: PlanError) -> Self {
        match value {
            PlanError::ZeroQuantity => InventoryError::Validation(value.to_string()),
            PlanError::InsufficientStock { requested, available } => {
                InventoryError::InsufficientStock { requested, available }
            }
        }
    }
}

impl From<PublishError<StoreError>> for InventoryError {
    fn from(value: PublishError<StoreError>) -> Self {
        match value {
            PublishError::Handler { reason, .. } => reason.into(),
            PublishError::Poisoned => InventoryError::Store("event bus lock poisoned".to_string()),
        }
    }
}

/// One failed entry of a bulk operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkFailure {
    /// Position of the entry in the submitted list.
    pub index: usize,
    pub code: &'static str,
    pub error: String,
}

/// Outcome of a best-effort bulk operation: entries are processed in order and
/// one failure never stops the rest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkReport<T> {
    pub succeeded: Vec<T>,
    pub failures: Vec<BulkFailure>,
}

impl<T> Default for BulkReport<T> {
    fn default() -> Self {
        Self {
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }
}

impl<T> BulkReport<T> {
    pub fn record(&mut self, index: usize, outcome: Result<T, InventoryError>) {
        match outcome {
            Ok(value) => self.succeeded.push(value),
            Err(err) => {
                tracing::warn!(index, code = err.code(), "bulk entry failed: {err}");
                self.failures.push(BulkFailure {
                    index,
                    code: err.code(),
                    error: err.to_string(),
                });
            }
        }
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Single human-readable summary of the failures, if any.
    pub fn warning(&self) -> Option<String> {
        if self.failures.is_empty() {
            return None;
        }
        let detail: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("#{}: {}", f.index, f.error))
            .collect();
        Some(format!(
            "{} of {} entries failed: {}",
            self.failures.len(),
            self.failures.len() + self.succeeded.len(),
            detail.join("; ")
        ))
    }
}
