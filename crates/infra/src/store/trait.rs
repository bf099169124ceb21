use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use fleetstock_core::{BatchId, CategoryId, DomainError, ItemId, RequestId};
use fleetstock_inventory::{
    Batch, BusRecord, Category, DeductionPlan, EmployeeRequest, IntakeRequest, InventoryItem,
    ItemStatus, NewBus, NewItem, NewRequest, RequestFilter, RequestStatus,
};
use std::sync::Arc;

/// Persistence operation error.
///
/// These are **infrastructure errors** as opposed to domain errors; domain
/// rejections that surface inside a store (e.g. a record failing to build) are
/// reported as `Invalid`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),

    /// A compare-and-swap or uniqueness check failed; re-read and retry.
    #[error("concurrent modification: {0}")]
    Conflict(String),

    #[error("invalid write: {0}")]
    Invalid(String),

    #[error("storage backend failure: {0}")]
    Backend(String),
}

impl From<DomainError> for StoreError {
    fn from(value: DomainError) -> Self {
        StoreError::Invalid(value.to_string())
    }
}

/// Persistence seam for the inventory core.
///
/// Reads return soft-deleted records only where the signature says so
/// (`find_*` returns the record whatever its flag, callers decide); listing
/// methods exclude them unless asked.
///
/// ## Identifier allocation
///
/// `insert_*` / `create_*` methods allocate the next identifier as "largest
/// existing numeric suffix + 1" atomically with the insert.
///
/// ## Atomic deduction
///
/// `commit_deduction` applies every [`BatchDeduction`](fleetstock_inventory::BatchDeduction)
/// of a plan or none of them. A change is applied only if the batch is live and
/// still holds exactly `expected_usable`; otherwise the whole plan is rejected
/// with `StoreError::Conflict` and nothing is written. When a request is
/// attached it is inserted in the same atomic unit.
#[async_trait]
pub trait InventoryStore: Send + Sync {
    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError>;

    async fn list_items(&self, include_deleted: bool) -> Result<Vec<InventoryItem>, StoreError>;

    async fn insert_item(&self, new: &NewItem, now: DateTime<Utc>) -> Result<InventoryItem, StoreError>;

    /// Replace the descriptive fields, override and policy of an item.
    async fn update_item(&self, item: &InventoryItem) -> Result<(), StoreError>;

    async fn update_item_status(&self, id: ItemId, status: ItemStatus) -> Result<(), StoreError>;

    /// Flag the item and all of its batches as deleted.
    async fn soft_delete_item(&self, id: ItemId, now: DateTime<Utc>) -> Result<(), StoreError>;

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError>;

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError>;

    async fn insert_category(&self, name: &str) -> Result<Category, StoreError>;

    async fn find_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError>;

    /// Batches of one item in creation order.
    async fn list_batches(&self, item_id: ItemId, include_deleted: bool) -> Result<Vec<Batch>, StoreError>;

    async fn create_batch(&self, intake: &IntakeRequest, now: DateTime<Utc>) -> Result<Batch, StoreError>;

    /// Lower a batch's usable quantity. Increases are rejected as `Invalid`.
    async fn update_batch_usable(&self, id: BatchId, new_usable: u32) -> Result<(), StoreError>;

    async fn commit_deduction(
        &self,
        plan: &DeductionPlan,
        attach: Option<&NewRequest>,
        now: DateTime<Utc>,
    ) -> Result<Option<EmployeeRequest>, StoreError>;

    async fn soft_delete_batch(&self, id: BatchId) -> Result<(), StoreError>;

    async fn find_request(&self, id: RequestId) -> Result<Option<EmployeeRequest>, StoreError>;

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<EmployeeRequest>, StoreError>;

    /// Move a request from `from` to `to`. Fails with `Conflict`, writing
    /// nothing, when the request is no longer in `from`.
    async fn update_request_status(
        &self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        actual_return: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    async fn soft_delete_request(&self, id: RequestId) -> Result<(), StoreError>;

    async fn insert_bus(&self, new: &NewBus) -> Result<BusRecord, StoreError>;

    async fn list_buses(&self) -> Result<Vec<BusRecord>, StoreError>;

    /// Live bus records linked to the item.
    async fn count_linked_buses(&self, item_id: ItemId) -> Result<u64, StoreError>;
}

/// Shared handle used by the services.
pub type SharedStore = Arc<dyn InventoryStore>;
