//! Inventory domain module.
//!
//! This crate contains the business rules for stock batches, item status and
//! employee requests, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage).

mod mapping;

pub mod batch;
pub mod category;
pub mod events;
pub mod fifo;
pub mod fleet;
pub mod item;
pub mod request;
pub mod status;
pub mod view;

pub use batch::{Batch, IntakeRequest, validate_breakdown};
pub use category::{Category, CategoryPolicy};
pub use events::{BatchChange, BatchChanged, InventoryEvent, ItemChanged};
pub use fifo::{BatchDeduction, DeductionPlan, PlanError, consumption_order, plan_fifo};
pub use fleet::{BusCondition, BusRecord, NewBus};
pub use item::{ExternalSource, InventoryItem, ItemPatch, ItemStatus, NewItem, StockPolicy};
pub use request::{EmployeeRequest, NewRequest, RequestFilter, RequestStatus, RequestType};
pub use status::{StockSnapshot, derive_status};
pub use view::{ItemFilter, ItemSort, ItemSortKey, ItemView, SortDirection, select_items};
