//! Infrastructure for the inventory core: persistence, status recomputation
//! and the services the API drives.

pub mod catalogue;
pub mod clock;
pub mod config;
pub mod error;
pub mod ledger;
pub mod requests;
pub mod services;
pub mod status;
pub mod store;

#[cfg(test)]
mod integration_tests;

use fleetstock_events::InlineEventBus;
use fleetstock_inventory::InventoryEvent;

pub use catalogue::{CatalogueService, InitialStock};
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{AppConfig, ConfigError, LedgerConfig};
pub use error::{BulkFailure, BulkReport, InventoryError};
pub use ledger::{BatchLedger, BatchView, DeductionOutcome};
pub use requests::RequestService;
pub use services::InventoryServices;
pub use status::StatusRecomputer;
pub use store::{InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, SharedStore, StoreError};

/// Bus carrying inventory events to the status recomputer (and any observer).
pub type InventoryBus = InlineEventBus<InventoryEvent, StoreError>;
