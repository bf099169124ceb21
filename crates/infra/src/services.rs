//! Wiring of the inventory services around one store.

use std::sync::Arc;

use fleetstock_events::InlineEventBus;

use crate::catalogue::CatalogueService;
use crate::clock::{Clock, SystemClock};
use crate::config::LedgerConfig;
use crate::ledger::BatchLedger;
use crate::requests::RequestService;
use crate::status::StatusRecomputer;
use crate::store::{InMemoryInventoryStore, SharedStore};
use crate::InventoryBus;

/// Everything the outer layers need, sharing one store and one bus.
#[derive(Clone)]
pub struct InventoryServices {
    pub store: SharedStore,
    pub bus: Arc<InventoryBus>,
    pub ledger: Arc<BatchLedger>,
    pub requests: Arc<RequestService>,
    pub catalogue: Arc<CatalogueService>,
}

impl InventoryServices {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        let bus: Arc<InventoryBus> = Arc::new(InlineEventBus::new());
        let recomputer = StatusRecomputer::new(store.clone(), clock.clone());
        bus.register(Arc::new(recomputer.clone()));

        let ledger = Arc::new(BatchLedger::new(store.clone(), bus.clone(), clock.clone(), config));
        let requests = Arc::new(RequestService::new(store.clone(), ledger.clone(), clock.clone()));
        let catalogue = Arc::new(CatalogueService::new(
            store.clone(),
            bus.clone(),
            ledger.clone(),
            recomputer,
            clock,
        ));

        Self {
            store,
            bus,
            ledger,
            requests,
            catalogue,
        }
    }

    /// Services over a fresh in-memory store and the system clock.
    pub fn in_memory(config: LedgerConfig) -> Self {
        Self::new(Arc::new(InMemoryInventoryStore::new()), Arc::new(SystemClock), config)
    }
}
