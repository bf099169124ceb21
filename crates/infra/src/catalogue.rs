//! Item catalogue: categories, item definitions, manual overrides and the
//! fleet records that back `ExternalCount` items.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use fleetstock_core::{CategoryId, ItemId};
use fleetstock_events::EventBus;
use fleetstock_inventory::{
    BusRecord, Category, IntakeRequest, InventoryEvent, InventoryItem, ItemChanged, ItemFilter, ItemPatch,
    ItemSort, ItemStatus, ItemView, NewBus, NewItem, select_items, validate_breakdown,
};

use crate::clock::Clock;
use crate::error::InventoryError;
use crate::ledger::BatchLedger;
use crate::status::StatusRecomputer;
use crate::store::SharedStore;
use crate::InventoryBus;

/// First delivery recorded together with a new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitialStock {
    pub total_received: u32,
    pub usable: u32,
    #[serde(default)]
    pub defective: u32,
    #[serde(default)]
    pub missing: u32,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

impl InitialStock {
    fn validate(&self) -> Result<(), InventoryError> {
        Ok(validate_breakdown(self.total_received, self.usable, self.defective, self.missing)?)
    }

    pub fn for_item(&self, item_id: ItemId) -> IntakeRequest {
        IntakeRequest {
            item_id,
            total_received: self.total_received,
            usable: self.usable,
            defective: self.defective,
            missing: self.missing,
            expiration_date: self.expiration_date,
        }
    }
}

pub struct CatalogueService {
    store: SharedStore,
    bus: Arc<InventoryBus>,
    ledger: Arc<BatchLedger>,
    recomputer: StatusRecomputer,
    clock: Arc<dyn Clock>,
}

impl CatalogueService {
    pub fn new(
        store: SharedStore,
        bus: Arc<InventoryBus>,
        ledger: Arc<BatchLedger>,
        recomputer: StatusRecomputer,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            bus,
            ledger,
            recomputer,
            clock,
        }
    }

    async fn item_changed(&self, item_id: ItemId) {
        let event = InventoryEvent::ItemChanged(ItemChanged {
            item_id,
            occurred_at: self.clock.now(),
        });
        if let Err(err) = self.bus.publish(event).await {
            warn!(item_id = %item_id, "item change not fully handled: {err}");
        }
    }

    async fn require_category(&self, id: CategoryId) -> Result<Category, InventoryError> {
        self.store
            .find_category(id)
            .await?
            .ok_or_else(|| InventoryError::not_found(format!("category {id}")))
    }

    async fn view_of(&self, item_id: ItemId) -> Result<ItemView, InventoryError> {
        let item = self.ledger.live_item(item_id).await?;
        Ok(self.recomputer.view(item).await?)
    }

    pub async fn create_category(&self, name: &str) -> Result<Category, InventoryError> {
        if name.trim().is_empty() {
            return Err(InventoryError::Validation("category name cannot be empty".to_string()));
        }
        Ok(self.store.insert_category(name).await?)
    }

    pub async fn list_categories(&self) -> Result<Vec<Category>, InventoryError> {
        Ok(self.store.list_categories().await?)
    }

    /// Define an item, optionally recording its first delivery.
    ///
    /// The initial delivery is checked before anything is written. Item and
    /// delivery are still two commits: a storage failure during the intake
    /// leaves the item defined with no stock and returns the error.
    #[instrument(skip(self, new, initial), fields(name = %new.name), err)]
    pub async fn create_item(&self, new: NewItem, initial: Option<InitialStock>) -> Result<ItemView, InventoryError> {
        new.validate()?;
        self.require_category(new.category_id).await?;
        if let Some(stock) = &initial {
            stock.validate()?;
        }

        let item = self.store.insert_item(&new, self.clock.now()).await?;
        info!(item_id = %item.id, "item created");
        self.item_changed(item.id).await;

        if let Some(stock) = initial {
            self.ledger.intake(stock.for_item(item.id)).await?;
        }
        self.view_of(item.id).await
    }

    pub async fn get_item(&self, id: ItemId) -> Result<ItemView, InventoryError> {
        self.view_of(id).await
    }

    /// Live items with their current stock, filtered and sorted.
    pub async fn list_items(&self, filter: &ItemFilter, sort: ItemSort) -> Result<Vec<ItemView>, InventoryError> {
        let items = self.store.list_items(false).await?;
        let mut views = Vec::with_capacity(items.len());
        for item in items {
            views.push(self.recomputer.view(item).await?);
        }
        Ok(select_items(views, filter, sort))
    }

    #[instrument(skip(self, patch), fields(item_id = %id), err)]
    pub async fn update_item(&self, id: ItemId, patch: ItemPatch) -> Result<ItemView, InventoryError> {
        let mut item = self.ledger.live_item(id).await?;
        if let Some(category_id) = patch.category_id {
            self.require_category(category_id).await?;
        }
        item.apply_patch(patch, self.clock.now())?;
        self.store.update_item(&item).await?;
        self.item_changed(id).await;
        self.view_of(id).await
    }

    /// Soft-delete an item together with its batches.
    #[instrument(skip(self), fields(item_id = %id), err)]
    pub async fn delete_item(&self, id: ItemId) -> Result<(), InventoryError> {
        self.ledger.live_item(id).await?;
        self.store.soft_delete_item(id, self.clock.now()).await?;
        info!(item_id = %id, "item deleted");
        self.item_changed(id).await;
        Ok(())
    }

    pub async fn set_override(&self, id: ItemId, status: ItemStatus) -> Result<ItemView, InventoryError> {
        let mut item = self.ledger.live_item(id).await?;
        item.set_override(status, self.clock.now())?;
        self.save_override(&item).await
    }

    pub async fn clear_override(&self, id: ItemId) -> Result<ItemView, InventoryError> {
        let mut item = self.ledger.live_item(id).await?;
        item.clear_override(self.clock.now());
        self.save_override(&item).await
    }

    async fn save_override(&self, item: &InventoryItem) -> Result<ItemView, InventoryError> {
        self.store.update_item(item).await?;
        info!(
            item_id = %item.id,
            manual_override = item.manual_override.map(|s| s.as_str()),
            "manual override updated"
        );
        self.item_changed(item.id).await;
        self.view_of(item.id).await
    }

    pub async fn register_bus(&self, new: NewBus) -> Result<BusRecord, InventoryError> {
        if let Some(item_id) = new.item_id {
            self.ledger.live_item(item_id).await?;
        }
        let bus = self.store.insert_bus(&new).await?;
        if let Some(item_id) = bus.item_id {
            self.item_changed(item_id).await;
        }
        Ok(bus)
    }

    pub async fn list_buses(&self) -> Result<Vec<BusRecord>, InventoryError> {
        Ok(self.store.list_buses().await?)
    }
}
