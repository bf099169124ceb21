//! Status recomputation wired to inventory events.
//!
//! The recomputer owns the only write path to an item's computed `status`.
//! It runs as an [`EventHandler`] on the inline bus, so by the time a batch
//! mutation returns the item's status already reflects it.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use fleetstock_core::ItemId;
use fleetstock_events::{EventEnvelope, EventHandler};
use fleetstock_inventory::{
    CategoryPolicy, ExternalSource, InventoryEvent, InventoryItem, ItemStatus, ItemView, StockPolicy,
    StockSnapshot, derive_status,
};

use crate::clock::Clock;
use crate::store::{SharedStore, StoreError};

#[derive(Clone)]
pub struct StatusRecomputer {
    store: SharedStore,
    clock: Arc<dyn Clock>,
}

impl StatusRecomputer {
    pub fn new(store: SharedStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Current stock and expiry of an item under its stock policy.
    pub async fn snapshot(&self, item: &InventoryItem) -> Result<StockSnapshot, StoreError> {
        let batches = self.store.list_batches(item.id, false).await?;
        let snapshot = StockSnapshot::from_batches(&batches, self.clock.today());
        match item.stock_policy {
            StockPolicy::BatchSum => Ok(snapshot),
            StockPolicy::ExternalCount(ExternalSource::FleetBuses) => {
                let linked = self.store.count_linked_buses(item.id).await?;
                Ok(snapshot.with_external_count(linked))
            }
        }
    }

    async fn evaluate(&self, item: &InventoryItem) -> Result<(StockSnapshot, ItemStatus), StoreError> {
        let policy = self
            .store
            .find_category(item.category_id)
            .await?
            .map(|c| c.policy())
            .unwrap_or(CategoryPolicy::Other);
        let snapshot = self.snapshot(item).await?;
        Ok((snapshot, derive_status(policy, item.reorder_level, snapshot)))
    }

    async fn persist(&self, item: &InventoryItem, status: ItemStatus) -> Result<(), StoreError> {
        if status == item.status {
            debug!(item_id = %item.id, status = status.as_str(), "item status unchanged");
            return Ok(());
        }
        self.store.update_item_status(item.id, status).await?;
        info!(
            item_id = %item.id,
            from = item.status.as_str(),
            to = status.as_str(),
            pinned = item.manual_override.is_some(),
            "item status changed"
        );
        Ok(())
    }

    /// Derive and store the item's status.
    ///
    /// Missing or deleted items are skipped and yield `None`. The manual
    /// override is never touched.
    pub async fn recompute_status(&self, item_id: ItemId) -> Result<Option<ItemStatus>, StoreError> {
        let item = match self.store.find_item(item_id).await? {
            Some(item) if !item.deleted => item,
            _ => {
                debug!(item_id = %item_id, "skipping status recompute for missing item");
                return Ok(None);
            }
        };
        let (_, status) = self.evaluate(&item).await?;
        self.persist(&item, status).await?;
        Ok(Some(status))
    }

    /// Build the read view of an item, catching up its status first.
    ///
    /// Expiry depends on the calendar, so a batch can expire with no write to
    /// trigger a recompute; reads close that gap.
    pub async fn view(&self, mut item: InventoryItem) -> Result<ItemView, StoreError> {
        let (snapshot, status) = self.evaluate(&item).await?;
        if !item.deleted {
            self.persist(&item, status).await?;
            item.status = status;
        }
        Ok(ItemView::new(item, snapshot.current_stock))
    }
}

#[async_trait]
impl EventHandler<InventoryEvent> for StatusRecomputer {
    type Error = StoreError;

    fn name(&self) -> &'static str {
        "status_recomputer"
    }

    async fn handle(&self, envelope: &EventEnvelope<InventoryEvent>) -> Result<(), Self::Error> {
        self.recompute_status(envelope.payload().item_id()).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use fleetstock_core::PrefixedId;
    use fleetstock_inventory::{BusCondition, IntakeRequest, NewBus, NewItem};

    use crate::clock::FixedClock;
    use crate::store::{InMemoryInventoryStore, InventoryStore};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 15).unwrap()
    }

    async fn setup(category: &str, policy: StockPolicy) -> (Arc<InMemoryInventoryStore>, StatusRecomputer, ItemId) {
        let store = Arc::new(InMemoryInventoryStore::new());
        let cat = store.insert_category(category).await.unwrap();
        let item = store
            .insert_item(
                &NewItem {
                    name: "Wiper blade".to_string(),
                    unit: "piece".to_string(),
                    reorder_level: 3,
                    category_id: cat.id,
                    stock_policy: policy,
                },
                Utc::now(),
            )
            .await
            .unwrap();
        let recomputer = StatusRecomputer::new(store.clone(), Arc::new(FixedClock::on(today())));
        (store, recomputer, item.id)
    }

    fn intake(item_id: ItemId, usable: u32, exp: Option<NaiveDate>) -> IntakeRequest {
        IntakeRequest {
            item_id,
            total_received: usable,
            usable,
            defective: 0,
            missing: 0,
            expiration_date: exp,
        }
    }

    #[tokio::test]
    async fn consumable_moves_through_stock_levels() {
        let (store, recomputer, item_id) = setup("Consumable", StockPolicy::BatchSum).await;

        assert_eq!(recomputer.recompute_status(item_id).await.unwrap(), Some(ItemStatus::OutOfStock));

        store.create_batch(&intake(item_id, 3, None), Utc::now()).await.unwrap();
        assert_eq!(recomputer.recompute_status(item_id).await.unwrap(), Some(ItemStatus::LowStock));

        store.create_batch(&intake(item_id, 1, None), Utc::now()).await.unwrap();
        assert_eq!(recomputer.recompute_status(item_id).await.unwrap(), Some(ItemStatus::Available));
        assert_eq!(store.find_item(item_id).await.unwrap().unwrap().status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn override_survives_recompute() {
        let (store, recomputer, item_id) = setup("Consumable", StockPolicy::BatchSum).await;
        let mut item = store.find_item(item_id).await.unwrap().unwrap();
        item.set_override(ItemStatus::UnderMaintenance, Utc::now()).unwrap();
        store.update_item(&item).await.unwrap();

        recomputer.recompute_status(item_id).await.unwrap();

        let item = store.find_item(item_id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::OutOfStock);
        assert_eq!(item.effective_status(), ItemStatus::UnderMaintenance);
    }

    #[tokio::test]
    async fn deleted_item_is_skipped() {
        let (store, recomputer, item_id) = setup("Consumable", StockPolicy::BatchSum).await;
        store.soft_delete_item(item_id, Utc::now()).await.unwrap();
        assert_eq!(recomputer.recompute_status(item_id).await.unwrap(), None);
        assert_eq!(recomputer.recompute_status(ItemId::from_seq(99)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn external_count_uses_linked_buses() {
        let (store, recomputer, item_id) =
            setup("Equipment", StockPolicy::ExternalCount(ExternalSource::FleetBuses)).await;
        assert_eq!(recomputer.recompute_status(item_id).await.unwrap(), Some(ItemStatus::InUsed));

        store
            .insert_bus(&NewBus {
                plate_number: "KL-7781".to_string(),
                item_id: Some(item_id),
                condition: BusCondition::Operational,
            })
            .await
            .unwrap();

        let item = store.find_item(item_id).await.unwrap().unwrap();
        let view = recomputer.view(item).await.unwrap();
        assert_eq!(view.current_stock, 1);
        assert_eq!(view.effective_status, ItemStatus::Available);
    }

    #[tokio::test]
    async fn view_catches_up_on_calendar_expiry() {
        let (store, recomputer, item_id) = setup("Consumable", StockPolicy::BatchSum).await;
        store.create_batch(&intake(item_id, 10, Some(today())), Utc::now()).await.unwrap();

        let item = store.find_item(item_id).await.unwrap().unwrap();
        assert_eq!(item.status, ItemStatus::Available);

        let view = recomputer.view(item).await.unwrap();
        assert_eq!(view.effective_status, ItemStatus::Expired);
        assert_eq!(store.find_item(item_id).await.unwrap().unwrap().status, ItemStatus::Expired);
    }
}
