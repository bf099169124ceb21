//! Batch ledger: intake, FIFO deduction and expired-batch removal.
//!
//! Every successful mutation publishes one `BatchChanged` per touched batch on
//! the inline bus before returning, so the item's status is current when the
//! caller gets control back.

use std::sync::Arc;

use serde::Serialize;
use tracing::{instrument, warn};

use fleetstock_core::{BatchId, ItemId};
use fleetstock_events::EventBus;
use fleetstock_inventory::{
    Batch, BatchChange, BatchChanged, BatchDeduction, EmployeeRequest, IntakeRequest, InventoryEvent,
    InventoryItem, ItemStatus, NewRequest, StockPolicy, plan_fifo,
};

use crate::clock::Clock;
use crate::config::LedgerConfig;
use crate::error::{BulkReport, InventoryError};
use crate::store::{SharedStore, StoreError};
use crate::InventoryBus;

/// Result of a committed deduction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeductionOutcome {
    pub item_id: ItemId,
    pub requested: u32,
    /// Per-batch changes in consumption order.
    pub deductions: Vec<BatchDeduction>,
    /// Commit attempts used, 1 when no concurrent writer interfered.
    pub attempts: u32,
    /// Status shown for the item after the deduction.
    pub effective_status: Option<ItemStatus>,
}

/// A batch as listed for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchView {
    #[serde(flatten)]
    pub batch: Batch,
    pub expired: bool,
}

pub struct BatchLedger {
    store: SharedStore,
    bus: Arc<InventoryBus>,
    clock: Arc<dyn Clock>,
    config: LedgerConfig,
}

impl BatchLedger {
    pub fn new(store: SharedStore, bus: Arc<InventoryBus>, clock: Arc<dyn Clock>, config: LedgerConfig) -> Self {
        Self {
            store,
            bus,
            clock,
            config,
        }
    }

    pub(crate) async fn live_item(&self, item_id: ItemId) -> Result<InventoryItem, InventoryError> {
        match self.store.find_item(item_id).await? {
            Some(item) if !item.deleted => Ok(item),
            _ => Err(InventoryError::not_found(format!("item {item_id}"))),
        }
    }

    /// Publish a batch change. The write it reports is already committed, so a
    /// failing handler is logged and the next read of the item catches up.
    async fn announce(&self, item_id: ItemId, batch_id: BatchId, change: BatchChange) {
        let event = InventoryEvent::BatchChanged(BatchChanged {
            item_id,
            batch_id,
            change,
            occurred_at: self.clock.now(),
        });
        if let Err(err) = self.bus.publish(event).await {
            warn!(item_id = %item_id, batch_id = %batch_id, "batch change not fully handled: {err}");
        }
    }

    #[instrument(skip(self, intake), fields(item_id = %intake.item_id, usable = intake.usable), err)]
    pub async fn intake(&self, intake: IntakeRequest) -> Result<Batch, InventoryError> {
        intake.validate()?;
        self.live_item(intake.item_id).await?;

        let batch = self.store.create_batch(&intake, self.clock.now()).await?;
        self.announce(
            batch.item_id,
            batch.id,
            BatchChange::Intake {
                usable: batch.usable_quantity,
            },
        )
        .await;
        Ok(batch)
    }

    /// Best-effort intake of many deliveries, in order.
    pub async fn bulk_intake(&self, intakes: Vec<IntakeRequest>) -> BulkReport<Batch> {
        let mut report = BulkReport::default();
        for (index, intake) in intakes.into_iter().enumerate() {
            let outcome = self.intake(intake).await;
            report.record(index, outcome);
        }
        report
    }

    /// Take `quantity` usable units from the item's batches, soonest-expiring first.
    ///
    /// All or nothing: when the item's usable stock cannot cover the quantity,
    /// no batch changes. Items whose stock is counted from external records
    /// have no batches to draw from and are refused.
    #[instrument(skip(self), fields(item_id = %item_id), err)]
    pub async fn deduct(&self, item_id: ItemId, quantity: u32) -> Result<DeductionOutcome, InventoryError> {
        let (outcome, _) = self.deduct_inner(item_id, quantity, None).await?;
        Ok(outcome)
    }

    /// Deduct for a request and persist the request in the same commit.
    pub(crate) async fn deduct_for_request(
        &self,
        new: &NewRequest,
    ) -> Result<(DeductionOutcome, EmployeeRequest), InventoryError> {
        let (outcome, request) = self.deduct_inner(new.item_id, new.quantity, Some(new)).await?;
        let request = request.ok_or_else(|| InventoryError::Store("request was not persisted".to_string()))?;
        Ok((outcome, request))
    }

    async fn deduct_inner(
        &self,
        item_id: ItemId,
        quantity: u32,
        attach: Option<&NewRequest>,
    ) -> Result<(DeductionOutcome, Option<EmployeeRequest>), InventoryError> {
        if quantity == 0 {
            return Err(InventoryError::Validation(
                "deduction quantity must be greater than zero".to_string(),
            ));
        }
        let item = self.live_item(item_id).await?;
        if let StockPolicy::ExternalCount(_) = item.stock_policy {
            return Err(InventoryError::Validation(format!(
                "stock of item {item_id} is counted externally and cannot be deducted"
            )));
        }

        let max_attempts = self.config.max_deduction_retries.saturating_add(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            let batches = self.store.list_batches(item_id, false).await?;
            let plan = plan_fifo(item_id, &batches, quantity)?;

            match self.store.commit_deduction(&plan, attach, self.clock.now()).await {
                Ok(request) => {
                    for d in &plan.deductions {
                        self.announce(item_id, d.batch_id, BatchChange::Deducted { taken: d.taken() })
                            .await;
                    }
                    let effective_status = self
                        .store
                        .find_item(item_id)
                        .await?
                        .map(|item| item.effective_status());
                    let outcome = DeductionOutcome {
                        item_id,
                        requested: quantity,
                        deductions: plan.deductions,
                        attempts: attempt,
                        effective_status,
                    };
                    return Ok((outcome, request));
                }
                Err(StoreError::Conflict(reason)) if attempt < max_attempts => {
                    warn!(item_id = %item_id, attempt, "deduction lost a race, re-planning: {reason}");
                    tokio::task::yield_now().await;
                }
                Err(StoreError::Conflict(reason)) => {
                    warn!(item_id = %item_id, attempt, "deduction gave up after repeated conflicts: {reason}");
                    return Err(InventoryError::Conflict(format!(
                        "stock of item {item_id} kept changing during deduction ({attempt} attempts)"
                    )));
                }
                Err(other) => return Err(other.into()),
            }
        }
    }

    /// Soft-delete a batch whose expiration date has been reached.
    #[instrument(skip(self), fields(batch_id = %batch_id), err)]
    pub async fn remove_expired_batch(&self, batch_id: BatchId) -> Result<Batch, InventoryError> {
        let mut batch = match self.store.find_batch(batch_id).await? {
            Some(batch) if !batch.deleted => batch,
            _ => return Err(InventoryError::not_found(format!("batch {batch_id}"))),
        };
        if !batch.is_expired(self.clock.today()) {
            return Err(InventoryError::NotExpired(batch_id.to_string()));
        }

        self.store.soft_delete_batch(batch_id).await?;
        batch.deleted = true;
        self.announce(batch.item_id, batch_id, BatchChange::Removed).await;
        Ok(batch)
    }

    /// Batches of an item in creation order, flagged when expired.
    pub async fn list_batches(&self, item_id: ItemId, include_deleted: bool) -> Result<Vec<BatchView>, InventoryError> {
        if self.store.find_item(item_id).await?.is_none() {
            return Err(InventoryError::not_found(format!("item {item_id}")));
        }
        let today = self.clock.today();
        let batches = self.store.list_batches(item_id, include_deleted).await?;
        Ok(batches
            .into_iter()
            .map(|batch| BatchView {
                expired: batch.is_expired(today),
                batch,
            })
            .collect())
    }
}
