//! Employee borrow/consume requests.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use fleetstock_core::RequestId;
use fleetstock_inventory::{EmployeeRequest, NewRequest, RequestFilter, RequestStatus};

use crate::clock::Clock;
use crate::error::{BulkReport, InventoryError};
use crate::ledger::BatchLedger;
use crate::store::{SharedStore, StoreError};

pub struct RequestService {
    store: SharedStore,
    ledger: Arc<BatchLedger>,
    clock: Arc<dyn Clock>,
}

impl RequestService {
    pub fn new(store: SharedStore, ledger: Arc<BatchLedger>, clock: Arc<dyn Clock>) -> Self {
        Self { store, ledger, clock }
    }

    /// Validate, deduct the stock, then record the request.
    ///
    /// The request only exists if the deduction succeeded; both are written in
    /// one commit.
    #[instrument(
        skip(self, new),
        fields(item_id = %new.item_id, requester = new.requester.as_str(), quantity = new.quantity),
        err
    )]
    pub async fn create(&self, new: NewRequest) -> Result<EmployeeRequest, InventoryError> {
        new.validate(self.clock.today())?;
        let (outcome, request) = self.ledger.deduct_for_request(&new).await?;
        info!(
            request_id = %request.id,
            request_type = request.request_type.as_str(),
            batches = outcome.deductions.len(),
            "request recorded"
        );
        Ok(request)
    }

    /// Best-effort creation of many requests, in order.
    pub async fn bulk_create(&self, requests: Vec<NewRequest>) -> BulkReport<EmployeeRequest> {
        let mut report = BulkReport::default();
        for (index, new) in requests.into_iter().enumerate() {
            let outcome = self.create(new).await;
            report.record(index, outcome);
        }
        report
    }

    /// Close a borrow. Returned stock is not put back into any batch.
    ///
    /// The store only applies the change while the request is still open, so
    /// of two concurrent returns exactly one stamps the return date.
    #[instrument(skip(self), fields(request_id = %id), err)]
    pub async fn mark_returned(
        &self,
        id: RequestId,
        actual_return: Option<DateTime<Utc>>,
    ) -> Result<EmployeeRequest, InventoryError> {
        let mut request = self.get(id).await?;
        request.mark_returned(actual_return.unwrap_or_else(|| self.clock.now()))?;
        match self
            .store
            .update_request_status(id, RequestStatus::NotReturned, request.status, request.actual_return_date)
            .await
        {
            Ok(()) => Ok(request),
            Err(StoreError::Conflict(reason)) => Err(InventoryError::InvalidTransition(reason)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn get(&self, id: RequestId) -> Result<EmployeeRequest, InventoryError> {
        match self.store.find_request(id).await? {
            Some(request) if !request.deleted => Ok(request),
            _ => Err(InventoryError::not_found(format!("request {id}"))),
        }
    }

    pub async fn list(&self, filter: &RequestFilter) -> Result<Vec<EmployeeRequest>, InventoryError> {
        Ok(self.store.list_requests(filter).await?)
    }

    /// Hide a request from listings. Stock is unaffected.
    pub async fn soft_delete(&self, id: RequestId) -> Result<(), InventoryError> {
        self.get(id).await?;
        self.store.soft_delete_request(id).await?;
        Ok(())
    }
}
