use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use fleetstock_core::{BatchId, BusId, CategoryId, ItemId, PrefixedId, RequestId};
use fleetstock_inventory::{
    Batch, BusRecord, Category, DeductionPlan, EmployeeRequest, IntakeRequest, InventoryItem,
    ItemStatus, NewBus, NewItem, NewRequest, RequestFilter, RequestStatus,
};

use super::r#trait::{InventoryStore, StoreError};

#[derive(Debug, Default)]
struct State {
    categories: BTreeMap<CategoryId, Category>,
    items: BTreeMap<ItemId, InventoryItem>,
    batches: BTreeMap<BatchId, Batch>,
    requests: BTreeMap<RequestId, EmployeeRequest>,
    buses: BTreeMap<BusId, BusRecord>,
}

/// Next identifier after the largest key of a map.
fn next_id<K: PrefixedId + Ord, V>(map: &BTreeMap<K, V>) -> K {
    K::next_after(map.keys().next_back().map(|k| k.seq()))
}

/// In-memory inventory store.
///
/// Intended for tests/dev. A single lock guards every table, so each trait call
/// is atomic with respect to the others.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    state: RwLock<State>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("inventory state lock poisoned".to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("inventory state lock poisoned".to_string()))
    }
}

fn check_plan(state: &State, plan: &DeductionPlan) -> Result<(), StoreError> {
    for d in &plan.deductions {
        let batch = state
            .batches
            .get(&d.batch_id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {}", d.batch_id)))?;
        if batch.deleted || batch.item_id != plan.item_id {
            return Err(StoreError::Conflict(format!(
                "batch {} is no longer drawable for item {}",
                d.batch_id, plan.item_id
            )));
        }
        if batch.usable_quantity != d.expected_usable {
            return Err(StoreError::Conflict(format!(
                "batch {} holds {} usable, plan expected {}",
                d.batch_id, batch.usable_quantity, d.expected_usable
            )));
        }
        if d.new_usable > d.expected_usable {
            return Err(StoreError::Invalid(format!(
                "deduction would raise batch {} from {} to {}",
                d.batch_id, d.expected_usable, d.new_usable
            )));
        }
    }
    Ok(())
}

#[async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn find_item(&self, id: ItemId) -> Result<Option<InventoryItem>, StoreError> {
        Ok(self.read()?.items.get(&id).cloned())
    }

    async fn list_items(&self, include_deleted: bool) -> Result<Vec<InventoryItem>, StoreError> {
        Ok(self
            .read()?
            .items
            .values()
            .filter(|i| include_deleted || !i.deleted)
            .cloned()
            .collect())
    }

    async fn insert_item(&self, new: &NewItem, now: DateTime<Utc>) -> Result<InventoryItem, StoreError> {
        let mut state = self.write()?;
        let id = next_id(&state.items);
        let item = InventoryItem::create(id, new.clone(), now)?;
        state.items.insert(id, item.clone());
        Ok(item)
    }

    async fn update_item(&self, item: &InventoryItem) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let stored = state
            .items
            .get_mut(&item.id)
            .ok_or_else(|| StoreError::NotFound(format!("item {}", item.id)))?;
        // The computed status column belongs to the status engine.
        let status = stored.status;
        *stored = InventoryItem {
            status,
            ..item.clone()
        };
        Ok(())
    }

    async fn update_item_status(&self, id: ItemId, status: ItemStatus) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let stored = state
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("item {id}")))?;
        stored.status = status;
        Ok(())
    }

    async fn soft_delete_item(&self, id: ItemId, now: DateTime<Utc>) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let item = state
            .items
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("item {id}")))?;
        item.deleted = true;
        item.updated_at = now;
        for batch in state.batches.values_mut().filter(|b| b.item_id == id) {
            batch.deleted = true;
        }
        Ok(())
    }

    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, StoreError> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn list_categories(&self) -> Result<Vec<Category>, StoreError> {
        Ok(self.read()?.categories.values().cloned().collect())
    }

    async fn insert_category(&self, name: &str) -> Result<Category, StoreError> {
        let mut state = self.write()?;
        let trimmed = name.trim();
        if state.categories.values().any(|c| c.name.eq_ignore_ascii_case(trimmed)) {
            return Err(StoreError::Conflict(format!("category '{trimmed}' already exists")));
        }
        let id = next_id(&state.categories);
        let category = Category::new(id, trimmed)?;
        state.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn find_batch(&self, id: BatchId) -> Result<Option<Batch>, StoreError> {
        Ok(self.read()?.batches.get(&id).cloned())
    }

    async fn list_batches(&self, item_id: ItemId, include_deleted: bool) -> Result<Vec<Batch>, StoreError> {
        Ok(self
            .read()?
            .batches
            .values()
            .filter(|b| b.item_id == item_id && (include_deleted || !b.deleted))
            .cloned()
            .collect())
    }

    async fn create_batch(&self, intake: &IntakeRequest, now: DateTime<Utc>) -> Result<Batch, StoreError> {
        let mut state = self.write()?;
        if !state.items.get(&intake.item_id).is_some_and(|i| !i.deleted) {
            return Err(StoreError::NotFound(format!("item {}", intake.item_id)));
        }
        let id = next_id(&state.batches);
        let batch = Batch::from_intake(id, intake, now)?;
        state.batches.insert(id, batch.clone());
        Ok(batch)
    }

    async fn update_batch_usable(&self, id: BatchId, new_usable: u32) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {id}")))?;
        if new_usable > batch.usable_quantity {
            return Err(StoreError::Invalid(format!(
                "usable quantity of batch {id} cannot rise from {} to {new_usable}",
                batch.usable_quantity
            )));
        }
        batch.usable_quantity = new_usable;
        Ok(())
    }

    async fn commit_deduction(
        &self,
        plan: &DeductionPlan,
        attach: Option<&NewRequest>,
        now: DateTime<Utc>,
    ) -> Result<Option<EmployeeRequest>, StoreError> {
        let mut state = self.write()?;
        // Validate everything before the first write so a rejected plan changes nothing.
        check_plan(&state, plan)?;

        for d in &plan.deductions {
            if let Some(batch) = state.batches.get_mut(&d.batch_id) {
                batch.draw(d.taken())?;
            }
        }

        let request = attach.map(|new| {
            let id = next_id(&state.requests);
            let request = EmployeeRequest::open(id, new.clone(), now);
            state.requests.insert(id, request.clone());
            request
        });
        Ok(request)
    }

    async fn soft_delete_batch(&self, id: BatchId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let batch = state
            .batches
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("batch {id}")))?;
        batch.deleted = true;
        Ok(())
    }

    async fn find_request(&self, id: RequestId) -> Result<Option<EmployeeRequest>, StoreError> {
        Ok(self.read()?.requests.get(&id).cloned())
    }

    async fn list_requests(&self, filter: &RequestFilter) -> Result<Vec<EmployeeRequest>, StoreError> {
        Ok(self
            .read()?
            .requests
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn update_request_status(
        &self,
        id: RequestId,
        from: RequestStatus,
        to: RequestStatus,
        actual_return: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))?;
        if request.status != from {
            return Err(StoreError::Conflict(format!(
                "request {id} is {}, expected {}",
                request.status.as_str(),
                from.as_str()
            )));
        }
        request.status = to;
        request.actual_return_date = actual_return;
        Ok(())
    }

    async fn soft_delete_request(&self, id: RequestId) -> Result<(), StoreError> {
        let mut state = self.write()?;
        let request = state
            .requests
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("request {id}")))?;
        request.deleted = true;
        Ok(())
    }

    async fn insert_bus(&self, new: &NewBus) -> Result<BusRecord, StoreError> {
        let mut state = self.write()?;
        let plate = new.plate_number.trim().to_uppercase();
        if state.buses.values().any(|b| !b.deleted && b.plate_number == plate) {
            return Err(StoreError::Conflict(format!("bus with plate '{plate}' already exists")));
        }
        let id = next_id(&state.buses);
        let bus = BusRecord::register(id, new.clone())?;
        state.buses.insert(id, bus.clone());
        Ok(bus)
    }

    async fn list_buses(&self) -> Result<Vec<BusRecord>, StoreError> {
        Ok(self.read()?.buses.values().filter(|b| !b.deleted).cloned().collect())
    }

    async fn count_linked_buses(&self, item_id: ItemId) -> Result<u64, StoreError> {
        Ok(self.read()?.buses.values().filter(|b| b.is_linked_to(item_id)).count() as u64)
    }
}
