use chrono::{DateTime, Utc};
use serde::Deserialize;

use fleetstock_core::CategoryId;
use fleetstock_infra::InitialStock;
use fleetstock_inventory::{ItemFilter, ItemSort, ItemSortKey, ItemStatus, NewItem, SortDirection};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(flatten)]
    pub item: NewItem,
    #[serde(default)]
    pub initial_stock: Option<InitialStock>,
}

#[derive(Debug, Deserialize)]
pub struct SetOverrideRequest {
    pub status: ItemStatus,
}

#[derive(Debug, Deserialize)]
pub struct DeductRequest {
    pub quantity: u32,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReturnRequestBody {
    #[serde(default)]
    pub actual_return_date: Option<DateTime<Utc>>,
}

// -------------------------
// Query DTOs
// -------------------------

/// `GET /items?status=LOW_STOCK&category_id=CAT-00001&search=oil&sort=current_stock&order=desc`
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub status: Option<ItemStatus>,
    pub category_id: Option<CategoryId>,
    pub search: Option<String>,
    pub sort: Option<ItemSortKey>,
    pub order: Option<SortDirection>,
}

impl ListItemsQuery {
    pub fn into_parts(self) -> (ItemFilter, ItemSort) {
        let filter = ItemFilter {
            status: self.status,
            category_id: self.category_id,
            search: self.search,
        };
        let sort = ItemSort {
            key: self.sort.unwrap_or_default(),
            direction: self.order.unwrap_or_default(),
        };
        (filter, sort)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListBatchesQuery {
    #[serde(default)]
    pub include_deleted: bool,
}
