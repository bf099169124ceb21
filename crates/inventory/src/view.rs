//! Read-side view of items: computed stock, filtering and sorting.

use serde::{Deserialize, Serialize};

use fleetstock_core::CategoryId;

use crate::item::{InventoryItem, ItemStatus};

/// An item as shown to users, with its read-time aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemView {
    #[serde(flatten)]
    pub item: InventoryItem,
    pub current_stock: u64,
    pub effective_status: ItemStatus,
}

impl ItemView {
    pub fn new(item: InventoryItem, current_stock: u64) -> Self {
        let effective_status = item.effective_status();
        Self {
            item,
            current_stock,
            effective_status,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemFilter {
    /// Matches the effective status.
    pub status: Option<ItemStatus>,
    pub category_id: Option<CategoryId>,
    /// Case-insensitive substring of the name.
    pub search: Option<String>,
}

impl ItemFilter {
    pub fn matches(&self, view: &ItemView) -> bool {
        if view.item.deleted {
            return false;
        }
        if self.status.is_some_and(|s| s != view.effective_status) {
            return false;
        }
        if self.category_id.is_some_and(|c| c != view.item.category_id) {
            return false;
        }
        match self.search.as_deref().map(str::trim) {
            Some(needle) if !needle.is_empty() => view
                .item
                .name
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => true,
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemSortKey {
    #[default]
    Name,
    CurrentStock,
    Status,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSort {
    pub key: ItemSortKey,
    pub direction: SortDirection,
}

/// Filter then sort; ties are broken by item id so output is deterministic.
pub fn select_items(views: Vec<ItemView>, filter: &ItemFilter, sort: ItemSort) -> Vec<ItemView> {
    let mut out: Vec<ItemView> = views.into_iter().filter(|v| filter.matches(v)).collect();
    out.sort_by(|a, b| {
        let primary = match sort.key {
            ItemSortKey::Name => a.item.name.to_lowercase().cmp(&b.item.name.to_lowercase()),
            ItemSortKey::CurrentStock => a.current_stock.cmp(&b.current_stock),
            ItemSortKey::Status => a.effective_status.as_str().cmp(b.effective_status.as_str()),
        };
        let primary = match sort.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.item.id.cmp(&b.item.id))
    });
    out
}
