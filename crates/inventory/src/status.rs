//! Status engine: item lifecycle status as a pure function of stock.
//!
//! Rules are an ordered decision list, first match wins:
//!
//! 1. any live batch expired (expiration ≤ today) → `EXPIRED`
//! 2. consumable, stock == 0 → `OUT_OF_STOCK`
//! 3. consumable, stock ≤ reorder level → `LOW_STOCK`
//! 4. durable, stock == 0 → `IN_USED`
//! 5. otherwise → `AVAILABLE`
//!
//! `UNDER_MAINTENANCE` is never produced here; it lives in the item's manual
//! override.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::batch::Batch;
use crate::category::CategoryPolicy;
use crate::item::ItemStatus;

/// Aggregate view of an item's live batches at a given day.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StockSnapshot {
    pub current_stock: u64,
    pub has_expired: bool,
}

impl StockSnapshot {
    /// Sum usable quantity and detect expiry over non-deleted batches.
    pub fn from_batches<'a>(batches: impl IntoIterator<Item = &'a Batch>, today: NaiveDate) -> Self {
        batches
            .into_iter()
            .filter(|b| !b.deleted)
            .fold(Self::default(), |acc, b| Self {
                current_stock: acc.current_stock + u64::from(b.usable_quantity),
                has_expired: acc.has_expired || b.is_expired(today),
            })
    }

    /// Replace the batch sum with an externally sourced count; expiry still comes from batches.
    pub fn with_external_count(self, count: u64) -> Self {
        Self {
            current_stock: count,
            ..self
        }
    }
}

pub fn derive_status(policy: CategoryPolicy, reorder_level: u32, snapshot: StockSnapshot) -> ItemStatus {
    let stock = snapshot.current_stock;
    let reorder_level = u64::from(reorder_level);

    if snapshot.has_expired {
        return ItemStatus::Expired;
    }

    match policy {
        CategoryPolicy::Consumable if stock == 0 => ItemStatus::OutOfStock,
        CategoryPolicy::Consumable if stock <= reorder_level => ItemStatus::LowStock,
        CategoryPolicy::Durable if stock == 0 => ItemStatus::InUsed,
        _ => ItemStatus::Available,
    }
}
