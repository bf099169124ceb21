use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleetstock_core::{CategoryId, DomainError, DomainResult, Entity, ItemId, SoftDelete};

use crate::mapping::canonical_enum;

canonical_enum! {
    /// Lifecycle status of an inventory item.
    pub enum ItemStatus {
        Available => ("AVAILABLE", "Available"),
        LowStock => ("LOW_STOCK", "Low Stock"),
        OutOfStock => ("OUT_OF_STOCK", "Out of Stock"),
        /// Durable goods fully checked out.
        InUsed => ("IN_USED", "In Use"),
        Expired => ("EXPIRED", "Expired"),
        /// Only ever set manually by an operator.
        UnderMaintenance => ("UNDER_MAINTENANCE", "Under Maintenance"),
    }
}

impl ItemStatus {
    /// Whether an operator may pin this status over the computed one.
    pub fn is_manual(self) -> bool {
        matches!(self, ItemStatus::UnderMaintenance)
    }
}

/// External record sets that can stand in for batch stock.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExternalSource {
    /// Non-deleted bus records linked to the item.
    FleetBuses,
}

/// How `current_stock` is computed for an item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(tag = "kind", content = "source", rename_all = "snake_case")]
pub enum StockPolicy {
    /// Sum of `usable_quantity` over live batches.
    #[default]
    BatchSum,
    /// Count of linked records in an external set.
    ExternalCount(ExternalSource),
}

/// Inventory item record.
///
/// `current_stock` is deliberately absent: it is recomputed on every read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: ItemId,
    pub name: String,
    pub unit: String,
    pub reorder_level: u32,
    pub category_id: CategoryId,
    /// Last status computed from batches.
    pub status: ItemStatus,
    /// Operator-pinned status, shown instead of `status` while set.
    pub manual_override: Option<ItemStatus>,
    pub stock_policy: StockPolicy,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn create(id: ItemId, new: NewItem, now: DateTime<Utc>) -> DomainResult<Self> {
        new.validate()?;
        Ok(Self {
            id,
            name: new.name.trim().to_string(),
            unit: new.unit.trim().to_string(),
            reorder_level: new.reorder_level,
            category_id: new.category_id,
            status: ItemStatus::Available,
            manual_override: None,
            stock_policy: new.stock_policy,
            deleted: false,
            created_at: now,
            updated_at: now,
        })
    }

    /// Status shown to users: the manual override when set, otherwise the computed one.
    pub fn effective_status(&self) -> ItemStatus {
        self.manual_override.unwrap_or(self.status)
    }

    pub fn set_override(&mut self, status: ItemStatus, now: DateTime<Utc>) -> DomainResult<()> {
        if !status.is_manual() {
            return Err(DomainError::validation(format!(
                "status {} cannot be set manually",
                status.as_str()
            )));
        }
        self.manual_override = Some(status);
        self.updated_at = now;
        Ok(())
    }

    pub fn clear_override(&mut self, now: DateTime<Utc>) {
        self.manual_override = None;
        self.updated_at = now;
    }

    pub fn apply_patch(&mut self, patch: ItemPatch, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = patch.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(DomainError::validation("name cannot be empty"));
            }
            self.name = name.to_string();
        }
        if let Some(unit) = patch.unit {
            let unit = unit.trim();
            if unit.is_empty() {
                return Err(DomainError::validation("unit cannot be empty"));
            }
            self.unit = unit.to_string();
        }
        if let Some(level) = patch.reorder_level {
            self.reorder_level = level;
        }
        if let Some(category_id) = patch.category_id {
            self.category_id = category_id;
        }
        if let Some(policy) = patch.stock_policy {
            self.stock_policy = policy;
        }
        self.updated_at = now;
        Ok(())
    }
}

impl Entity for InventoryItem {
    type Id = ItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SoftDelete for InventoryItem {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Input for defining a new item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewItem {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub reorder_level: u32,
    pub category_id: CategoryId,
    #[serde(default)]
    pub stock_policy: StockPolicy,
}

impl NewItem {
    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if self.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        Ok(())
    }
}

/// Partial update of an item's descriptive fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    pub name: Option<String>,
    pub unit: Option<String>,
    pub reorder_level: Option<u32>,
    pub category_id: Option<CategoryId>,
    pub stock_policy: Option<StockPolicy>,
}
