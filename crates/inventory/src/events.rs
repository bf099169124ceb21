use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use fleetstock_core::{BatchId, ItemId};
use fleetstock_events::Event;

/// What happened to a batch.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BatchChange {
    Intake { usable: u32 },
    Deducted { taken: u32 },
    Removed,
}

/// Event: BatchChanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchChanged {
    pub item_id: ItemId,
    pub batch_id: BatchId,
    pub change: BatchChange,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemChanged (descriptive fields or policy inputs edited).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemChanged {
    pub item_id: ItemId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    BatchChanged(BatchChanged),
    ItemChanged(ItemChanged),
}

impl InventoryEvent {
    /// Item whose derived state may be stale after this event.
    pub fn item_id(&self) -> ItemId {
        match self {
            InventoryEvent::BatchChanged(e) => e.item_id,
            InventoryEvent::ItemChanged(e) => e.item_id,
        }
    }
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::BatchChanged(_) => "inventory.batch.changed",
            InventoryEvent::ItemChanged(_) => "inventory.item.changed",
        }
    }

    fn subject_id(&self) -> String {
        self.item_id().to_string()
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::BatchChanged(e) => e.occurred_at,
            InventoryEvent::ItemChanged(e) => e.occurred_at,
        }
    }
}
