//! Fleet (bus) records, as far as inventory needs them.
//!
//! Buses are owned by the fleet side of the application. Inventory only counts
//! the live records linked to an item whose stock policy is
//! `ExternalCount(FleetBuses)`.

use serde::{Deserialize, Serialize};

use fleetstock_core::{BusId, DomainError, DomainResult, Entity, ItemId, SoftDelete};

use crate::mapping::canonical_enum;

canonical_enum! {
    /// Physical condition of a bus.
    pub enum BusCondition {
        Operational => ("OPERATIONAL", "Operational"),
        UnderRepair => ("UNDER_REPAIR", "Under Repair"),
        Decommissioned => ("DECOMMISSIONED", "Decommissioned"),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusRecord {
    pub id: BusId,
    pub plate_number: String,
    pub item_id: Option<ItemId>,
    pub condition: BusCondition,
    pub deleted: bool,
}

impl BusRecord {
    pub fn register(id: BusId, new: NewBus) -> DomainResult<Self> {
        let plate_number = new.plate_number.trim().to_uppercase();
        if plate_number.is_empty() {
            return Err(DomainError::validation("plate_number cannot be empty"));
        }
        Ok(Self {
            id,
            plate_number,
            item_id: new.item_id,
            condition: new.condition,
            deleted: false,
        })
    }

    pub fn is_linked_to(&self, item_id: ItemId) -> bool {
        !self.deleted && self.item_id == Some(item_id)
    }
}

impl Entity for BusRecord {
    type Id = BusId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SoftDelete for BusRecord {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBus {
    pub plate_number: String,
    #[serde(default)]
    pub item_id: Option<ItemId>,
    pub condition: BusCondition,
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetstock_core::PrefixedId;

    #[test]
    fn plate_is_normalised() {
        let bus = BusRecord::register(
            BusId::from_seq(1),
            NewBus {
                plate_number: " abc-123 ".to_string(),
                item_id: Some(ItemId::from_seq(9)),
                condition: BusCondition::Operational,
            },
        )
        .unwrap();
        assert_eq!(bus.plate_number, "ABC-123");
        assert!(bus.is_linked_to(ItemId::from_seq(9)));
        assert!(!bus.is_linked_to(ItemId::from_seq(8)));
    }

    #[test]
    fn condition_accepts_label_or_code() {
        assert_eq!("under repair".parse::<BusCondition>().unwrap(), BusCondition::UnderRepair);
        assert_eq!("UNDER_REPAIR".parse::<BusCondition>().unwrap(), BusCondition::UnderRepair);
    }
}
