use serde::{Deserialize, Serialize};

use fleetstock_core::{CategoryId, DomainError, DomainResult, Entity};

/// Item category (e.g. "Consumable", "Tool").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

impl Category {
    pub fn new(id: CategoryId, name: impl Into<String>) -> DomainResult<Self> {
        let name = name.into().trim().to_string();
        if name.is_empty() {
            return Err(DomainError::validation("category name cannot be empty"));
        }
        Ok(Self { id, name })
    }

    pub fn policy(&self) -> CategoryPolicy {
        CategoryPolicy::from_name(&self.name)
    }
}

impl Entity for Category {
    type Id = CategoryId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// How an item's stock level maps to a lifecycle status.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryPolicy {
    /// Stock depletes with use; tracked via OUT_OF_STOCK / LOW_STOCK.
    Consumable,
    /// Machines, tools, equipment; zero on hand means everything is in use.
    Durable,
    /// Any other category: only expiry affects status.
    Other,
}

impl CategoryPolicy {
    pub fn from_name(name: &str) -> Self {
        let name = name.trim();
        if name.eq_ignore_ascii_case("consumable") {
            CategoryPolicy::Consumable
        } else if ["machine", "tool", "equipment"]
            .iter()
            .any(|d| name.eq_ignore_ascii_case(d))
        {
            CategoryPolicy::Durable
        } else {
            CategoryPolicy::Other
        }
    }
}
