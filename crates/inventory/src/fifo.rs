//! First-expiring-first-out deduction planning.
//!
//! Planning is pure: given an item's batches and a quantity it returns the
//! exact per-batch changes, or refuses when total usable stock cannot cover the
//! request. Nothing is mutated, so a refused plan leaves every batch as it was.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use fleetstock_core::{BatchId, ItemId};

use crate::batch::Batch;

/// One batch's part of a deduction.
///
/// `expected_usable` is the value the plan was computed against; stores commit
/// the change only if the batch still holds exactly that amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchDeduction {
    pub batch_id: BatchId,
    pub expected_usable: u32,
    pub new_usable: u32,
}

impl BatchDeduction {
    pub fn taken(&self) -> u32 {
        self.expected_usable - self.new_usable
    }
}

/// Ordered per-batch changes satisfying one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeductionPlan {
    pub item_id: ItemId,
    pub requested: u32,
    pub deductions: Vec<BatchDeduction>,
}

impl DeductionPlan {
    pub fn total_taken(&self) -> u64 {
        self.deductions.iter().map(|d| u64::from(d.taken())).sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("deduction quantity must be greater than zero")]
    ZeroQuantity,

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u64 },
}

/// Eligible batches in consumption order: soonest expiration first, undated last.
///
/// The sort is stable, so equal dates keep retrieval order.
pub fn consumption_order<'a>(item_id: ItemId, batches: &'a [Batch]) -> Vec<&'a Batch> {
    let mut eligible: Vec<&Batch> = batches
        .iter()
        .filter(|b| b.item_id == item_id && b.is_drawable())
        .collect();
    eligible.sort_by_key(|b| (b.expiration_date.is_none(), b.expiration_date));
    eligible
}

pub fn plan_fifo(item_id: ItemId, batches: &[Batch], quantity: u32) -> Result<DeductionPlan, PlanError> {
    if quantity == 0 {
        return Err(PlanError::ZeroQuantity);
    }

    let order = consumption_order(item_id, batches);
    let available: u64 = order.iter().map(|b| u64::from(b.usable_quantity)).sum();
    if available < u64::from(quantity) {
        return Err(PlanError::InsufficientStock {
            requested: quantity,
            available,
        });
    }

    let mut remaining = quantity;
    let mut deductions = Vec::new();
    for batch in order {
        if remaining == 0 {
            break;
        }
        let take = batch.usable_quantity.min(remaining);
        deductions.push(BatchDeduction {
            batch_id: batch.id,
            expected_usable: batch.usable_quantity,
            new_usable: batch.usable_quantity - take,
        });
        remaining -= take;
    }

    Ok(DeductionPlan {
        item_id,
        requested: quantity,
        deductions,
    })
}
