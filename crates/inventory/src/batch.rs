use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use fleetstock_core::{BatchId, DomainError, DomainResult, Entity, ItemId, SoftDelete};

/// A dated lot of stock received in one intake transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub item_id: ItemId,
    /// Only ever decreases after creation.
    pub usable_quantity: u32,
    pub defective_quantity: u32,
    pub missing_quantity: u32,
    pub expiration_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

impl Batch {
    pub fn from_intake(id: BatchId, intake: &IntakeRequest, created_at: DateTime<Utc>) -> DomainResult<Self> {
        intake.validate()?;
        Ok(Self {
            id,
            item_id: intake.item_id,
            usable_quantity: intake.usable,
            defective_quantity: intake.defective,
            missing_quantity: intake.missing,
            expiration_date: intake.expiration_date,
            created_at,
            deleted: false,
        })
    }

    /// Expired when the expiration date is today or earlier (date-only comparison).
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiration_date.is_some_and(|exp| exp <= today)
    }

    /// Live and holding usable stock.
    pub fn is_drawable(&self) -> bool {
        !self.deleted && self.usable_quantity > 0
    }

    /// Remove `take` units from the usable quantity.
    pub fn draw(&mut self, take: u32) -> DomainResult<()> {
        self.usable_quantity = self.usable_quantity.checked_sub(take).ok_or_else(|| {
            DomainError::invariant(format!(
                "batch {} holds {} usable, cannot draw {}",
                self.id, self.usable_quantity, take
            ))
        })?;
        Ok(())
    }
}

impl Entity for Batch {
    type Id = BatchId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SoftDelete for Batch {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Stock intake form: a received quantity broken down by condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntakeRequest {
    pub item_id: ItemId,
    pub total_received: u32,
    pub usable: u32,
    #[serde(default)]
    pub defective: u32,
    #[serde(default)]
    pub missing: u32,
    #[serde(default)]
    pub expiration_date: Option<NaiveDate>,
}

impl IntakeRequest {
    /// The breakdown must account for every unit received.
    pub fn validate(&self) -> DomainResult<()> {
        validate_breakdown(self.total_received, self.usable, self.defective, self.missing)
    }
}

/// `usable + defective + missing == total_received`, with something received.
pub fn validate_breakdown(total_received: u32, usable: u32, defective: u32, missing: u32) -> DomainResult<()> {
    if total_received == 0 {
        return Err(DomainError::validation("total_received must be greater than zero"));
    }
    let accounted = u64::from(usable) + u64::from(defective) + u64::from(missing);
    if accounted != u64::from(total_received) {
        return Err(DomainError::validation(format!(
            "usable + defective + missing ({accounted}) must equal total_received ({total_received})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleetstock_core::PrefixedId;

    fn intake(total: u32, usable: u32, defective: u32, missing: u32) -> IntakeRequest {
        IntakeRequest {
            item_id: ItemId::from_seq(1),
            total_received: total,
            usable,
            defective,
            missing,
            expiration_date: None,
        }
    }

    #[test]
    fn intake_breakdown_must_match_total() {
        assert!(intake(10, 7, 2, 1).validate().is_ok());

        let err = intake(10, 7, 2, 0).validate().unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains("must equal total_received")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn intake_rejects_empty_delivery() {
        assert!(intake(0, 0, 0, 0).validate().is_err());
    }

    #[test]
    fn intake_sum_does_not_overflow() {
        assert!(intake(u32::MAX, u32::MAX, 1, 0).validate().is_err());
    }

    #[test]
    fn expiry_is_inclusive_of_today() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();
        let mut batch = Batch::from_intake(BatchId::from_seq(1), &intake(5, 5, 0, 0), Utc::now()).unwrap();
        assert!(!batch.is_expired(today));

        batch.expiration_date = Some(today);
        assert!(batch.is_expired(today));

        batch.expiration_date = today.succ_opt();
        assert!(!batch.is_expired(today));
    }

    #[test]
    fn draw_never_goes_negative() {
        let mut batch = Batch::from_intake(BatchId::from_seq(1), &intake(5, 5, 0, 0), Utc::now()).unwrap();
        batch.draw(3).unwrap();
        assert_eq!(batch.usable_quantity, 2);
        assert!(batch.draw(3).is_err());
        assert_eq!(batch.usable_quantity, 2);
    }
}
