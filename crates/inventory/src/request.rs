use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use fleetstock_core::{DomainError, DomainResult, EmployeeId, Entity, ItemId, RequestId, SoftDelete};

use crate::mapping::canonical_enum;

canonical_enum! {
    /// What the employee intends to do with the stock.
    pub enum RequestType {
        Borrow => ("BORROW", "Borrow"),
        Consume => ("CONSUME", "Consume"),
    }
}

canonical_enum! {
    /// Request lifecycle.
    pub enum RequestStatus {
        NotReturned => ("NOT_RETURNED", "Not Returned"),
        Consumed => ("CONSUMED", "Consumed"),
        Returned => ("RETURNED", "Returned"),
    }
}

impl RequestType {
    /// Status a request starts in; fully determined by its type.
    pub fn initial_status(self) -> RequestStatus {
        match self {
            RequestType::Borrow => RequestStatus::NotReturned,
            RequestType::Consume => RequestStatus::Consumed,
        }
    }
}

/// Employee request to borrow or consume stock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRequest {
    pub id: RequestId,
    pub requester: EmployeeId,
    pub item_id: ItemId,
    pub request_type: RequestType,
    pub quantity: u32,
    pub purpose: String,
    pub status: RequestStatus,
    pub expected_return_date: Option<NaiveDate>,
    pub actual_return_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub deleted: bool,
}

impl EmployeeRequest {
    pub fn open(id: RequestId, new: NewRequest, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            requester: new.requester,
            item_id: new.item_id,
            request_type: new.request_type,
            quantity: new.quantity,
            purpose: new.purpose.trim().to_string(),
            status: new.request_type.initial_status(),
            expected_return_date: new.expected_return_date,
            actual_return_date: None,
            created_at,
            deleted: false,
        }
    }

    /// `NOT_RETURNED → RETURNED`; every other transition is refused.
    pub fn mark_returned(&mut self, at: DateTime<Utc>) -> DomainResult<()> {
        match self.status {
            RequestStatus::NotReturned => {
                self.status = RequestStatus::Returned;
                self.actual_return_date = Some(at);
                Ok(())
            }
            other => Err(DomainError::transition(format!(
                "request {} is {} and cannot be returned",
                self.id,
                other.as_str()
            ))),
        }
    }
}

impl Entity for EmployeeRequest {
    type Id = RequestId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl SoftDelete for EmployeeRequest {
    fn is_deleted(&self) -> bool {
        self.deleted
    }
}

/// Request form as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRequest {
    pub requester: EmployeeId,
    pub item_id: ItemId,
    pub request_type: RequestType,
    pub quantity: u32,
    pub purpose: String,
    #[serde(default)]
    pub expected_return_date: Option<NaiveDate>,
}

impl NewRequest {
    pub fn validate(&self, today: NaiveDate) -> DomainResult<()> {
        if self.quantity == 0 {
            return Err(DomainError::validation("quantity must be greater than zero"));
        }
        if self.purpose.trim().is_empty() {
            return Err(DomainError::validation("purpose cannot be empty"));
        }
        match (self.request_type, self.expected_return_date) {
            (RequestType::Consume, Some(_)) => Err(DomainError::validation(
                "expected_return_date only applies to BORROW requests",
            )),
            (RequestType::Borrow, Some(date)) if date < today => Err(DomainError::validation(
                "expected_return_date cannot be in the past",
            )),
            _ => Ok(()),
        }
    }
}

/// Listing filter for requests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestFilter {
    pub item_id: Option<ItemId>,
    pub requester: Option<EmployeeId>,
    pub status: Option<RequestStatus>,
    pub request_type: Option<RequestType>,
}

impl RequestFilter {
    pub fn matches(&self, request: &EmployeeRequest) -> bool {
        !request.deleted
            && self.item_id.is_none_or(|id| id == request.item_id)
            && self.requester.as_ref().is_none_or(|r| *r == request.requester)
            && self.status.is_none_or(|s| s == request.status)
            && self.request_type.is_none_or(|t| t == request.request_type)
    }
}
