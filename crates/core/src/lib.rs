//! Shared primitives for the fleet inventory: prefixed record ids, the domain
//! error type and the record traits every stored entity implements.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::{Entity, SoftDelete};
pub use error::{DomainError, DomainResult};
pub use id::{BatchId, BusId, CategoryId, EmployeeId, ItemId, PrefixedId, RequestId};
