//! Strongly-typed identifiers used across the domain.
//!
//! Record identifiers are opaque strings with a human-readable prefix
//! (`ITEM-00001`, `BAT-00042`). The numeric suffix is allocated by the store as
//! "largest existing suffix + 1", so sequences may contain gaps and callers must
//! not rely on contiguity.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Minimum number of digits in the rendered suffix.
const SUFFIX_WIDTH: usize = 5;

/// An identifier rendered as `PREFIX-NNNNN`.
pub trait PrefixedId: Copy + Ord + core::fmt::Display + FromStr<Err = DomainError> {
    /// Human-readable prefix, without the trailing dash.
    const PREFIX: &'static str;

    fn from_seq(seq: u64) -> Self;

    fn seq(&self) -> u64;

    /// Allocate the identifier following the largest existing one.
    fn next_after(max_existing: Option<u64>) -> Self {
        Self::from_seq(max_existing.unwrap_or(0) + 1)
    }
}

fn parse_prefixed(s: &str, prefix: &str, name: &str) -> Result<u64, DomainError> {
    let suffix = s
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .ok_or_else(|| DomainError::invalid_id(format!("{name}: expected prefix '{prefix}-' in '{s}'")))?;

    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(DomainError::invalid_id(format!(
            "{name}: non-numeric suffix in '{s}'"
        )));
    }

    let seq: u64 = suffix
        .parse()
        .map_err(|e| DomainError::invalid_id(format!("{name}: {e}")))?;
    if seq == 0 {
        return Err(DomainError::invalid_id(format!("{name}: suffix must be positive")));
    }
    Ok(seq)
}

macro_rules! impl_prefixed_id {
    ($(#[$meta:meta])* $t:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $t(u64);

        impl PrefixedId for $t {
            const PREFIX: &'static str = $prefix;

            fn from_seq(seq: u64) -> Self {
                Self(seq)
            }

            fn seq(&self) -> u64 {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, "{}-{:0width$}", $prefix, self.0, width = SUFFIX_WIDTH)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_prefixed(s.trim(), $prefix, stringify!($t)).map(Self)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.to_string()
            }
        }
    };
}

impl_prefixed_id!(
    /// Identifier of an inventory item.
    ItemId,
    "ITEM"
);
impl_prefixed_id!(
    /// Identifier of a stock batch (lot).
    BatchId,
    "BAT"
);
impl_prefixed_id!(
    /// Identifier of an employee borrow/consume request.
    RequestId,
    "REQ"
);
impl_prefixed_id!(
    /// Identifier of an item category.
    CategoryId,
    "CAT"
);
impl_prefixed_id!(
    /// Identifier of a fleet (bus) record.
    BusId,
    "BUS"
);

/// Reference to an employee managed by an external directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmployeeId(String);

impl EmployeeId {
    pub fn parse(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(DomainError::invalid_id("EmployeeId: cannot be empty"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for EmployeeId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EmployeeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EmployeeId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<EmployeeId> for String {
    fn from(value: EmployeeId) -> Self {
        value.0
    }
}
