//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}

/// Entities that are never physically removed, only flagged inactive.
///
/// Soft-deleted records are excluded from every read aggregate.
pub trait SoftDelete {
    fn is_deleted(&self) -> bool;

    fn is_live(&self) -> bool {
        !self.is_deleted()
    }
}
