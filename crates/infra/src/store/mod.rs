//! Inventory persistence: the store seam and its backends.

pub mod in_memory;
pub mod postgres;
mod r#trait;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;
pub use r#trait::{InventoryStore, SharedStore, StoreError};
