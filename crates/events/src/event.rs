use chrono::{DateTime, Utc};

/// A fact published after a committed change.
///
/// Handlers react to it synchronously; it is never stored or replayed.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Dotted name, e.g. "inventory.batch.changed".
    fn event_type(&self) -> &'static str;

    /// Id of the record the change concerns.
    fn subject_id(&self) -> String;

    fn occurred_at(&self) -> DateTime<Utc>;
}
