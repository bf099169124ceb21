use async_trait::async_trait;

use crate::{Event, EventEnvelope};

/// Reacts to a published event.
///
/// Handlers registered on an [`InlineEventBus`](crate::InlineEventBus) run
/// synchronously inside `publish`, in registration order, so every effect a
/// handler has is visible to the caller once `publish` returns. A handler error
/// aborts the remaining handlers and is surfaced to the publisher.
///
/// Handlers must be idempotent: the same event may be delivered again after a
/// retried operation.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    /// Short stable name used in logs.
    fn name(&self) -> &'static str;

    async fn handle(&self, envelope: &EventEnvelope<E>) -> Result<(), Self::Error>;
}
