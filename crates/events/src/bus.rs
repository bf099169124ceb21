//! Event publishing/subscription abstraction.
//!
//! The inventory core needs derived state (item status) to be current as soon as
//! a batch mutation returns, so the bus used here is **synchronous**: handlers
//! run inline inside `publish`. Observers that only want to watch the stream
//! (audit, tests) get a buffered [`Subscription`] and never block publication.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex, RwLock, mpsc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{Event, EventEnvelope, EventHandler};

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every envelope published after it was
/// created (broadcast semantics). Designed for single-threaded consumption.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Drain everything currently buffered.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Failure while publishing an event.
#[derive(Debug, Error)]
pub enum PublishError<E>
where
    E: core::fmt::Debug + core::fmt::Display,
{
    #[error("handler '{handler}' failed: {reason}")]
    Handler { handler: &'static str, reason: E },

    #[error("event bus lock poisoned")]
    Poisoned,
}

/// Domain-agnostic event bus.
///
/// `publish` returns only once every registered handler has run. Multiple
/// threads may publish concurrently.
#[async_trait]
pub trait EventBus<E: Event>: Send + Sync {
    type Error: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static;

    async fn publish(&self, event: E) -> Result<EventEnvelope<E>, Self::Error>;

    fn subscribe(&self) -> Subscription<EventEnvelope<E>>;
}

#[async_trait]
impl<E, B> EventBus<E> for Arc<B>
where
    E: Event,
    B: EventBus<E> + ?Sized,
{
    type Error = B::Error;

    async fn publish(&self, event: E) -> Result<EventEnvelope<E>, Self::Error> {
        (**self).publish(event).await
    }

    fn subscribe(&self) -> Subscription<EventEnvelope<E>> {
        (**self).subscribe()
    }
}

/// Error types a handler may report.
pub trait HandlerError: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static {}

impl<T> HandlerError for T where T: core::fmt::Debug + core::fmt::Display + Send + Sync + 'static {}

type DynHandler<E, Err> = Arc<dyn EventHandler<E, Error = Err>>;

/// In-process bus running handlers inline, in registration order.
pub struct InlineEventBus<E: Event, Err: HandlerError> {
    handlers: RwLock<Vec<DynHandler<E, Err>>>,
    observers: Mutex<Vec<mpsc::Sender<EventEnvelope<E>>>>,
    sequence: AtomicU64,
}

impl<E: Event, Err: HandlerError> InlineEventBus<E, Err> {
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(Vec::new()),
            observers: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
        }
    }

    /// Register a handler. Handlers run in the order they were registered.
    pub fn register(&self, handler: DynHandler<E, Err>) {
        if let Ok(mut handlers) = self.handlers.write() {
            handlers.push(handler);
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.read().map(|h| h.len()).unwrap_or(0)
    }
}

impl<E: Event, Err: HandlerError> Default for InlineEventBus<E, Err> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Event, Err: HandlerError> core::fmt::Debug for InlineEventBus<E, Err> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InlineEventBus")
            .field("handlers", &self.handler_count())
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish()
    }
}

#[async_trait]
impl<E, Err> EventBus<E> for InlineEventBus<E, Err>
where
    E: Event,
    Err: HandlerError,
{
    type Error = PublishError<Err>;

    async fn publish(&self, event: E) -> Result<EventEnvelope<E>, Self::Error> {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        let envelope = EventEnvelope::wrap(seq, event);

        // Snapshot so no lock is held across handler awaits.
        let handlers: Vec<DynHandler<E, Err>> = self
            .handlers
            .read()
            .map_err(|_| PublishError::Poisoned)?
            .clone();

        for handler in handlers {
            if let Err(reason) = handler.handle(&envelope).await {
                tracing::warn!(
                    handler = handler.name(),
                    event_type = envelope.event_type(),
                    subject_id = envelope.subject_id(),
                    "event handler failed: {reason}"
                );
                return Err(PublishError::Handler {
                    handler: handler.name(),
                    reason,
                });
            }
        }

        if let Ok(mut observers) = self.observers.lock() {
            // Drop any dead observers while publishing.
            observers.retain(|tx| tx.send(envelope.clone()).is_ok());
        }

        Ok(envelope)
    }

    fn subscribe(&self) -> Subscription<EventEnvelope<E>> {
        let (tx, rx) = mpsc::channel();

        // If the lock is poisoned, we still return a subscription;
        // it just won't receive messages.
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(tx);
        }

        Subscription::new(rx)
    }
}
