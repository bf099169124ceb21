//! Domain events and their in-process distribution.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod handler;

pub use bus::{EventBus, HandlerError, InlineEventBus, PublishError, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::EventHandler;
