use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Event;

/// A published event plus the metadata the bus attaches to it.
///
/// `sequence_number` grows by one per publish on the same bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    sequence_number: u64,
    event_type: String,
    subject_id: String,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E: Event> EventEnvelope<E> {
    pub fn wrap(sequence_number: u64, event: E) -> Self {
        Self {
            event_id: Uuid::now_v7(),
            sequence_number,
            event_type: event.event_type().to_string(),
            subject_id: event.subject_id(),
            occurred_at: event.occurred_at(),
            payload: event,
        }
    }
}

impl<E> EventEnvelope<E> {
    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn subject_id(&self) -> &str {
        &self.subject_id
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }
}
