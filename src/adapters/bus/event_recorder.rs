//! Event recorder - a subscriber that keeps every event it receives.
//!
//! Useful for front ends that poll instead of reacting, and for test
//! assertions on what the engine published.

use async_trait::async_trait;
use std::sync::{Mutex, PoisonError};

use crate::domain::bus::{EngineStatus, Event, EventKind};
use crate::domain::foundation::DomainError;
use crate::ports::EventHandler;

/// Captures events in arrival order.
#[derive(Debug, Default)]
pub struct EventRecorder {
    events: Mutex<Vec<Event>>,
}

impl EventRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all recorded events.
    pub fn events(&self) -> Vec<Event> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Returns recorded events of one kind.
    pub fn events_of_kind(&self, kind: EventKind) -> Vec<Event> {
        self.events()
            .into_iter()
            .filter(|e| e.kind() == kind)
            .collect()
    }

    /// Returns the status sequence, in order.
    pub fn statuses(&self) -> Vec<EngineStatus> {
        self.events()
            .iter()
            .filter_map(Event::as_status)
            .cloned()
            .collect()
    }

    pub fn event_count(&self) -> usize {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Clears all recorded events.
    pub fn clear(&self) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl EventHandler for EventRecorder {
    async fn handle(&self, event: Event) -> Result<(), DomainError> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "EventRecorder"
    }
}
