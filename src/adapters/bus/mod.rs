//! Bus adapters - the in-process message bus and an event recorder.

mod event_recorder;
mod message_bus;

pub use event_recorder::EventRecorder;
pub use message_bus::{MessageBus, SubscriptionId};
