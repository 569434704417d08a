//! Order events and the hooks that react to them.
//!
//! Events are published after the database transaction that caused them has committed. Hooks run in the background
//! and cannot fail the operation that published the event.
mod channel;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use event_types::{OrderEvent, OrderEventKind};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
