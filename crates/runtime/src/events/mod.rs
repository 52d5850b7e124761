//! Topic-based event bus for battle events.
//!
//! Every pipeline stage talks to the others only through this bus. Payloads
//! have one fixed schema per [`Topic`] and are checked at the bus boundary.

mod bus;
mod topic;
mod types;

pub use bus::{EventBus, EventHandler, HandlerFailure, Outbox, PublishReport};
pub use topic::Topic;
pub use types::{Envelope, Event};
