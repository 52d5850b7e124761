//! Event-driven orchestration of one battle.
//!
//! `combat-runtime` wires the deterministic rules in `combat-core` into a
//! pipeline of bus handlers. Callers drive a fight through
//! [`BattleSession`] and read back the [`PublishReport`] of each call.
//!
//! Modules are organized by responsibility:
//! - [`events`] holds the topic-based bus and the per-topic event schemas
//! - [`handlers`] has one bus handler per pipeline stage
//! - [`session`] is the public entry point and its builder
//! - [`state`] owns the store, queue, turn and window machinery handlers share
//! - [`config`] and [`error`] carry runtime settings and failures
pub mod config;
pub mod error;
pub mod events;
pub mod handlers;
pub mod session;
pub mod state;

pub use config::RuntimeConfig;
pub use error::{PublishError, Result, RuntimeError};
pub use events::{
    Envelope, Event, EventBus, EventHandler, HandlerFailure, Outbox, PublishReport, Topic,
};
pub use handlers::default_handlers;
pub use session::{BattleSession, SessionBuilder};
pub use state::{BattleOutcome, BattleState};
