//! Actions from menu to resolution.
//!
//! The [`ActionCatalog`] lists what an actor can do, [`validate_intent`]
//! checks a submitted [`ActionIntent`], the [`ActionScheduler`] reserves its
//! cost and queues it, and [`perform`] resolves it once any reaction window
//! has closed.
mod catalog;
mod intent;
mod performer;
mod scheduler;
mod validation;

pub use catalog::{
    ABSORB, ATTACK_MELEE, ATTACK_RANGED, ActionCatalog, ActionDef, ActionEffect, ActionOption,
    AttackStyle, CatalogError, DODGE, DefenseKind, FOCUS, MOVE, PARRY, SPRINT, Targeting,
};
pub use intent::{ActionCost, ActionId, ActionIntent, Target, ValidatedIntent};
pub use performer::{
    ActionOutcome, ActionResolution, AttackReport, DamageDelta, DefenseReport, FizzleReason,
    MovementDelta, PerformContext, PerformError, RollSummary, perform,
};
pub use scheduler::{
    ActionScheduler, Enqueued, QueuedAction, Reservation, ReservationId, ScheduleError,
};
pub use validation::{InvalidIntent, ValidationContext, validate_intent};
