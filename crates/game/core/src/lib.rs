//! Deterministic combat rules shared by the runtime and offline tools.
//!
//! `combat-core` resolves actions: dice pools, the damage pipeline, health
//! tracks, the condition ledger, the action catalog and the turn/reaction
//! machinery. It performs no I/O; pathfinding, line of sight and dice come in
//! through the oracle traits in [`env`] and [`dice`].
pub mod action;
pub mod combat;
pub mod conditions;
pub mod config;
pub mod dice;
pub mod engine;
pub mod env;
pub mod error;
pub mod state;

pub use action::{
    ActionCatalog, ActionCost, ActionDef, ActionId, ActionIntent, ActionOption, ActionOutcome,
    ActionResolution, ActionScheduler, InvalidIntent, QueuedAction, Reservation, ReservationId,
    Target, ValidatedIntent,
};
pub use combat::{ArmorProfile, DamageCategory, DamagePacket, DamageReport, Severity, WeaponClass};
pub use conditions::{
    ConditionChange, ConditionError, ConditionId, ConditionLedger, ConditionSpec, Duration,
    ModifierKind, StatusKind,
};
pub use config::CombatConfig;
pub use dice::{DicePool, DiceSource, FixedDice, RollOutcome, SeededDice, TieBreak};
pub use engine::{
    Declaration, Phase, PhaseMachine, ReactionChoice, ReactionWindow, TurnSequencer, WindowId,
    WindowState,
};
pub use env::{Env, MovementOracle, OpenGround, Sight, VisibilityOracle};
pub use error::{CombatError, ErrorContext, ErrorSeverity};
pub use state::{
    Combatant, CombatantSpec, CombatStats, EntityId, EntityStore, HealthTrack, Position, Round,
    TeamId, TrackKind, Weapon,
};
