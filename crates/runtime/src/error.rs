//! Unified error types surfaced by the runtime API.
//!
//! Wraps core rule errors and session misuse so handlers and callers share one
//! error type. Every variant is `Clone` so failures can be collected into a
//! [`PublishReport`](crate::PublishReport) and handed back to the caller.
use thiserror::Error;

use combat_core::action::{PerformError, ScheduleError};
use combat_core::engine::{PhaseError, ReactionError, TurnError, WindowId};
use combat_core::state::StoreError;
use combat_core::{CombatError, ConditionError, EntityId, ErrorSeverity, Phase};

use crate::events::Topic;

pub type Result<T> = std::result::Result<T, RuntimeError>;

/// Schema failure at the bus boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PublishError {
    #[error("{topic} payload rejected: {reason}")]
    InvalidPayload { topic: Topic, reason: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    // ===== session lifecycle =====
    #[error("battle has not started")]
    NotStarted,

    #[error("battle already started")]
    AlreadyStarted,

    #[error("battle is over")]
    BattleOver,

    #[error("session needs at least one combatant")]
    EmptyRoster,

    // ===== session misuse =====
    #[error("cannot {operation} while the turn is in {phase}")]
    Busy { operation: &'static str, phase: Phase },

    #[error("{actor} is not the active combatant (current: {current:?})")]
    NotCurrentActor {
        actor: EntityId,
        current: Option<EntityId>,
    },

    #[error("intent can no longer be cancelled in {phase}")]
    CancelTooLate { phase: Phase },

    #[error("no reaction window is open (asked for {window})")]
    NoOpenWindow { window: WindowId },

    // ===== wrapped errors =====
    #[error(transparent)]
    Publish(#[from] PublishError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Perform(#[from] PerformError),

    #[error(transparent)]
    Reaction(#[from] ReactionError),

    #[error(transparent)]
    Turn(#[from] TurnError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Condition(#[from] ConditionError),
}

impl CombatError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotStarted
            | Self::AlreadyStarted
            | Self::BattleOver
            | Self::NoOpenWindow { .. } => ErrorSeverity::Recoverable,
            Self::EmptyRoster
            | Self::Busy { .. }
            | Self::NotCurrentActor { .. }
            | Self::CancelTooLate { .. } => ErrorSeverity::Validation,
            Self::Publish(_) => ErrorSeverity::Internal,
            Self::Schedule(inner) => inner.severity(),
            Self::Perform(inner) => inner.severity(),
            Self::Reaction(inner) => inner.severity(),
            Self::Turn(inner) => inner.severity(),
            Self::Phase(inner) => inner.severity(),
            Self::Store(inner) => inner.severity(),
            Self::Condition(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotStarted => "session_not_started",
            Self::AlreadyStarted => "session_already_started",
            Self::BattleOver => "session_battle_over",
            Self::EmptyRoster => "session_empty_roster",
            Self::Busy { .. } => "session_busy",
            Self::NotCurrentActor { .. } => "session_not_current_actor",
            Self::CancelTooLate { .. } => "session_cancel_too_late",
            Self::NoOpenWindow { .. } => "session_no_open_window",
            Self::Publish(_) => "publish_invalid_payload",
            Self::Schedule(inner) => inner.error_code(),
            Self::Perform(inner) => inner.error_code(),
            Self::Reaction(inner) => inner.error_code(),
            Self::Turn(inner) => inner.error_code(),
            Self::Phase(inner) => inner.error_code(),
            Self::Store(inner) => inner.error_code(),
            Self::Condition(inner) => inner.error_code(),
        }
    }
}
