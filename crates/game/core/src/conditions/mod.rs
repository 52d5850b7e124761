//! Condition ledger: stackable, timed modifiers and statuses.
//!
//! Nets are always summed from the live instances, so a query right after a
//! tick already reflects every expiry of that tick.
mod kind;
mod ledger;

pub use kind::{
    ConditionEffect, ConditionId, ConditionSpec, DamageScope, Duration, ModifierKind, StatusKind,
};
pub use ledger::{Applied, Condition, ConditionLedger};

use crate::error::{CombatError, ErrorSeverity};
use crate::state::EntityId;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionError {
    #[error("condition {name} applied with a duration of zero rounds")]
    ZeroDuration { name: String },

    #[error("condition ledger is full ({capacity} instances)")]
    LedgerFull { capacity: usize },

    #[error("no active condition {id}")]
    NotFound { id: ConditionId },

    #[error("entity {entity} not found")]
    UnknownEntity { entity: EntityId },
}

impl CombatError for ConditionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::ZeroDuration { .. } | Self::NotFound { .. } | Self::UnknownEntity { .. } => {
                ErrorSeverity::Validation
            }
            Self::LedgerFull { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::ZeroDuration { .. } => "condition_zero_duration",
            Self::LedgerFull { .. } => "condition_ledger_full",
            Self::NotFound { .. } => "condition_not_found",
            Self::UnknownEntity { .. } => "condition_unknown_entity",
        }
    }
}

/// Why a condition left or entered a ledger, for presentation subscribers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ChangeKind {
    Applied,
    Refreshed,
    Removed,
    Expired,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionChange {
    pub entity: EntityId,
    pub kind: ChangeKind,
    pub condition: ConditionId,
    pub delta: i32,
}
