//! Common error infrastructure for combat-core.
//!
//! Domain errors (`DiceError`, `InvalidIntent`, `TrackError`, ...) live next to
//! the rules that raise them. This module holds the shared classification used
//! by the runtime to decide whether a failure returns control to the
//! controller, gets logged and ignored, or aborts a resolution.

use crate::state::{EntityId, Round};

/// Severity level of an error, used for routing and recovery.
///
/// - **Recoverable**: the caller may retry, possibly with a different choice
/// - **Validation**: the input was wrong and must change before retrying
/// - **Internal**: a state inconsistency that points at a bug
/// - **Fatal**: a broken invariant; the current resolution cannot continue
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Examples: no reaction slot left, window already closed.
    Recoverable,

    /// Examples: unknown action, target out of reach.
    Validation,

    /// Examples: scheduler queue out of sync with the published reservation.
    Internal,

    /// Examples: a health track holding more marks than boxes.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable | Self::Validation)
    }

    /// Returns true if this error indicates a bug rather than bad input.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Where an error happened, captured when it is created.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ErrorContext {
    pub actor: Option<EntityId>,
    pub round: Option<Round>,
    #[cfg_attr(feature = "serde", serde(skip_deserializing))]
    pub message: Option<&'static str>,
}

impl ErrorContext {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            actor: None,
            round: None,
            message: None,
        }
    }

    #[must_use]
    pub const fn with_actor(mut self, actor: EntityId) -> Self {
        self.actor = Some(actor);
        self
    }

    #[must_use]
    pub const fn with_round(mut self, round: Round) -> Self {
        self.round = Some(round);
        self
    }

    #[must_use]
    pub const fn with_message(mut self, message: &'static str) -> Self {
        self.message = Some(message);
        self
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - Use `#[derive(thiserror::Error)]` for the Display/Error impl
/// - Classify severity by recoverability, not by how bad the outcome is
/// - `error_code` should be a stable snake_case identifier per variant
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    fn context(&self) -> Option<&ErrorContext> {
        None
    }

    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}
