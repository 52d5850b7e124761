//! Reaction windows: the one suspension point of an action.
//!
//! A window is opened for a defendable action, collects declarations in
//! arrival order, then moves `Open -> Resolving -> Closed` exactly once.

use std::fmt;

use crate::action::{ActionCatalog, ActionId, QueuedAction, ReservationId};
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{EntityId, EntityStore, ReactionTally};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WindowId(pub u64);

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum WindowState {
    Open,
    Resolving,
    Closed,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionChoice {
    React(ActionId),
    Pass,
}

/// One defender's answer, with the penalty fixed at declaration time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Declaration {
    pub defender: EntityId,
    pub choice: ReactionChoice,
    /// Added to difficulty and removed from the pool.
    pub penalty: u32,
}

impl Declaration {
    pub fn reaction(&self) -> Option<&ActionId> {
        match &self.choice {
            ReactionChoice::React(action) => Some(action),
            ReactionChoice::Pass => None,
        }
    }
}

/// A defender allowed to answer, with the reactions open to them.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EligibleDefender {
    pub defender: EntityId,
    pub options: Vec<ActionId>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ReactionError {
    #[error("window {window} is {state}; declaration from {defender} ignored")]
    Stale {
        window: WindowId,
        state: WindowState,
        defender: EntityId,
    },

    #[error("{defender} may not react in window {window}")]
    NotEligible { window: WindowId, defender: EntityId },

    #[error("{defender} already declared in window {window}")]
    AlreadyDeclared { window: WindowId, defender: EntityId },

    #[error("{action} is not an option for {defender}")]
    InvalidReaction { defender: EntityId, action: ActionId },

    #[error("window {window} cannot move from {from} to {to}")]
    IllegalTransition {
        window: WindowId,
        from: WindowState,
        to: WindowState,
    },
}

impl CombatError for ReactionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Stale { .. } => ErrorSeverity::Recoverable,
            Self::NotEligible { .. }
            | Self::AlreadyDeclared { .. }
            | Self::InvalidReaction { .. } => {
                ErrorSeverity::Validation
            }
            Self::IllegalTransition { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Stale { .. } => "reaction_stale",
            Self::NotEligible { .. } => "reaction_not_eligible",
            Self::AlreadyDeclared { .. } => "reaction_already_declared",
            Self::InvalidReaction { .. } => "reaction_invalid",
            Self::IllegalTransition { .. } => "reaction_illegal_transition",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionWindow {
    id: WindowId,
    pending: ReservationId,
    eligible: Vec<EligibleDefender>,
    declarations: Vec<Declaration>,
    max_declarations: usize,
    state: WindowState,
}

impl ReactionWindow {
    pub fn open(
        id: WindowId,
        pending: ReservationId,
        eligible: Vec<EligibleDefender>,
        max_declarations: usize,
    ) -> Self {
        Self {
            id,
            pending,
            eligible,
            declarations: Vec::new(),
            max_declarations: max_declarations.max(1),
            state: WindowState::Open,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn pending(&self) -> ReservationId {
        self.pending
    }

    pub fn state(&self) -> WindowState {
        self.state
    }

    pub fn eligible(&self) -> &[EligibleDefender] {
        &self.eligible
    }

    pub fn declarations(&self) -> &[Declaration] {
        &self.declarations
    }

    /// Records a declaration. A reaction is charged to the defender's tally;
    /// a pass costs nothing.
    pub fn declare(
        &mut self,
        defender: EntityId,
        choice: ReactionChoice,
        tally: &mut ReactionTally,
    ) -> Result<&Declaration, ReactionError> {
        if self.state != WindowState::Open {
            return Err(ReactionError::Stale {
                window: self.id,
                state: self.state,
                defender,
            });
        }
        let entry = self
            .eligible
            .iter()
            .find(|e| e.defender == defender)
            .ok_or(ReactionError::NotEligible {
                window: self.id,
                defender,
            })?;
        if self.declarations.iter().any(|d| d.defender == defender) {
            return Err(ReactionError::AlreadyDeclared {
                window: self.id,
                defender,
            });
        }
        if let ReactionChoice::React(action) = &choice
            && !entry.options.contains(action)
        {
            return Err(ReactionError::InvalidReaction {
                defender,
                action: action.clone(),
            });
        }

        let penalty = match choice {
            ReactionChoice::React(_) => tally.record(),
            ReactionChoice::Pass => 0,
        };
        self.declarations.push(Declaration {
            defender,
            choice,
            penalty,
        });
        Ok(&self.declarations[self.declarations.len() - 1])
    }

    /// Every eligible defender answered, or the declaration cap was hit.
    pub fn is_ready(&self) -> bool {
        self.declarations.len() >= self.max_declarations
            || self
                .eligible
                .iter()
                .all(|e| self.declarations.iter().any(|d| d.defender == e.defender))
    }

    /// Stops accepting declarations and hands them over in declaration order.
    pub fn begin_resolving(&mut self) -> Result<Vec<Declaration>, ReactionError> {
        self.transition(WindowState::Open, WindowState::Resolving)?;
        Ok(self.declarations.clone())
    }

    pub fn close(&mut self) -> Result<(), ReactionError> {
        self.transition(WindowState::Resolving, WindowState::Closed)
    }

    fn transition(&mut self, from: WindowState, to: WindowState) -> Result<(), ReactionError> {
        if self.state != from {
            return Err(ReactionError::IllegalTransition {
                window: self.id,
                from: self.state,
                to,
            });
        }
        self.state = to;
        Ok(())
    }
}

/// Defenders who may answer a queued action. Empty when the action is not
/// defendable or its target cannot react.
pub fn eligible_defenders(
    catalog: &ActionCatalog,
    store: &EntityStore,
    queued: &QueuedAction,
) -> Vec<EligibleDefender> {
    let intent = queued.intent.intent();
    let Some(def) = catalog.get(&intent.action) else {
        return Vec::new();
    };
    if !def.is_defendable() {
        return Vec::new();
    }
    let (Some(attacker), Some(defender)) = (
        store.get(intent.actor),
        intent.target_entity().and_then(|id| store.get(id)),
    ) else {
        return Vec::new();
    };

    let options = catalog.reaction_options(def, attacker, defender);
    if options.is_empty() {
        return Vec::new();
    }
    vec![EligibleDefender {
        defender: defender.id,
        options,
    }]
}
