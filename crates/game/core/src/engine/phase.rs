//! Turn and action phase machine.

use crate::error::{CombatError, ErrorSeverity};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    #[default]
    Idle,
    TurnActive,
    AwaitingIntent,
    IntentValidated,
    Enqueued,
    Executing,
    ReactionOpen,
    ReactionResolved,
    Resolved,
    TurnEnded,
}

impl Phase {
    /// Whether `self -> next` is a legal edge.
    pub const fn can_move_to(self, next: Phase) -> bool {
        use Phase::*;
        matches!(
            (self, next),
            (Idle, TurnActive)
                | (TurnActive, AwaitingIntent | TurnEnded)
                // A rejected intent stays in AwaitingIntent.
                | (AwaitingIntent, IntentValidated | AwaitingIntent | TurnEnded)
                | (IntentValidated, Enqueued | AwaitingIntent)
                | (Enqueued, Executing)
                | (Executing, ReactionOpen | Resolved)
                | (ReactionOpen, ReactionResolved)
                | (ReactionResolved, Resolved)
                | (Resolved, TurnActive | TurnEnded)
                | (TurnEnded, TurnActive | Idle)
        )
    }

    /// An intent in flight can still be withdrawn.
    pub const fn can_cancel(self) -> bool {
        matches!(self, Phase::AwaitingIntent)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[error("illegal phase transition {from} -> {to}")]
pub struct PhaseError {
    pub from: Phase,
    pub to: Phase,
}

impl CombatError for PhaseError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Internal
    }

    fn error_code(&self) -> &'static str {
        "phase_illegal_transition"
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PhaseMachine {
    phase: Phase,
}

impl PhaseMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn transition(&mut self, to: Phase) -> Result<Phase, PhaseError> {
        if !self.phase.can_move_to(to) {
            return Err(PhaseError { from: self.phase, to });
        }
        self.phase = to;
        Ok(to)
    }

    /// Walks several edges, stopping at the first illegal one.
    pub fn walk(&mut self, path: &[Phase]) -> Result<Phase, PhaseError> {
        for &to in path {
            self.transition(to)?;
        }
        Ok(self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_action_with_reactions() {
        let mut machine = PhaseMachine::new();
        let end = machine
            .walk(&[
                Phase::TurnActive,
                Phase::AwaitingIntent,
                Phase::IntentValidated,
                Phase::Enqueued,
                Phase::Executing,
                Phase::ReactionOpen,
                Phase::ReactionResolved,
                Phase::Resolved,
                Phase::TurnActive,
            ])
            .unwrap();
        assert_eq!(end, Phase::TurnActive);
    }

    #[test]
    fn reservation_failure_returns_to_awaiting_intent() {
        let mut machine = PhaseMachine::new();
        machine
            .walk(&[Phase::TurnActive, Phase::AwaitingIntent, Phase::IntentValidated])
            .unwrap();
        assert_eq!(machine.transition(Phase::AwaitingIntent), Ok(Phase::AwaitingIntent));
    }

    #[test]
    fn cannot_skip_execution() {
        let mut machine = PhaseMachine::new();
        machine
            .walk(&[
                Phase::TurnActive,
                Phase::AwaitingIntent,
                Phase::IntentValidated,
                Phase::Enqueued,
            ])
            .unwrap();
        assert_eq!(
            machine.transition(Phase::Resolved),
            Err(PhaseError {
                from: Phase::Enqueued,
                to: Phase::Resolved,
            })
        );
        assert!(!machine.phase().can_cancel());
    }
}
