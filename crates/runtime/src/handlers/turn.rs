//! Turn sequencing on the bus.

use tracing::{debug, info};

use combat_core::{EntityId, Phase, Severity};

use crate::error::RuntimeError;
use crate::events::{Envelope, Event, EventHandler, Outbox, Topic};
use crate::state::BattleState;

/// Starts and ends turns, and rolls new rounds when the order runs out.
///
/// Also closes the turn loop after each resolved action: the actor gets
/// another intent unless they are out of slots, destroyed, or the battle is
/// over.
#[derive(Debug, Default)]
pub struct TurnHandler;

impl TurnHandler {
    const TOPICS: &'static [Topic] = &[
        Topic::BeginTurn,
        Topic::EndTurn,
        Topic::TurnDelayed,
        Topic::ActionResolved,
    ];

    fn begin_turn(
        &self,
        actor: EntityId,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        state.phase.transition(Phase::TurnActive)?;
        let start = state.turns.begin_turn(&mut state.store)?;

        if let Some((amount, track)) = start.poison {
            outbox.push(Event::DamageApplied {
                target: actor,
                source: EntityId::SYSTEM,
                amount,
                severity: Severity::Superficial,
                applied: Severity::Superficial,
                track,
            });
        }

        if start.can_act() {
            state.phase.transition(Phase::AwaitingIntent)?;
            info!(
                target: "runtime::turn",
                actor = %actor,
                round = state.turns.round().0,
                "turn started"
            );
        } else {
            info!(
                target: "runtime::turn",
                actor = %actor,
                stunned = start.stunned,
                "turn lost"
            );
            outbox.push(Event::EndTurn { actor });
        }
        Ok(())
    }

    fn end_turn(
        &self,
        actor: EntityId,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        match state.turns.current() {
            Some(current) if current != actor => {
                return Err(RuntimeError::NotCurrentActor {
                    actor,
                    current: Some(current),
                });
            }
            Some(_) => {
                close_turn_phase(state)?;
                state.turns.end_turn(actor, &mut state.store)?;
            }
            // Delayed or skipped: the sequencer already let go of the actor.
            None => close_turn_phase(state)?,
        }
        debug!(target: "runtime::turn", actor = %actor, "turn ended");
        advance(state, outbox)
    }

    fn after_action(
        &self,
        actor: EntityId,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        state.phase.transition(Phase::TurnActive)?;

        if let Some(outcome) = state.settle() {
            if state.turns.current() == Some(actor) {
                state.turns.end_turn(actor, &mut state.store)?;
            }
            state.phase.walk(&[Phase::TurnEnded, Phase::Idle])?;
            info!(
                target: "runtime::turn",
                winner = ?outcome.winner,
                round = outcome.round.0,
                "battle over"
            );
            return Ok(());
        }

        let spent = state
            .store
            .get(actor)
            .is_none_or(|c| c.is_destroyed() || c.budget.is_spent());
        if spent {
            outbox.push(Event::EndTurn { actor });
        } else {
            state.phase.transition(Phase::AwaitingIntent)?;
        }
        Ok(())
    }
}

impl EventHandler<BattleState> for TurnHandler {
    fn name(&self) -> &'static str {
        "turn"
    }

    fn topics(&self) -> &[Topic] {
        Self::TOPICS
    }

    fn handle(
        &mut self,
        envelope: &Envelope,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        match &envelope.event {
            Event::BeginTurn { actor, .. } => self.begin_turn(*actor, state, outbox),
            Event::EndTurn { actor } => self.end_turn(*actor, state, outbox),
            Event::TurnDelayed { actor, rank } => {
                debug!(target: "runtime::turn", actor = %actor, rank, "turn delayed");
                close_turn_phase(state)?;
                advance(state, outbox)
            }
            Event::ActionResolved { resolution } => {
                self.after_action(resolution.actor, state, outbox)
            }
            _ => Ok(()),
        }
    }
}

fn close_turn_phase(state: &mut BattleState) -> Result<(), RuntimeError> {
    if state.phase.phase() != Phase::TurnEnded {
        state.phase.transition(Phase::TurnEnded)?;
    }
    Ok(())
}

/// Hands the turn to the next combatant, rolling a new round when the current
/// order is exhausted. Does nothing once the battle is settled.
pub(crate) fn advance(state: &mut BattleState, outbox: &mut Outbox) -> Result<(), RuntimeError> {
    if let Some(outcome) = state.settle() {
        if state.phase.phase() == Phase::TurnEnded {
            state.phase.transition(Phase::Idle)?;
        }
        debug!(target: "runtime::turn", winner = ?outcome.winner, "no turn to hand out");
        return Ok(());
    }

    // A fresh round always has someone to hand the turn to, so two passes
    // are enough.
    for _ in 0..2 {
        if let Some(actor) = state.turns.next_turn(&state.store) {
            outbox.push(Event::BeginTurn {
                actor,
                round: state.turns.round(),
            });
            return Ok(());
        }

        let start = state.start_round()?;
        info!(
            target: "runtime::turn",
            round = start.round.0,
            order = ?start.order.iter().map(|e| e.actor).collect::<Vec<_>>(),
            "round started"
        );
        outbox.extend(
            start
                .expired
                .into_iter()
                .map(|change| Event::ConditionChanged { change }),
        );
        outbox.push(Event::RoundStarted {
            round: start.round,
            order: start.order,
        });
    }
    Err(combat_core::engine::TurnError::NoCombatants.into())
}
