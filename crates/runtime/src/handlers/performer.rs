//! Execution stage: opens reaction windows and resolves queued actions.

use tracing::{debug, info, warn};

use combat_core::engine::eligible_defenders;
use combat_core::{Declaration, Phase, ReservationId};

use crate::error::RuntimeError;
use crate::events::{Envelope, Event, EventHandler, Outbox, Topic};
use crate::state::BattleState;

/// Runs `PERFORM_ACTION`.
///
/// The first pass for a defendable action opens a reaction window and stops
/// there; the reaction stage republishes the event once the window resolves.
#[derive(Debug, Default)]
pub struct PerformerHandler;

impl PerformerHandler {
    fn perform(
        &self,
        reservation: ReservationId,
        await_reactions: bool,
        reactions_resolved: bool,
        reactions: &[Declaration],
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        if reactions_resolved {
            return self.resolve(reservation, reactions, state, outbox);
        }

        state.phase.transition(Phase::Executing)?;
        if await_reactions {
            let queued = state
                .scheduler
                .get(reservation)
                .ok_or(combat_core::action::ScheduleError::UnknownReservation(reservation))?;
            let attacker = queued.reservation.actor;
            let eligible = eligible_defenders(&state.catalog, &state.store, queued);

            if !eligible.is_empty() {
                state.phase.transition(Phase::ReactionOpen)?;
                let window = state.open_window(reservation, eligible);
                debug!(
                    target: "runtime::performer",
                    window = %window.id(),
                    reservation = %reservation,
                    "reaction window opened"
                );
                outbox.push(Event::ReactionWindowOpened {
                    window: window.id(),
                    pending: window.pending(),
                    attacker,
                    eligible: window.eligible().to_vec(),
                });
                return Ok(());
            }
        }
        self.resolve(reservation, &[], state, outbox)
    }

    fn resolve(
        &self,
        reservation: ReservationId,
        reactions: &[Declaration],
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let queued = state.scheduler.take(reservation)?;
        let resolution = state.perform(&queued, reactions)?;
        state.phase.transition(Phase::Resolved)?;

        for delta in &resolution.damage {
            let (amount, severity) = delta.report.reported();
            let (_, applied) = delta.report.applied();
            outbox.push(Event::DamageApplied {
                target: delta.target,
                source: resolution.actor,
                amount,
                severity,
                applied,
                track: delta.report.track,
            });
        }
        outbox.extend(
            resolution
                .conditions
                .iter()
                .cloned()
                .map(|change| Event::ConditionChanged { change }),
        );

        info!(
            target: "runtime::performer",
            reservation = %reservation,
            actor = %resolution.actor,
            action = %resolution.action,
            outcome = ?resolution.outcome,
            reactions = reactions.len(),
            "action resolved"
        );
        outbox.push(Event::ActionResolved { resolution });
        Ok(())
    }
}

impl EventHandler<BattleState> for PerformerHandler {
    fn name(&self) -> &'static str {
        "performer"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::PerformAction]
    }

    fn handle(
        &mut self,
        envelope: &Envelope,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let Event::PerformAction {
            reservation,
            await_reactions,
            reactions_resolved,
            reactions,
        } = &envelope.event
        else {
            return Ok(());
        };

        let result = self.perform(
            *reservation,
            *await_reactions,
            *reactions_resolved,
            reactions,
            state,
            outbox,
        );
        if let Err(err) = &result
            && matches!(state.phase(), Phase::Executing | Phase::ReactionResolved)
        {
            // The actor gets the turn back; whatever was reserved stays spent.
            state
                .phase
                .walk(&[Phase::Resolved, Phase::TurnActive, Phase::AwaitingIntent])?;
            warn!(
                target: "runtime::performer",
                reservation = %reservation,
                error = %err,
                "action aborted"
            );
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use combat_core::{ActionCatalog, CombatConfig, EntityStore, FixedDice, OpenGround};

    use super::*;

    fn state_in(path: &[Phase]) -> BattleState {
        let ground = Arc::new(OpenGround::new(8, 8));
        let mut state = BattleState::new(
            EntityStore::new(),
            ActionCatalog::standard(),
            CombatConfig::default(),
            Box::new(FixedDice::default()),
            ground.clone(),
            ground,
        );
        state.phase.walk(path).unwrap();
        state
    }

    fn perform(reservation: u64, await_reactions: bool, reactions_resolved: bool) -> Envelope {
        let event = Event::PerformAction {
            reservation: ReservationId(reservation),
            await_reactions,
            reactions_resolved,
            reactions: Vec::new(),
        };
        Envelope {
            sequence: 0,
            topic: event.topic(),
            event,
        }
    }

    const TO_ENQUEUED: [Phase; 4] = [
        Phase::TurnActive,
        Phase::AwaitingIntent,
        Phase::IntentValidated,
        Phase::Enqueued,
    ];

    #[test]
    fn failed_resolution_hands_the_turn_back() {
        let mut state = state_in(&TO_ENQUEUED);
        let mut outbox = Outbox::new();

        let result = PerformerHandler.handle(&perform(42, false, false), &mut state, &mut outbox);

        assert!(result.is_err());
        assert_eq!(state.phase(), Phase::AwaitingIntent);
    }

    #[test]
    fn failure_after_reactions_hands_the_turn_back() {
        let mut path = TO_ENQUEUED.to_vec();
        path.extend([Phase::Executing, Phase::ReactionOpen, Phase::ReactionResolved]);
        let mut state = state_in(&path);
        let mut outbox = Outbox::new();

        let result = PerformerHandler.handle(&perform(7, true, true), &mut state, &mut outbox);

        assert!(result.is_err());
        assert_eq!(state.phase(), Phase::AwaitingIntent);
        assert!(outbox.is_empty());
    }

    #[test]
    fn unknown_reservation_while_awaiting_reactions_hands_the_turn_back() {
        let mut state = state_in(&TO_ENQUEUED);
        let mut outbox = Outbox::new();

        let result = PerformerHandler.handle(&perform(3, true, false), &mut state, &mut outbox);

        assert!(result.is_err());
        assert_eq!(state.phase(), Phase::AwaitingIntent);
    }
}
