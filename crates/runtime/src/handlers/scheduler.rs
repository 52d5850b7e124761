use tracing::{debug, info};

use combat_core::Phase;
use combat_core::action::ScheduleError;

use crate::error::RuntimeError;
use crate::events::{Envelope, Event, EventHandler, Outbox, Topic};
use crate::state::BattleState;

/// Reserves the cost of validated intents and queues them for execution.
#[derive(Debug, Default)]
pub struct SchedulerHandler;

impl EventHandler<BattleState> for SchedulerHandler {
    fn name(&self) -> &'static str {
        "scheduler"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::IntentValidated]
    }

    fn handle(
        &mut self,
        envelope: &Envelope,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let Event::IntentValidated { intent } = &envelope.event else {
            return Ok(());
        };

        // The store may have moved on since validation: re-checked here.
        match state.scheduler.reserve(intent.clone(), &mut state.store) {
            Ok(enqueued) => {
                state.phase.transition(Phase::Enqueued)?;
                let await_reactions = state
                    .catalog
                    .get(intent.action())
                    .is_some_and(|def| def.is_defendable());
                debug!(
                    target: "runtime::scheduler",
                    reservation = %enqueued.reservation.id,
                    position = enqueued.position,
                    "action enqueued"
                );
                outbox.push(Event::ActionEnqueued {
                    reservation: enqueued.reservation,
                    position: enqueued.position,
                });
                outbox.push(Event::PerformAction {
                    reservation: enqueued.reservation.id,
                    await_reactions,
                    reactions_resolved: false,
                    reactions: Vec::new(),
                });
                Ok(())
            }
            Err(ScheduleError::Rejected(reason)) => {
                state.phase.transition(Phase::AwaitingIntent)?;
                info!(
                    target: "runtime::scheduler",
                    actor = %intent.actor(),
                    %reason,
                    "reservation refused"
                );
                outbox.push(Event::IntentRejected {
                    intent: intent.intent().clone(),
                    reason,
                });
                Ok(())
            }
            Err(err) => Err(err.into()),
        }
    }
}
