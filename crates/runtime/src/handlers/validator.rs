use tracing::{debug, info};

use combat_core::Phase;
use combat_core::action::validate_intent;

use crate::error::RuntimeError;
use crate::events::{Envelope, Event, EventHandler, Outbox, Topic};
use crate::state::BattleState;

/// Checks submitted intents against the store, the catalog and the oracles.
///
/// A rejection leaves the turn waiting for another intent; nothing is
/// reserved.
#[derive(Debug, Default)]
pub struct ValidatorHandler;

impl EventHandler<BattleState> for ValidatorHandler {
    fn name(&self) -> &'static str {
        "validator"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::IntentSubmitted]
    }

    fn handle(
        &mut self,
        envelope: &Envelope,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let Event::IntentSubmitted { intent } = &envelope.event else {
            return Ok(());
        };
        let phase = state.phase();
        if phase != Phase::AwaitingIntent {
            return Err(RuntimeError::Busy {
                operation: "validate an intent",
                phase,
            });
        }

        match validate_intent(intent.clone(), &state.validation_context()) {
            Ok(validated) => {
                state.phase.transition(Phase::IntentValidated)?;
                debug!(
                    target: "runtime::validator",
                    actor = %intent.actor,
                    action = %intent.action,
                    "intent accepted"
                );
                outbox.push(Event::IntentValidated { intent: validated });
            }
            Err(reason) => {
                state.phase.transition(Phase::AwaitingIntent)?;
                info!(
                    target: "runtime::validator",
                    actor = %intent.actor,
                    action = %intent.action,
                    %reason,
                    "intent rejected"
                );
                outbox.push(Event::IntentRejected {
                    intent: intent.clone(),
                    reason,
                });
            }
        }
        Ok(())
    }
}
