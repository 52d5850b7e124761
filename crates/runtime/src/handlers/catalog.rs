use tracing::debug;

use crate::error::RuntimeError;
use crate::events::{Envelope, Event, EventHandler, Outbox, Topic};
use crate::state::BattleState;

/// Answers `REQUEST_ACTIONS` with the actor's menu.
#[derive(Debug, Default)]
pub struct CatalogHandler;

impl EventHandler<BattleState> for CatalogHandler {
    fn name(&self) -> &'static str {
        "catalog"
    }

    fn topics(&self) -> &[Topic] {
        &[Topic::RequestActions]
    }

    fn handle(
        &mut self,
        envelope: &Envelope,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let Event::RequestActions { actor } = &envelope.event else {
            return Ok(());
        };
        let options = state.catalog.options_for(*actor, &state.store, state.env())?;
        debug!(
            target: "runtime::catalog",
            actor = %actor,
            applicable = options.iter().filter(|o| o.applicable).count(),
            "actions listed"
        );
        outbox.push(Event::ActionsAvailable {
            actor: *actor,
            options,
        });
        Ok(())
    }
}
