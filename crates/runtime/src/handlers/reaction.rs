//! Reaction windows on the bus.

use tracing::{debug, warn};

use combat_core::engine::{ReactionError, WindowId, WindowState};
use combat_core::{EntityId, Phase, ReactionChoice, ReactionWindow};

use crate::error::RuntimeError;
use crate::events::{Envelope, Event, EventHandler, Outbox, Topic};
use crate::state::BattleState;

/// Collects declarations for the open window and closes it when every
/// eligible defender has answered or the window times out.
///
/// Declarations and timeouts addressed to a window that is no longer open are
/// dropped with a warning.
#[derive(Debug, Default)]
pub struct ReactionHandler;

impl ReactionHandler {
    const TOPICS: &'static [Topic] = &[
        Topic::ReactionDeclared,
        Topic::ReactionTimeout,
        Topic::ReactionResolved,
    ];

    fn declare(
        &self,
        window: WindowId,
        defender: EntityId,
        choice: &ReactionChoice,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let Some(open) = open_window(&mut state.window, window) else {
            warn!(target: "runtime::reaction", %window, %defender, "stale declaration dropped");
            return Ok(());
        };

        let mut tally = state
            .store
            .get(defender)
            .map(|c| c.reactions)
            .unwrap_or_default();
        match open.declare(defender, choice.clone(), &mut tally) {
            Ok(declaration) => {
                debug!(
                    target: "runtime::reaction",
                    %window,
                    %defender,
                    penalty = declaration.penalty,
                    "reaction declared"
                );
            }
            Err(err @ ReactionError::Stale { .. }) => {
                warn!(
                    target: "runtime::reaction",
                    %window,
                    %defender,
                    error = %err,
                    "stale declaration dropped"
                );
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        }
        if let Some(combatant) = state.store.get_mut(defender) {
            combatant.reactions = tally;
        }

        if open.is_ready() {
            let reactions = open.begin_resolving()?;
            outbox.push(Event::ReactionResolved {
                window,
                pending: open.pending(),
                reactions,
            });
        }
        Ok(())
    }

    fn timeout(
        &self,
        window: WindowId,
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let Some(open) = open_window(&mut state.window, window) else {
            warn!(target: "runtime::reaction", %window, "stale timeout dropped");
            return Ok(());
        };
        let reactions = open.begin_resolving()?;
        debug!(
            target: "runtime::reaction",
            %window,
            declared = reactions.len(),
            "reaction window timed out"
        );
        outbox.push(Event::ReactionResolved {
            window,
            pending: open.pending(),
            reactions,
        });
        Ok(())
    }

    fn resolved(
        &self,
        window: WindowId,
        reactions: &[combat_core::Declaration],
        state: &mut BattleState,
        outbox: &mut Outbox,
    ) -> Result<(), RuntimeError> {
        let current = state
            .window
            .as_mut()
            .filter(|w| w.id() == window && w.state() == WindowState::Resolving)
            .ok_or(RuntimeError::NoOpenWindow { window })?;
        current.close()?;
        let pending = current.pending();
        state.phase.transition(Phase::ReactionResolved)?;

        outbox.push(Event::PerformAction {
            reservation: pending,
            await_reactions: false,
            reactions_resolved: true,
            reactions: reactions.to_vec(),
        });
        Ok(())
    }
}

impl EventHandler<BattleState> for ReactionHandler {
    fn name(&self) -> &'static str {
        "reaction"
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
            Event::ReactionDeclared {
                window,
                defender,
                choice,
            } => self.declare(*window, *defender, choice, state, outbox),
            Event::ReactionTimeout { window } => self.timeout(*window, state, outbox),
            Event::ReactionResolved { window, reactions, .. } => {
                self.resolved(*window, reactions, state, outbox)
            }
            _ => Ok(()),
        }
    }
}

/// The window with `id`, if it is still taking declarations.
fn open_window(slot: &mut Option<ReactionWindow>, id: WindowId) -> Option<&mut ReactionWindow> {
    slot.as_mut()
        .filter(|w| w.id() == id && w.state() == WindowState::Open)
}
