//! Mutable state of one battle, shared by every bus handler.

use std::sync::Arc;

use combat_core::action::{PerformContext, PerformError, ValidationContext, perform};
use combat_core::engine::{EligibleDefender, RoundStart, TurnError};
use combat_core::{
    ActionCatalog, ActionResolution, ActionScheduler, CombatConfig, Declaration, DiceSource,
    EntityStore, Env, MovementOracle, Phase, PhaseMachine, QueuedAction, ReactionWindow,
    ReservationId, Round, TeamId, TurnSequencer, VisibilityOracle, WindowId,
};
use serde::{Deserialize, Serialize};

/// How the battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleOutcome {
    /// `None` when nobody is left standing.
    pub winner: Option<TeamId>,
    pub round: Round,
}

/// The canonical store plus the turn, queue and window machinery around it.
///
/// Handlers mutate this through the bus; callers read it through the
/// accessors.
pub struct BattleState {
    pub(crate) store: EntityStore,
    pub(crate) catalog: ActionCatalog,
    pub(crate) config: CombatConfig,
    pub(crate) phase: PhaseMachine,
    pub(crate) turns: TurnSequencer,
    pub(crate) scheduler: ActionScheduler,
    pub(crate) window: Option<ReactionWindow>,
    next_window: u64,
    dice: Box<dyn DiceSource>,
    movement: Arc<dyn MovementOracle>,
    visibility: Arc<dyn VisibilityOracle>,
    pub(crate) outcome: Option<BattleOutcome>,
}

impl BattleState {
    pub(crate) fn new(
        store: EntityStore,
        catalog: ActionCatalog,
        config: CombatConfig,
        dice: Box<dyn DiceSource>,
        movement: Arc<dyn MovementOracle>,
        visibility: Arc<dyn VisibilityOracle>,
    ) -> Self {
        Self {
            store,
            catalog,
            config,
            phase: PhaseMachine::new(),
            turns: TurnSequencer::new(),
            scheduler: ActionScheduler::new(),
            window: None,
            next_window: 1,
            dice,
            movement,
            visibility,
            outcome: None,
        }
    }

    // ===== read access =====

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn catalog(&self) -> &ActionCatalog {
        &self.catalog
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase.phase()
    }

    pub fn turns(&self) -> &TurnSequencer {
        &self.turns
    }

    pub fn scheduler(&self) -> &ActionScheduler {
        &self.scheduler
    }

    /// The most recent reaction window, open or not.
    pub fn window(&self) -> Option<&ReactionWindow> {
        self.window.as_ref()
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.outcome
    }

    pub fn env(&self) -> Env<'_> {
        Env::new(self.movement.as_ref(), self.visibility.as_ref())
    }

    pub fn validation_context(&self) -> ValidationContext<'_> {
        ValidationContext {
            store: &self.store,
            catalog: &self.catalog,
            env: self.env(),
            current_actor: self.turns.current(),
        }
    }

    // ===== crate-internal mutation =====

    pub(crate) fn start_round(&mut self) -> Result<RoundStart, TurnError> {
        self.turns
            .start_round(&mut self.store, self.dice.as_mut(), &self.config)
    }

    pub(crate) fn open_window(
        &mut self,
        pending: ReservationId,
        eligible: Vec<EligibleDefender>,
    ) -> &ReactionWindow {
        let id = WindowId(self.next_window);
        self.next_window += 1;
        self.window.insert(ReactionWindow::open(
            id,
            pending,
            eligible,
            self.config.max_reaction_declarations,
        ))
    }

    pub(crate) fn perform(
        &mut self,
        queued: &QueuedAction,
        reactions: &[Declaration],
    ) -> Result<ActionResolution, PerformError> {
        let mut ctx = PerformContext {
            store: &mut self.store,
            catalog: &self.catalog,
            env: Env::new(self.movement.as_ref(), self.visibility.as_ref()),
            config: &self.config,
            dice: self.dice.as_mut(),
            round: self.turns.round(),
        };
        perform(&mut ctx, queued, reactions)
    }

    /// Records the outcome once at most one team is left standing.
    pub(crate) fn settle(&mut self) -> Option<BattleOutcome> {
        if self.outcome.is_none() {
            let standing = self.store.teams_standing();
            if standing.len() <= 1 {
                self.outcome = Some(BattleOutcome {
                    winner: standing.into_iter().next(),
                    round: self.turns.round(),
                });
            }
        }
        self.outcome
    }
}
