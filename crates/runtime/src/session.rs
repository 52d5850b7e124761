//! The battle session: the API callers drive a fight through.
//!
//! A [`BattleSession`] owns the [`BattleState`] and the [`EventBus`] wired
//! with the default pipeline stages. Every call publishes one or more events
//! and returns the [`PublishReport`] of everything that cascaded from them.

use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, info};

use combat_core::engine::WindowId;
use combat_core::{
    ActionCatalog, ActionIntent, CombatantSpec, DiceSource, EntityId, EntityStore, MovementOracle,
    OpenGround, Phase, ReactionChoice, ReactionWindow, Round, SeededDice, VisibilityOracle,
};

use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::events::{Envelope, Event, EventBus, EventHandler, Outbox, PublishReport};
use crate::handlers::{advance, default_handlers};
use crate::state::{BattleOutcome, BattleState};

/// Side length of the default open battlefield.
const DEFAULT_GROUND: i32 = 64;

pub struct BattleSession {
    bus: EventBus<BattleState>,
    state: BattleState,
    started: bool,
}

impl BattleSession {
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    // ===== turn flow =====

    /// Rolls initiative for round 1 and hands out the first turn.
    pub fn start(&mut self) -> Result<PublishReport> {
        if self.started {
            return Err(RuntimeError::AlreadyStarted);
        }
        self.started = true;

        let mut outbox = Outbox::new();
        advance(&mut self.state, &mut outbox)?;
        info!(
            target: "runtime::session",
            combatants = self.state.store.iter().count(),
            "battle started"
        );
        self.publish_all(outbox.into_events())
    }

    /// Asks for the current actor's action menu. The answer is the
    /// `ACTIONS_AVAILABLE` event in the returned report.
    pub fn request_actions(&mut self, actor: EntityId) -> Result<PublishReport> {
        self.ensure_running()?;
        self.publish(Event::RequestActions { actor })
    }

    /// Submits an intent for the current turn. Rejections come back as
    /// `INTENT_REJECTED`, not as an error.
    pub fn submit_intent(&mut self, intent: ActionIntent) -> Result<PublishReport> {
        self.ensure_running()?;
        self.ensure_phase("submit an intent", Phase::AwaitingIntent)?;
        self.publish(Event::IntentSubmitted { intent })
    }

    /// Withdraws an intent that has not been enqueued yet.
    ///
    /// Nothing is reserved before the scheduler accepts an intent, so a
    /// successful cancel has no side effects.
    pub fn cancel_intent(&mut self, actor: EntityId) -> Result<PublishReport> {
        self.ensure_running()?;
        self.ensure_current(actor)?;
        let phase = self.state.phase();
        if !phase.can_cancel() {
            return Err(RuntimeError::CancelTooLate { phase });
        }
        debug!(target: "runtime::session", actor = %actor, "intent cancelled");
        Ok(PublishReport::default())
    }

    pub fn end_turn(&mut self, actor: EntityId) -> Result<PublishReport> {
        self.ensure_running()?;
        self.ensure_current(actor)?;
        self.ensure_phase("end the turn", Phase::AwaitingIntent)?;
        self.publish(Event::EndTurn { actor })
    }

    /// Moves the current actor to a later initiative rank this round.
    pub fn delay(&mut self, actor: EntityId, rank: i32) -> Result<PublishReport> {
        self.ensure_running()?;
        self.ensure_phase("delay", Phase::AwaitingIntent)?;
        self.state.turns.delay(actor, rank, &self.state.store)?;
        self.publish(Event::TurnDelayed { actor, rank })
    }

    /// Gives up the rest of the round for an initiative bonus next round.
    /// Works for the current actor before acting, or for anyone still
    /// waiting for their slot.
    pub fn skip_round(&mut self, actor: EntityId) -> Result<PublishReport> {
        self.ensure_running()?;
        let was_current = self.state.turns.current() == Some(actor);
        if was_current {
            self.ensure_phase("skip the round", Phase::AwaitingIntent)?;
        }
        self.state.turns.skip_round(actor, &self.state.store)?;
        info!(target: "runtime::session", actor = %actor, "round skipped");
        if was_current {
            self.publish(Event::EndTurn { actor })
        } else {
            Ok(PublishReport::default())
        }
    }

    /// Gives up `actor`'s major action this round so their extra reactions
    /// carry no penalty.
    pub fn forgo_major(&mut self, actor: EntityId) -> Result<PublishReport> {
        self.ensure_running()?;
        self.state.turns.forgo_major(actor, &mut self.state.store)?;
        debug!(target: "runtime::session", actor = %actor, "major action forgone");
        Ok(PublishReport::default())
    }

    // ===== reactions =====

    /// Declares a reaction (or a pass) in an open window. Declarations for a
    /// window that has already closed are dropped.
    pub fn declare_reaction(
        &mut self,
        window: WindowId,
        defender: EntityId,
        choice: ReactionChoice,
    ) -> Result<PublishReport> {
        self.ensure_running()?;
        self.publish(Event::ReactionDeclared {
            window,
            defender,
            choice,
        })
    }

    /// Closes a window before every defender has answered. Defenders who
    /// stayed silent are treated as passing.
    pub fn close_reaction_window(&mut self, window: WindowId) -> Result<PublishReport> {
        self.ensure_running()?;
        self.publish(Event::ReactionTimeout { window })
    }

    // ===== observation =====

    /// Mirror of every delivered envelope, for presentation layers.
    pub fn subscribe(&self) -> broadcast::Receiver<Envelope> {
        self.bus.subscribe()
    }

    pub fn state(&self) -> &BattleState {
        &self.state
    }

    pub fn store(&self) -> &EntityStore {
        self.state.store()
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn current_actor(&self) -> Option<EntityId> {
        self.state.turns().current()
    }

    pub fn round(&self) -> Round {
        self.state.turns().round()
    }

    /// The reaction window still waiting for declarations, if any.
    pub fn open_window(&self) -> Option<&ReactionWindow> {
        self.state
            .window()
            .filter(|w| w.state() == combat_core::WindowState::Open)
    }

    pub fn outcome(&self) -> Option<BattleOutcome> {
        self.state.outcome()
    }

    pub fn is_over(&self) -> bool {
        self.state.outcome().is_some()
    }

    /// Tears down the bus and hands back the final state.
    pub fn teardown(self) -> BattleState {
        let Self { bus, state, .. } = self;
        drop(bus);
        info!(
            target: "runtime::session",
            round = state.turns().round().0,
            outcome = ?state.outcome(),
            "session closed"
        );
        state
    }

    // ===== internals =====

    fn publish(&mut self, event: Event) -> Result<PublishReport> {
        Ok(self.bus.publish(event, &mut self.state)?)
    }

    fn publish_all(&mut self, events: Vec<Event>) -> Result<PublishReport> {
        Ok(self.bus.publish_all(events, &mut self.state)?)
    }

    fn ensure_running(&self) -> Result<()> {
        if !self.started {
            return Err(RuntimeError::NotStarted);
        }
        if self.state.outcome().is_some() {
            return Err(RuntimeError::BattleOver);
        }
        Ok(())
    }

    fn ensure_current(&self, actor: EntityId) -> Result<()> {
        let current = self.state.turns().current();
        if current != Some(actor) {
            return Err(RuntimeError::NotCurrentActor { actor, current });
        }
        Ok(())
    }

    fn ensure_phase(&self, operation: &'static str, expected: Phase) -> Result<()> {
        let phase = self.state.phase();
        if phase != expected {
            return Err(RuntimeError::Busy { operation, phase });
        }
        Ok(())
    }
}

/// Builder for [`BattleSession`].
pub struct SessionBuilder {
    config: RuntimeConfig,
    catalog: Option<ActionCatalog>,
    roster: Vec<CombatantSpec>,
    movement: Option<Arc<dyn MovementOracle>>,
    visibility: Option<Arc<dyn VisibilityOracle>>,
    dice: Option<Box<dyn DiceSource>>,
    handlers: Vec<Box<dyn EventHandler<BattleState>>>,
}

impl SessionBuilder {
    fn new() -> Self {
        Self {
            config: RuntimeConfig::default(),
            catalog: None,
            roster: Vec::new(),
            movement: None,
            visibility: None,
            dice: None,
            handlers: Vec::new(),
        }
    }

    /// Override runtime configuration
    pub fn config(mut self, config: RuntimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Defaults to [`ActionCatalog::standard`].
    pub fn catalog(mut self, catalog: ActionCatalog) -> Self {
        self.catalog = Some(catalog);
        self
    }

    pub fn roster(mut self, roster: impl IntoIterator<Item = CombatantSpec>) -> Self {
        self.roster.extend(roster);
        self
    }

    pub fn combatant(mut self, spec: CombatantSpec) -> Self {
        self.roster.push(spec);
        self
    }

    /// Uses one oracle for both movement and sight.
    pub fn terrain<T>(self, terrain: T) -> Self
    where
        T: MovementOracle + VisibilityOracle + 'static,
    {
        let terrain = Arc::new(terrain);
        self.movement(terrain.clone()).visibility(terrain)
    }

    pub fn movement(mut self, oracle: Arc<dyn MovementOracle>) -> Self {
        self.movement = Some(oracle);
        self
    }

    pub fn visibility(mut self, oracle: Arc<dyn VisibilityOracle>) -> Self {
        self.visibility = Some(oracle);
        self
    }

    /// Defaults to [`SeededDice`] with the configured seed.
    pub fn dice(mut self, dice: impl DiceSource + 'static) -> Self {
        self.dice = Some(Box::new(dice));
        self
    }

    /// Registers an extra stage after the default ones.
    pub fn handler(mut self, handler: impl EventHandler<BattleState> + 'static) -> Self {
        self.handlers.push(Box::new(handler));
        self
    }

    pub fn build(self) -> Result<BattleSession> {
        if self.roster.is_empty() {
            return Err(RuntimeError::EmptyRoster);
        }

        let combat = self.config.combat.clone();
        let mut store = EntityStore::new();
        for spec in self.roster {
            store.insert(spec.build(&combat))?;
        }

        let ground = Arc::new(OpenGround::new(DEFAULT_GROUND, DEFAULT_GROUND));
        let movement: Arc<dyn MovementOracle> = match self.movement {
            Some(oracle) => oracle,
            None => ground.clone(),
        };
        let visibility: Arc<dyn VisibilityOracle> = match self.visibility {
            Some(oracle) => oracle,
            None => ground,
        };
        let dice: Box<dyn DiceSource> = match self.dice {
            Some(dice) => dice,
            None => Box::new(SeededDice::new(self.config.seed)),
        };

        let state = BattleState::new(
            store,
            self.catalog.unwrap_or_else(ActionCatalog::standard),
            combat,
            dice,
            movement,
            visibility,
        );

        let mut bus = EventBus::with_limits(self.config.event_buffer_size, self.config.max_cascade);
        for handler in default_handlers().into_iter().chain(self.handlers) {
            bus.register(handler);
        }

        Ok(BattleSession {
            bus,
            state,
            started: false,
        })
    }
}
