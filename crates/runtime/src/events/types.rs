//! Fixed per-topic event payloads.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use combat_core::action::ActionOption;
use combat_core::engine::{Declaration, EligibleDefender, InitiativeEntry, ReactionChoice, WindowId};
use combat_core::state::TrackOutcome;
use combat_core::{
    ActionIntent, ActionResolution, ConditionChange, EntityId, InvalidIntent, Reservation,
    ReservationId, Round, Severity, ValidatedIntent,
};

use super::Topic;
use crate::error::PublishError;

/// One bus event. Each variant is the schema of its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "topic", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Event {
    RoundStarted {
        round: Round,
        order: Vec<InitiativeEntry>,
    },
    BeginTurn {
        actor: EntityId,
        round: Round,
    },
    TurnDelayed {
        actor: EntityId,
        rank: i32,
    },
    EndTurn {
        actor: EntityId,
    },

    RequestActions {
        actor: EntityId,
    },
    ActionsAvailable {
        actor: EntityId,
        options: Vec<ActionOption>,
    },
    IntentSubmitted {
        intent: ActionIntent,
    },
    /// The scheduler reserves the cost on receipt and reports the
    /// reservation in `ACTION_ENQUEUED`.
    IntentValidated {
        intent: ValidatedIntent,
    },
    IntentRejected {
        intent: ActionIntent,
        reason: InvalidIntent,
    },
    ActionEnqueued {
        reservation: Reservation,
        position: usize,
    },
    /// Published once with `await_reactions`, and again with
    /// `reactions_resolved` once a reaction window has closed.
    PerformAction {
        reservation: ReservationId,
        await_reactions: bool,
        reactions_resolved: bool,
        reactions: Vec<Declaration>,
    },

    ReactionWindowOpened {
        window: WindowId,
        pending: ReservationId,
        attacker: EntityId,
        eligible: Vec<EligibleDefender>,
    },
    ReactionDeclared {
        window: WindowId,
        defender: EntityId,
        choice: ReactionChoice,
    },
    ReactionTimeout {
        window: WindowId,
    },
    /// Declarations in resolution order.
    ReactionResolved {
        window: WindowId,
        pending: ReservationId,
        reactions: Vec<Declaration>,
    },

    ActionResolved {
        resolution: ActionResolution,
    },
    /// `amount` and `severity` are the reported figures; `applied` is the
    /// severity that reached the track.
    DamageApplied {
        target: EntityId,
        source: EntityId,
        amount: u32,
        severity: Severity,
        applied: Severity,
        track: TrackOutcome,
    },
    ConditionChanged {
        change: ConditionChange,
    },
}

impl Event {
    pub fn topic(&self) -> Topic {
        match self {
            Event::RoundStarted { .. } => Topic::RoundStarted,
            Event::BeginTurn { .. } => Topic::BeginTurn,
            Event::TurnDelayed { .. } => Topic::TurnDelayed,
            Event::EndTurn { .. } => Topic::EndTurn,
            Event::RequestActions { .. } => Topic::RequestActions,
            Event::ActionsAvailable { .. } => Topic::ActionsAvailable,
            Event::IntentSubmitted { .. } => Topic::IntentSubmitted,
            Event::IntentValidated { .. } => Topic::IntentValidated,
            Event::IntentRejected { .. } => Topic::IntentRejected,
            Event::ActionEnqueued { .. } => Topic::ActionEnqueued,
            Event::PerformAction { .. } => Topic::PerformAction,
            Event::ReactionWindowOpened { .. } => Topic::ReactionWindowOpened,
            Event::ReactionDeclared { .. } => Topic::ReactionDeclared,
            Event::ReactionTimeout { .. } => Topic::ReactionTimeout,
            Event::ReactionResolved { .. } => Topic::ReactionResolved,
            Event::ActionResolved { .. } => Topic::ActionResolved,
            Event::DamageApplied { .. } => Topic::DamageApplied,
            Event::ConditionChanged { .. } => Topic::ConditionChanged,
        }
    }

    /// Checks the payload against its topic's schema. Run by the bus on
    /// every event before any handler sees it.
    pub fn validate(&self) -> Result<(), PublishError> {
        let topic = self.topic();
        let reject = |reason: &'static str| Err(PublishError::InvalidPayload { topic, reason });

        match self {
            Event::RoundStarted { round, order } => {
                if *round == Round::ZERO {
                    return reject("round numbers start at 1");
                }
                if order.is_empty() {
                    return reject("initiative order is empty");
                }
                if !unique(order.iter().map(|e| e.actor)) {
                    return reject("combatant listed twice in initiative order");
                }
            }
            Event::BeginTurn { actor, round } => {
                if actor.is_system() {
                    return reject("system id cannot take a turn");
                }
                if *round == Round::ZERO {
                    return reject("turn outside a round");
                }
            }
            Event::TurnDelayed { actor, .. }
            | Event::EndTurn { actor }
            | Event::RequestActions { actor }
            | Event::ActionsAvailable { actor, .. } => {
                if actor.is_system() {
                    return reject("system id is not a combatant");
                }
                if let Event::ActionsAvailable { options, .. } = self
                    && !unique(options.iter().map(|o| o.action.clone()))
                {
                    return reject("action offered twice");
                }
            }
            Event::IntentSubmitted { intent } | Event::IntentRejected { intent, .. } => {
                if intent.actor.is_system() {
                    return reject("system id cannot submit intents");
                }
            }
            Event::IntentValidated { intent } => {
                if intent.actor().is_system() {
                    return reject("system id cannot submit intents");
                }
            }
            Event::ActionEnqueued { reservation, .. } => {
                if reservation.actor.is_system() {
                    return reject("system id cannot hold reservations");
                }
            }
            Event::PerformAction {
                await_reactions,
                reactions_resolved,
                reactions,
                ..
            } => {
                if *await_reactions && *reactions_resolved {
                    return reject("await_reactions and reactions_resolved are exclusive");
                }
                if !*reactions_resolved && !reactions.is_empty() {
                    return reject("reactions attached before the window resolved");
                }
                if !unique(reactions.iter().map(|d| d.defender)) {
                    return reject("defender declared twice");
                }
            }
            Event::ReactionWindowOpened { eligible, .. } => {
                if eligible.is_empty() {
                    return reject("window opened with no eligible defender");
                }
                if !unique(eligible.iter().map(|e| e.defender)) {
                    return reject("defender listed twice");
                }
            }
            Event::ReactionDeclared { defender, .. } => {
                if defender.is_system() {
                    return reject("system id cannot react");
                }
            }
            Event::ReactionResolved { reactions, .. } => {
                if !unique(reactions.iter().map(|d| d.defender)) {
                    return reject("defender declared twice");
                }
            }
            Event::DamageApplied { severity, applied, .. } => {
                if applied > severity {
                    return reject("applied severity exceeds reported severity");
                }
            }
            Event::ReactionTimeout { .. }
            | Event::ActionResolved { .. }
            | Event::ConditionChanged { .. } => {}
        }
        Ok(())
    }

    /// Combatant the event is about, when there is one.
    pub fn actor(&self) -> Option<EntityId> {
        match self {
            Event::BeginTurn { actor, .. }
            | Event::TurnDelayed { actor, .. }
            | Event::EndTurn { actor }
            | Event::RequestActions { actor }
            | Event::ActionsAvailable { actor, .. } => Some(*actor),
            Event::IntentSubmitted { intent } | Event::IntentRejected { intent, .. } => {
                Some(intent.actor)
            }
            Event::IntentValidated { intent } => Some(intent.actor()),
            Event::ActionEnqueued { reservation, .. } => Some(reservation.actor),
            Event::ReactionWindowOpened { attacker, .. } => Some(*attacker),
            Event::ReactionDeclared { defender, .. } => Some(*defender),
            Event::ActionResolved { resolution } => Some(resolution.actor),
            Event::DamageApplied { target, .. } => Some(*target),
            Event::ConditionChanged { change } => Some(change.entity),
            Event::RoundStarted { .. }
            | Event::PerformAction { .. }
            | Event::ReactionTimeout { .. }
            | Event::ReactionResolved { .. } => None,
        }
    }
}

/// An event as delivered: stamped with its position in the session's
/// publish order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub sequence: u64,
    pub topic: Topic,
    pub event: Event,
}

fn unique<T: Ord>(items: impl IntoIterator<Item = T>) -> bool {
    let mut seen = BTreeSet::new();
    items.into_iter().all(|item| seen.insert(item))
}
