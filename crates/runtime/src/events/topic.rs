//! Bus topics.

use serde::{Deserialize, Serialize};

/// Topics for event routing.
///
/// Every [`Event`](super::Event) belongs to exactly one topic and handlers
/// subscribe by topic.
#[derive(
    Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize,
    strum::Display,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum Topic {
    // ===== turn flow =====
    RoundStarted,
    BeginTurn,
    TurnDelayed,
    EndTurn,

    // ===== intent pipeline =====
    RequestActions,
    ActionsAvailable,
    IntentSubmitted,
    IntentValidated,
    IntentRejected,
    ActionEnqueued,
    PerformAction,

    // ===== reactions =====
    ReactionWindowOpened,
    ReactionDeclared,
    /// External signal that closes an open window early.
    ReactionTimeout,
    ReactionResolved,

    // ===== results =====
    ActionResolved,
    DamageApplied,
    ConditionChanged,
}

impl Topic {
    pub const ALL: [Topic; 18] = [
        Topic::RoundStarted,
        Topic::BeginTurn,
        Topic::TurnDelayed,
        Topic::EndTurn,
        Topic::RequestActions,
        Topic::ActionsAvailable,
        Topic::IntentSubmitted,
        Topic::IntentValidated,
        Topic::IntentRejected,
        Topic::ActionEnqueued,
        Topic::PerformAction,
        Topic::ReactionWindowOpened,
        Topic::ReactionDeclared,
        Topic::ReactionTimeout,
        Topic::ReactionResolved,
        Topic::ActionResolved,
        Topic::DamageApplied,
        Topic::ConditionChanged,
    ];
}
