use std::fmt;

use crate::state::{ActionSlot, EntityId, Position};

/// Catalog key of an action, e.g. `attack_melee`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct ActionId(pub String);

impl ActionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ActionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    SelfTarget,
    Entity(EntityId),
    Tile(Position),
}

/// Resources an action consumes when it is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionCost {
    pub slot: ActionSlot,
    #[cfg_attr(feature = "serde", serde(default))]
    pub willpower: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ammunition: u32,
}

impl ActionCost {
    pub const fn slot(slot: ActionSlot) -> Self {
        Self {
            slot,
            willpower: 0,
            ammunition: 0,
        }
    }

    #[must_use]
    pub const fn with_willpower(mut self, willpower: u32) -> Self {
        self.willpower = willpower;
        self
    }

    #[must_use]
    pub const fn with_ammunition(mut self, ammunition: u32) -> Self {
        self.ammunition = ammunition;
        self
    }
}

/// A controller's request to act. Human, AI and replay controllers all
/// submit the same shape.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionIntent {
    pub actor: EntityId,
    pub action: ActionId,
    pub target: Option<Target>,
    /// Cost the controller believes the action has; must match the catalog.
    pub cost: ActionCost,
}

impl ActionIntent {
    pub fn new(actor: EntityId, action: impl Into<ActionId>, cost: ActionCost) -> Self {
        Self {
            actor,
            action: action.into(),
            target: None,
            cost,
        }
    }

    #[must_use]
    pub fn at(mut self, target: Target) -> Self {
        self.target = Some(target);
        self
    }

    pub fn target_entity(&self) -> Option<EntityId> {
        match self.target {
            Some(Target::Entity(id)) => Some(id),
            _ => None,
        }
    }

    pub fn target_tile(&self) -> Option<Position> {
        match self.target {
            Some(Target::Tile(position)) => Some(position),
            _ => None,
        }
    }
}

/// An intent that passed validation. It can only be read from here on.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValidatedIntent(ActionIntent);

impl ValidatedIntent {
    pub(crate) fn new(intent: ActionIntent) -> Self {
        Self(intent)
    }

    pub fn intent(&self) -> &ActionIntent {
        &self.0
    }

    pub fn actor(&self) -> EntityId {
        self.0.actor
    }

    pub fn action(&self) -> &ActionId {
        &self.0.action
    }
}
