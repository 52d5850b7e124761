//! Action catalog: what can be done, and what can be done right now.

use std::collections::BTreeSet;

use super::{ActionCost, ActionId, Target};
use crate::combat::Severity;
use crate::conditions::{ConditionSpec, Duration, ModifierKind, StatusKind};
use crate::env::Env;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{ActionSlot, Combatant, EntityId, EntityStore, StoreError};

pub const MOVE: &str = "move";
pub const SPRINT: &str = "sprint";
pub const ATTACK_MELEE: &str = "attack_melee";
pub const ATTACK_RANGED: &str = "attack_ranged";
pub const FOCUS: &str = "focus";
pub const DODGE: &str = "dodge";
pub const PARRY: &str = "parry";
pub const ABSORB: &str = "absorb";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Targeting {
    None,
    SelfOnly,
    Entity,
    Tile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum AttackStyle {
    Melee,
    Ranged,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DefenseKind {
    /// Opposed against any attack.
    Dodge,
    /// Opposed against close attacks.
    Parry,
    /// Soaks close attacks; successes come off the damage.
    Absorb,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionEffect {
    Move,
    Sprint,
    Attack(AttackStyle),
    Defense(DefenseKind),
    Condition(ConditionSpec),
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionDef {
    pub id: ActionId,
    pub label: String,
    pub cost: ActionCost,
    pub targeting: Targeting,
    pub effect: ActionEffect,
}

impl ActionDef {
    /// Attacks open a reaction window before they resolve.
    pub fn is_defendable(&self) -> bool {
        matches!(self.effect, ActionEffect::Attack(_))
    }

    pub fn is_reaction(&self) -> bool {
        self.cost.slot == ActionSlot::Reaction
    }

    pub fn needs_target(&self) -> bool {
        matches!(self.targeting, Targeting::Entity | Targeting::Tile)
    }

    pub fn attack_style(&self) -> Option<AttackStyle> {
        match self.effect {
            ActionEffect::Attack(style) => Some(style),
            _ => None,
        }
    }

    pub fn defense_kind(&self) -> Option<DefenseKind> {
        match self.effect {
            ActionEffect::Defense(kind) => Some(kind),
            _ => None,
        }
    }
}

/// One entry of an actor's action menu.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionOption {
    pub action: ActionId,
    pub needs_target: bool,
    pub cost: ActionCost,
    /// Whether the action can be taken right now.
    pub applicable: bool,
    /// Entity targets currently in reach. Tiles are not enumerated.
    pub targets: Vec<Target>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CatalogError {
    #[error("action {0} defined twice")]
    DuplicateAction(ActionId),

    #[error("catalog is empty")]
    Empty,
}

impl CombatError for CatalogError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateAction(_) => "catalog_duplicate_action",
            Self::Empty => "catalog_empty",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionCatalog {
    defs: Vec<ActionDef>,
}

impl ActionCatalog {
    pub fn from_defs(defs: Vec<ActionDef>) -> Result<Self, CatalogError> {
        if defs.is_empty() {
            return Err(CatalogError::Empty);
        }
        let mut seen = BTreeSet::new();
        for def in &defs {
            if !seen.insert(def.id.clone()) {
                return Err(CatalogError::DuplicateAction(def.id.clone()));
            }
        }
        Ok(Self { defs })
    }

    /// Built-in catalog: moves, attacks, focus and the three defenses.
    pub fn standard() -> Self {
        let def = |id: &str, label: &str, cost, targeting, effect| ActionDef {
            id: ActionId::from(id),
            label: label.to_owned(),
            cost,
            targeting,
            effect,
        };
        Self {
            defs: vec![
                def(
                    MOVE,
                    "Move",
                    ActionCost::slot(ActionSlot::FreeMove),
                    Targeting::Tile,
                    ActionEffect::Move,
                ),
                def(
                    SPRINT,
                    "Sprint",
                    ActionCost::slot(ActionSlot::Sprint),
                    Targeting::Tile,
                    ActionEffect::Sprint,
                ),
                def(
                    ATTACK_MELEE,
                    "Melee attack",
                    ActionCost::slot(ActionSlot::Major),
                    Targeting::Entity,
                    ActionEffect::Attack(AttackStyle::Melee),
                ),
                def(
                    ATTACK_RANGED,
                    "Ranged attack",
                    ActionCost::slot(ActionSlot::Major).with_ammunition(1),
                    Targeting::Entity,
                    ActionEffect::Attack(AttackStyle::Ranged),
                ),
                def(
                    FOCUS,
                    "Focus",
                    ActionCost::slot(ActionSlot::Minor).with_willpower(1),
                    Targeting::SelfOnly,
                    ActionEffect::Condition(ConditionSpec::modifier(
                        "Focused",
                        ModifierKind::AttackPool,
                        1,
                        Duration::Rounds(1),
                    )),
                ),
                def(
                    DODGE,
                    "Dodge",
                    ActionCost::slot(ActionSlot::Reaction),
                    Targeting::None,
                    ActionEffect::Defense(DefenseKind::Dodge),
                ),
                def(
                    PARRY,
                    "Parry",
                    ActionCost::slot(ActionSlot::Reaction),
                    Targeting::None,
                    ActionEffect::Defense(DefenseKind::Parry),
                ),
                def(
                    ABSORB,
                    "Absorb",
                    ActionCost::slot(ActionSlot::Reaction),
                    Targeting::None,
                    ActionEffect::Defense(DefenseKind::Absorb),
                ),
            ],
        }
    }

    pub fn get(&self, id: &ActionId) -> Option<&ActionDef> {
        self.defs.iter().find(|d| &d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ActionDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    /// Menu for `actor` on their own turn. Reactions are not listed; they are
    /// offered by reaction windows.
    pub fn options_for(
        &self,
        actor: EntityId,
        store: &EntityStore,
        env: Env<'_>,
    ) -> Result<Vec<ActionOption>, StoreError> {
        let combatant = store.require(actor)?;
        Ok(self
            .defs
            .iter()
            .filter(|def| !def.is_reaction())
            .map(|def| {
                let targets = match def.targeting {
                    Targeting::Entity => attack_targets(def, combatant, store, env),
                    Targeting::SelfOnly => vec![Target::SelfTarget],
                    Targeting::None | Targeting::Tile => Vec::new(),
                };
                let applicable = can_pay(def, combatant)
                    && match &def.effect {
                        ActionEffect::Move => can_move(combatant) && combatant.stats.speed > 0,
                        ActionEffect::Sprint => can_move(combatant) && combatant.stats.sprint > 0,
                        ActionEffect::Attack(_) => !targets.is_empty(),
                        ActionEffect::Condition(_) => true,
                        ActionEffect::Defense(_) => false,
                    };
                ActionOption {
                    action: def.id.clone(),
                    needs_target: def.needs_target(),
                    cost: def.cost,
                    applicable: applicable && !combatant.is_destroyed(),
                    targets,
                }
            })
            .collect())
    }

    /// Defenses `defender` may declare against `attack` by `attacker`.
    pub fn reaction_options(
        &self,
        attack: &ActionDef,
        attacker: &Combatant,
        defender: &Combatant,
    ) -> Vec<ActionId> {
        let Some(style) = attack.attack_style() else {
            return Vec::new();
        };
        if defender.is_destroyed() {
            return Vec::new();
        }
        let close = style == AttackStyle::Melee && attacker.weapon.class.is_close();

        self.defs
            .iter()
            .filter(|def| match def.defense_kind() {
                Some(DefenseKind::Dodge) => true,
                Some(DefenseKind::Parry) => close && defender.weapon.class.is_close(),
                Some(DefenseKind::Absorb) => {
                    close
                        && (attacker.weapon.severity == Severity::Superficial
                            || defender.armor.has_protection()
                            || defender.stats.resistance >= 1)
                }
                None => false,
            })
            .map(|def| def.id.clone())
            .collect()
    }
}

impl Default for ActionCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

fn can_pay(def: &ActionDef, combatant: &Combatant) -> bool {
    combatant.budget.can_afford(def.cost.slot)
        && combatant.willpower.unmarked() >= def.cost.willpower
        && (def.cost.ammunition == 0 || combatant.weapon.has_ammunition(def.cost.ammunition))
}

fn can_move(combatant: &Combatant) -> bool {
    !combatant.conditions.has_status(StatusKind::Immobilized)
}

/// Living enemies the actor's weapon can reach with this attack style.
fn attack_targets(
    def: &ActionDef,
    actor: &Combatant,
    store: &EntityStore,
    env: Env<'_>,
) -> Vec<Target> {
    let Some(style) = def.attack_style() else {
        return Vec::new();
    };
    store
        .living()
        .filter(|other| other.team != actor.team)
        .filter(|other| reach(style, actor, other.position, env).is_ok())
        .map(|other| Target::Entity(other.id))
        .collect()
}

/// Why an attack cannot reach a position.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReachError {
    WeaponMismatch,
    OutOfRange { distance: u32 },
    NoLineOfSight,
}

/// Range increments the attack spans when it can reach `to`.
pub(crate) fn reach(
    style: AttackStyle,
    actor: &Combatant,
    to: crate::state::Position,
    env: Env<'_>,
) -> Result<u32, ReachError> {
    let weapon = &actor.weapon;
    let distance = actor.position.distance(to);
    match style {
        AttackStyle::Melee if !weapon.class.is_close() => Err(ReachError::WeaponMismatch),
        AttackStyle::Ranged if !weapon.class.is_ranged() => Err(ReachError::WeaponMismatch),
        AttackStyle::Melee => weapon
            .increments(distance)
            .ok_or(ReachError::OutOfRange { distance }),
        AttackStyle::Ranged => {
            let increments = weapon
                .increments(distance)
                .ok_or(ReachError::OutOfRange { distance })?;
            if env.visibility.sight(actor.position, to).can_target() {
                Ok(increments)
            } else {
                Err(ReachError::NoLineOfSight)
            }
        }
    }
}
