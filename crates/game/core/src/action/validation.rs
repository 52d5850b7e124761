//! Intent validation against the catalog, the actor's resources and the
//! external oracles.
//!
//! Validation never mutates state. Resources are only reserved later by the
//! [`ActionScheduler`](super::ActionScheduler).

use super::catalog::{ReachError, reach};
use super::{
    ActionCatalog, ActionCost, ActionDef, ActionEffect, ActionId, ActionIntent, Target, Targeting,
    ValidatedIntent,
};
use crate::conditions::StatusKind;
use crate::env::Env;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{ActionSlot, Combatant, EntityId, EntityStore, Position};

/// Why an intent was rejected. Always surfaced to the submitting controller;
/// the turn returns to awaiting an intent.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InvalidIntent {
    #[error("it is not {actor}'s turn")]
    NotActorsTurn { actor: EntityId },

    #[error("actor {actor} not found")]
    UnknownActor { actor: EntityId },

    #[error("actor {actor} is destroyed")]
    ActorIncapacitated { actor: EntityId },

    #[error("unknown action {action}")]
    UnknownAction { action: ActionId },

    #[error("{action} can only be declared inside a reaction window")]
    ReactionOutsideWindow { action: ActionId },

    #[error("declared cost {declared:?} does not match catalog cost {expected:?}")]
    CostMismatch { declared: ActionCost, expected: ActionCost },

    #[error("{action} needs a target")]
    MissingTarget { action: ActionId },

    #[error("{action} takes no target")]
    UnexpectedTarget { action: ActionId },

    #[error("{action} needs a different kind of target")]
    WrongTargetKind { action: ActionId },

    #[error("actor cannot target itself")]
    TargetIsSelf,

    #[error("target {target} not found")]
    UnknownTarget { target: EntityId },

    #[error("target {target} is destroyed")]
    TargetDestroyed { target: EntityId },

    #[error("target {target} is on the actor's team")]
    FriendlyTarget { target: EntityId },

    #[error("equipped weapon cannot make this attack")]
    WeaponMismatch,

    #[error("target is {distance} tiles away, out of reach")]
    OutOfReach { distance: u32 },

    #[error("no line of sight to target")]
    NoLineOfSight,

    #[error("tile {tile} is occupied")]
    TileOccupied { tile: Position },

    #[error("tile {tile} cannot be reached")]
    Unreachable { tile: Position },

    #[error("path costs {cost} tiles but only {allowance} are available")]
    TooFar { cost: u32, allowance: u32 },

    #[error("{slot} slot already spent this turn")]
    SlotUnavailable { slot: ActionSlot },

    #[error("needs {needed} willpower, {available} unmarked")]
    InsufficientWillpower { needed: u32, available: u32 },

    #[error("weapon is out of ammunition")]
    OutOfAmmunition,

    #[error("actor is immobilized")]
    Immobilized,
}

impl CombatError for InvalidIntent {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotActorsTurn { .. } => "intent_not_actors_turn",
            Self::UnknownActor { .. } => "intent_unknown_actor",
            Self::ActorIncapacitated { .. } => "intent_actor_incapacitated",
            Self::UnknownAction { .. } => "intent_unknown_action",
            Self::ReactionOutsideWindow { .. } => "intent_reaction_outside_window",
            Self::CostMismatch { .. } => "intent_cost_mismatch",
            Self::MissingTarget { .. } => "intent_missing_target",
            Self::UnexpectedTarget { .. } => "intent_unexpected_target",
            Self::WrongTargetKind { .. } => "intent_wrong_target_kind",
            Self::TargetIsSelf => "intent_target_is_self",
            Self::UnknownTarget { .. } => "intent_unknown_target",
            Self::TargetDestroyed { .. } => "intent_target_destroyed",
            Self::FriendlyTarget { .. } => "intent_friendly_target",
            Self::WeaponMismatch => "intent_weapon_mismatch",
            Self::OutOfReach { .. } => "intent_out_of_reach",
            Self::NoLineOfSight => "intent_no_line_of_sight",
            Self::TileOccupied { .. } => "intent_tile_occupied",
            Self::Unreachable { .. } => "intent_unreachable",
            Self::TooFar { .. } => "intent_too_far",
            Self::SlotUnavailable { .. } => "intent_slot_unavailable",
            Self::InsufficientWillpower { .. } => "intent_insufficient_willpower",
            Self::OutOfAmmunition => "intent_out_of_ammunition",
            Self::Immobilized => "intent_immobilized",
        }
    }
}

impl From<ReachError> for InvalidIntent {
    fn from(error: ReachError) -> Self {
        match error {
            ReachError::WeaponMismatch => Self::WeaponMismatch,
            ReachError::OutOfRange { distance } => Self::OutOfReach { distance },
            ReachError::NoLineOfSight => Self::NoLineOfSight,
        }
    }
}

/// Everything validation reads.
#[derive(Clone, Copy)]
pub struct ValidationContext<'a> {
    pub store: &'a EntityStore,
    pub catalog: &'a ActionCatalog,
    pub env: Env<'a>,
    /// Combatant whose turn is active, if any.
    pub current_actor: Option<EntityId>,
}

/// Checks an intent submitted on the actor's own turn.
pub fn validate_intent(
    intent: ActionIntent,
    ctx: &ValidationContext<'_>,
) -> Result<ValidatedIntent, InvalidIntent> {
    let actor = ctx
        .store
        .get(intent.actor)
        .ok_or(InvalidIntent::UnknownActor { actor: intent.actor })?;
    if ctx.current_actor != Some(intent.actor) {
        return Err(InvalidIntent::NotActorsTurn { actor: intent.actor });
    }
    if actor.is_destroyed() {
        return Err(InvalidIntent::ActorIncapacitated { actor: intent.actor });
    }

    let def = ctx
        .catalog
        .get(&intent.action)
        .ok_or_else(|| InvalidIntent::UnknownAction {
            action: intent.action.clone(),
        })?;
    if def.is_reaction() {
        return Err(InvalidIntent::ReactionOutsideWindow {
            action: intent.action.clone(),
        });
    }
    if intent.cost != def.cost {
        return Err(InvalidIntent::CostMismatch {
            declared: intent.cost,
            expected: def.cost,
        });
    }

    check_target_shape(def, &intent)?;
    check_resources(def, actor)?;

    match &def.effect {
        ActionEffect::Move | ActionEffect::Sprint => check_movement(def, actor, &intent, ctx)?,
        ActionEffect::Attack(style) => {
            let target = intent.target_entity().ok_or_else(|| InvalidIntent::WrongTargetKind {
                action: def.id.clone(),
            })?;
            let defender = check_hostile_target(actor, target, ctx.store)?;
            reach(*style, actor, defender.position, ctx.env)?;
        }
        ActionEffect::Condition(_) | ActionEffect::Defense(_) => {}
    }

    Ok(ValidatedIntent::new(intent))
}

fn check_target_shape(def: &ActionDef, intent: &ActionIntent) -> Result<(), InvalidIntent> {
    let action = || def.id.clone();
    match (def.targeting, intent.target) {
        (Targeting::None, None) | (Targeting::SelfOnly, None | Some(Target::SelfTarget)) => Ok(()),
        (Targeting::Entity, Some(Target::Entity(_)))
        | (Targeting::Tile, Some(Target::Tile(_))) => Ok(()),
        (Targeting::Entity | Targeting::Tile, None) => {
            Err(InvalidIntent::MissingTarget { action: action() })
        }
        (Targeting::None, Some(_)) => Err(InvalidIntent::UnexpectedTarget { action: action() }),
        _ => Err(InvalidIntent::WrongTargetKind { action: action() }),
    }
}

fn check_resources(def: &ActionDef, actor: &Combatant) -> Result<(), InvalidIntent> {
    let cost = def.cost;
    if !actor.budget.can_afford(cost.slot) {
        return Err(InvalidIntent::SlotUnavailable { slot: cost.slot });
    }
    let available = actor.willpower.unmarked();
    if available < cost.willpower {
        return Err(InvalidIntent::InsufficientWillpower {
            needed: cost.willpower,
            available,
        });
    }
    if cost.ammunition > 0 && !actor.weapon.has_ammunition(cost.ammunition) {
        return Err(InvalidIntent::OutOfAmmunition);
    }
    Ok(())
}

fn check_movement(
    def: &ActionDef,
    actor: &Combatant,
    intent: &ActionIntent,
    ctx: &ValidationContext<'_>,
) -> Result<(), InvalidIntent> {
    if actor.conditions.has_status(StatusKind::Immobilized) {
        return Err(InvalidIntent::Immobilized);
    }
    let tile = intent.target_tile().ok_or_else(|| InvalidIntent::WrongTargetKind {
        action: def.id.clone(),
    })?;
    if ctx.store.occupant_at(tile).is_some() {
        return Err(InvalidIntent::TileOccupied { tile });
    }
    let cost = ctx
        .env
        .movement
        .path_cost(1, actor.position, tile)
        .ok_or(InvalidIntent::Unreachable { tile })?;
    let allowance = match def.effect {
        ActionEffect::Sprint => actor.stats.sprint,
        _ => actor.stats.speed,
    };
    if cost > allowance {
        return Err(InvalidIntent::TooFar { cost, allowance });
    }
    Ok(())
}

pub(crate) fn check_hostile_target<'s>(
    actor: &Combatant,
    target: EntityId,
    store: &'s EntityStore,
) -> Result<&'s Combatant, InvalidIntent> {
    if target == actor.id {
        return Err(InvalidIntent::TargetIsSelf);
    }
    let defender = store.get(target).ok_or(InvalidIntent::UnknownTarget { target })?;
    if defender.is_destroyed() {
        return Err(InvalidIntent::TargetDestroyed { target });
    }
    if defender.team == actor.team {
        return Err(InvalidIntent::FriendlyTarget { target });
    }
    Ok(defender)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ATTACK_MELEE, ATTACK_RANGED, DODGE, FOCUS, MOVE, SPRINT};
    use crate::combat::{DamageCategory, Severity, WeaponClass};
    use crate::conditions::{ConditionSpec, Duration};
    use crate::config::CombatConfig;
    use crate::env::OpenGround;
    use crate::state::{ActionBudget, CombatStats, CombatantSpec, TeamId, Weapon};

    const GROUND: OpenGround = OpenGround::new(12, 12);

    fn fighter(id: u32, team: u8, x: i32) -> Combatant {
        let mut combatant = CombatantSpec {
            id: EntityId(id),
            name: format!("fighter-{id}"),
            team: TeamId(team),
            position: Position::new(x, 0),
            stats: CombatStats {
                melee: 3,
                speed: 3,
                sprint: 6,
                ..CombatStats::default()
            },
            weapon: Weapon::fists(),
            armor: Default::default(),
        }
        .build(&CombatConfig::default());
        combatant.budget = ActionBudget::fresh();
        combatant
    }

    fn arena(combatants: impl IntoIterator<Item = Combatant>) -> EntityStore {
        let mut store = EntityStore::new();
        for combatant in combatants {
            store.insert(combatant).unwrap();
        }
        store
    }

    fn check(store: &EntityStore, intent: ActionIntent) -> Result<ValidatedIntent, InvalidIntent> {
        let catalog = ActionCatalog::standard();
        let ctx = ValidationContext {
            store,
            catalog: &catalog,
            env: Env::new(&GROUND, &GROUND),
            current_actor: Some(EntityId(1)),
        };
        validate_intent(intent, &ctx)
    }

    fn intent(action: &str, target: Option<Target>) -> ActionIntent {
        let cost = ActionCatalog::standard()
            .get(&ActionId::from(action))
            .map(|d| d.cost)
            .unwrap();
        let intent = ActionIntent::new(EntityId(1), action, cost);
        match target {
            Some(target) => intent.at(target),
            None => intent,
        }
    }

    #[test]
    fn adjacent_melee_attack_is_valid() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 1)]);
        let validated =
            check(&store, intent(ATTACK_MELEE, Some(Target::Entity(EntityId(2))))).unwrap();
        assert_eq!(validated.actor(), EntityId(1));
    }

    #[test]
    fn other_actors_turn_is_rejected() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 1)]);
        let mut submitted = intent(ATTACK_MELEE, Some(Target::Entity(EntityId(1))));
        submitted.actor = EntityId(2);
        assert_eq!(
            check(&store, submitted),
            Err(InvalidIntent::NotActorsTurn { actor: EntityId(2) })
        );
    }

    #[test]
    fn unknown_action_and_target() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 1)]);
        let bogus = ActionIntent::new(EntityId(1), "fireball", ActionCost::slot(ActionSlot::Major));
        assert!(matches!(check(&store, bogus), Err(InvalidIntent::UnknownAction { .. })));

        let missing = intent(ATTACK_MELEE, Some(Target::Entity(EntityId(9))));
        assert_eq!(
            check(&store, missing),
            Err(InvalidIntent::UnknownTarget { target: EntityId(9) })
        );
    }

    #[test]
    fn melee_out_of_reach() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 3)]);
        assert_eq!(
            check(&store, intent(ATTACK_MELEE, Some(Target::Entity(EntityId(2))))),
            Err(InvalidIntent::OutOfReach { distance: 3 })
        );
    }

    #[test]
    fn ranged_attack_with_fists_is_a_weapon_mismatch() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 3)]);
        assert_eq!(
            check(&store, intent(ATTACK_RANGED, Some(Target::Entity(EntityId(2))))),
            Err(InvalidIntent::WeaponMismatch)
        );
    }

    #[test]
    fn ranged_attack_without_ammunition() {
        let mut shooter = fighter(1, 0, 0);
        shooter.weapon = Weapon {
            name: "pistol".into(),
            class: WeaponClass::Ranged,
            bonus: 2,
            severity: Severity::Superficial,
            category: DamageCategory::Physical,
            range: 5,
            ammunition: Some(0),
        };
        let store = arena([shooter, fighter(2, 1, 3)]);
        assert_eq!(
            check(&store, intent(ATTACK_RANGED, Some(Target::Entity(EntityId(2))))),
            Err(InvalidIntent::OutOfAmmunition)
        );
    }

    #[test]
    fn friendly_fire_is_rejected() {
        let store = arena([fighter(1, 0, 0), fighter(2, 0, 1)]);
        assert_eq!(
            check(&store, intent(ATTACK_MELEE, Some(Target::Entity(EntityId(2))))),
            Err(InvalidIntent::FriendlyTarget { target: EntityId(2) })
        );
    }

    #[test]
    fn declared_cost_must_match() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 1)]);
        let mut submitted = intent(ATTACK_MELEE, Some(Target::Entity(EntityId(2))));
        submitted.cost = ActionCost::slot(ActionSlot::Minor);
        assert!(matches!(check(&store, submitted), Err(InvalidIntent::CostMismatch { .. })));
    }

    #[test]
    fn spent_major_rejects_attack() {
        let mut actor = fighter(1, 0, 0);
        actor.budget.spend(ActionSlot::Major);
        let store = arena([actor, fighter(2, 1, 1)]);
        assert_eq!(
            check(&store, intent(ATTACK_MELEE, Some(Target::Entity(EntityId(2))))),
            Err(InvalidIntent::SlotUnavailable { slot: ActionSlot::Major })
        );
    }

    #[test]
    fn movement_respects_speed_and_occupancy() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 2)]);

        assert!(check(&store, intent(MOVE, Some(Target::Tile(Position::new(0, 3))))).is_ok());
        assert_eq!(
            check(&store, intent(MOVE, Some(Target::Tile(Position::new(5, 0))))),
            Err(InvalidIntent::TooFar { cost: 5, allowance: 3 })
        );
        assert!(check(&store, intent(SPRINT, Some(Target::Tile(Position::new(5, 0))))).is_ok());
        assert_eq!(
            check(&store, intent(MOVE, Some(Target::Tile(Position::new(2, 0))))),
            Err(InvalidIntent::TileOccupied { tile: Position::new(2, 0) })
        );
        assert_eq!(
            check(&store, intent(MOVE, Some(Target::Tile(Position::new(-1, 0))))),
            Err(InvalidIntent::Unreachable { tile: Position::new(-1, 0) })
        );
    }

    #[test]
    fn immobilized_actor_cannot_move() {
        let mut actor = fighter(1, 0, 0);
        let snare =
            ConditionSpec::status("Snared", StatusKind::Immobilized, 0, Duration::Rounds(2));
        actor.apply_condition(snare).unwrap();
        let store = arena([actor]);
        assert_eq!(
            check(&store, intent(MOVE, Some(Target::Tile(Position::new(1, 0))))),
            Err(InvalidIntent::Immobilized)
        );
    }

    #[test]
    fn focus_needs_unmarked_willpower() {
        let mut actor = fighter(1, 0, 0);
        assert!(check(&arena([actor.clone()]), intent(FOCUS, None)).is_ok());

        let capacity = actor.willpower.capacity();
        actor.spend_willpower(capacity).unwrap();
        assert_eq!(
            check(&arena([actor]), intent(FOCUS, None)),
            Err(InvalidIntent::InsufficientWillpower { needed: 1, available: 0 })
        );
    }

    #[test]
    fn reactions_are_not_turn_actions() {
        let store = arena([fighter(1, 0, 0)]);
        assert!(matches!(
            check(&store, intent(DODGE, None)),
            Err(InvalidIntent::ReactionOutsideWindow { .. })
        ));
    }

    #[test]
    fn missing_and_wrong_targets() {
        let store = arena([fighter(1, 0, 0), fighter(2, 1, 1)]);
        assert!(matches!(
            check(&store, intent(ATTACK_MELEE, None)),
            Err(InvalidIntent::MissingTarget { .. })
        ));
        assert!(matches!(
            check(&store, intent(MOVE, Some(Target::Entity(EntityId(2))))),
            Err(InvalidIntent::WrongTargetKind { .. })
        ));
        assert_eq!(
            check(&store, intent(ATTACK_MELEE, Some(Target::Entity(EntityId(1))))),
            Err(InvalidIntent::TargetIsSelf)
        );
    }
}
