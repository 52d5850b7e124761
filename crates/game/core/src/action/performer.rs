//! Executes a queued action against the entity store.
//!
//! Attacks roll the attacker's pool, resolve declared defenses in declaration
//! order, then push the hit through the damage pipeline. Only one combatant
//! is mutated at a time: everything needed from the attacker is read first.

use super::catalog::{AttackStyle, DefenseKind, reach};
use super::{ActionCatalog, ActionDef, ActionEffect, ActionId, QueuedAction, ReservationId, Target};
use crate::combat::{DamagePacket, DamageReport};
use crate::conditions::{ConditionChange, ConditionError, ConditionSpec};
use crate::config::CombatConfig;
use crate::dice::{DicePool, DiceSource, RollOutcome, Side, compare_totals};
use crate::engine::Declaration;
use crate::env::Env;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{EntityId, EntityStore, PoolKind, Position, Round, StoreError, TrackError};

/// Snapshot of one roll kept for reporting.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollSummary {
    pub faces: Vec<u8>,
    pub hunger_dice: u32,
    pub difficulty: u32,
    pub successes: u32,
    pub critical_bonus: u32,
    pub total: u32,
    pub margin: u32,
    pub success: bool,
    pub critical: bool,
    pub bestial_failure: bool,
    pub bestial_success: bool,
}

impl From<&RollOutcome> for RollSummary {
    fn from(roll: &RollOutcome) -> Self {
        Self {
            faces: roll.faces().to_vec(),
            hunger_dice: roll.hunger_faces().len() as u32,
            difficulty: roll.difficulty(),
            successes: roll.successes(),
            critical_bonus: roll.critical_bonus(),
            total: roll.total(),
            margin: roll.margin(),
            success: roll.is_success(),
            critical: roll.is_critical(),
            bestial_failure: roll.is_bestial_failure(),
            bestial_success: roll.is_bestial_success(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefenseReport {
    pub defender: EntityId,
    pub action: ActionId,
    pub kind: DefenseKind,
    pub penalty: u32,
    pub pool: DicePool,
    pub roll: RollSummary,
    /// Successes the defense contributed; zero when the roll missed its
    /// difficulty.
    pub counted: u32,
    /// For opposed defenses, whether the attack lost the comparison.
    pub stopped_attack: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttackReport {
    pub style: AttackStyle,
    pub increments: u32,
    pub pool: DicePool,
    pub roll: RollSummary,
    pub defenses: Vec<DefenseReport>,
    pub net_successes: u32,
    pub absorbed: u32,
    pub hit: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageDelta {
    pub target: EntityId,
    pub report: DamageReport,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MovementDelta {
    pub from: Position,
    pub to: Position,
    pub cost: u32,
}

/// Why an enqueued action resolved without effect. Its cost stays spent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum FizzleReason {
    ActorDestroyed,
    TargetLost,
    OutOfReach,
    TileOccupied,
    Unreachable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionOutcome {
    Hit,
    Miss,
    Moved,
    ConditionApplied,
    Fizzled(FizzleReason),
}

/// Terminal result of one action.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionResolution {
    pub reservation: ReservationId,
    pub actor: EntityId,
    pub action: ActionId,
    pub target: Option<Target>,
    pub outcome: ActionOutcome,
    pub attack: Option<AttackReport>,
    pub damage: Vec<DamageDelta>,
    pub movement: Option<MovementDelta>,
    pub conditions: Vec<ConditionChange>,
}

impl ActionResolution {
    fn new(queued: &QueuedAction, outcome: ActionOutcome) -> Self {
        let intent = queued.intent.intent();
        Self {
            reservation: queued.reservation.id,
            actor: intent.actor,
            action: intent.action.clone(),
            target: intent.target,
            outcome,
            attack: None,
            damage: Vec::new(),
            movement: None,
            conditions: Vec::new(),
        }
    }

    fn fizzled(queued: &QueuedAction, reason: FizzleReason) -> Self {
        Self::new(queued, ActionOutcome::Fizzled(reason))
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PerformError {
    #[error("action {0} is not in the catalog")]
    UnknownAction(ActionId),

    #[error("reaction {0} cannot be performed as an action")]
    NotPerformable(ActionId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Condition(#[from] ConditionError),

    #[error(transparent)]
    Track(#[from] TrackError),
}

impl CombatError for PerformError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownAction(_) | Self::NotPerformable(_) => ErrorSeverity::Internal,
            Self::Store(inner) => inner.severity(),
            Self::Condition(inner) => inner.severity(),
            Self::Track(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownAction(_) => "perform_unknown_action",
            Self::NotPerformable(_) => "perform_not_performable",
            Self::Store(inner) => inner.error_code(),
            Self::Condition(inner) => inner.error_code(),
            Self::Track(inner) => inner.error_code(),
        }
    }
}

pub struct PerformContext<'a> {
    pub store: &'a mut EntityStore,
    pub catalog: &'a ActionCatalog,
    pub env: Env<'a>,
    pub config: &'a CombatConfig,
    pub dice: &'a mut dyn DiceSource,
    pub round: Round,
}

/// Resolves `queued` with the reactions declared against it.
pub fn perform(
    ctx: &mut PerformContext<'_>,
    queued: &QueuedAction,
    reactions: &[Declaration],
) -> Result<ActionResolution, PerformError> {
    let intent = queued.intent.intent();
    let def = ctx
        .catalog
        .get(&intent.action)
        .ok_or_else(|| PerformError::UnknownAction(intent.action.clone()))?;

    if ctx.store.require(intent.actor)?.is_destroyed() {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::ActorDestroyed));
    }

    match &def.effect {
        ActionEffect::Move | ActionEffect::Sprint => perform_move(ctx, queued),
        ActionEffect::Condition(spec) => perform_condition(ctx, queued, spec.clone()),
        ActionEffect::Attack(style) => perform_attack(ctx, queued, *style, reactions),
        ActionEffect::Defense(_) => Err(PerformError::NotPerformable(def.id.clone())),
    }
}

fn perform_move(
    ctx: &mut PerformContext<'_>,
    queued: &QueuedAction,
) -> Result<ActionResolution, PerformError> {
    let intent = queued.intent.intent();
    let Some(to) = intent.target_tile() else {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::Unreachable));
    };
    if ctx.store.occupant_at(to).is_some_and(|id| id != intent.actor) {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::TileOccupied));
    }

    let actor = ctx.store.require_mut(intent.actor)?;
    let from = actor.position;
    let Some(cost) = ctx.env.movement.path_cost(1, from, to) else {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::Unreachable));
    };
    actor.position = to;

    let mut resolution = ActionResolution::new(queued, ActionOutcome::Moved);
    resolution.movement = Some(MovementDelta { from, to, cost });
    Ok(resolution)
}

fn perform_condition(
    ctx: &mut PerformContext<'_>,
    queued: &QueuedAction,
    spec: ConditionSpec,
) -> Result<ActionResolution, PerformError> {
    let intent = queued.intent.intent();
    let recipient = intent.target_entity().unwrap_or(intent.actor);
    let target = ctx.store.require_mut(recipient)?;
    if target.is_destroyed() {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::TargetLost));
    }
    let change = target.apply_condition(spec.from_source(intent.actor))?;

    let mut resolution = ActionResolution::new(queued, ActionOutcome::ConditionApplied);
    resolution.conditions.push(change);
    Ok(resolution)
}

fn perform_attack(
    ctx: &mut PerformContext<'_>,
    queued: &QueuedAction,
    style: AttackStyle,
    reactions: &[Declaration],
) -> Result<ActionResolution, PerformError> {
    let intent = queued.intent.intent();
    let Some(target_id) = intent.target_entity() else {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::TargetLost));
    };
    let Some(defender) = ctx.store.get(target_id).filter(|d| !d.is_destroyed()) else {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::TargetLost));
    };
    let attacker = ctx.store.require(intent.actor)?;
    let Ok(increments) = reach(style, attacker, defender.position, ctx.env) else {
        return Ok(ActionResolution::fizzled(queued, FizzleReason::OutOfReach));
    };

    let (kind, situational) = match style {
        AttackStyle::Melee => (PoolKind::Melee, 0),
        AttackStyle::Ranged => (
            PoolKind::Ranged,
            ctx.env
                .visibility
                .sight(attacker.position, defender.position)
                .cover
                .ranged_penalty(),
        ),
    };
    let breakdown = attacker.pool_breakdown(kind, situational, ctx.config);
    let size = halve_for_range(breakdown.size(), increments);
    let pool = DicePool::new(size, 0).with_hunger(attacker.stats.hunger);
    let weapon = attacker.weapon.clone();
    let packet = DamagePacket::new(weapon.severity, weapon.category, weapon.class)
        .with_weapon_bonus(weapon.bonus);
    let outgoing = attacker.outgoing_modifier(&packet);

    let attack_roll = pool.roll(ctx.dice);
    let mut net = attack_roll.total();
    let mut opposed = false;
    let mut stopped = false;
    let mut absorbed = 0;
    let mut defenses = Vec::new();

    for declaration in reactions.iter().filter(|d| d.defender == target_id) {
        let Some(action) = declaration.reaction() else {
            continue;
        };
        let Some(kind) = ctx.catalog.get(action).and_then(ActionDef::defense_kind) else {
            continue;
        };
        let pool_kind = match kind {
            DefenseKind::Dodge => PoolKind::Dodge,
            DefenseKind::Parry => PoolKind::Parry,
            DefenseKind::Absorb => PoolKind::Absorb,
        };
        let defender = ctx.store.require(target_id)?;
        let defense_pool = defender
            .pool(pool_kind, declaration.penalty, declaration.penalty, ctx.config);
        let roll = defense_pool.roll(ctx.dice);
        let counted = if roll.is_success() { roll.total() } else { 0 };

        let mut stopped_attack = false;
        match kind {
            DefenseKind::Dodge | DefenseKind::Parry if !stopped => {
                opposed = true;
                if compare_totals(net, counted, ctx.config.tie_break) == Some(Side::Initiator) {
                    net -= counted;
                } else {
                    stopped = true;
                    stopped_attack = true;
                }
            }
            DefenseKind::Dodge | DefenseKind::Parry => {}
            DefenseKind::Absorb => absorbed += counted,
        }

        defenses.push(DefenseReport {
            defender: target_id,
            action: action.clone(),
            kind,
            penalty: declaration.penalty,
            pool: defense_pool,
            roll: RollSummary::from(&roll),
            counted,
            stopped_attack,
        });
    }

    // Unopposed attacks need at least one success.
    let hit = !stopped && (opposed || net >= 1);
    let outcome = if hit { ActionOutcome::Hit } else { ActionOutcome::Miss };
    let mut resolution = ActionResolution::new(queued, outcome);

    if hit {
        let packet = packet.with_net_successes(net);
        let target = ctx.store.require_mut(target_id)?;
        let report =
            target.receive_damage(&packet, outgoing, absorbed, ctx.config, ctx.dice, ctx.round)?;
        resolution.damage.push(DamageDelta {
            target: target_id,
            report,
        });
    }

    resolution.attack = Some(AttackReport {
        style,
        increments,
        pool,
        roll: RollSummary::from(&attack_roll),
        defenses,
        net_successes: if hit { net } else { 0 },
        absorbed,
        hit,
    });
    Ok(resolution)
}

/// Halves a ranged pool once per full increment beyond the first.
fn halve_for_range(size: i32, increments: u32) -> i32 {
    if size <= 0 {
        return size;
    }
    (1..increments).fold(size, |size, _| size / 2)
}
