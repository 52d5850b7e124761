//! The canonical per-battle entity store.
//!
//! Every system reads and writes combatant components through this store,
//! addressed by [`EntityId`]. There is no second lookup table.

use std::collections::{BTreeMap, BTreeSet};

use super::{
    ActionBudget, CombatStats, EntityId, HealthTrack, Injuries, Position, ReactionTally, Round,
    TeamId, TrackError, TrackKind, TrackOutcome, Weapon,
};
use crate::combat::{
    ArmorProfile, DamageModifiers, DamagePacket, DamageReport, Mitigation, compute_damage,
    roll_critical_injury,
};
use crate::conditions::{
    Applied, ChangeKind, Condition, ConditionChange, ConditionError, ConditionId, ConditionLedger,
    ConditionSpec, ModifierKind,
};
use crate::config::CombatConfig;
use crate::dice::{DicePool, DiceSource};
use crate::error::{CombatError, ErrorSeverity};
use crate::state::InjuryKind;

/// Which rating a roll draws on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum PoolKind {
    Melee,
    Ranged,
    Dodge,
    Parry,
    Absorb,
}

impl PoolKind {
    pub const fn modifier(self) -> ModifierKind {
        match self {
            PoolKind::Melee | PoolKind::Ranged => ModifierKind::AttackPool,
            PoolKind::Dodge | PoolKind::Parry | PoolKind::Absorb => ModifierKind::DefensePool,
        }
    }
}

/// How a pool size was reached, kept for reporting.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PoolBreakdown {
    pub base: u32,
    pub conditions: i32,
    pub weakened: u32,
    pub injuries: u32,
    pub situational: u32,
}

impl PoolBreakdown {
    pub fn size(&self) -> i32 {
        self.base as i32 + self.conditions
            - self.weakened as i32
            - self.injuries as i32
            - self.situational as i32
    }
}

/// Serializable description used to seed a battle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatantSpec {
    pub id: EntityId,
    pub name: String,
    pub team: TeamId,
    pub position: Position,
    pub stats: CombatStats,
    #[cfg_attr(feature = "serde", serde(default = "Weapon::fists"))]
    pub weapon: Weapon,
    #[cfg_attr(feature = "serde", serde(default))]
    pub armor: ArmorProfile,
}

impl CombatantSpec {
    pub fn build(self, config: &CombatConfig) -> Combatant {
        let health_base = config.base_health + self.stats.stamina;
        Combatant {
            id: self.id,
            name: self.name,
            team: self.team,
            position: self.position,
            stats: self.stats,
            weapon: self.weapon,
            armor: self.armor,
            health: HealthTrack::new(health_base),
            willpower: HealthTrack::new(config.base_willpower + self.stats.resolve),
            health_base,
            conditions: ConditionLedger::new(),
            injuries: Injuries::default(),
            budget: ActionBudget::exhausted(),
            reactions: ReactionTally::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Combatant {
    pub id: EntityId,
    pub name: String,
    pub team: TeamId,
    pub position: Position,
    pub stats: CombatStats,
    pub weapon: Weapon,
    pub armor: ArmorProfile,
    pub health: HealthTrack,
    pub willpower: HealthTrack,
    /// Health capacity before max-health conditions.
    health_base: u32,
    pub conditions: ConditionLedger,
    pub injuries: Injuries,
    pub budget: ActionBudget,
    pub reactions: ReactionTally,
}

impl Combatant {
    pub fn is_destroyed(&self) -> bool {
        self.health.is_destroyed()
    }

    pub fn track(&self, kind: TrackKind) -> &HealthTrack {
        match kind {
            TrackKind::Health => &self.health,
            TrackKind::Willpower => &self.willpower,
        }
    }

    fn track_mut(&mut self, kind: TrackKind) -> &mut HealthTrack {
        match kind {
            TrackKind::Health => &mut self.health,
            TrackKind::Willpower => &mut self.willpower,
        }
    }

    pub fn pool_breakdown(
        &self,
        kind: PoolKind,
        situational: u32,
        config: &CombatConfig,
    ) -> PoolBreakdown {
        let base = match kind {
            PoolKind::Melee => self.stats.melee,
            PoolKind::Ranged => self.stats.ranged,
            PoolKind::Dodge => self.stats.dodge,
            PoolKind::Parry => self.stats.parry,
            PoolKind::Absorb => self.stats.absorb,
        };

        // Every pool here is physical: health weakness costs dice, and
        // willpower weakness only adds a second penalty when stacking.
        let mut weakened = 0;
        if self.health.is_weakened() {
            weakened += config.weakened_penalty;
            if config.stack_weakened_penalties && self.willpower.is_weakened() {
                weakened += config.weakened_penalty;
            }
        }

        PoolBreakdown {
            base,
            conditions: self.conditions.net(kind.modifier()),
            weakened,
            injuries: self.injuries.pool_penalty(),
            situational,
        }
    }

    /// Builds the pool for a roll; a negative total becomes a malformed pool.
    pub fn pool(
        &self,
        kind: PoolKind,
        situational: u32,
        difficulty: u32,
        config: &CombatConfig,
    ) -> DicePool {
        let breakdown = self.pool_breakdown(kind, situational, config);
        DicePool::new(breakdown.size(), difficulty).with_hunger(self.stats.hunger)
    }

    /// Damage-out net this combatant adds to a hit it deals.
    pub fn outgoing_modifier(&self, packet: &DamagePacket) -> i32 {
        self.conditions
            .net_for_hit(ModifierKind::DamageOut, packet.severity, packet.category)
    }

    /// Runs a hit through the pipeline and onto the target track.
    ///
    /// `outgoing` is the attacker's damage-out net, read before this call so
    /// only one combatant is mutated at a time.
    pub fn receive_damage(
        &mut self,
        packet: &DamagePacket,
        outgoing: i32,
        absorbed: u32,
        config: &CombatConfig,
        dice: &mut dyn DiceSource,
        round: Round,
    ) -> Result<DamageReport, TrackError> {
        let modifiers = DamageModifiers {
            outgoing,
            incoming: self
                .conditions
                .net_for_hit(ModifierKind::DamageIn, packet.severity, packet.category),
        };
        let computation = compute_damage(
            packet,
            Mitigation {
                armor: &self.armor,
                resistance: self.stats.resistance,
                absorbed,
            },
            modifiers,
            config,
        );

        let was_weakened = self.health.is_weakened();
        let aggravated_before = self.health.aggravated();

        let track = self
            .track_mut(computation.track)
            .apply(computation.applied_severity, computation.amount)?;

        let mut report = DamageReport {
            computation,
            track,
            injury: None,
        };

        if computation.track == TrackKind::Health && was_weakened && computation.amount > 0 {
            let injury = roll_critical_injury(dice, aggravated_before, round);
            if injury.kind == InjuryKind::Terminal {
                self.health.collapse();
                report.track.collapsed = true;
                report.track.destroyed = true;
            }
            self.injuries.push(injury);
            report.injury = Some(injury);
        }

        Ok(report)
    }

    /// Pays a willpower cost as superficial willpower damage.
    pub fn spend_willpower(&mut self, amount: u32) -> Result<TrackOutcome, TrackError> {
        self.willpower.apply(crate::combat::Severity::Superficial, amount)
    }

    pub fn heal_superficial(&mut self, amount: u32) -> u32 {
        self.health.heal_superficial(amount)
    }

    /// Heals aggravated boxes; each healed box clears the oldest injury.
    pub fn heal_aggravated(&mut self, amount: u32) -> u32 {
        let healed = self.health.heal_aggravated(amount);
        self.injuries.heal(healed);
        healed
    }

    pub fn apply_condition(
        &mut self,
        spec: ConditionSpec,
    ) -> Result<ConditionChange, ConditionError> {
        let touches_health = spec.effect.modifier_kind() == Some(ModifierKind::MaxHealth);
        let applied = self.conditions.apply(spec)?;

        if touches_health {
            let cleared = self.health.resize(self.health_capacity());
            if !cleared.is_empty()
                && let Some(instance) = self.conditions.get_mut(applied.id())
            {
                instance.restore.superficial += cleared.superficial;
                instance.restore.aggravated += cleared.aggravated;
            }
        }

        let delta = self.conditions.get(applied.id()).map_or(0, |c| c.delta);
        Ok(match applied {
            Applied::Added(id) => self.change(ChangeKind::Applied, id, delta),
            Applied::Refreshed(id) => self.change(ChangeKind::Refreshed, id, delta),
        })
    }

    pub fn remove_condition(
        &mut self,
        id: &ConditionId,
    ) -> Result<ConditionChange, ConditionError> {
        let removed = self.conditions.remove(id)?;
        self.revert(&removed);
        Ok(self.change(ChangeKind::Removed, removed.id, removed.delta))
    }

    /// Ticks the ledger for `round` and reverts every expired instance.
    pub fn tick_conditions(&mut self, round: Round) -> Vec<ConditionChange> {
        let expired = self.conditions.tick(round);
        for condition in &expired {
            self.revert(condition);
        }
        expired
            .into_iter()
            .map(|c| self.change(ChangeKind::Expired, c.id, c.delta))
            .collect()
    }

    /// Current health capacity including max-health conditions.
    pub fn health_capacity(&self) -> u32 {
        let capacity =
            self.health_base as i64 + self.conditions.net(ModifierKind::MaxHealth) as i64;
        capacity.max(1) as u32
    }

    fn revert(&mut self, condition: &Condition) {
        if condition.effect.modifier_kind() == Some(ModifierKind::MaxHealth) {
            self.health.resize(self.health_capacity());
            self.health.restore(condition.restore);
        }
    }

    fn change(&self, kind: ChangeKind, condition: ConditionId, delta: i32) -> ConditionChange {
        ConditionChange {
            entity: self.id,
            kind,
            condition,
            delta,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StoreError {
    #[error("entity {0} not found")]
    UnknownEntity(EntityId),

    #[error("entity {0} already registered")]
    DuplicateEntity(EntityId),
}

impl CombatError for StoreError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownEntity(_) => "store_unknown_entity",
            Self::DuplicateEntity(_) => "store_duplicate_entity",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EntityStore {
    entities: BTreeMap<EntityId, Combatant>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, combatant: Combatant) -> Result<(), StoreError> {
        if self.entities.contains_key(&combatant.id) {
            return Err(StoreError::DuplicateEntity(combatant.id));
        }
        self.entities.insert(combatant.id, combatant);
        Ok(())
    }

    pub fn get(&self, id: EntityId) -> Option<&Combatant> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Combatant> {
        self.entities.get_mut(&id)
    }

    pub fn require(&self, id: EntityId) -> Result<&Combatant, StoreError> {
        self.get(id).ok_or(StoreError::UnknownEntity(id))
    }

    pub fn require_mut(&mut self, id: EntityId) -> Result<&mut Combatant, StoreError> {
        self.get_mut(id).ok_or(StoreError::UnknownEntity(id))
    }

    pub fn position(&self, id: EntityId) -> Option<Position> {
        self.get(id).map(|c| c.position)
    }

    pub fn health(&self, id: EntityId) -> Option<&HealthTrack> {
        self.get(id).map(|c| &c.health)
    }

    pub fn ledger(&self, id: EntityId) -> Option<&ConditionLedger> {
        self.get(id).map(|c| &c.conditions)
    }

    pub fn ledger_mut(&mut self, id: EntityId) -> Option<&mut ConditionLedger> {
        self.get_mut(id).map(|c| &mut c.conditions)
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Combatant> {
        self.entities.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Combatant> {
        self.entities.values_mut()
    }

    pub fn living(&self) -> impl Iterator<Item = &Combatant> {
        self.entities.values().filter(|c| !c.is_destroyed())
    }

    /// Living combatant standing on `position`, if any.
    pub fn occupant_at(&self, position: Position) -> Option<EntityId> {
        self.living().find(|c| c.position == position).map(|c| c.id)
    }

    pub fn teams_standing(&self) -> BTreeSet<TeamId> {
        self.living().map(|c| c.team).collect()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
