//! Per-combatant condition ledger.

use std::collections::BTreeMap;

use arrayvec::ArrayVec;
use strum::IntoEnumIterator;

use super::{
    ConditionEffect, ConditionError, ConditionId, ConditionSpec, Duration, ModifierKind,
    StatusKind,
};
use crate::combat::{DamageCategory, Severity};
use crate::config::CombatConfig;
use crate::state::{ClearedMarks, EntityId, Round};

/// One active instance. Removing it reverts exactly its own delta.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Condition {
    pub id: ConditionId,
    pub effect: ConditionEffect,
    pub delta: i32,
    pub remaining: Duration,
    pub source: Option<EntityId>,
    /// Track marks cleared when this instance shrank the health track.
    pub restore: ClearedMarks,
}

/// How `apply` stored the request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Applied {
    Added(ConditionId),
    /// A non-stackable condition was already active; its delta and duration
    /// were replaced.
    Refreshed(ConditionId),
}

impl Applied {
    pub fn id(&self) -> &ConditionId {
        match self {
            Applied::Added(id) | Applied::Refreshed(id) => id,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionLedger {
    instances: ArrayVec<Condition, { CombatConfig::MAX_CONDITION_INSTANCES }>,
    /// Next suffix per base name while any instance of that base is active.
    next_suffix: BTreeMap<String, u32>,
    last_tick: Option<Round>,
}

impl ConditionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, spec: ConditionSpec) -> Result<Applied, ConditionError> {
        if spec.duration == Duration::Rounds(0) {
            return Err(ConditionError::ZeroDuration { name: spec.name });
        }

        let active = self.instances.iter().any(|c| c.id.base == spec.name);

        if active && !spec.effect.is_stackable() {
            if let Some(existing) = self.instances.iter_mut().find(|c| c.id.base == spec.name) {
                existing.delta = spec.delta;
                existing.remaining = spec.duration;
                existing.effect = spec.effect;
                existing.source = spec.source;
                return Ok(Applied::Refreshed(existing.id.clone()));
            }
        }

        if self.instances.is_full() {
            return Err(ConditionError::LedgerFull {
                capacity: CombatConfig::MAX_CONDITION_INSTANCES,
            });
        }

        let id = if active {
            let counter = self.next_suffix.entry(spec.name.clone()).or_insert(1);
            let suffix = *counter;
            *counter += 1;
            ConditionId::suffixed(spec.name, suffix)
        } else {
            self.next_suffix.insert(spec.name.clone(), 1);
            ConditionId::base(spec.name)
        };

        self.instances.push(Condition {
            id: id.clone(),
            effect: spec.effect,
            delta: spec.delta,
            remaining: spec.duration,
            source: spec.source,
            restore: ClearedMarks::default(),
        });
        Ok(Applied::Added(id))
    }

    /// Advances every timed instance by one round and removes those that run
    /// out. All expirations of the tick are removed before this returns.
    ///
    /// Ticking the same round twice is a no-op.
    pub fn tick(&mut self, round: Round) -> Vec<Condition> {
        if self.last_tick.is_some_and(|last| last >= round) {
            return Vec::new();
        }
        self.last_tick = Some(round);

        for condition in self.instances.iter_mut() {
            if let Duration::Rounds(n) = condition.remaining {
                condition.remaining = Duration::Rounds(n.saturating_sub(1));
            }
        }

        let mut expired = Vec::new();
        let mut kept = ArrayVec::new();
        for condition in self.instances.drain(..) {
            if condition.remaining == Duration::Rounds(0) {
                expired.push(condition);
            } else {
                kept.push(condition);
            }
        }
        self.instances = kept;

        for condition in &expired {
            self.forget_base_if_unused(&condition.id.base);
        }
        expired
    }

    pub fn remove(&mut self, id: &ConditionId) -> Result<Condition, ConditionError> {
        let index = self
            .instances
            .iter()
            .position(|c| &c.id == id)
            .ok_or_else(|| ConditionError::NotFound { id: id.clone() })?;
        let removed = self.instances.remove(index);
        self.forget_base_if_unused(&removed.id.base);
        Ok(removed)
    }

    /// Sum of deltas of every active instance of `kind`, whatever its scope.
    pub fn net(&self, kind: ModifierKind) -> i32 {
        self.instances
            .iter()
            .filter(|c| c.effect.modifier_kind() == Some(kind))
            .map(|c| c.delta)
            .sum()
    }

    /// Sum of deltas of `kind` instances whose scope matches the hit.
    pub fn net_for_hit(
        &self,
        kind: ModifierKind,
        severity: Severity,
        category: DamageCategory,
    ) -> i32 {
        self.instances
            .iter()
            .filter_map(|c| match c.effect {
                ConditionEffect::Modifier { kind: k, scope } if k == kind => {
                    scope.matches(severity, category).then_some(c.delta)
                }
                _ => None,
            })
            .sum()
    }

    /// Every modifier kind with its current net.
    pub fn nets(&self) -> Vec<(ModifierKind, i32)> {
        ModifierKind::iter().map(|k| (k, self.net(k))).collect()
    }

    pub fn status(&self, status: StatusKind) -> Option<&Condition> {
        self.instances
            .iter()
            .find(|c| c.effect == ConditionEffect::Status(status))
    }

    pub fn has_status(&self, status: StatusKind) -> bool {
        self.status(status).is_some()
    }

    pub fn get(&self, id: &ConditionId) -> Option<&Condition> {
        self.instances.iter().find(|c| &c.id == id)
    }

    pub(crate) fn get_mut(&mut self, id: &ConditionId) -> Option<&mut Condition> {
        self.instances.iter_mut().find(|c| &c.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.instances.iter()
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    fn forget_base_if_unused(&mut self, base: &str) {
        if !self.instances.iter().any(|c| c.id.base == base) {
            self.next_suffix.remove(base);
        }
    }
}

#[cfg(feature = "serde")]
impl ConditionLedger {
    /// Compact binary snapshot for save points and replays.
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}
