//! Initiative order, delays, skips and per-turn setup.

use std::collections::BTreeSet;

use crate::combat::Severity;
use crate::conditions::{ConditionChange, ModifierKind, StatusKind};
use crate::config::CombatConfig;
use crate::dice::DiceSource;
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{
    ActionBudget, EntityId, EntityStore, ReactionTally, Round, StoreError, TrackError, TrackOutcome,
};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnError {
    #[error("no turn is active")]
    NoTurnActive,

    #[error("{actor} is not the active combatant")]
    NotCurrentActor { actor: EntityId },

    #[error("{actor} already acted this turn")]
    AlreadyActed { actor: EntityId },

    #[error("{actor} already delayed this round")]
    AlreadyDelayed { actor: EntityId },

    #[error("rank {rank} is not later than current initiative {current}")]
    RankNotLater { rank: i32, current: i32 },

    #[error("{actor} has no turn left this round")]
    NotInOrder { actor: EntityId },

    #[error("{actor} already spent their major action this round")]
    MajorAlreadySpent { actor: EntityId },

    #[error("no combatant can act")]
    NoCombatants,

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Track(#[from] TrackError),
}

impl CombatError for TurnError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Store(inner) => inner.severity(),
            Self::Track(inner) => inner.severity(),
            Self::NoCombatants => ErrorSeverity::Recoverable,
            _ => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NoTurnActive => "turn_none_active",
            Self::NotCurrentActor { .. } => "turn_not_current_actor",
            Self::AlreadyActed { .. } => "turn_already_acted",
            Self::AlreadyDelayed { .. } => "turn_already_delayed",
            Self::RankNotLater { .. } => "turn_rank_not_later",
            Self::NotInOrder { .. } => "turn_not_in_order",
            Self::MajorAlreadySpent { .. } => "turn_major_already_spent",
            Self::NoCombatants => "turn_no_combatants",
            Self::Store(inner) => inner.error_code(),
            Self::Track(inner) => inner.error_code(),
        }
    }
}

/// One slot of the round's initiative order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitiativeEntry {
    pub actor: EntityId,
    pub initiative: i32,
    /// Seeded d10 used to break initiative ties.
    pub tiebreak: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoundStart {
    pub round: Round,
    pub order: Vec<InitiativeEntry>,
    /// Conditions that ran out when the previous round ended.
    pub expired: Vec<ConditionChange>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnStart {
    pub actor: EntityId,
    pub budget: ActionBudget,
    /// A pending stun was served; the turn is lost.
    pub stunned: bool,
    /// Poison damage taken as the turn began.
    pub poison: Option<(u32, TrackOutcome)>,
}

impl TurnStart {
    /// Whether the actor can still do anything this turn.
    pub fn can_act(&self) -> bool {
        !self.stunned && !self.poison.is_some_and(|(_, outcome)| outcome.destroyed)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TurnSequencer {
    round: Round,
    order: Vec<InitiativeEntry>,
    /// Index of the next slot to hand out.
    cursor: usize,
    current: Option<EntityId>,
    delayed: BTreeSet<EntityId>,
    /// Skipping the rest of this round; they get a bonus on the next roll.
    skipping: BTreeSet<EntityId>,
}

impl TurnSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn round(&self) -> Round {
        self.round
    }

    pub fn current(&self) -> Option<EntityId> {
        self.current
    }

    pub fn order(&self) -> &[InitiativeEntry] {
        &self.order
    }

    /// Slots not yet handed out this round.
    pub fn remaining(&self) -> &[InitiativeEntry] {
        &self.order[self.cursor.min(self.order.len())..]
    }

    pub fn is_round_over(&self) -> bool {
        self.current.is_none() && self.cursor >= self.order.len()
    }

    /// Closes the previous round, ticks every ledger, resets reaction tallies
    /// and rolls the new initiative order.
    pub fn start_round(
        &mut self,
        store: &mut EntityStore,
        dice: &mut dyn DiceSource,
        config: &CombatConfig,
    ) -> Result<RoundStart, TurnError> {
        let mut expired = Vec::new();
        if self.round > Round::ZERO {
            for combatant in store.iter_mut() {
                expired.extend(combatant.tick_conditions(self.round));
            }
        }
        self.round = self.round.next();

        let bonus_for = std::mem::take(&mut self.skipping);
        self.delayed.clear();
        self.cursor = 0;
        self.current = None;

        let mut order = Vec::new();
        for combatant in store.iter_mut() {
            combatant.reactions = ReactionTally::default();
            combatant.budget = ActionBudget::exhausted();
            if combatant.is_destroyed() {
                continue;
            }
            let bonus = if bonus_for.contains(&combatant.id) {
                config.skip_initiative_bonus
            } else {
                0
            };
            order.push(InitiativeEntry {
                actor: combatant.id,
                initiative: combatant.stats.initiative
                    + combatant.conditions.net(ModifierKind::Initiative)
                    + bonus,
                tiebreak: dice.roll_d10(),
            });
        }
        if order.is_empty() {
            return Err(TurnError::NoCombatants);
        }
        order.sort_by(|a, b| {
            b.initiative
                .cmp(&a.initiative)
                .then(b.tiebreak.cmp(&a.tiebreak))
                .then(a.actor.cmp(&b.actor))
        });
        self.order = order;

        Ok(RoundStart {
            round: self.round,
            order: self.order.clone(),
            expired,
        })
    }

    /// Hands the turn to the next living, non-skipping combatant. `None` once
    /// the round is exhausted.
    pub fn next_turn(&mut self, store: &EntityStore) -> Option<EntityId> {
        self.current = None;
        while let Some(entry) = self.order.get(self.cursor) {
            self.cursor += 1;
            let alive = store.get(entry.actor).is_some_and(|c| !c.is_destroyed());
            if alive && !self.skipping.contains(&entry.actor) {
                self.current = Some(entry.actor);
                return self.current;
            }
        }
        None
    }

    /// Sets up the current actor's budget and applies start-of-turn effects.
    pub fn begin_turn(&self, store: &mut EntityStore) -> Result<TurnStart, TurnError> {
        let actor = self.current.ok_or(TurnError::NoTurnActive)?;
        let combatant = store.require_mut(actor)?;

        let mut budget = ActionBudget::fresh();
        if combatant.conditions.has_status(StatusKind::Handicapped) {
            budget.remove(ActionBudget::MAJOR | ActionBudget::MINOR);
        }
        if combatant.conditions.has_status(StatusKind::Immobilized) {
            budget.remove(ActionBudget::FREE_MOVE);
        }
        if combatant.reactions.forgo_major {
            budget.remove(ActionBudget::MAJOR);
        }

        let mut poison = None;
        if let Some(delta) = combatant
            .conditions
            .status(StatusKind::Poisoned)
            .map(|c| c.delta.max(0) as u32)
            .filter(|&d| d > 0)
        {
            let outcome = combatant.health.apply(Severity::Superficial, delta)?;
            poison = Some((delta, outcome));
        }

        let stunned = combatant.injuries.serve_stun();
        if stunned || combatant.is_destroyed() {
            budget = ActionBudget::exhausted();
        }
        combatant.budget = budget;

        Ok(TurnStart {
            actor,
            budget,
            stunned,
            poison,
        })
    }

    /// Finishes the current actor's turn.
    pub fn end_turn(&mut self, actor: EntityId, store: &mut EntityStore) -> Result<(), TurnError> {
        self.require_current(actor)?;
        store.require_mut(actor)?.budget = ActionBudget::exhausted();
        self.current = None;
        Ok(())
    }

    /// Moves the current actor to a later rank of this round. Delayers who
    /// pick the same rank keep the order in which they delayed.
    pub fn delay(
        &mut self,
        actor: EntityId,
        rank: i32,
        store: &EntityStore,
    ) -> Result<(), TurnError> {
        self.require_current(actor)?;
        if !store.require(actor)?.budget.is_untouched() {
            return Err(TurnError::AlreadyActed { actor });
        }
        if self.delayed.contains(&actor) {
            return Err(TurnError::AlreadyDelayed { actor });
        }
        let index = self.cursor - 1;
        let current = self.order[index].initiative;
        if rank >= current {
            return Err(TurnError::RankNotLater { rank, current });
        }

        let mut entry = self.order.remove(index);
        self.cursor -= 1;
        entry.initiative = rank;
        let insert_at = self.order[self.cursor..]
            .iter()
            .position(|e| e.initiative < rank)
            .map_or(self.order.len(), |offset| self.cursor + offset);
        self.order.insert(insert_at, entry);

        self.delayed.insert(actor);
        self.current = None;
        Ok(())
    }

    /// Gives up the rest of this round for an initiative bonus next round.
    /// Allowed for the current actor before acting, or for anyone whose slot
    /// is still ahead.
    pub fn skip_round(&mut self, actor: EntityId, store: &EntityStore) -> Result<(), TurnError> {
        if self.current == Some(actor) {
            if !store.require(actor)?.budget.is_untouched() {
                return Err(TurnError::AlreadyActed { actor });
            }
            self.current = None;
        } else if !self.remaining().iter().any(|e| e.actor == actor) {
            return Err(TurnError::NotInOrder { actor });
        }
        self.skipping.insert(actor);
        Ok(())
    }

    /// Gives up the major action this round to waive extra reaction penalties.
    pub fn forgo_major(&self, actor: EntityId, store: &mut EntityStore) -> Result<(), TurnError> {
        let combatant = store.require_mut(actor)?;
        if combatant.reactions.major_spent {
            return Err(TurnError::MajorAlreadySpent { actor });
        }
        combatant.reactions.forgo_major = true;
        combatant.budget.remove(ActionBudget::MAJOR);
        Ok(())
    }

    fn require_current(&self, actor: EntityId) -> Result<(), TurnError> {
        match self.current {
            Some(current) if current == actor => Ok(()),
            Some(_) => Err(TurnError::NotCurrentActor { actor }),
            None => Err(TurnError::NoTurnActive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{ConditionSpec, Duration};
    use crate::dice::FixedDice;
    use crate::state::{CombatStats, CombatantSpec, InjuryKind, Position, TeamId, Weapon};

    fn store(initiatives: &[i32]) -> EntityStore {
        let config = CombatConfig::default();
        let mut store = EntityStore::new();
        for (i, &initiative) in initiatives.iter().enumerate() {
            let combatant = CombatantSpec {
                id: EntityId(i as u32 + 1),
                name: format!("c{}", i + 1),
                team: TeamId((i % 2) as u8),
                position: Position::new(i as i32, 0),
                stats: CombatStats {
                    initiative,
                    ..CombatStats::default()
                },
                weapon: Weapon::fists(),
                armor: Default::default(),
            }
            .build(&config);
            store.insert(combatant).unwrap();
        }
        store
    }

    fn actors(order: &[InitiativeEntry]) -> Vec<u32> {
        order.iter().map(|e| e.actor.0).collect()
    }

    #[test]
    fn initiative_ties_break_by_seeded_die_then_id() {
        let mut store = store(&[3, 5, 3, 3]);
        let mut sequencer = TurnSequencer::new();
        // Tiebreak dice in id order: 1 -> 4, 2 -> 1, 3 -> 9, 4 -> 4.
        let mut dice = FixedDice::new([4, 1, 9, 4]);

        let start = sequencer
            .start_round(&mut store, &mut dice, &CombatConfig::default())
            .unwrap();

        assert_eq!(start.round, Round(1));
        assert_eq!(actors(&start.order), vec![2, 3, 1, 4]);
    }

    #[test]
    fn turns_follow_the_order_and_skip_the_destroyed() {
        let mut store = store(&[9, 5, 1]);
        let mut sequencer = TurnSequencer::new();
        sequencer
            .start_round(&mut store, &mut FixedDice::default(), &CombatConfig::default())
            .unwrap();
        store.get_mut(EntityId(2)).unwrap().health.collapse();

        assert_eq!(sequencer.next_turn(&store), Some(EntityId(1)));
        sequencer.end_turn(EntityId(1), &mut store).unwrap();
        assert_eq!(sequencer.next_turn(&store), Some(EntityId(3)));
        sequencer.end_turn(EntityId(3), &mut store).unwrap();
        assert_eq!(sequencer.next_turn(&store), None);
        assert!(sequencer.is_round_over());
    }

    #[test]
    fn delayed_actors_keep_declaration_order_at_the_same_rank() {
        let mut store = store(&[9, 8, 5, 2]);
        let mut sequencer = TurnSequencer::new();
        sequencer
            .start_round(&mut store, &mut FixedDice::default(), &CombatConfig::default())
            .unwrap();

        sequencer.next_turn(&store);
        sequencer.begin_turn(&mut store).unwrap();
        sequencer.delay(EntityId(1), 5, &store).unwrap();

        assert_eq!(sequencer.next_turn(&store), Some(EntityId(2)));
        sequencer.begin_turn(&mut store).unwrap();
        sequencer.delay(EntityId(2), 5, &store).unwrap();

        let mut seen = Vec::new();
        while let Some(actor) = sequencer.next_turn(&store) {
            seen.push(actor.0);
            sequencer.end_turn(actor, &mut store).unwrap();
        }
        assert_eq!(seen, vec![3, 1, 2, 4]);
    }

    #[test]
    fn delay_must_pick_a_later_rank() {
        let mut store = store(&[5]);
        let mut sequencer = TurnSequencer::new();
        sequencer
            .start_round(&mut store, &mut FixedDice::default(), &CombatConfig::default())
            .unwrap();
        sequencer.next_turn(&store);
        sequencer.begin_turn(&mut store).unwrap();

        assert_eq!(
            sequencer.delay(EntityId(1), 5, &store),
            Err(TurnError::RankNotLater { rank: 5, current: 5 })
        );
    }

    #[test]
    fn skipping_grants_a_one_round_bonus() {
        let mut store = store(&[5, 5]);
        let config = CombatConfig::default();
        let mut sequencer = TurnSequencer::new();
        sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        sequencer.skip_round(EntityId(2), &store).unwrap();

        assert_eq!(sequencer.next_turn(&store), Some(EntityId(1)));
        sequencer.end_turn(EntityId(1), &mut store).unwrap();
        assert_eq!(sequencer.next_turn(&store), None);

        let second = sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        assert_eq!(second.order[0].actor, EntityId(2));
        assert_eq!(second.order[0].initiative, 6);

        let third = sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        assert!(third.order.iter().all(|e| e.initiative == 5));
    }

    #[test]
    fn new_round_ticks_conditions() {
        let mut store = store(&[5]);
        let haste =
            ConditionSpec::modifier("Haste", ModifierKind::Initiative, 3, Duration::Rounds(1));
        store.get_mut(EntityId(1)).unwrap().apply_condition(haste).unwrap();
        let config = CombatConfig::default();
        let mut sequencer = TurnSequencer::new();

        let first = sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        assert_eq!(first.order[0].initiative, 8);
        assert!(first.expired.is_empty());

        let second = sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        assert_eq!(second.expired.len(), 1);
        assert_eq!(second.order[0].initiative, 5);
    }

    #[test]
    fn statuses_shape_the_budget() {
        let mut store = store(&[5]);
        let combatant = store.get_mut(EntityId(1)).unwrap();
        let chains =
            ConditionSpec::status("Chains", StatusKind::Handicapped, 0, Duration::Rounds(2));
        let venom = ConditionSpec::status("Venom", StatusKind::Poisoned, 2, Duration::Rounds(2));
        combatant.apply_condition(chains).unwrap();
        combatant.apply_condition(venom).unwrap();
        let mut sequencer = TurnSequencer::new();
        sequencer
            .start_round(&mut store, &mut FixedDice::default(), &CombatConfig::default())
            .unwrap();
        sequencer.next_turn(&store);

        let start = sequencer.begin_turn(&mut store).unwrap();
        assert_eq!(start.budget, ActionBudget::FREE_MOVE);
        assert_eq!(start.poison.map(|(amount, _)| amount), Some(2));
        assert_eq!(store.health(EntityId(1)).unwrap().superficial(), 2);
    }

    #[test]
    fn stun_costs_exactly_one_turn() {
        let mut store = store(&[5]);
        store.get_mut(EntityId(1)).unwrap().injuries.push(crate::state::Injury {
            kind: InjuryKind::Stunned,
            roll: 3,
            total: 3,
            inflicted: Round(1),
            served: false,
        });
        let config = CombatConfig::default();
        let mut sequencer = TurnSequencer::new();

        sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        sequencer.next_turn(&store);
        let start = sequencer.begin_turn(&mut store).unwrap();
        assert!(start.stunned);
        assert!(!start.can_act());
        sequencer.end_turn(EntityId(1), &mut store).unwrap();

        sequencer.start_round(&mut store, &mut FixedDice::default(), &config).unwrap();
        sequencer.next_turn(&store);
        assert!(sequencer.begin_turn(&mut store).unwrap().can_act());
    }

    #[test]
    fn forgoing_major_is_refused_once_it_was_spent() {
        let mut store = store(&[5]);
        let sequencer = TurnSequencer::new();
        store.get_mut(EntityId(1)).unwrap().reactions.major_spent = true;
        assert_eq!(
            sequencer.forgo_major(EntityId(1), &mut store),
            Err(TurnError::MajorAlreadySpent { actor: EntityId(1) })
        );
    }
}
