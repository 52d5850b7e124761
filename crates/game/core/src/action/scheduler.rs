//! Cost reservation and the pending-action queue.

use std::collections::VecDeque;
use std::fmt;

use super::{ActionCost, InvalidIntent, ValidatedIntent};
use crate::error::{CombatError, ErrorSeverity};
use crate::state::{ActionSlot, EntityId, EntityStore, TrackError};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReservationId(pub u64);

impl fmt::Display for ReservationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Proof that an actor's cost was paid for one queued action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Reservation {
    pub id: ReservationId,
    pub actor: EntityId,
    pub cost: ActionCost,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QueuedAction {
    pub reservation: Reservation,
    pub intent: ValidatedIntent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Enqueued {
    pub reservation: Reservation,
    /// Zero-based position in the queue after insertion.
    pub position: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScheduleError {
    #[error(transparent)]
    Rejected(#[from] InvalidIntent),

    #[error("reservation {0} is not queued")]
    UnknownReservation(ReservationId),

    #[error(transparent)]
    Track(#[from] TrackError),
}

impl CombatError for ScheduleError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Rejected(inner) => inner.severity(),
            Self::UnknownReservation(_) => ErrorSeverity::Internal,
            Self::Track(inner) => inner.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Rejected(inner) => inner.error_code(),
            Self::UnknownReservation(_) => "schedule_unknown_reservation",
            Self::Track(inner) => inner.error_code(),
        }
    }
}

/// FIFO queue of validated intents whose costs are already paid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ActionScheduler {
    queue: VecDeque<QueuedAction>,
    next_id: u64,
}

impl ActionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the intent's cost and enqueues it.
    ///
    /// All-or-nothing: every resource is checked before any is spent, so a
    /// rejection leaves the actor untouched.
    pub fn reserve(
        &mut self,
        intent: ValidatedIntent,
        store: &mut EntityStore,
    ) -> Result<Enqueued, ScheduleError> {
        let cost = intent.intent().cost;
        let actor = store
            .get_mut(intent.actor())
            .ok_or(InvalidIntent::UnknownActor { actor: intent.actor() })?;

        if !actor.budget.can_afford(cost.slot) {
            return Err(InvalidIntent::SlotUnavailable { slot: cost.slot }.into());
        }
        let available = actor.willpower.unmarked();
        if available < cost.willpower {
            return Err(InvalidIntent::InsufficientWillpower {
                needed: cost.willpower,
                available,
            }
            .into());
        }
        if cost.ammunition > 0 && !actor.weapon.has_ammunition(cost.ammunition) {
            return Err(InvalidIntent::OutOfAmmunition.into());
        }

        if cost.willpower > 0 {
            actor.spend_willpower(cost.willpower)?;
        }
        actor.budget.spend(cost.slot);
        if matches!(cost.slot, ActionSlot::Major | ActionSlot::Sprint) {
            actor.reactions.major_spent = true;
        }
        if let Some(left) = actor.weapon.ammunition.as_mut() {
            *left -= cost.ammunition;
        }

        let reservation = Reservation {
            id: ReservationId(self.next_id),
            actor: intent.actor(),
            cost,
        };
        self.next_id += 1;
        self.queue.push_back(QueuedAction { reservation, intent });

        Ok(Enqueued {
            reservation,
            position: self.queue.len() - 1,
        })
    }

    /// Removes a queued action for execution.
    pub fn take(&mut self, id: ReservationId) -> Result<QueuedAction, ScheduleError> {
        let index = self
            .queue
            .iter()
            .position(|queued| queued.reservation.id == id)
            .ok_or(ScheduleError::UnknownReservation(id))?;
        self.queue
            .remove(index)
            .ok_or(ScheduleError::UnknownReservation(id))
    }

    pub fn get(&self, id: ReservationId) -> Option<&QueuedAction> {
        self.queue.iter().find(|queued| queued.reservation.id == id)
    }

    pub fn front(&self) -> Option<&QueuedAction> {
        self.queue.front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionIntent, FOCUS};
    use crate::config::CombatConfig;
    use crate::state::{ActionBudget, CombatStats, CombatantSpec, Position, TeamId, Weapon};

    fn store_with_actor() -> EntityStore {
        let mut combatant = CombatantSpec {
            id: EntityId(1),
            name: "solo".into(),
            team: TeamId(0),
            position: Position::ORIGIN,
            stats: CombatStats::default(),
            weapon: Weapon::fists(),
            armor: Default::default(),
        }
        .build(&CombatConfig::default());
        combatant.budget = ActionBudget::fresh();

        let mut store = EntityStore::new();
        store.insert(combatant).unwrap();
        store
    }

    fn focus() -> ValidatedIntent {
        let cost = ActionCost::slot(ActionSlot::Minor).with_willpower(1);
        ValidatedIntent::new(ActionIntent::new(EntityId(1), FOCUS, cost))
    }

    #[test]
    fn reserve_pays_every_cost() {
        let mut store = store_with_actor();
        let mut scheduler = ActionScheduler::new();

        let enqueued = scheduler.reserve(focus(), &mut store).unwrap();
        assert_eq!(enqueued.position, 0);

        let actor = store.get(EntityId(1)).unwrap();
        assert!(!actor.budget.contains(ActionBudget::MINOR));
        assert_eq!(actor.willpower.superficial(), 1);
        assert!(!actor.reactions.major_spent);
    }

    #[test]
    fn rejected_reservation_changes_nothing() {
        let mut store = store_with_actor();
        let mut scheduler = ActionScheduler::new();
        scheduler.reserve(focus(), &mut store).unwrap();
        let before = store.clone();

        let err = scheduler.reserve(focus(), &mut store).unwrap_err();
        assert_eq!(
            err,
            ScheduleError::Rejected(InvalidIntent::SlotUnavailable { slot: ActionSlot::Minor })
        );
        assert_eq!(store, before);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn take_is_by_reservation_id() {
        let mut store = store_with_actor();
        let mut scheduler = ActionScheduler::new();
        let enqueued = scheduler.reserve(focus(), &mut store).unwrap();

        assert_eq!(
            scheduler.take(ReservationId(7)),
            Err(ScheduleError::UnknownReservation(ReservationId(7)))
        );
        let queued = scheduler.take(enqueued.reservation.id).unwrap();
        assert_eq!(queued.reservation, enqueued.reservation);
        assert!(scheduler.is_empty());
    }
}
