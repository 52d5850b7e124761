//! Battle state: identifiers, tracks, action economy and the entity store.
mod budget;
mod common;
mod health;
mod injury;
mod stats;
mod store;

pub use budget::{ActionBudget, ActionSlot, ReactionTally};
pub use common::{EntityId, Position, Round, TeamId};
pub use health::{BoxState, ClearedMarks, HealthTrack, TrackError, TrackKind, TrackOutcome};
pub use injury::{Injuries, Injury, InjuryKind};
pub use stats::{CombatStats, Weapon};
pub use store::{Combatant, CombatantSpec, EntityStore, PoolBreakdown, PoolKind, StoreError};
