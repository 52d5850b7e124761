//! Per-turn action economy and per-round reaction accounting.

/// Slot an action draws from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ActionSlot {
    Major,
    Minor,
    /// The free simple move.
    FreeMove,
    /// Major + minor + free move spent together.
    Sprint,
    /// Declared during another actor's action.
    Reaction,
}

bitflags::bitflags! {
    /// Slots still available to the acting combatant this turn.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct ActionBudget: u8 {
        const MAJOR     = 1 << 0;
        const MINOR     = 1 << 1;
        const FREE_MOVE = 1 << 2;
    }
}

impl ActionBudget {
    pub const fn fresh() -> Self {
        Self::all()
    }

    pub const fn exhausted() -> Self {
        Self::empty()
    }

    /// Nothing has been spent this turn.
    pub fn is_untouched(&self) -> bool {
        self.is_all()
    }

    /// No slot is left for an action of the actor's own.
    pub fn is_spent(&self) -> bool {
        self.is_empty()
    }

    fn flags_for(slot: ActionSlot) -> Self {
        match slot {
            ActionSlot::Major => Self::MAJOR,
            ActionSlot::Minor => Self::MINOR,
            ActionSlot::FreeMove => Self::FREE_MOVE,
            ActionSlot::Sprint => Self::all(),
            ActionSlot::Reaction => Self::empty(),
        }
    }

    pub fn can_afford(&self, slot: ActionSlot) -> bool {
        // Reactions are paid from the round tally, not the turn budget.
        slot != ActionSlot::Reaction && self.contains(Self::flags_for(slot))
    }

    /// Spends `slot`. Callers check [`can_afford`](Self::can_afford) first;
    /// spending an unavailable slot returns false and changes nothing.
    pub fn spend(&mut self, slot: ActionSlot) -> bool {
        if !self.can_afford(slot) {
            return false;
        }
        self.remove(Self::flags_for(slot));
        true
    }
}

impl Default for ActionBudget {
    fn default() -> Self {
        Self::fresh()
    }
}

/// Reactions declared by one combatant during the current round.
///
/// The first reaction of a round is free. Each later one adds one difficulty
/// and removes one die per reaction beyond the first, unless the combatant
/// forwent their major action this round.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ReactionTally {
    pub declared: u32,
    pub forgo_major: bool,
    /// Set once the major slot is spent on the combatant's own turn.
    pub major_spent: bool,
}

impl ReactionTally {
    /// Penalty the next declared reaction would carry (difficulty and dice).
    pub fn next_penalty(&self) -> u32 {
        if self.forgo_major { 0 } else { self.declared }
    }

    /// Records a declared reaction and returns the penalty it carries.
    pub fn record(&mut self) -> u32 {
        let penalty = self.next_penalty();
        self.declared += 1;
        penalty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprint_requires_every_movement_slot() {
        let mut budget = ActionBudget::fresh();
        assert!(budget.can_afford(ActionSlot::Sprint));

        assert!(budget.spend(ActionSlot::Minor));
        assert!(!budget.can_afford(ActionSlot::Sprint));
        assert!(!budget.spend(ActionSlot::Sprint));
        assert!(budget.contains(ActionBudget::MAJOR));
    }

    #[test]
    fn sprint_consumes_major_minor_and_move() {
        let mut budget = ActionBudget::fresh();
        assert!(budget.spend(ActionSlot::Sprint));
        assert_eq!(budget, ActionBudget::exhausted());
        assert!(budget.is_spent());
    }

    #[test]
    fn reactions_never_draw_on_the_turn_budget() {
        let mut budget = ActionBudget::fresh();
        assert!(!budget.can_afford(ActionSlot::Reaction));
        assert!(!budget.spend(ActionSlot::Reaction));
        assert!(budget.is_untouched());
    }

    #[test]
    fn reaction_penalty_grows_per_extra_reaction() {
        let mut tally = ReactionTally::default();
        assert_eq!(tally.record(), 0);
        assert_eq!(tally.record(), 1);
        assert_eq!(tally.record(), 2);
    }

    #[test]
    fn forgoing_major_waives_reaction_penalty() {
        let mut tally = ReactionTally::default();
        tally.record();
        tally.forgo_major = true;
        assert_eq!(tally.record(), 0);
    }
}
