use super::{DicePool, DiceSource, RollOutcome};

/// Who wins an opposed roll when both totals are equal.
///
/// The engine never assumes a tie rule; every call site passes one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TieBreak {
    /// A tie has no winner, which is a failure for the initiator.
    #[default]
    NoWinner,
    Initiator,
    Opponent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Side {
    Initiator,
    Opponent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OpposedOutcome {
    pub initiator: RollOutcome,
    pub opponent: RollOutcome,
    pub winner: Option<Side>,
    /// Winner total minus loser total.
    pub win_margin: u32,
    /// Winner total measured against the loser's total as difficulty:
    /// `winner - (loser + 1)`, floored at zero.
    pub margin: u32,
}

impl OpposedOutcome {
    pub fn initiator_wins(&self) -> bool {
        self.winner == Some(Side::Initiator)
    }
}

/// Winner of two totals under `tie_break`.
pub fn compare_totals(initiator: u32, opponent: u32, tie_break: TieBreak) -> Option<Side> {
    match initiator.cmp(&opponent) {
        std::cmp::Ordering::Greater => Some(Side::Initiator),
        std::cmp::Ordering::Less => Some(Side::Opponent),
        std::cmp::Ordering::Equal => match tie_break {
            TieBreak::NoWinner => None,
            TieBreak::Initiator => Some(Side::Initiator),
            TieBreak::Opponent => Some(Side::Opponent),
        },
    }
}

/// Compares two independent rolls.
pub fn resolve_opposed(
    initiator: RollOutcome,
    opponent: RollOutcome,
    tie_break: TieBreak,
) -> OpposedOutcome {
    let (mine, theirs) = (initiator.total(), opponent.total());
    let winner = compare_totals(mine, theirs, tie_break);
    let (win, lose) = match winner {
        Some(Side::Initiator) => (mine, theirs),
        Some(Side::Opponent) => (theirs, mine),
        None => (mine, theirs),
    };
    let (win_margin, margin) = if winner.is_some() {
        (win - lose, win.saturating_sub(lose + 1))
    } else {
        (0, 0)
    };

    OpposedOutcome {
        initiator,
        opponent,
        winner,
        win_margin,
        margin,
    }
}

/// Rolls both pools (initiator first) and compares them.
pub fn roll_opposed(
    initiator: &DicePool,
    opponent: &DicePool,
    dice: &mut dyn DiceSource,
    tie_break: TieBreak,
) -> OpposedOutcome {
    let first = initiator.roll(dice);
    let second = opponent.roll(dice);
    resolve_opposed(first, second, tie_break)
}
