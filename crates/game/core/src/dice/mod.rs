//! Dice resolution engine.
//!
//! Pools of ten-sided dice: faces 6-10 succeed, every unordered pair of tens
//! adds two bonus successes, and hunger dice raise informational bestial flags.
mod opposed;
mod pool;
mod source;

pub use opposed::{OpposedOutcome, Side, TieBreak, compare_totals, resolve_opposed, roll_opposed};
pub use pool::{DicePool, RollOutcome};
pub use source::{DiceSource, FixedDice, SeededDice};

use crate::error::{CombatError, ErrorSeverity};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiceError {
    #[error("die face {face} is outside 1..=10")]
    FaceOutOfRange { face: u8 },

    #[error("{hunger} hunger dice requested from a pool of {size}")]
    HungerExceedsPool { hunger: u32, size: u32 },
}

impl CombatError for DiceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::FaceOutOfRange { .. } => "dice_face_out_of_range",
            Self::HungerExceedsPool { .. } => "dice_hunger_exceeds_pool",
        }
    }
}

#[cfg(test)]
mod properties {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn margin_and_success_follow_totals(
            faces in prop::collection::vec(1_u8..=10, 0..12),
            difficulty in 0_u32..8,
        ) {
            let roll = RollOutcome::from_faces(faces, 0, difficulty).unwrap();
            let total = roll.total();

            prop_assert_eq!(roll.margin(), total.saturating_sub(difficulty + 1));
            prop_assert_eq!(roll.is_success(), total >= difficulty);
            prop_assert!(roll.total() >= roll.successes());
        }

        #[test]
        fn critical_requires_success_and_a_pair(
            faces in prop::collection::vec(1_u8..=10, 0..12),
            difficulty in 0_u32..8,
        ) {
            let tens = faces.iter().filter(|&&f| f == 10).count();
            let roll = RollOutcome::from_faces(faces, 0, difficulty).unwrap();
            prop_assert_eq!(roll.is_critical(), roll.is_success() && tens >= 2);
        }

        #[test]
        fn seeded_rolls_are_reproducible(seed in 1_u64..10_000, size in 0_i32..10) {
            let pool = DicePool::new(size, 1);
            let a = pool.roll(&mut SeededDice::new(seed));
            let b = pool.roll(&mut SeededDice::new(seed));
            prop_assert_eq!(a, b);
        }
    }
}
