//! Dice pools and the outcome of rolling one.

use tracing::debug;

use super::{DiceError, DiceSource};
use crate::config::CombatConfig;

/// A pool of ten-sided dice checked against a difficulty.
///
/// The last `hunger` dice of the pool are hunger dice: their 1s and 10s raise
/// the bestial flags on the outcome but count exactly like ordinary dice.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DicePool {
    size: u32,
    difficulty: u32,
    hunger: u32,
    malformed: bool,
}

impl DicePool {
    /// Builds a pool from a possibly negative computed size.
    ///
    /// A negative size is clamped to zero and the pool is flagged malformed;
    /// rolling it is an automatic failure.
    pub fn new(size: i32, difficulty: u32) -> Self {
        let malformed = size < 0;
        if malformed {
            debug!(target: "core::dice", size, difficulty, "negative pool clamped to zero");
        }
        Self {
            size: size.max(0) as u32,
            difficulty,
            hunger: 0,
            malformed,
        }
    }

    /// Marks up to `hunger` dice of the pool as hunger dice.
    #[must_use]
    pub fn with_hunger(mut self, hunger: u32) -> Self {
        self.hunger = hunger.min(self.size);
        self
    }

    #[must_use]
    pub fn with_difficulty(mut self, difficulty: u32) -> Self {
        self.difficulty = difficulty;
        self
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    pub fn hunger(&self) -> u32 {
        self.hunger
    }

    pub fn ordinary(&self) -> u32 {
        self.size - self.hunger
    }

    pub fn is_malformed(&self) -> bool {
        self.malformed
    }

    pub fn roll(&self, dice: &mut dyn DiceSource) -> RollOutcome {
        if self.malformed {
            return RollOutcome::automatic_failure(self.difficulty);
        }
        let faces = dice.roll_many(self.size);
        RollOutcome::evaluate(faces, self.hunger, self.difficulty)
    }
}

/// Result of one roll. Every derived figure is computed once, at creation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RollOutcome {
    faces: Vec<u8>,
    hunger_dice: u32,
    difficulty: u32,
    successes: u32,
    critical_bonus: u32,
    margin: u32,
    success: bool,
    critical: bool,
    bestial_failure: bool,
    bestial_success: bool,
}

impl RollOutcome {
    /// Evaluates already-rolled faces. The last `hunger_dice` faces are the
    /// hunger dice.
    pub fn from_faces(
        faces: Vec<u8>,
        hunger_dice: u32,
        difficulty: u32,
    ) -> Result<Self, DiceError> {
        if let Some(&face) = faces
            .iter()
            .find(|&&f| f == 0 || f > CombatConfig::DIE_FACES)
        {
            return Err(DiceError::FaceOutOfRange { face });
        }
        if hunger_dice as usize > faces.len() {
            return Err(DiceError::HungerExceedsPool {
                hunger: hunger_dice,
                size: faces.len() as u32,
            });
        }
        Ok(Self::evaluate(faces, hunger_dice, difficulty))
    }

    /// Outcome of a malformed pool: no dice, no successes, never a success.
    pub fn automatic_failure(difficulty: u32) -> Self {
        Self {
            faces: Vec::new(),
            hunger_dice: 0,
            difficulty,
            successes: 0,
            critical_bonus: 0,
            margin: 0,
            success: false,
            critical: false,
            bestial_failure: false,
            bestial_success: false,
        }
    }

    fn evaluate(faces: Vec<u8>, hunger_dice: u32, difficulty: u32) -> Self {
        let successes = faces
            .iter()
            .filter(|&&f| f >= CombatConfig::SUCCESS_FACE)
            .count() as u32;
        let criticals = faces
            .iter()
            .filter(|&&f| f == CombatConfig::CRITICAL_FACE)
            .count() as u32;
        // n tens form n * (n - 1) / 2 unordered pairs.
        let pairs = criticals * criticals.saturating_sub(1) / 2;
        let critical_bonus = pairs * CombatConfig::CRITICAL_PAIR_BONUS;

        let total = successes + critical_bonus;
        let success = total >= difficulty;
        let margin = total.saturating_sub(difficulty + 1);

        let hunger_start = faces.len() - hunger_dice as usize;
        let hunger = &faces[hunger_start..];
        let bestial_failure =
            !success && hunger.contains(&CombatConfig::BESTIAL_FAILURE_FACE);
        let bestial_success = success && hunger.contains(&CombatConfig::CRITICAL_FACE);

        Self {
            faces,
            hunger_dice,
            difficulty,
            successes,
            critical_bonus,
            margin,
            success,
            critical: success && pairs > 0,
            bestial_failure,
            bestial_success,
        }
    }

    pub fn faces(&self) -> &[u8] {
        &self.faces
    }

    pub fn hunger_faces(&self) -> &[u8] {
        &self.faces[self.faces.len() - self.hunger_dice as usize..]
    }

    pub fn difficulty(&self) -> u32 {
        self.difficulty
    }

    /// Dice showing a success face, before critical pair bonuses.
    pub fn successes(&self) -> u32 {
        self.successes
    }

    /// Bonus successes from pairs of tens.
    pub fn critical_bonus(&self) -> u32 {
        self.critical_bonus
    }

    /// Successes including critical pair bonuses.
    pub fn total(&self) -> u32 {
        self.successes + self.critical_bonus
    }

    pub fn margin(&self) -> u32 {
        self.margin
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_critical(&self) -> bool {
        self.critical
    }

    pub fn is_bestial_failure(&self) -> bool {
        self.bestial_failure
    }

    pub fn is_bestial_success(&self) -> bool {
        self.bestial_success
    }
}
