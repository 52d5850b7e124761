use crate::dice::TieBreak;

/// Rules configuration and tunable parameters for one battle.
///
/// Every rule whose source material is ambiguous is a field here rather than
/// an assumption inside the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    /// Who wins an opposed roll when both sides score the same total.
    pub tie_break: TieBreak,
    /// Declarations after which a reaction window closes on its own.
    pub max_reaction_declarations: usize,
    /// Resistance rating at which aggravated hits are downgraded.
    pub downgrade_threshold: u32,
    /// Dice removed from a pool while the matching track is weakened.
    pub weakened_penalty: u32,
    /// When true, a weakened willpower track also penalises physical pools,
    /// on top of the health penalty.
    pub stack_weakened_penalties: bool,
    /// Initiative bonus granted for the round after a skipped round.
    pub skip_initiative_bonus: i32,
    pub damage_out_stage: ModifierStage,
    pub damage_in_stage: ModifierStage,
    /// Health capacity before the stamina rating is added.
    pub base_health: u32,
    /// Willpower capacity before the resolve rating is added.
    pub base_willpower: u32,
}

/// Where additive damage-out/damage-in modifiers enter the damage pipeline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ModifierStage {
    /// Added to the base amount, before resistance and soak.
    #[default]
    BeforeMitigation,
    /// Added after resistance and soak.
    AfterMitigation,
}

impl CombatConfig {
    // ===== compile-time constants used as type parameters =====
    pub const MAX_CONDITION_INSTANCES: usize = 32;
    pub const MAX_INJURIES: usize = 8;

    // ===== dice rules =====
    pub const DIE_FACES: u8 = 10;
    pub const SUCCESS_FACE: u8 = 6;
    pub const CRITICAL_FACE: u8 = 10;
    pub const BESTIAL_FAILURE_FACE: u8 = 1;
    /// Bonus successes granted for each unordered pair of critical faces.
    pub const CRITICAL_PAIR_BONUS: u32 = 2;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_REACTION_DECLARATIONS: usize = 4;
    pub const DEFAULT_DOWNGRADE_THRESHOLD: u32 = 2;
    pub const DEFAULT_WEAKENED_PENALTY: u32 = 2;
    pub const DEFAULT_SKIP_INITIATIVE_BONUS: i32 = 1;
    pub const DEFAULT_BASE_HEALTH: u32 = 3;
    pub const DEFAULT_BASE_WILLPOWER: u32 = 3;

    pub fn new() -> Self {
        Self {
            tie_break: TieBreak::default(),
            max_reaction_declarations: Self::DEFAULT_MAX_REACTION_DECLARATIONS,
            downgrade_threshold: Self::DEFAULT_DOWNGRADE_THRESHOLD,
            weakened_penalty: Self::DEFAULT_WEAKENED_PENALTY,
            stack_weakened_penalties: false,
            skip_initiative_bonus: Self::DEFAULT_SKIP_INITIATIVE_BONUS,
            damage_out_stage: ModifierStage::BeforeMitigation,
            damage_in_stage: ModifierStage::AfterMitigation,
            base_health: Self::DEFAULT_BASE_HEALTH,
            base_willpower: Self::DEFAULT_BASE_WILLPOWER,
        }
    }

    pub fn with_tie_break(mut self, tie_break: TieBreak) -> Self {
        self.tie_break = tie_break;
        self
    }

    pub fn with_max_reaction_declarations(mut self, max: usize) -> Self {
        self.max_reaction_declarations = max.max(1);
        self
    }
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self::new()
    }
}
