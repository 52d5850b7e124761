use crate::config::CombatConfig;
use crate::dice::DiceSource;
use crate::state::{Injury, InjuryKind, Round};

/// Rolls the critical injury table: one die plus the aggravated boxes
/// already on the track.
pub fn roll_critical_injury(dice: &mut dyn DiceSource, aggravated: u32, round: Round) -> Injury {
    let roll = dice.roll_d10().clamp(1, CombatConfig::DIE_FACES);
    let total = roll as u32 + aggravated;
    Injury {
        kind: InjuryKind::from_total(total),
        roll,
        total,
        inflicted: round,
        served: false,
    }
}
