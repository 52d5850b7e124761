//! Static combat ratings and equipment of a combatant.

use crate::combat::{DamageCategory, Severity, WeaponClass};

/// Ratings a combatant brings into battle. Pools are dice counts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatStats {
    /// Base initiative before conditions and skip bonuses.
    pub initiative: i32,
    pub melee: u32,
    pub ranged: u32,
    pub dodge: u32,
    pub parry: u32,
    pub absorb: u32,
    /// Resistance rating checked by the high-resistance downgrade.
    pub resistance: u32,
    /// Hunger dice folded into every pool.
    pub hunger: u32,
    /// Added to the base health capacity.
    pub stamina: u32,
    /// Added to the base willpower capacity.
    pub resolve: u32,
    /// Tiles covered by the free move.
    pub speed: u32,
    /// Tiles covered by a sprint.
    pub sprint: u32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Weapon {
    pub name: String,
    pub class: WeaponClass,
    pub bonus: u32,
    pub severity: Severity,
    pub category: DamageCategory,
    /// Range increment in tiles. Close weapons reach adjacent tiles only.
    pub range: u32,
    /// `None` means the weapon never runs out.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ammunition: Option<u32>,
}

impl Weapon {
    pub const MAX_RANGE_INCREMENTS: u32 = 4;

    pub fn fists() -> Self {
        Self {
            name: "fists".into(),
            class: WeaponClass::Brawl,
            bonus: 0,
            severity: Severity::Superficial,
            category: DamageCategory::Physical,
            range: 1,
            ammunition: None,
        }
    }

    /// Range increments a shot at `distance` spans, or `None` when out of
    /// range. Close weapons only reach adjacent tiles.
    pub fn increments(&self, distance: u32) -> Option<u32> {
        if self.class.is_close() {
            return (distance <= 1).then_some(1);
        }
        let range = self.range.max(1);
        let increments = distance.div_ceil(range).max(1);
        (increments <= Self::MAX_RANGE_INCREMENTS).then_some(increments)
    }

    pub fn has_ammunition(&self, needed: u32) -> bool {
        self.ammunition.is_none_or(|left| left >= needed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pistol() -> Weapon {
        Weapon {
            name: "pistol".into(),
            class: WeaponClass::Ranged,
            bonus: 2,
            severity: Severity::Superficial,
            category: DamageCategory::Physical,
            range: 5,
            ammunition: Some(1),
        }
    }

    #[test]
    fn ranged_increments() {
        let gun = pistol();
        assert_eq!(gun.increments(3), Some(1));
        assert_eq!(gun.increments(6), Some(2));
        assert_eq!(gun.increments(20), Some(4));
        assert_eq!(gun.increments(21), None);
    }

    #[test]
    fn close_weapons_reach_adjacent_only() {
        let fists = Weapon::fists();
        assert_eq!(fists.increments(1), Some(1));
        assert_eq!(fists.increments(2), None);
    }

    #[test]
    fn ammunition_check() {
        assert!(pistol().has_ammunition(1));
        assert!(!pistol().has_ammunition(2));
        assert!(Weapon::fists().has_ammunition(100));
    }
}
