//! Damage vocabulary: severities, categories, weapon classes and packets.

use bitflags::bitflags;

use crate::state::TrackKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Severity {
    Superficial,
    Aggravated,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum DamageCategory {
    Physical,
    Fire,
    Gas,
    Magic,
    Cold,
    Electric,
    TrueFaith,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum WeaponClass {
    Brawl,
    Melee,
    Ranged,
    Thrown,
    Mental,
    Social,
    Special,
}

impl WeaponClass {
    /// Close-combat classes can be parried and absorbed.
    pub const fn is_close(self) -> bool {
        matches!(self, WeaponClass::Brawl | WeaponClass::Melee)
    }

    pub const fn is_ranged(self) -> bool {
        matches!(self, WeaponClass::Ranged | WeaponClass::Thrown)
    }

    pub const fn flag(self) -> WeaponClasses {
        match self {
            WeaponClass::Brawl => WeaponClasses::BRAWL,
            WeaponClass::Melee => WeaponClasses::MELEE,
            WeaponClass::Ranged => WeaponClasses::RANGED,
            WeaponClass::Thrown => WeaponClasses::THROWN,
            WeaponClass::Mental => WeaponClasses::MENTAL,
            WeaponClass::Social => WeaponClasses::SOCIAL,
            WeaponClass::Special => WeaponClasses::SPECIAL,
        }
    }
}

bitflags! {
    /// Set of weapon classes an armor protects against.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct WeaponClasses: u8 {
        const BRAWL = 1 << 0;
        const MELEE = 1 << 1;
        const RANGED = 1 << 2;
        const THROWN = 1 << 3;
        const MENTAL = 1 << 4;
        const SOCIAL = 1 << 5;
        const SPECIAL = 1 << 6;

        const PHYSICAL = Self::BRAWL.bits()
            | Self::MELEE.bits()
            | Self::RANGED.bits()
            | Self::THROWN.bits();
    }
}

bitflags! {
    /// Set of severities a soak applies to.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct Severities: u8 {
        const SUPERFICIAL = 1 << 0;
        const AGGRAVATED = 1 << 1;
    }
}

impl Severities {
    pub fn covers(self, severity: Severity) -> bool {
        match severity {
            Severity::Superficial => self.contains(Severities::SUPERFICIAL),
            Severity::Aggravated => self.contains(Severities::AGGRAVATED),
        }
    }
}

/// A single hit on its way into the damage pipeline.
///
/// Transient: built by the performer for one hit and dropped once applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamagePacket {
    pub severity: Severity,
    pub category: DamageCategory,
    pub weapon: WeaponClass,
    pub weapon_bonus: u32,
    /// Net successes of the attack over the defense.
    pub net_successes: u32,
    pub track: TrackKind,
}

impl DamagePacket {
    pub fn new(severity: Severity, category: DamageCategory, weapon: WeaponClass) -> Self {
        Self {
            severity,
            category,
            weapon,
            weapon_bonus: 0,
            net_successes: 0,
            track: TrackKind::Health,
        }
    }

    #[must_use]
    pub fn with_weapon_bonus(mut self, bonus: u32) -> Self {
        self.weapon_bonus = bonus;
        self
    }

    #[must_use]
    pub fn with_net_successes(mut self, net: u32) -> Self {
        self.net_successes = net;
        self
    }

    #[must_use]
    pub fn on_track(mut self, track: TrackKind) -> Self {
        self.track = track;
        self
    }

    /// `weapon_bonus + net_successes`.
    pub fn base_amount(&self) -> u32 {
        self.weapon_bonus + self.net_successes
    }

    /// `weapon_bonus + (net_successes - 1)`, used by the high-resistance downgrade.
    pub fn downgraded_base(&self) -> u32 {
        self.weapon_bonus + self.net_successes.saturating_sub(1)
    }
}
