//! Armor: resistance multipliers and flat soak.

use super::{DamageCategory, DamagePacket, Severities, Severity, WeaponClasses};

/// What a resistance entry matches on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResistanceKey {
    Category(DamageCategory),
    Severity(Severity),
    All,
}

impl ResistanceKey {
    /// Lookup stage: category entries first, then severity, then catch-all.
    const fn stage(self) -> u8 {
        match self {
            ResistanceKey::Category(_) => 0,
            ResistanceKey::Severity(_) => 1,
            ResistanceKey::All => 2,
        }
    }

    fn matches(self, packet: &DamagePacket) -> bool {
        match self {
            ResistanceKey::Category(category) => category == packet.category,
            ResistanceKey::Severity(severity) => severity == packet.severity,
            ResistanceKey::All => true,
        }
    }
}

/// Multiplier expressed in percent: 100 = unchanged, 50 = halved, 0 = immune.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Resistance {
    pub key: ResistanceKey,
    pub percent: u32,
}

impl Resistance {
    pub const fn new(key: ResistanceKey, percent: u32) -> Self {
        Self { key, percent }
    }
}

/// Combined multiplier as an exact fraction so repeated entries do not lose
/// precision to intermediate rounding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Multiplier {
    pub numerator: u64,
    pub denominator: u64,
}

impl Multiplier {
    pub const IDENTITY: Self = Self {
        numerator: 1,
        denominator: 1,
    };

    fn times_percent(self, percent: u32) -> Self {
        Self {
            numerator: self.numerator.saturating_mul(percent as u64),
            denominator: self.denominator.saturating_mul(100),
        }
    }

    /// Applies the multiplier, rounding down.
    pub fn apply(self, amount: u32) -> u32 {
        if self.denominator == 0 {
            return amount;
        }
        let scaled = (amount as u64).saturating_mul(self.numerator) / self.denominator;
        scaled.min(u32::MAX as u64) as u32
    }

    /// Approximate percentage, for reporting.
    pub fn percent(self) -> u32 {
        self.apply(100)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ArmorProfile {
    /// Ordered resistance entries; every matching entry contributes.
    pub resistances: Vec<Resistance>,
    pub soak: u32,
    /// Severities the soak applies to.
    pub soak_severities: Severities,
    /// Weapon classes the armor protects against.
    pub protects: WeaponClasses,
}

impl ArmorProfile {
    pub fn none() -> Self {
        Self::default()
    }

    /// Flat soak against physical weapons for the given severities.
    pub fn with_soak(soak: u32, severities: Severities) -> Self {
        Self {
            resistances: Vec::new(),
            soak,
            soak_severities: severities,
            protects: WeaponClasses::PHYSICAL,
        }
    }

    #[must_use]
    pub fn resist(mut self, key: ResistanceKey, percent: u32) -> Self {
        self.resistances.push(Resistance::new(key, percent));
        self
    }

    /// Multiplies every matching entry, visiting category entries, then
    /// severity entries, then catch-all entries.
    pub fn multiplier(&self, packet: &DamagePacket) -> Multiplier {
        (0..=2).fold(Multiplier::IDENTITY, |acc, stage| {
            self.resistances
                .iter()
                .filter(|r| r.key.stage() == stage && r.key.matches(packet))
                .fold(acc, |acc, r| acc.times_percent(r.percent))
        })
    }

    /// Whether the flat soak applies to this packet.
    pub fn soaks(&self, packet: &DamagePacket) -> bool {
        self.soak > 0
            && self.protects.contains(packet.weapon.flag())
            && self.soak_severities.covers(packet.severity)
    }

    pub fn has_protection(&self) -> bool {
        self.soak > 0 || !self.resistances.is_empty()
    }
}
