//! Damage resolution: packets, armor, the damage pipeline and critical injuries.
mod armor;
mod critical;
mod damage;
mod pipeline;

pub use armor::{ArmorProfile, Multiplier, Resistance, ResistanceKey};
pub use critical::roll_critical_injury;
pub use damage::{
    DamageCategory, DamagePacket, Severities, Severity, WeaponClass, WeaponClasses,
};
pub use pipeline::{DamageComputation, DamageModifiers, DamageReport, Mitigation, compute_damage};
