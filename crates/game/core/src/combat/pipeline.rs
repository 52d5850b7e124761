//! Damage pipeline: turns a packet into the amount and severity that reach a
//! track.
//!
//! Fixed order: downgrade check, base amount, absorb, pre-mitigation
//! modifiers, resistance multiplier, flat soak, post-mitigation modifiers,
//! clamp at zero. Track application happens in
//! [`Combatant::receive_damage`](crate::state::Combatant::receive_damage).

use super::{ArmorProfile, DamagePacket, Severity};
use crate::config::{CombatConfig, ModifierStage};
use crate::state::{Injury, TrackKind, TrackOutcome};

/// Damage-out (attacker) and damage-in (defender) nets for one hit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageModifiers {
    pub outgoing: i32,
    pub incoming: i32,
}

/// Defender-side inputs to mitigation.
#[derive(Clone, Copy, Debug)]
pub struct Mitigation<'a> {
    pub armor: &'a ArmorProfile,
    /// Resistance trait rating checked against the downgrade threshold.
    pub resistance: u32,
    /// Successes of an absorb defense, subtracted from the base amount.
    pub absorbed: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageComputation {
    pub base: u32,
    pub absorbed: u32,
    pub multiplier_percent: u32,
    pub soaked: u32,
    /// Modifiers tried to take the amount below zero.
    pub clamped: bool,
    pub downgraded: bool,
    /// Final amount, identical for the reported and applied figures.
    pub amount: u32,
    /// Severity reported to callers; the pre-downgrade severity.
    pub reported_severity: Severity,
    /// Severity actually written to the track.
    pub applied_severity: Severity,
    pub track: TrackKind,
}

pub fn compute_damage(
    packet: &DamagePacket,
    mitigation: Mitigation<'_>,
    modifiers: DamageModifiers,
    config: &CombatConfig,
) -> DamageComputation {
    let downgraded = packet.severity == Severity::Aggravated
        && packet.track == TrackKind::Health
        && mitigation.resistance >= config.downgrade_threshold;

    let base = if downgraded {
        packet.downgraded_base()
    } else {
        packet.base_amount()
    };
    let absorbed = mitigation.absorbed.min(base);

    let mut clamped = false;
    let mut amount = (base - absorbed) as i64;
    amount = stage(amount, modifiers, config, ModifierStage::BeforeMitigation, &mut clamped);

    let multiplier = mitigation.armor.multiplier(packet);
    let mut amount = multiplier.apply(amount as u32);

    let mut soaked = 0;
    if !downgraded && mitigation.armor.soaks(packet) {
        soaked = mitigation.armor.soak.min(amount);
        amount -= soaked;
    }

    let amount = stage(
        amount as i64,
        modifiers,
        config,
        ModifierStage::AfterMitigation,
        &mut clamped,
    ) as u32;

    DamageComputation {
        base,
        absorbed,
        multiplier_percent: multiplier.percent(),
        soaked,
        clamped,
        downgraded,
        amount,
        reported_severity: packet.severity,
        applied_severity: if downgraded {
            Severity::Superficial
        } else {
            packet.severity
        },
        track: packet.track,
    }
}

fn stage(
    amount: i64,
    modifiers: DamageModifiers,
    config: &CombatConfig,
    at: ModifierStage,
    clamped: &mut bool,
) -> i64 {
    let mut amount = amount;
    if config.damage_out_stage == at {
        amount += modifiers.outgoing as i64;
    }
    if config.damage_in_stage == at {
        amount += modifiers.incoming as i64;
    }
    if amount < 0 {
        *clamped = true;
        return 0;
    }
    amount.min(u32::MAX as i64)
}

/// Everything one hit did to its target.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageReport {
    pub computation: DamageComputation,
    pub track: TrackOutcome,
    pub injury: Option<Injury>,
}

impl DamageReport {
    /// The `(amount, severity)` pair reported for logging and triggers.
    pub fn reported(&self) -> (u32, Severity) {
        (self.computation.amount, self.computation.reported_severity)
    }

    pub fn applied(&self) -> (u32, Severity) {
        (self.computation.amount, self.computation.applied_severity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::{DamageCategory, ResistanceKey, Severities, WeaponClass};

    fn claws() -> DamagePacket {
        DamagePacket::new(Severity::Aggravated, DamageCategory::Physical, WeaponClass::Brawl)
            .with_weapon_bonus(2)
            .with_net_successes(3)
    }

    fn mitigation(armor: &ArmorProfile, resistance: u32) -> Mitigation<'_> {
        Mitigation {
            armor,
            resistance,
            absorbed: 0,
        }
    }

    #[test]
    fn high_resistance_downgrades_and_reports_aggravated() {
        let armor = ArmorProfile::with_soak(3, Severities::all());
        let result = compute_damage(
            &claws(),
            mitigation(&armor, 2),
            DamageModifiers::default(),
            &CombatConfig::default(),
        );

        assert!(result.downgraded);
        assert_eq!(result.base, 4);
        assert_eq!(result.soaked, 0);
        assert_eq!(result.amount, 4);
        assert_eq!(result.reported_severity, Severity::Aggravated);
        assert_eq!(result.applied_severity, Severity::Superficial);
    }

    #[test]
    fn below_threshold_uses_full_base_and_soak() {
        let armor = ArmorProfile::with_soak(3, Severities::all());
        let result = compute_damage(
            &claws(),
            mitigation(&armor, 1),
            DamageModifiers::default(),
            &CombatConfig::default(),
        );

        assert!(!result.downgraded);
        assert_eq!(result.base, 5);
        assert_eq!(result.soaked, 3);
        assert_eq!(result.amount, 2);
        assert_eq!(result.applied_severity, Severity::Aggravated);
    }

    #[test]
    fn resistance_applies_before_soak() {
        let armor = ArmorProfile::with_soak(1, Severities::all()).resist(ResistanceKey::All, 50);
        let result = compute_damage(
            &claws(),
            mitigation(&armor, 0),
            DamageModifiers::default(),
            &CombatConfig::default(),
        );
        // 5 halved to 2, then soak 1
        assert_eq!(result.amount, 1);
        assert_eq!(result.multiplier_percent, 50);
    }

    #[test]
    fn modifiers_never_drive_damage_negative() {
        let result = compute_damage(
            &claws(),
            mitigation(&ArmorProfile::none(), 0),
            DamageModifiers {
                outgoing: 0,
                incoming: -20,
            },
            &CombatConfig::default(),
        );
        assert_eq!(result.amount, 0);
        assert!(result.clamped);
    }

    #[test]
    fn outgoing_bonus_is_scaled_by_resistance_when_applied_first() {
        let armor = ArmorProfile::none().resist(ResistanceKey::All, 50);
        let result = compute_damage(
            &claws(),
            mitigation(&armor, 0),
            DamageModifiers {
                outgoing: 3,
                incoming: 0,
            },
            &CombatConfig::default(),
        );
        assert_eq!(result.amount, 4);
    }

    #[test]
    fn absorb_reduces_base() {
        let armor = ArmorProfile::none();
        let result = compute_damage(
            &claws(),
            Mitigation {
                armor: &armor,
                resistance: 0,
                absorbed: 2,
            },
            DamageModifiers::default(),
            &CombatConfig::default(),
        );
        assert_eq!(result.absorbed, 2);
        assert_eq!(result.amount, 3);
    }
}
