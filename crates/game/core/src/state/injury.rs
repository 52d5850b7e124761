//! Critical injuries suffered by hits landing on a weakened health track.

use arrayvec::ArrayVec;

use crate::config::CombatConfig;
use crate::state::Round;

/// Result of the critical injury table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum InjuryKind {
    /// Loses their next turn.
    Stunned,
    MinorDebuff,
    MajorDebuff,
    Dismemberment,
    /// Instant death or torpor; the track collapses.
    Terminal,
}

impl InjuryKind {
    /// Maps a table total (one die + aggravated boxes) to an injury.
    pub const fn from_total(total: u32) -> Self {
        match total {
            0..=6 => Self::Stunned,
            7..=8 => Self::MinorDebuff,
            9..=10 => Self::MajorDebuff,
            11..=12 => Self::Dismemberment,
            _ => Self::Terminal,
        }
    }

    /// Dice removed from every physical pool while the injury lasts.
    pub const fn pool_penalty(self) -> u32 {
        match self {
            Self::Stunned | Self::Terminal => 0,
            Self::MinorDebuff => 1,
            Self::MajorDebuff => 2,
            Self::Dismemberment => 3,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Injury {
    pub kind: InjuryKind,
    pub roll: u8,
    pub total: u32,
    pub inflicted: Round,
    /// A stun costs exactly one turn; this records that it was served.
    pub served: bool,
}

/// Active injuries, oldest first. Each aggravated box healed clears the oldest.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Injuries {
    list: ArrayVec<Injury, { CombatConfig::MAX_INJURIES }>,
}

impl Injuries {
    /// Records an injury. When the list is full the oldest injury gives way.
    pub fn push(&mut self, injury: Injury) {
        if self.list.is_full() {
            self.list.remove(0);
        }
        self.list.push(injury);
    }

    /// Clears up to `count` injuries, oldest first.
    pub fn heal(&mut self, count: u32) -> Vec<Injury> {
        let count = (count as usize).min(self.list.len());
        self.list.drain(..count).collect()
    }

    pub fn pool_penalty(&self) -> u32 {
        self.list.iter().map(|i| i.kind.pool_penalty()).sum()
    }

    /// Marks one pending stun as served and reports whether there was one.
    pub fn serve_stun(&mut self) -> bool {
        match self
            .list
            .iter_mut()
            .find(|i| i.kind == InjuryKind::Stunned && !i.served)
        {
            Some(injury) => {
                injury.served = true;
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Injury> {
        self.list.iter()
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn injury(kind: InjuryKind) -> Injury {
        Injury {
            kind,
            roll: 5,
            total: 5,
            inflicted: Round(1),
            served: false,
        }
    }

    #[test]
    fn table_boundaries() {
        assert_eq!(InjuryKind::from_total(1), InjuryKind::Stunned);
        assert_eq!(InjuryKind::from_total(6), InjuryKind::Stunned);
        assert_eq!(InjuryKind::from_total(7), InjuryKind::MinorDebuff);
        assert_eq!(InjuryKind::from_total(10), InjuryKind::MajorDebuff);
        assert_eq!(InjuryKind::from_total(12), InjuryKind::Dismemberment);
        assert_eq!(InjuryKind::from_total(13), InjuryKind::Terminal);
    }

    #[test]
    fn healing_clears_oldest_first() {
        let mut injuries = Injuries::default();
        injuries.push(injury(InjuryKind::MinorDebuff));
        injuries.push(injury(InjuryKind::MajorDebuff));
        assert_eq!(injuries.pool_penalty(), 3);

        let healed = injuries.heal(1);
        assert_eq!(healed[0].kind, InjuryKind::MinorDebuff);
        assert_eq!(injuries.pool_penalty(), 2);
    }

    #[test]
    fn stun_is_served_once() {
        let mut injuries = Injuries::default();
        injuries.push(injury(InjuryKind::Stunned));
        assert!(injuries.serve_stun());
        assert!(!injuries.serve_stun());
        assert_eq!(injuries.len(), 1);
    }
}
