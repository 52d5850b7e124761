use std::fmt;
use std::str::FromStr;

use crate::combat::{DamageCategory, Severity};
use crate::state::EntityId;

/// Numeric quantity a condition instance adjusts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ModifierKind {
    Initiative,
    MaxHealth,
    DamageOut,
    DamageIn,
    AttackPool,
    DefensePool,
}

impl ModifierKind {
    /// Stackable kinds keep one independent instance per application.
    pub const fn is_stackable(self) -> bool {
        matches!(
            self,
            ModifierKind::Initiative
                | ModifierKind::MaxHealth
                | ModifierKind::DamageOut
                | ModifierKind::DamageIn
        )
    }
}

/// Non-numeric statuses tracked by the same ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum StatusKind {
    /// Takes `delta` superficial damage at the start of each of its turns.
    Poisoned,
    /// Loses the free move.
    Immobilized,
    /// Loses the major and minor slots.
    Handicapped,
}

/// Which hits a damage modifier applies to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageScope {
    #[default]
    All,
    Category(DamageCategory),
    Severity(Severity),
}

impl DamageScope {
    pub fn matches(self, severity: Severity, category: DamageCategory) -> bool {
        match self {
            DamageScope::All => true,
            DamageScope::Category(c) => c == category,
            DamageScope::Severity(s) => s == severity,
        }
    }
}

/// Side-effect descriptor of a condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ConditionEffect {
    Modifier {
        kind: ModifierKind,
        #[cfg_attr(feature = "serde", serde(default))]
        scope: DamageScope,
    },
    Status(StatusKind),
}

impl ConditionEffect {
    pub const fn modifier(kind: ModifierKind) -> Self {
        Self::Modifier {
            kind,
            scope: DamageScope::All,
        }
    }

    pub const fn is_stackable(self) -> bool {
        match self {
            ConditionEffect::Modifier { kind, .. } => kind.is_stackable(),
            ConditionEffect::Status(_) => false,
        }
    }

    pub fn modifier_kind(self) -> Option<ModifierKind> {
        match self {
            ConditionEffect::Modifier { kind, .. } => Some(kind),
            ConditionEffect::Status(_) => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Duration {
    Rounds(u32),
    Indefinite,
}

impl Duration {
    pub fn remaining(self) -> Option<u32> {
        match self {
            Duration::Rounds(n) => Some(n),
            Duration::Indefinite => None,
        }
    }
}

/// Identity of one condition instance: the base name plus an optional
/// numeric suffix, written `Name` or `Name#n`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionId {
    pub base: String,
    pub suffix: Option<u32>,
}

impl ConditionId {
    pub fn base(name: impl Into<String>) -> Self {
        Self {
            base: name.into(),
            suffix: None,
        }
    }

    pub fn suffixed(name: impl Into<String>, suffix: u32) -> Self {
        Self {
            base: name.into(),
            suffix: Some(suffix),
        }
    }
}

impl fmt::Display for ConditionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.suffix {
            Some(n) => write!(f, "{}#{}", self.base, n),
            None => write!(f, "{}", self.base),
        }
    }
}

impl FromStr for ConditionId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.rsplit_once('#') {
            Some((base, n)) => Ok(Self::suffixed(base, n.parse()?)),
            None => Ok(Self::base(s)),
        }
    }
}

/// Request to apply a condition. The ledger turns it into an instance.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ConditionSpec {
    pub name: String,
    pub effect: ConditionEffect,
    pub delta: i32,
    pub duration: Duration,
    #[cfg_attr(feature = "serde", serde(default))]
    pub source: Option<EntityId>,
}

impl ConditionSpec {
    pub fn modifier(
        name: impl Into<String>,
        kind: ModifierKind,
        delta: i32,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            effect: ConditionEffect::modifier(kind),
            delta,
            duration,
            source: None,
        }
    }

    pub fn status(
        name: impl Into<String>,
        status: StatusKind,
        delta: i32,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            effect: ConditionEffect::Status(status),
            delta,
            duration,
            source: None,
        }
    }

    #[must_use]
    pub fn scoped(mut self, scope: DamageScope) -> Self {
        if let ConditionEffect::Modifier { kind, .. } = self.effect {
            self.effect = ConditionEffect::Modifier { kind, scope };
        }
        self
    }

    #[must_use]
    pub fn from_source(mut self, source: EntityId) -> Self {
        self.source = Some(source);
        self
    }
}
