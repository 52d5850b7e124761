//! Runtime configuration.

use std::env;
use std::path::PathBuf;

use combat_core::CombatConfig;

/// Settings for one battle session.
///
/// `combat` carries the rules; the remaining fields size the event pipeline.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuntimeConfig {
    pub combat: CombatConfig,
    /// Battle seed for dice and initiative tiebreaks.
    pub seed: u64,
    /// Capacity of the presentation mirror channel.
    pub event_buffer_size: usize,
    /// Events processed per publish before the cascade is cut off.
    pub max_cascade: usize,
    /// TOML rules file to load in place of the defaults. Loading is left to
    /// the composition root.
    pub rules_path: Option<PathBuf>,
}

impl RuntimeConfig {
    pub const DEFAULT_SEED: u64 = 0x5eed;
    pub const DEFAULT_EVENT_BUFFER: usize = 256;
    pub const DEFAULT_MAX_CASCADE: usize = 1024;

    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `COMBAT_SEED` - Battle seed (default: `0x5eed`)
    /// - `COMBAT_EVENT_BUFFER` - Mirror channel capacity (default: 256)
    /// - `COMBAT_MAX_CASCADE` - Events per publish (default: 1024)
    /// - `COMBAT_RULES` - Path to a TOML rules file (default: none)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with a custom variable source.
    /// Unparsable values are ignored.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(seed) = read_env::<u64>(&lookup, "COMBAT_SEED") {
            config.seed = seed;
        }
        if let Some(capacity) = read_env::<usize>(&lookup, "COMBAT_EVENT_BUFFER") {
            config.event_buffer_size = capacity.max(1);
        }
        if let Some(max) = read_env::<usize>(&lookup, "COMBAT_MAX_CASCADE") {
            config.max_cascade = max.max(1);
        }
        if let Some(path) = lookup("COMBAT_RULES").filter(|p| !p.is_empty()) {
            config.rules_path = Some(PathBuf::from(path));
        }

        config
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_combat(mut self, combat: CombatConfig) -> Self {
        self.combat = combat;
        self
    }

    pub fn with_max_cascade(mut self, max: usize) -> Self {
        self.max_cascade = max.max(1);
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            combat: CombatConfig::default(),
            seed: Self::DEFAULT_SEED,
            event_buffer_size: Self::DEFAULT_EVENT_BUFFER,
            max_cascade: Self::DEFAULT_MAX_CASCADE,
            rules_path: None,
        }
    }
}

fn read_env<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    lookup(key)?.trim().parse().ok()
}
