//! Combatant roster loader.

use std::collections::BTreeSet;
use std::path::Path;

use combat_core::CombatantSpec;

use crate::loaders::{LoadResult, read_file};

/// Loader for the combatants a battle starts with.
pub struct RosterLoader;

impl RosterLoader {
    /// Load a roster from a RON file holding a list of `CombatantSpec`.
    pub fn load(path: &Path) -> LoadResult<Vec<CombatantSpec>> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse a roster and check it can seed a battle: unique ids, no two
    /// combatants on one tile, and at least two teams.
    pub fn parse(content: &str) -> LoadResult<Vec<CombatantSpec>> {
        let roster: Vec<CombatantSpec> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse roster RON: {}", e))?;

        let mut ids = BTreeSet::new();
        let mut tiles = BTreeSet::new();
        for spec in &roster {
            if !ids.insert(spec.id) {
                anyhow::bail!("Combatant {} listed twice", spec.id);
            }
            if !tiles.insert(spec.position) {
                anyhow::bail!("Combatant {} shares tile {}", spec.id, spec.position);
            }
        }

        let teams: BTreeSet<_> = roster.iter().map(|spec| spec.team).collect();
        if teams.len() < 2 {
            anyhow::bail!("Roster needs at least two teams, found {}", teams.len());
        }

        Ok(roster)
    }

    /// The demo roster shipped with the crate (`data/roster.ron`).
    pub fn demo() -> LoadResult<Vec<CombatantSpec>> {
        Self::parse(include_str!("../../data/roster.ron"))
    }
}
