//! Content factory for loading a whole battle setup from a data directory.

use std::path::{Path, PathBuf};

use combat_core::{ActionCatalog, CombatConfig, CombatantSpec};

use crate::loaders::{CatalogLoader, ConfigLoader, LoadResult, RosterLoader};

/// Content factory that loads battle content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── rules.toml
/// ├── actions.ron
/// └── roster.ron
/// ```
///
/// A missing `rules.toml` or `actions.ron` falls back to the shipped
/// defaults. The roster has no fallback.
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load combat rules from `rules.toml`.
    pub fn load_rules(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("rules.toml");
        if !path.exists() {
            return ConfigLoader::standard();
        }
        ConfigLoader::load(&path)
    }

    /// Load the action catalog from `actions.ron`.
    pub fn load_catalog(&self) -> LoadResult<ActionCatalog> {
        let path = self.data_dir.join("actions.ron");
        if !path.exists() {
            return CatalogLoader::standard();
        }
        CatalogLoader::load(&path)
    }

    /// Load the combatants from `roster.ron`.
    pub fn load_roster(&self) -> LoadResult<Vec<CombatantSpec>> {
        let path = self.data_dir.join("roster.ron");
        RosterLoader::load(&path)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}
