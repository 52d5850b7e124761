//! Action catalog loader.
//!
//! Loads [`ActionDef`] lists from RON files and checks them into an
//! [`ActionCatalog`].

use std::path::Path;

use combat_core::{ActionCatalog, ActionDef};

use crate::loaders::{LoadResult, read_file};

/// Loader for action catalogs.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Load a catalog from a RON file holding a list of action definitions.
    pub fn load(path: &Path) -> LoadResult<ActionCatalog> {
        let content = read_file(path)?;
        Self::parse(&content).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    pub fn parse(content: &str) -> LoadResult<ActionCatalog> {
        let defs: Vec<ActionDef> = ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse actions RON: {}", e))?;
        let catalog = ActionCatalog::from_defs(defs)
            .map_err(|e| anyhow::anyhow!("Invalid action catalog: {}", e))?;

        Ok(catalog)
    }

    /// The catalog shipped with the crate (`data/actions.ron`).
    pub fn standard() -> LoadResult<ActionCatalog> {
        Self::parse(include_str!("../../data/actions.ron"))
    }
}
