//! Loaders for battle content: rules, the action catalog and rosters.
//!
//! Every loader parses into a `combat-core` type and checks that type's own
//! invariants before handing it back, so a malformed file fails here rather
//! than mid-battle. `parse` takes the raw text and `load` reads it from disk.
pub mod actions;
pub mod config;
pub mod factory;
pub mod roster;

pub use actions::CatalogLoader;
pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use roster::RosterLoader;

use std::path::Path;

use anyhow::Context;

pub type LoadResult<T> = anyhow::Result<T>;

/// Reads a content file, naming it in the error.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .with_context(|| format!("reading content file {}", path.display()))
}
