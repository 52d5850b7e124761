//! Data-driven battle content and loaders.
//!
//! This crate ships the default content and reads RON/TOML data files:
//! - Action catalog (data-driven via RON)
//! - Combatant rosters (data-driven via RON)
//! - Combat rules configuration (data-driven via TOML)
//!
//! All loaders use combat-core types directly with serde for RON/TOML
//! deserialization. Content is handed to the runtime at session setup and is
//! never mutated by it.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{CatalogLoader, ConfigLoader, ContentFactory, LoadResult, RosterLoader};
