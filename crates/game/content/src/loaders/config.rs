//! Combat rules loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat rules from TOML files.
///
/// Missing keys fall back to [`CombatConfig::default`].
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load rules from a TOML file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the TOML file containing a `CombatConfig`
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse rules from TOML text.
    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse rules TOML: {}", e))?;

        // A window that never closes on its own would wait on the timeout alone.
        if config.max_reaction_declarations == 0 {
            anyhow::bail!("max_reaction_declarations must be at least 1");
        }

        Ok(config)
    }

    /// The rules file shipped with the crate.
    pub fn standard() -> LoadResult<CombatConfig> {
        Self::parse(include_str!("../../data/rules.toml"))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use combat_core::TieBreak;
    use combat_core::config::ModifierStage;

    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "tie_break = \"Initiator\"").unwrap();
        writeln!(file, "weakened_penalty = 1").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.tie_break, TieBreak::Initiator);
        assert_eq!(config.weakened_penalty, 1);
        assert_eq!(
            config.max_reaction_declarations,
            CombatConfig::DEFAULT_MAX_REACTION_DECLARATIONS
        );
        assert_eq!(config.damage_in_stage, ModifierStage::AfterMitigation);
    }

    #[test]
    fn empty_file_is_default_rules() {
        let file = tempfile::NamedTempFile::new().unwrap();
        assert_eq!(ConfigLoader::load(file.path()).unwrap(), CombatConfig::default());
    }

    #[test]
    fn rejects_zero_declaration_limit() {
        let err = ConfigLoader::parse("max_reaction_declarations = 0").unwrap_err();
        assert!(err.to_string().contains("max_reaction_declarations"));
    }

    #[test]
    fn rejects_unknown_tie_policy() {
        assert!(ConfigLoader::parse("tie_break = \"Coin\"").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = ConfigLoader::load(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }

    #[test]
    fn shipped_rules_parse() {
        let config = ConfigLoader::standard().unwrap();
        assert_eq!(config.tie_break, TieBreak::NoWinner);
        assert!(!config.stack_weakened_penalties);
    }
}
