//! Demo skirmish binary.
//!
//! Composition root: loads rules, catalog and roster through `combat-content`,
//! builds a [`BattleSession`], lets a scripted driver play it out and prints
//! every delivered event to stdout as one JSON object per line. Logs go to
//! stderr.
//!
//! Environment (a `.env` file is honoured):
//! - `COMBAT_SEED`, `COMBAT_EVENT_BUFFER`, `COMBAT_MAX_CASCADE`, `COMBAT_RULES`
//!   (see [`RuntimeConfig::from_env`])
//! - `COMBAT_CONTENT_DIR` - directory holding `actions.ron`, `roster.ron` and
//!   an optional `rules.toml`; the built-in demo content is used when unset
//! - `COMBAT_MAX_ROUNDS` - round cap for the driver (default: 20)
//!
//! ```bash
//! RUST_LOG=runtime=debug cargo run -p combat-sim > battle.jsonl
//! ```
mod driver;

use std::env;
use std::io::Write;

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};

use combat_content::{CatalogLoader, ConfigLoader, ContentFactory, RosterLoader};
use combat_core::{ActionCatalog, CombatConfig, CombatantSpec};
use combat_runtime::{BattleSession, RuntimeConfig};

use driver::Driver;

const DEFAULT_MAX_ROUNDS: u32 = 20;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut config = RuntimeConfig::from_env();
    let (rules, catalog, roster) = load_content(&config)?;
    config = config.with_combat(rules);
    let max_rounds = env::var("COMBAT_MAX_ROUNDS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_MAX_ROUNDS);

    info!(seed = config.seed, combatants = roster.len(), max_rounds, "starting skirmish");

    let mut session = BattleSession::builder()
        .config(config)
        .catalog(catalog)
        .roster(roster)
        .build()?;

    let mut events = session.subscribe();
    let printer = tokio::spawn(async move {
        let mut out = std::io::stdout();
        loop {
            match events.recv().await {
                Ok(envelope) => match serde_json::to_string(&envelope) {
                    Ok(line) => {
                        if writeln!(out, "{line}").is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        warn!(sequence = envelope.sequence, error = %e, "event not serializable")
                    }
                },
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    });

    Driver::new(max_rounds).run(&mut session).await?;

    let state = session.teardown();
    printer.await.context("event printer panicked")?;

    match state.outcome() {
        Some(outcome) => info!(winner = ?outcome.winner, round = outcome.round.0, "battle over"),
        None => info!(round = state.turns().round().0, "battle undecided"),
    }
    for combatant in state.store().iter() {
        info!(
            id = %combatant.id,
            name = %combatant.name,
            superficial = combatant.health.superficial(),
            aggravated = combatant.health.aggravated(),
            destroyed = combatant.is_destroyed(),
            "final track"
        );
    }
    Ok(())
}

fn load_content(
    config: &RuntimeConfig,
) -> Result<(CombatConfig, ActionCatalog, Vec<CombatantSpec>)> {
    let (mut rules, catalog, roster) = match env::var("COMBAT_CONTENT_DIR") {
        Ok(dir) if !dir.is_empty() => {
            let factory = ContentFactory::new(dir);
            info!(dir = %factory.data_dir().display(), "loading content");
            (factory.load_rules()?, factory.load_catalog()?, factory.load_roster()?)
        }
        _ => (
            ConfigLoader::standard()?,
            CatalogLoader::standard()?,
            RosterLoader::demo()?,
        ),
    };

    if let Some(path) = &config.rules_path {
        rules = ConfigLoader::load(path)
            .with_context(|| format!("loading rules from {}", path.display()))?;
    }
    Ok((rules, catalog, roster))
}
