//! Scripted controller for the demo skirmish.
//!
//! Every combatant attacks whatever its weapon reaches, otherwise walks toward
//! the nearest enemy. Defenders dodge their first attack of a round and pass
//! on the rest.

use anyhow::Result;
use tracing::{debug, info, warn};

use combat_core::action::{ATTACK_MELEE, ATTACK_RANGED, DODGE, MOVE};
use combat_core::{
    ActionId, ActionIntent, ActionOption, Combatant, EntityId, Phase, Position, ReactionChoice,
    Target,
};
use combat_runtime::{BattleSession, Event, PublishReport, Topic};

/// Intents tried per turn before the driver ends it.
const MAX_DECISIONS: usize = 4;

pub struct Driver {
    max_rounds: u32,
}

impl Driver {
    pub fn new(max_rounds: u32) -> Self {
        Self { max_rounds }
    }

    /// Plays turns until one side is down or the round cap is hit.
    pub async fn run(&self, session: &mut BattleSession) -> Result<()> {
        session.start()?;

        while !session.is_over() && session.round().0 <= self.max_rounds {
            let Some(actor) = session.current_actor() else {
                warn!(target: "sim::driver", phase = %session.phase(), "no active combatant");
                break;
            };
            self.play_turn(session, actor).await?;
            tokio::task::yield_now().await;
        }

        if !session.is_over() {
            info!(target: "sim::driver", rounds = self.max_rounds, "round cap reached");
        }
        Ok(())
    }

    async fn play_turn(&self, session: &mut BattleSession, actor: EntityId) -> Result<()> {
        for _ in 0..MAX_DECISIONS {
            if session.is_over() || session.current_actor() != Some(actor) {
                return Ok(());
            }

            let report = session.request_actions(actor)?;
            let Some(intent) = choose(session, actor, &report) else {
                break;
            };
            debug!(target: "sim::driver", actor = %actor, action = %intent.action, "submitting");

            let report = session.submit_intent(intent)?;
            log_failures(&report);
            if report.contains(Topic::IntentRejected) {
                break;
            }
            self.answer_reactions(session)?;
            tokio::task::yield_now().await;
        }

        if !session.is_over()
            && session.current_actor() == Some(actor)
            && session.phase() == Phase::AwaitingIntent
        {
            let report = session.end_turn(actor)?;
            log_failures(&report);
        }
        Ok(())
    }

    fn answer_reactions(&self, session: &mut BattleSession) -> Result<()> {
        let Some(window) = session.open_window() else {
            return Ok(());
        };
        let id = window.id();
        let answers: Vec<_> = window
            .eligible()
            .iter()
            .map(|eligible| {
                let fresh = session
                    .store()
                    .get(eligible.defender)
                    .is_some_and(|c| c.reactions.declared == 0);
                let dodge = ActionId::from(DODGE);
                let choice = if fresh && eligible.options.contains(&dodge) {
                    ReactionChoice::React(dodge)
                } else {
                    ReactionChoice::Pass
                };
                (eligible.defender, choice)
            })
            .collect();

        for (defender, choice) in answers {
            let report = session.declare_reaction(id, defender, choice)?;
            log_failures(&report);
        }
        // Anyone the window still waits for is timed out.
        if session.open_window().is_some_and(|w| w.id() == id) {
            let report = session.close_reaction_window(id)?;
            log_failures(&report);
        }
        Ok(())
    }
}

fn choose(
    session: &BattleSession,
    actor: EntityId,
    report: &PublishReport,
) -> Option<ActionIntent> {
    let Some(Event::ActionsAvailable { options, .. }) = report.find(Topic::ActionsAvailable) else {
        return None;
    };
    let usable = |id: &str| {
        options
            .iter()
            .find(|o: &&ActionOption| o.applicable && o.action.as_str() == id)
    };

    for attack in [ATTACK_MELEE, ATTACK_RANGED] {
        if let Some(option) = usable(attack)
            && let Some(target) = option.targets.first()
        {
            return Some(ActionIntent::new(actor, attack, option.cost).at(*target));
        }
    }

    let option = usable(MOVE)?;
    let me = session.store().get(actor)?;
    let tile = approach(session, me)?;
    Some(ActionIntent::new(actor, MOVE, option.cost).at(Target::Tile(tile)))
}

/// Furthest free tile on a straight walk toward the nearest enemy, stopping
/// once adjacent.
fn approach(session: &BattleSession, me: &Combatant) -> Option<Position> {
    let enemy = session
        .store()
        .living()
        .filter(|c| c.team != me.team)
        .min_by_key(|c| (me.position.distance(c.position), c.id))?;

    let mut tile = me.position;
    for _ in 0..me.stats.speed {
        if tile.is_adjacent(enemy.position) {
            break;
        }
        let next = tile.step_towards(enemy.position);
        if session.store().occupant_at(next).is_some() {
            break;
        }
        tile = next;
    }
    (tile != me.position).then_some(tile)
}

fn log_failures(report: &PublishReport) {
    for failure in &report.failures {
        warn!(
            target: "sim::driver",
            handler = failure.handler,
            topic = %failure.topic,
            error = %failure.error,
            "handler failed"
        );
    }
}
