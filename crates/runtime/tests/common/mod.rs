//! Shared fixtures for session tests.
#![allow(dead_code)]

use combat_core::action::{ATTACK_MELEE, MOVE};
use combat_core::{
    ActionId, ActionIntent, ArmorProfile, CombatStats, CombatantSpec, DamageCategory, EntityId,
    FixedDice, OpenGround, Position, Severity, Target, TeamId, Weapon, WeaponClass,
};
use combat_runtime::{BattleSession, Event, PublishReport, Topic};

pub const HERO: EntityId = EntityId(1);
pub const BRUTE: EntityId = EntityId(2);
pub const SIDEKICK: EntityId = EntityId(3);

pub fn knife() -> Weapon {
    Weapon {
        name: "knife".into(),
        class: WeaponClass::Melee,
        bonus: 1,
        severity: Severity::Superficial,
        category: DamageCategory::Physical,
        range: 1,
        ammunition: None,
    }
}

pub fn fighter(id: EntityId, team: u8, x: i32, y: i32, initiative: i32) -> CombatantSpec {
    CombatantSpec {
        id,
        name: format!("fighter-{}", id.0),
        team: TeamId(team),
        position: Position::new(x, y),
        stats: CombatStats {
            initiative,
            melee: 3,
            dodge: 2,
            stamina: 2,
            speed: 4,
            ..CombatStats::default()
        },
        weapon: knife(),
        armor: ArmorProfile::none(),
    }
}

/// Hero (initiative 5, team 0) next to a brute (initiative 1, team 1).
pub fn duel() -> Vec<CombatantSpec> {
    vec![fighter(HERO, 0, 0, 0, 5), fighter(BRUTE, 1, 1, 0, 1)]
}

/// Builds and starts a session. Initiative rolls draw one die per combatant
/// before any scripted face is used.
pub fn started(roster: Vec<CombatantSpec>, faces: impl IntoIterator<Item = u8>) -> BattleSession {
    let tiebreaks = vec![1; roster.len()];
    let mut session = BattleSession::builder()
        .roster(roster)
        .terrain(OpenGround::new(10, 10))
        .dice(FixedDice::new(tiebreaks.into_iter().chain(faces)))
        .build()
        .unwrap();
    let report = session.start().unwrap();
    assert!(report.is_clean(), "{:?}", report.failures);
    session
}

pub fn intent(
    session: &BattleSession,
    actor: EntityId,
    action: &str,
    target: Option<Target>,
) -> ActionIntent {
    let cost = session
        .state()
        .catalog()
        .get(&ActionId::from(action))
        .unwrap()
        .cost;
    let mut intent = ActionIntent::new(actor, action, cost);
    intent.target = target;
    intent
}

pub fn attack(session: &BattleSession, actor: EntityId, target: EntityId) -> ActionIntent {
    intent(session, actor, ATTACK_MELEE, Some(Target::Entity(target)))
}

pub fn step(session: &BattleSession, actor: EntityId, x: i32, y: i32) -> ActionIntent {
    intent(session, actor, MOVE, Some(Target::Tile(Position::new(x, y))))
}

pub fn topics(report: &PublishReport) -> Vec<Topic> {
    report.topics().collect()
}

pub fn began(report: &PublishReport) -> Vec<EntityId> {
    report
        .all(Topic::BeginTurn)
        .filter_map(|event| match event {
            Event::BeginTurn { actor, .. } => Some(*actor),
            _ => None,
        })
        .collect()
}
