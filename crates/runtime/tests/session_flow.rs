mod common;

use combat_core::action::{DODGE, FOCUS};
use combat_core::engine::WindowId;
use combat_core::state::ActionBudget;
use combat_core::{ActionId, ActionOutcome, Phase, ReactionChoice, Round, Severity, TeamId};
use combat_runtime::{BattleSession, Event, RuntimeError, Topic};

use common::*;

#[test]
fn start_hands_the_first_turn_to_the_highest_initiative() {
    let mut session = BattleSession::builder()
        .roster(duel())
        .dice(combat_core::FixedDice::default())
        .build()
        .unwrap();

    let err = session.submit_intent(attack(&session, HERO, BRUTE)).unwrap_err();
    assert_eq!(err, RuntimeError::NotStarted);

    let report = session.start().unwrap();
    assert_eq!(topics(&report), vec![Topic::RoundStarted, Topic::BeginTurn]);
    assert_eq!(began(&report), vec![HERO]);
    assert_eq!(session.round(), Round(1));
    assert_eq!(session.current_actor(), Some(HERO));
    assert_eq!(session.phase(), Phase::AwaitingIntent);

    assert_eq!(session.start().unwrap_err(), RuntimeError::AlreadyStarted);
}

#[test]
fn empty_roster_is_refused() {
    assert!(matches!(
        BattleSession::builder().build(),
        Err(RuntimeError::EmptyRoster)
    ));
}

#[test]
fn request_actions_lists_the_menu() {
    let mut session = started(duel(), []);

    let report = session.request_actions(HERO).unwrap();
    assert_eq!(topics(&report), vec![Topic::RequestActions, Topic::ActionsAvailable]);

    let Some(Event::ActionsAvailable { actor, options }) = report.find(Topic::ActionsAvailable)
    else {
        panic!("no menu in {report:?}");
    };
    assert_eq!(*actor, HERO);
    let melee = options
        .iter()
        .find(|o| o.action == ActionId::from(combat_core::action::ATTACK_MELEE))
        .unwrap();
    assert!(melee.applicable);
    assert!(options.iter().all(|o| o.action != ActionId::from(DODGE)));
}

#[test]
fn attack_waits_for_the_reaction_window() {
    let mut session = started(duel(), [7, 8, 2]);

    let report = session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    assert!(report.is_clean());
    assert_eq!(
        topics(&report),
        vec![
            Topic::IntentSubmitted,
            Topic::IntentValidated,
            Topic::ActionEnqueued,
            Topic::PerformAction,
            Topic::ReactionWindowOpened,
        ]
    );
    assert_eq!(session.phase(), Phase::ReactionOpen);
    assert_eq!(session.open_window().map(|w| w.id()), Some(WindowId(1)));
    assert_eq!(session.store().health(BRUTE).unwrap().marked(), 0);
    assert!(!session.store().get(HERO).unwrap().budget.contains(ActionBudget::MAJOR));

    let report = session
        .declare_reaction(WindowId(1), BRUTE, ReactionChoice::Pass)
        .unwrap();
    assert_eq!(
        topics(&report),
        vec![
            Topic::ReactionDeclared,
            Topic::ReactionResolved,
            Topic::PerformAction,
            Topic::DamageApplied,
            Topic::ActionResolved,
        ]
    );
    let Some(Event::DamageApplied {
        target,
        source,
        amount,
        severity,
        applied,
        ..
    }) = report.find(Topic::DamageApplied)
    else {
        panic!("no damage in {report:?}");
    };
    assert_eq!((*target, *source, *amount), (BRUTE, HERO, 3));
    assert_eq!((*severity, *applied), (Severity::Superficial, Severity::Superficial));
    assert_eq!(session.store().health(BRUTE).unwrap().superficial(), 3);

    // Minor and free move are left, so the turn goes on.
    assert_eq!(session.phase(), Phase::AwaitingIntent);
    assert_eq!(session.current_actor(), Some(HERO));
    assert!(session.open_window().is_none());
}

#[test]
fn dodge_reduces_the_hit() {
    // Attack: three successes. Dodge: one success.
    let mut session = started(duel(), [7, 8, 9, 6, 2]);
    session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();

    let report = session
        .declare_reaction(WindowId(1), BRUTE, ReactionChoice::React(ActionId::from(DODGE)))
        .unwrap();

    let Some(Event::ActionResolved { resolution }) = report.find(Topic::ActionResolved) else {
        panic!("unresolved: {report:?}");
    };
    assert_eq!(resolution.outcome, ActionOutcome::Hit);
    let attack = resolution.attack.as_ref().unwrap();
    assert_eq!(attack.defenses.len(), 1);
    assert_eq!(attack.net_successes, 2);
    assert_eq!(resolution.damage[0].report.reported(), (3, Severity::Superficial));
    assert_eq!(session.store().get(BRUTE).unwrap().reactions.declared, 1);
}

#[test]
fn timeout_treats_silent_defenders_as_passing() {
    let mut session = started(duel(), [7, 8, 2]);
    session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();

    let report = session.close_reaction_window(WindowId(1)).unwrap();
    assert_eq!(
        topics(&report),
        vec![
            Topic::ReactionTimeout,
            Topic::ReactionResolved,
            Topic::PerformAction,
            Topic::DamageApplied,
            Topic::ActionResolved,
        ]
    );
    let Some(Event::ReactionResolved { reactions, .. }) = report.find(Topic::ReactionResolved)
    else {
        unreachable!();
    };
    assert!(reactions.is_empty());
    assert_eq!(session.store().health(BRUTE).unwrap().superficial(), 3);
}

#[test]
fn late_declarations_and_timeouts_are_dropped() {
    let mut session = started(duel(), [7, 8, 2]);
    session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    session.close_reaction_window(WindowId(1)).unwrap();

    let report = session
        .declare_reaction(WindowId(1), BRUTE, ReactionChoice::React(ActionId::from(DODGE)))
        .unwrap();
    assert!(report.is_clean());
    assert_eq!(topics(&report), vec![Topic::ReactionDeclared]);
    assert_eq!(session.store().get(BRUTE).unwrap().reactions.declared, 0);

    let report = session.close_reaction_window(WindowId(1)).unwrap();
    assert!(report.is_clean());
    assert_eq!(topics(&report), vec![Topic::ReactionTimeout]);
    assert_eq!(session.store().health(BRUTE).unwrap().superficial(), 3);
}

#[test]
fn rejected_intent_keeps_the_turn_waiting() {
    let mut roster = duel();
    roster[1].position = combat_core::Position::new(5, 5);
    let mut session = started(roster, []);

    let report = session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    assert_eq!(topics(&report), vec![Topic::IntentSubmitted, Topic::IntentRejected]);
    let Some(Event::IntentRejected { reason, .. }) = report.find(Topic::IntentRejected) else {
        unreachable!();
    };
    assert!(matches!(reason, combat_core::InvalidIntent::OutOfReach { .. }));

    assert_eq!(session.phase(), Phase::AwaitingIntent);
    assert!(session.store().get(HERO).unwrap().budget.contains(ActionBudget::MAJOR));
    assert!(session.state().scheduler().is_empty());

    // Someone else's intent is refused the same way.
    let report = session.submit_intent(step(&session, BRUTE, 5, 4)).unwrap();
    assert!(report.contains(Topic::IntentRejected));
    assert_eq!(session.store().position(BRUTE), Some(combat_core::Position::new(5, 5)));
}

#[test]
fn cancel_is_only_possible_before_enqueue() {
    let mut session = started(duel(), [7, 8, 2]);

    assert_eq!(
        session.cancel_intent(BRUTE).unwrap_err(),
        RuntimeError::NotCurrentActor {
            actor: BRUTE,
            current: Some(HERO),
        }
    );
    assert!(session.cancel_intent(HERO).unwrap().events.is_empty());

    session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    assert_eq!(
        session.cancel_intent(HERO).unwrap_err(),
        RuntimeError::CancelTooLate {
            phase: Phase::ReactionOpen,
        }
    );
    assert_eq!(
        session.submit_intent(attack(&session, HERO, BRUTE)).unwrap_err(),
        RuntimeError::Busy {
            operation: "submit an intent",
            phase: Phase::ReactionOpen,
        }
    );
}

#[test]
fn focus_applies_a_condition_without_a_window() {
    let mut session = started(duel(), []);

    let report = session.submit_intent(intent(&session, HERO, FOCUS, None)).unwrap();
    assert_eq!(
        topics(&report),
        vec![
            Topic::IntentSubmitted,
            Topic::IntentValidated,
            Topic::ActionEnqueued,
            Topic::PerformAction,
            Topic::ConditionChanged,
            Topic::ActionResolved,
        ]
    );
    let Some(Event::ConditionChanged { change }) = report.find(Topic::ConditionChanged) else {
        unreachable!();
    };
    assert_eq!(change.entity, HERO);
    assert_eq!(session.store().get(HERO).unwrap().willpower.superficial(), 1);
    assert_eq!(session.phase(), Phase::AwaitingIntent);
}

#[test]
fn spending_every_slot_ends_the_turn() {
    let mut session = started(duel(), []);

    session.submit_intent(intent(&session, HERO, FOCUS, None)).unwrap();
    let report = session.submit_intent(step(&session, HERO, 0, 1)).unwrap();
    assert!(report.contains(Topic::ActionResolved));
    assert!(!report.contains(Topic::EndTurn));

    session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    let report = session
        .declare_reaction(WindowId(1), BRUTE, ReactionChoice::Pass)
        .unwrap();

    let Some(Event::ActionResolved { resolution }) = report.find(Topic::ActionResolved) else {
        unreachable!();
    };
    assert_eq!(resolution.outcome, ActionOutcome::Miss);
    assert!(report.contains(Topic::EndTurn));
    assert_eq!(began(&report), vec![BRUTE]);
    assert_eq!(session.current_actor(), Some(BRUTE));
    assert_eq!(session.phase(), Phase::AwaitingIntent);
}

#[test]
fn ending_the_last_turn_rolls_a_new_round() {
    let mut session = started(duel(), []);

    let report = session.end_turn(HERO).unwrap();
    assert_eq!(topics(&report), vec![Topic::EndTurn, Topic::BeginTurn]);
    assert_eq!(began(&report), vec![BRUTE]);

    assert_eq!(
        session.end_turn(HERO).unwrap_err(),
        RuntimeError::NotCurrentActor {
            actor: HERO,
            current: Some(BRUTE),
        }
    );

    let report = session.end_turn(BRUTE).unwrap();
    assert_eq!(topics(&report), vec![Topic::EndTurn, Topic::RoundStarted, Topic::BeginTurn]);
    assert_eq!(began(&report), vec![HERO]);
    assert_eq!(session.round(), Round(2));
}

#[test]
fn delayed_actor_acts_later_in_the_round() {
    let roster = vec![
        fighter(HERO, 0, 0, 0, 5),
        fighter(BRUTE, 1, 1, 0, 3),
        fighter(SIDEKICK, 0, 0, 1, 1),
    ];
    let mut session = started(roster, []);

    let report = session.delay(HERO, 2).unwrap();
    assert_eq!(topics(&report), vec![Topic::TurnDelayed, Topic::BeginTurn]);
    assert_eq!(began(&report), vec![BRUTE]);

    assert_eq!(began(&session.end_turn(BRUTE).unwrap()), vec![HERO]);
    assert_eq!(began(&session.end_turn(HERO).unwrap()), vec![SIDEKICK]);

    let report = session.end_turn(SIDEKICK).unwrap();
    assert!(report.contains(Topic::RoundStarted));
    assert_eq!(session.round(), Round(2));
    assert_eq!(session.current_actor(), Some(HERO));
}

#[test]
fn skipping_gives_an_initiative_bonus_next_round() {
    let mut session = started(duel(), []);
    let bonus = session.state().config().skip_initiative_bonus;

    let report = session.skip_round(HERO).unwrap();
    assert_eq!(topics(&report), vec![Topic::EndTurn, Topic::BeginTurn]);
    assert_eq!(began(&report), vec![BRUTE]);

    let report = session.end_turn(BRUTE).unwrap();
    let Some(Event::RoundStarted { round, order }) = report.find(Topic::RoundStarted) else {
        panic!("no new round in {report:?}");
    };
    assert_eq!(*round, Round(2));
    let hero = order.iter().find(|e| e.actor == HERO).unwrap();
    assert_eq!(hero.initiative, 5 + bonus);
}

#[test]
fn skipping_ahead_of_time_drops_the_slot() {
    let mut session = started(duel(), []);

    let report = session.skip_round(BRUTE).unwrap();
    assert!(report.events.is_empty());

    let report = session.end_turn(HERO).unwrap();
    assert_eq!(topics(&report), vec![Topic::EndTurn, Topic::RoundStarted, Topic::BeginTurn]);
    assert_eq!(began(&report), vec![HERO]);
}

#[test]
fn forgoing_the_major_action_removes_it_from_the_budget() {
    let mut session = started(duel(), []);

    session.forgo_major(HERO).unwrap();
    let hero = session.store().get(HERO).unwrap();
    assert!(!hero.budget.contains(ActionBudget::MAJOR));
    assert!(hero.reactions.forgo_major);

    let report = session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    assert!(report.contains(Topic::IntentRejected));
}

#[test]
fn destroying_the_last_enemy_ends_the_battle() {
    let mut roster = duel();
    roster[0].weapon.severity = Severity::Aggravated;
    roster[0].weapon.bonus = 2;
    roster[1].stats.stamina = 0;
    let mut session = started(roster, [7, 8, 2]);

    session.submit_intent(attack(&session, HERO, BRUTE)).unwrap();
    let report = session
        .declare_reaction(WindowId(1), BRUTE, ReactionChoice::Pass)
        .unwrap();

    assert_eq!(
        topics(&report),
        vec![
            Topic::ReactionDeclared,
            Topic::ReactionResolved,
            Topic::PerformAction,
            Topic::DamageApplied,
            Topic::ActionResolved,
        ]
    );
    let Some(Event::DamageApplied { track, .. }) = report.find(Topic::DamageApplied) else {
        unreachable!();
    };
    assert!(track.destroyed);

    let outcome = session.outcome().unwrap();
    assert_eq!(outcome.winner, Some(TeamId(0)));
    assert_eq!(outcome.round, Round(1));
    assert!(session.is_over());
    assert_eq!(session.phase(), Phase::Idle);
    assert_eq!(session.end_turn(HERO).unwrap_err(), RuntimeError::BattleOver);
}
