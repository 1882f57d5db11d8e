use std::cell::Cell;
use std::rc::Rc;

use gemfall_battle::{ActionError, DayPhase, PlayerClass, Proficiency, Rules};
use serde_json::json;

use crate::bus::{BusConfig, EventBus};
use crate::channel::{Channel, Command, GameEvent};
use crate::session::{GameSession, SessionError};
use crate::store::{StateStore, StoreConfig};
use crate::tests::*;

fn new_knight_run(h: &Harness) {
    h.send(Command::NewRun {
        class: PlayerClass::Knight,
    });
}

fn start_battle(h: &Harness, enemy: &str) {
    h.send(Command::StartBattle {
        enemy_key: enemy.to_string(),
    });
}

fn rejection(event: &GameEvent) -> (Channel, Option<ActionError>) {
    match event {
        GameEvent::ActionRejected { command, error, .. } => (*command, error.clone()),
        other => panic!("expected a rejection, got {:?}", other),
    }
}

// ==========================================
// RUNS AND BATTLES OVER THE BUS
// ==========================================

#[test]
fn test_new_run_fills_the_store() {
    let h = Harness::new();
    let started = h.capture(Channel::RunStarted);

    new_knight_run(&h);

    assert_eq!(started.borrow().len(), 1);
    assert_eq!(h.store.get("player.health"), Some(json!(50)));
    assert_eq!(h.store.get("player.stamina"), Some(json!(3)));
    assert_eq!(h.store.get("progress.day"), Some(json!(1)));
    assert_eq!(h.store.get("battle"), Some(serde_json::Value::Null));
    assert!(h.store.validate().valid);

    let state = h.state();
    assert_eq!(state.gems.bag.len(), 7, "knight starter bag");
    assert!(state.gems.hand.is_empty());
}

#[test]
fn test_start_battle_and_play_a_gem() {
    let h = Harness::new();
    new_knight_run(&h);
    start_battle(&h, "slime");

    let state = h.state();
    let battle = state.battle.as_ref().expect("battle started");
    assert_eq!(battle.enemy.health, 20);
    assert_eq!(state.gems.hand.len(), 3);
    assert_eq!(h.store.get("battle.status"), Some(json!("awaitingPlayerAction")));

    let cost = state.gems.hand[0].cost;
    let resolved = h.capture(Channel::GemResolved);
    let spent = h.capture(Channel::StaminaSpent);

    h.send(Command::PlayGems { indices: vec![0] });

    assert_eq!(resolved.borrow().len(), 1, "a passing roll resolves the gem");
    assert_eq!(spent.borrow().len(), 1);
    let after = h.state();
    assert_eq!(after.player.stamina, 3 - cost);
    assert_eq!(after.gems.hand.len(), 2);
    assert_eq!(after.gems.discard.len(), 1);
}

#[test]
fn test_end_turn_runs_the_enemy_turn() {
    let h = Harness::new();
    new_knight_run(&h);
    start_battle(&h, "slime");
    let acted = h.capture(Channel::EnemyActed);
    let turns = h.capture(Channel::TurnStarted);

    h.send(Command::EndTurn);

    assert_eq!(acted.borrow().len(), 1);
    assert!(!turns.borrow().is_empty());
    let state = h.state();
    assert_eq!(state.player.health, 47, "slime opens with a 3 damage attack");
    assert_eq!(state.battle.map(|b| b.turn), Some(2));
}

#[test]
fn test_flee_ends_the_battle() {
    let h = Harness::new();
    new_knight_run(&h);
    start_battle(&h, "goblin");
    let fled = h.capture(Channel::BattleFled);

    h.send(Command::Flee);

    assert_eq!(fled.borrow().len(), 1);
    assert!(!h.state().in_battle());
    assert_eq!(h.store.get("battle"), Some(serde_json::Value::Null));
}

// ==========================================
// REJECTIONS
// ==========================================

#[test]
fn test_rejected_intent_leaves_store_untouched() {
    let h = Harness::new();
    new_knight_run(&h);
    start_battle(&h, "slime");
    let rejected = h.capture(Channel::ActionRejected);
    let before = h.store.snapshot();
    let history = h.store.history().len();

    h.send(Command::PlayGems { indices: vec![7] });

    let rejected = rejected.borrow();
    assert_eq!(rejected.len(), 1);
    let (command, error) = rejection(&rejected[0]);
    assert_eq!(command, Channel::GemsPlay);
    assert!(matches!(
        error,
        Some(ActionError::InvalidHandIndex { index: 7, .. })
    ));
    assert_eq!(h.store.snapshot(), before);
    assert_eq!(h.store.history().len(), history);
}

#[test]
fn test_intent_without_a_run_is_rejected() {
    let h = Harness::new();
    let rejected = h.capture(Channel::ActionRejected);
    let before = h.store.snapshot();

    h.send(Command::EndTurn);
    h.send(Command::QueryProficiency {
        gem_key: "red_strike".to_string(),
    });

    let rejected = rejected.borrow();
    assert_eq!(rejected.len(), 2);
    assert_eq!(rejection(&rejected[0]), (Channel::EndTurn, None));
    assert_eq!(rejection(&rejected[1]), (Channel::GemProficiencyQuery, None));
    assert_eq!(h.store.snapshot(), before);
    assert!(matches!(h.session.state(), Err(SessionError::NoRun)));
}

#[test]
fn test_cannot_flee_in_the_dark() {
    let h = Harness::new();
    new_knight_run(&h);
    h.send(Command::AdvancePhase);
    h.send(Command::AdvancePhase);
    assert_eq!(h.state().progress.phase, DayPhase::Dark);

    start_battle(&h, "slime");
    let rejected = h.capture(Channel::ActionRejected);
    h.send(Command::Flee);

    let rejected = rejected.borrow();
    assert_eq!(
        rejection(&rejected[0]),
        (
            Channel::FleeBattle,
            Some(ActionError::CannotFlee {
                phase: DayPhase::Dark
            })
        )
    );
    assert!(h.state().in_battle());
}

#[test]
fn test_unknown_content_is_rejected() {
    let h = Harness::new();
    new_knight_run(&h);
    let rejected = h.capture(Channel::ActionRejected);

    start_battle(&h, "dragon");
    h.send(Command::BuyGem {
        gem_key: "diamond".to_string(),
    });

    let rejected = rejected.borrow();
    assert!(matches!(
        rejection(&rejected[0]).1,
        Some(ActionError::UnknownEnemy { .. })
    ));
    assert!(matches!(
        rejection(&rejected[1]).1,
        Some(ActionError::UnknownGem { .. })
    ));
}

// ==========================================
// SHOP, DAY CYCLE AND PROFICIENCY
// ==========================================

#[test]
fn test_buy_gem_spends_zenny() {
    let h = Harness::new();
    new_knight_run(&h);
    let purchased = h.capture(Channel::GemPurchased);
    let zenny = h.state().player.zenny;
    let price = h
        .session
        .catalog()
        .gem("grey_spark")
        .map(|g| g.price)
        .expect("grey_spark exists");
    assert!(price <= zenny, "a knight can afford a grey gem");

    h.send(Command::BuyGem {
        gem_key: "grey_spark".to_string(),
    });

    assert_eq!(purchased.borrow().len(), 1);
    let state = h.state();
    assert_eq!(state.player.zenny, zenny - price);
    assert_eq!(state.gems.total(), 8);
}

#[test]
fn test_next_day_restores_the_player() {
    let h = Harness::new();
    new_knight_run(&h);
    start_battle(&h, "slime");
    h.send(Command::EndTurn);
    h.send(Command::Flee);
    assert_eq!(h.state().player.health, 47);
    let days = h.capture(Channel::DayStarted);

    h.send(Command::StartNextDay);

    assert_eq!(days.borrow().len(), 1);
    let state = h.state();
    assert_eq!(state.progress.day, 2);
    assert_eq!(state.player.health, state.player.max_health);
    assert_eq!(state.gems.bag.len(), 7);
}

#[test]
fn test_proficiency_query_reports_over_the_bus() {
    let h = Harness::new();
    new_knight_run(&h);
    let reports = h.capture(Channel::GemProficiencyReport);

    h.send(Command::QueryProficiency {
        gem_key: "red_cleave".to_string(),
    });
    h.send(Command::QueryProficiency {
        gem_key: "red_strike".to_string(),
    });

    let reports = reports.borrow();
    assert_eq!(
        reports[0],
        GameEvent::ProficiencyReport {
            gem_key: "red_cleave".to_string(),
            proficiency: Proficiency {
                success_count: 0,
                failure_chance: Rules::default().novice_failure_bp,
            },
        }
    );
    assert_eq!(
        h.session.proficiency("red_strike").unwrap(),
        Proficiency::mastered()
    );
    assert_eq!(reports.len(), 2);
}

// ==========================================
// STORE NOTIFICATIONS AND RE-ENTRANCY
// ==========================================

#[test]
fn test_one_store_notification_per_command() {
    let h = Harness::new();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let _ = h.store.subscribe(move |_, _| counter.set(counter.get() + 1));

    new_knight_run(&h);
    assert_eq!(calls.get(), 1);

    start_battle(&h, "slime");
    assert_eq!(calls.get(), 2);

    h.send(Command::PlayGems { indices: vec![9] });
    assert_eq!(calls.get(), 2, "rejections do not write");

    h.send(Command::QueryProficiency {
        gem_key: "red_strike".to_string(),
    });
    assert_eq!(calls.get(), 2, "queries do not write");
}

#[test]
fn test_store_is_updated_before_outcomes_are_published() {
    let h = Harness::new();
    let reader = h.store.clone();
    let seen = Rc::new(Cell::new(None));
    let sink = Rc::clone(&seen);
    h.bus.subscribe(Channel::BattleStarted, move |_| {
        sink.set(reader.get("battle.enemy.health").and_then(|v| v.as_i64()));
        Ok(())
    });

    new_knight_run(&h);
    start_battle(&h, "troll");

    assert_eq!(seen.get(), Some(45));
}

#[test]
fn test_outcome_handler_may_issue_the_next_command() {
    let h = Harness::new();
    let bus = h.bus.clone();
    h.bus.subscribe_once(Channel::RunStarted, move |_| {
        bus.publish(GameEvent::Command(Command::StartBattle {
            enemy_key: "slime".to_string(),
        }));
        Ok(())
    });
    let log = new_log();
    let sink = Rc::clone(&log);
    h.bus.subscribe_all(move |envelope| {
        if !envelope.channel.is_command() {
            sink.borrow_mut().push(envelope.channel.to_string());
        }
        Ok(())
    });

    new_knight_run(&h);

    assert!(h.state().in_battle());
    let log = entries(&log);
    let run = log.iter().position(|c| c == "RUN_STARTED");
    let battle = log.iter().position(|c| c == "BATTLE_STARTED");
    assert!(run.is_some() && battle.is_some());
    assert!(
        battle < run,
        "the nested command resolves before the outer outcome reaches wildcards: {:?}",
        log
    );
}

// ==========================================
// LIFECYCLE
// ==========================================

#[test]
fn test_restore_replaces_stored_state() {
    let h = Harness::new();
    new_knight_run(&h);
    let mut state = h.state();
    state.player.zenny = 99;
    state.progress.day = 4;

    h.session.restore(&state).unwrap();

    assert_eq!(h.store.get("player.zenny"), Some(json!(99)));
    assert_eq!(h.state(), state);
}

#[test]
fn test_detached_session_ignores_commands() {
    let bus: EventBus<GameEvent> = EventBus::new(BusConfig::default());
    let store = StateStore::new(StoreConfig::default());
    let session = GameSession::attach(
        &bus,
        &store,
        gemfall_assets::default_catalog(),
        Rules::default(),
        FixedRng(0),
    )
    .unwrap();
    assert_eq!(bus.subscriber_count(Channel::NewRun), 1);

    session.detach();
    bus.publish(GameEvent::Command(Command::NewRun {
        class: PlayerClass::Mage,
    }));

    assert_eq!(bus.subscriber_count(Channel::NewRun), 0);
    assert_eq!(store.get("player"), Some(serde_json::Value::Null));
}

#[test]
fn test_dropped_session_goes_quiet() {
    let bus: EventBus<GameEvent> = EventBus::new(BusConfig::default());
    let store = StateStore::new(StoreConfig::default());
    let session = GameSession::attach(
        &bus,
        &store,
        gemfall_assets::default_catalog(),
        Rules::default(),
        FixedRng(0),
    )
    .unwrap();
    drop(session);

    bus.publish(GameEvent::Command(Command::NewRun {
        class: PlayerClass::Rogue,
    }));

    assert_eq!(store.get("player"), Some(serde_json::Value::Null));
}
