use crate::buffs;
use crate::cycle::DayPhase;
use crate::error::ActionError;
use crate::events::BattleEvent;
use crate::rules::Rules;
use crate::state::TurnStatus;
use crate::tests::*;

fn recovered(events: &[BattleEvent]) -> usize {
    count_events(events, |e| matches!(e, BattleEvent::StaminaRecovered { .. }))
}

// ==========================================
// REST AND END TURN
// ==========================================

#[test]
fn test_wait_grants_rest_bonus_and_passes_turn() {
    let mut state = knight_vs("dummy");
    state.player.stamina = 0;

    let events = state
        .wait(&Rules::default(), &mut FixedRng(ROLL_HIT))
        .unwrap();

    assert_eq!(state.player.stamina, 3);
    assert_eq!(state.player.health, 47, "the dummy attacks for 3");
    let battle = state.battle.as_ref().unwrap();
    assert_eq!(battle.turn, 2);
    assert_eq!(battle.status, TurnStatus::AwaitingPlayerAction);
    assert!(events.contains(&BattleEvent::TurnEnded {
        side: Side::Player,
        turn: 1
    }));
    assert!(events.contains(&BattleEvent::TurnStarted {
        side: Side::Player,
        turn: 2
    }));
}

#[test]
fn test_wait_after_playing_is_rejected() {
    let mut state = knight_vs("dummy");
    let rules = Rules::default();
    set_hand(&mut state, &["ruby_strike", "grey_mend"]);
    state.play_gems(&[0], &rules, &mut FixedRng(ROLL_HIT)).unwrap();
    let before = state.clone();

    assert_eq!(
        state.wait(&rules, &mut FixedRng(ROLL_HIT)),
        Err(ActionError::AlreadyActed)
    );
    assert_eq!(state, before);
}

#[test]
fn test_end_turn_after_playing_grants_no_rest() {
    let mut state = knight_vs("dummy");
    let rules = Rules::default();
    set_hand(&mut state, &["ruby_strike"]);
    state.play_gems(&[0], &rules, &mut FixedRng(ROLL_HIT)).unwrap();

    let events = state.end_turn(&rules, &mut FixedRng(ROLL_HIT)).unwrap();

    assert_eq!(state.player.stamina, 2);
    assert_eq!(recovered(&events), 0);
}

#[test]
fn test_end_turn_without_playing_grants_rest_once() {
    let mut state = knight_vs("dummy");
    state.player.max_stamina = 10;
    state.player.stamina = 0;

    let events = state
        .end_turn(&Rules::default(), &mut FixedRng(ROLL_HIT))
        .unwrap();

    assert_eq!(state.player.stamina, 3);
    assert_eq!(recovered(&events), 1);
}

#[test]
fn test_discard_and_end_rest_bonus_not_doubled() {
    let mut state = knight_vs("dummy");
    state.player.max_stamina = 10;
    state.player.stamina = 0;
    // Enough in the bag that the next draw never reshuffles the discard pile
    let spare = fill(&mut state, "grey_mend", 5);
    state.gems.bag.extend(spare);
    let discard_before = state.gems.discard.len();
    let total = state.gems.total();

    let events = state
        .discard_and_end(&[0, 1], &Rules::default(), &mut FixedRng(ROLL_HIT))
        .unwrap();

    assert_eq!(state.player.stamina, 3, "one rest bonus, not two");
    assert_eq!(recovered(&events), 1);
    assert_eq!(state.gems.discard.len(), discard_before + 2);
    assert_eq!(state.gems.total(), total);
    assert!(events.contains(&BattleEvent::GemsDiscarded { count: 2 }));
}

#[test]
fn test_discard_and_end_requires_selection() {
    let mut state = knight_vs("dummy");
    assert_eq!(
        state.discard_and_end(&[], &Rules::default(), &mut FixedRng(ROLL_HIT)),
        Err(ActionError::EmptySelection)
    );
}

#[test]
fn test_intents_without_battle_are_rejected() {
    let mut state = knight();
    let rules = Rules::default();
    assert_eq!(
        state.wait(&rules, &mut FixedRng(ROLL_HIT)),
        Err(ActionError::NoBattle)
    );
    assert_eq!(state.flee(), Err(ActionError::NoBattle));
}

#[test]
fn test_battle_cannot_start_twice() {
    let mut state = knight_vs("dummy");
    let catalog = test_catalog();
    let result = state.start_battle(
        catalog.enemy("glass").unwrap(),
        &Rules::default(),
        &mut FixedRng(ROLL_HIT),
    );
    assert_eq!(result, Err(ActionError::BattleInProgress));
}

#[test]
fn test_enemy_without_pattern_is_rejected() {
    let mut state = knight();
    let catalog = test_catalog();
    let result = state.start_battle(
        catalog.enemy("empty").unwrap(),
        &Rules::default(),
        &mut FixedRng(ROLL_HIT),
    );
    assert_eq!(
        result,
        Err(ActionError::UnknownEnemy {
            key: "empty".to_string()
        })
    );
    assert!(!state.in_battle());
}

// ==========================================
// FLEE
// ==========================================

#[test]
fn test_flee_in_dark_is_rejected_without_change() {
    let mut state = knight_vs("dummy");
    state.progress.phase = DayPhase::Dark;
    let before = state.clone();

    let result = state.flee();

    assert_eq!(
        result,
        Err(ActionError::CannotFlee {
            phase: DayPhase::Dark
        })
    );
    assert_eq!(state, before, "battle state is untouched");
}

#[test]
fn test_flee_outside_dark_ends_battle() {
    let mut state = knight_vs("dummy");
    state.progress.phase = DayPhase::Dusk;

    let events = state.flee().unwrap();

    assert!(!state.in_battle());
    assert_eq!(
        events,
        vec![BattleEvent::BattleFled {
            enemy: "dummy".to_string()
        }]
    );
}

// ==========================================
// STUN
// ==========================================

#[test]
fn test_stun_blocks_exactly_one_player_turn() {
    let mut state = knight_vs("stunner");
    let rules = Rules::default();
    let mut rng = FixedRng(ROLL_HIT);

    state.end_turn(&rules, &mut rng).unwrap();
    assert!(buffs::has(&state.player.buffs, BuffKind::Stunned));

    let before = state.clone();
    assert_eq!(state.play_gems(&[0], &rules, &mut rng), Err(ActionError::Stunned));
    assert_eq!(state.wait(&rules, &mut rng), Err(ActionError::Stunned));
    assert_eq!(
        state.discard_and_end(&[0], &rules, &mut rng),
        Err(ActionError::Stunned)
    );
    assert_eq!(state.flee(), Err(ActionError::Stunned));
    assert_eq!(state, before);

    state.end_turn(&rules, &mut rng).unwrap();
    assert!(
        !buffs::has(&state.player.buffs, BuffKind::Stunned),
        "stun expires at the end of the stunned turn"
    );
    assert_eq!(state.player.health, 48, "the stunner attacks for 2");

    set_hand(&mut state, &["ruby_strike"]);
    assert!(state.play_gems(&[0], &rules, &mut rng).is_ok());
}

#[test]
fn test_stunned_enemy_skips_turn_and_keeps_intent() {
    let mut state = knight_vs("brute");
    let rules = Rules::default();
    let mut rng = FixedRng(ROLL_HIT);
    set_hand(&mut state, &["grey_daze"]);
    state.play_gems(&[0], &rules, &mut rng).unwrap();

    let events = state.end_turn(&rules, &mut rng).unwrap();

    assert!(events.contains(&BattleEvent::EnemyStunned));
    assert_eq!(state.player.health, 50);
    let foe = enemy(&state);
    assert_eq!(foe.next_action, EnemyAction::Attack { damage: 5 });
    assert!(!buffs::has(&foe.buffs, BuffKind::Stunned));
}

// ==========================================
// ENEMY BEHAVIOUR
// ==========================================

#[test]
fn test_enemy_pattern_cycles() {
    let mut state = knight_vs("brute");
    let rules = Rules::default();
    let mut rng = FixedRng(ROLL_HIT);

    let mut intents = Vec::new();
    for _ in 0..4 {
        state.end_turn(&rules, &mut rng).unwrap();
        intents.push(enemy(&state).next_action.clone());
    }

    assert_eq!(
        intents,
        vec![
            EnemyAction::Defend { turns: 1 },
            EnemyAction::Charge { bonus: 2 },
            EnemyAction::Attack { damage: 5 },
            EnemyAction::Defend { turns: 1 },
        ]
    );
    // Attack 5, defend, charge, then attack 5 + 2 focus
    assert_eq!(state.player.health, 50 - 5 - 7);
}

// ==========================================
// VICTORY AND DEFEAT
// ==========================================

#[test]
fn test_victory_awards_reward_and_discards_leftovers() {
    let mut state = knight_vs("glass");
    set_hand(&mut state, &["ruby_strike", "grey_mend"]);
    let total = state.gems.total();

    let events = state
        .play_gems(&[0, 1], &Rules::default(), &mut FixedRng(ROLL_HIT))
        .unwrap();

    assert!(!state.in_battle());
    assert_eq!(state.player.zenny, 27);
    assert_eq!(state.gems.total(), total);
    assert_eq!(
        count_events(&events, |e| matches!(e, BattleEvent::GemResolved { .. })),
        1,
        "the heal is never resolved once the enemy is down"
    );
    assert!(events.contains(&BattleEvent::ZennyChanged { delta: 7, zenny: 27 }));
}

#[test]
fn test_defeat_forces_next_day() {
    let mut state = knight_vs("dummy");
    let rules = Rules::default();
    let catalog = test_catalog();
    let mut rng = FixedRng(ROLL_HIT);
    state.player.health = 2;

    let events = state.end_turn(&rules, &mut rng).unwrap();

    assert!(!state.in_battle());
    assert!(events.contains(&BattleEvent::BattleDefeat {
        enemy: "dummy".to_string()
    }));
    let def = catalog.enemy("dummy").unwrap();
    assert_eq!(
        state.start_battle(def, &rules, &mut rng),
        Err(ActionError::PlayerDefeated)
    );

    state.start_next_day(&mut rng).unwrap();
    assert_eq!(state.player.health, 50);
    assert!(state.start_battle(def, &rules, &mut rng).is_ok());
}
