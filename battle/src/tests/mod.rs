mod flow;

use crate::catalog::ContentCatalog;
use crate::events::BattleEvent;
use crate::rng::BattleRng;
use crate::rules::Rules;
use crate::state::GameState;
use crate::types::*;

// ==========================================
// HELPER FUNCTIONS (Boilerplate Reduction)
// ==========================================

/// A roll that passes any failure chance below 100%
pub(crate) const ROLL_HIT: u32 = 9_999;
/// A roll that fails any non-zero failure chance
pub(crate) const ROLL_MISS: u32 = 0;

/// Returns the same value forever
pub(crate) struct FixedRng(pub u32);

impl BattleRng for FixedRng {
    fn next_u32(&mut self) -> u32 {
        self.0
    }
}

/// Replays a fixed list of values, cycling when exhausted
pub(crate) struct SequenceRng {
    values: Vec<u32>,
    pos: usize,
}

impl SequenceRng {
    pub(crate) fn new(values: Vec<u32>) -> Self {
        Self { values, pos: 0 }
    }
}

impl BattleRng for SequenceRng {
    fn next_u32(&mut self) -> u32 {
        let value = self.values[self.pos % self.values.len()];
        self.pos += 1;
        value
    }
}

fn gem_def(
    key: &str,
    color: GemColor,
    cost: i32,
    effects: Vec<GemEffect>,
    price: i32,
    mastered: bool,
) -> GemDefinition {
    GemDefinition {
        key: key.to_string(),
        name: key.to_string(),
        color,
        cost,
        effects,
        price,
        mastered,
    }
}

fn enemy_def(key: &str, health: i32, reward: i32, pattern: Vec<EnemyAction>) -> EnemyDefinition {
    EnemyDefinition {
        key: key.to_string(),
        name: key.to_string(),
        health,
        reward,
        pattern,
    }
}

pub(crate) fn test_catalog() -> ContentCatalog {
    ContentCatalog {
        gems: vec![
            gem_def("ruby_strike", GemColor::Red, 1, vec![GemEffect::Damage { amount: 4 }], 6, true),
            gem_def("ruby_cleave", GemColor::Red, 2, vec![GemEffect::Damage { amount: 6 }], 10, true),
            gem_def(
                "grey_guard",
                GemColor::Grey,
                1,
                vec![GemEffect::Shield { amount: 5, turns: 2 }],
                4,
                true,
            ),
            gem_def("grey_mend", GemColor::Grey, 1, vec![GemEffect::Heal { amount: 5 }], 4, true),
            gem_def("grey_daze", GemColor::Grey, 2, vec![GemEffect::Stun { turns: 1 }], 12, true),
            gem_def("sapphire_bolt", GemColor::Blue, 2, vec![GemEffect::Damage { amount: 5 }], 8, false),
            gem_def(
                "emerald_venom",
                GemColor::Green,
                1,
                vec![GemEffect::Poison { amount: 2, turns: 3 }],
                9,
                false,
            ),
        ],
        enemies: vec![
            enemy_def("dummy", 50, 5, vec![EnemyAction::Attack { damage: 3 }]),
            enemy_def("glass", 4, 7, vec![EnemyAction::Attack { damage: 1 }]),
            enemy_def(
                "brute",
                30,
                12,
                vec![
                    EnemyAction::Attack { damage: 5 },
                    EnemyAction::Defend { turns: 1 },
                    EnemyAction::Charge { bonus: 2 },
                ],
            ),
            enemy_def(
                "stunner",
                40,
                9,
                vec![EnemyAction::Stun { turns: 1 }, EnemyAction::Attack { damage: 2 }],
            ),
            enemy_def("thief", 20, 3, vec![EnemyAction::Steal { zenny: 5 }]),
            enemy_def("empty", 10, 1, vec![]),
        ],
        classes: vec![ClassStats {
            class: PlayerClass::Knight,
            max_health: 50,
            max_stamina: 3,
            starting_zenny: 20,
            starter_gems: vec![
                "ruby_strike".to_string(),
                "ruby_cleave".to_string(),
                "grey_guard".to_string(),
                "grey_mend".to_string(),
            ],
        }],
    }
}

/// A fresh Knight run, outside battle at day 1 dawn
pub(crate) fn knight() -> GameState {
    let (state, _) = GameState::new_run(
        PlayerClass::Knight,
        &test_catalog(),
        &Rules::default(),
        &mut FixedRng(ROLL_HIT),
    )
    .expect("knight stats exist");
    state
}

/// A Knight already in battle against `enemy_key`, on turn 1
pub(crate) fn knight_vs(enemy_key: &str) -> GameState {
    let mut state = knight();
    let catalog = test_catalog();
    let def = catalog.enemy(enemy_key).expect("enemy exists");
    state
        .start_battle(def, &Rules::default(), &mut FixedRng(ROLL_HIT))
        .expect("battle starts");
    state
}

/// Replace the hand with fresh gems of the given keys (old hand goes to the bag)
pub(crate) fn set_hand(state: &mut GameState, keys: &[&str]) {
    let catalog = test_catalog();
    let old: Vec<Gem> = state.gems.hand.drain(..).collect();
    state.gems.bag.extend(old);
    for key in keys {
        let def = catalog.gem(key).expect("gem exists");
        let id = state.gems.generate_gem_id();
        state.gems.hand.push(Gem::from_definition(id, def));
    }
}

/// Fill a collection with `count` copies of a gem
pub(crate) fn fill(state: &mut GameState, key: &str, count: usize) -> Vec<Gem> {
    let catalog = test_catalog();
    let def = catalog.gem(key).expect("gem exists");
    (0..count)
        .map(|_| Gem::from_definition(state.gems.generate_gem_id(), def))
        .collect()
}

pub(crate) fn enemy(state: &GameState) -> &Enemy {
    &state.battle.as_ref().expect("in battle").enemy
}

pub(crate) fn enemy_mut(state: &mut GameState) -> &mut Enemy {
    &mut state.battle.as_mut().expect("in battle").enemy
}

pub(crate) fn count_events(events: &[BattleEvent], pred: impl Fn(&BattleEvent) -> bool) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
