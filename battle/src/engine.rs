//! Turn resolution engine.
//!
//! Every intent follows the same shape: validate against the current state
//! and bail out with an [`ActionError`] before touching anything, then mutate
//! and return the [`BattleEvent`]s in the order they happened. A rejected
//! intent therefore leaves the state exactly as it was.
//!
//! A battle cycles `AwaitingPlayerAction -> ResolvingPlayerAction ->
//! AwaitingEnemyAction -> ResolvingEnemyAction` until it reaches `Victory`,
//! `Defeat` or `Fled`. The enemy turn runs synchronously as part of the
//! player's end-turn intent. Each side's buffs tick down once at the end of
//! that side's turn.

use crate::buffs;
use crate::error::{ActionError, ActionResult};
use crate::events::BattleEvent;
use crate::proficiency::roll_failure;
use crate::rng::BattleRng;
use crate::rules::Rules;
use crate::state::{BattleState, GameState, TurnFlags, TurnStatus};
use crate::types::{
    Buff, BuffKind, Enemy, EnemyAction, EnemyDefinition, GemEffect, Player, Side,
};

// ==========================================
// BATTLE LIFECYCLE
// ==========================================

impl GameState {
    /// Begin a battle against `def`. The player draws up to the hand size and
    /// takes the first turn.
    pub fn start_battle(
        &mut self,
        def: &EnemyDefinition,
        rules: &Rules,
        rng: &mut impl BattleRng,
    ) -> ActionResult<Vec<BattleEvent>> {
        if self.in_battle() {
            return Err(ActionError::BattleInProgress);
        }
        if !self.player.is_alive() {
            return Err(ActionError::PlayerDefeated);
        }
        let enemy = Enemy::from_definition(def).ok_or_else(|| ActionError::UnknownEnemy {
            key: def.key.clone(),
        })?;

        log::info!("battle start: {} ({} hp)", enemy.name, enemy.health);
        let mut events = vec![BattleEvent::BattleStarted {
            enemy: enemy.name.clone(),
            enemy_health: enemy.health,
            intent: enemy.next_action.clone(),
        }];

        self.battle = Some(BattleState {
            enemy,
            status: TurnStatus::AwaitingPlayerAction,
            turn: 1,
            flags: TurnFlags::default(),
        });
        self.begin_player_turn(1, rules, rng, &mut events);
        Ok(events)
    }

    /// The battle, if the player may act right now
    fn awaiting_player(&self) -> ActionResult<&BattleState> {
        let battle = self.battle.as_ref().ok_or(ActionError::NoBattle)?;
        if battle.status != TurnStatus::AwaitingPlayerAction {
            return Err(ActionError::NotPlayerTurn);
        }
        Ok(battle)
    }

    fn ensure_not_stunned(&self) -> ActionResult<()> {
        if buffs::has(&self.player.buffs, BuffKind::Stunned) {
            return Err(ActionError::Stunned);
        }
        Ok(())
    }

    fn begin_player_turn(
        &mut self,
        turn: u32,
        rules: &Rules,
        rng: &mut impl BattleRng,
        events: &mut Vec<BattleEvent>,
    ) {
        if let Some(battle) = self.battle.as_mut() {
            battle.turn = turn;
            battle.flags = TurnFlags::default();
            battle.status = TurnStatus::AwaitingPlayerAction;
        }
        let (count, reshuffled) = self.gems.draw_to(rules.hand_size, rng);
        events.push(BattleEvent::GemsDrawn { count, reshuffled });
        events.push(BattleEvent::TurnStarted {
            side: Side::Player,
            turn,
        });
    }

    /// Remove the battle and report its outcome
    fn conclude(&mut self, outcome: TurnStatus, events: &mut Vec<BattleEvent>) {
        let Some(battle) = self.battle.take() else {
            return;
        };
        let enemy = battle.enemy.name;
        match outcome {
            TurnStatus::Victory => {
                let reward = battle.enemy.reward;
                self.player.zenny += reward;
                events.push(BattleEvent::ZennyChanged {
                    delta: reward,
                    zenny: self.player.zenny,
                });
                events.push(BattleEvent::BattleVictory { enemy, reward });
            }
            TurnStatus::Defeat => events.push(BattleEvent::BattleDefeat { enemy }),
            TurnStatus::Fled => events.push(BattleEvent::BattleFled { enemy }),
            _ => {}
        }
        log::info!("battle over: {:?} after {} turns", outcome, battle.turn);
    }
}

// ==========================================
// PLAYER INTENTS
// ==========================================

impl GameState {
    /// Play the selected hand gems.
    ///
    /// The whole selection must be affordable; nothing is spent otherwise.
    /// Gems resolve in hand order, each rolling against its proficiency. A gem
    /// that fails is discarded without effect. Once the enemy falls the
    /// remaining gems are discarded unresolved.
    pub fn play_gems(
        &mut self,
        indices: &[usize],
        rules: &Rules,
        rng: &mut impl BattleRng,
    ) -> ActionResult<Vec<BattleEvent>> {
        self.awaiting_player()?;
        self.ensure_not_stunned()?;
        if indices.is_empty() {
            return Err(ActionError::EmptySelection);
        }
        let sorted = self.gems.validate_selection(indices)?;
        let need: i32 = sorted.iter().map(|&i| self.gems.hand[i].cost).sum();
        if need > self.player.stamina {
            return Err(ActionError::NotEnoughStamina {
                have: self.player.stamina,
                need,
            });
        }

        let mut events = Vec::new();
        let Some(battle) = self.battle.as_mut() else {
            return Err(ActionError::NoBattle);
        };
        battle.status = TurnStatus::ResolvingPlayerAction;
        battle.flags.acted = true;

        let played = self.gems.take_from_hand(&sorted);
        self.player.stamina -= need;
        events.push(BattleEvent::StaminaSpent {
            amount: need,
            remaining: self.player.stamina,
        });

        for gem in &played {
            if !battle.enemy.is_alive() {
                break;
            }
            let proficiency = self.proficiency.get_proficiency(&gem.key);
            let failed = roll_failure(&proficiency, rng);
            let update = self.proficiency.record_outcome(&gem.key, !failed);
            events.push(BattleEvent::ProficiencyUpdated {
                gem_key: update.gem_key.clone(),
                before: update.before,
                after: update.after,
                success: update.success,
            });
            if update.mastery_achieved {
                log::info!("gem mastered: {}", gem.key);
                events.push(BattleEvent::GemMastered {
                    gem_key: gem.key.clone(),
                });
            }

            if failed {
                log::debug!("gem {} ({}) failed", gem.id, gem.key);
                events.push(BattleEvent::GemFailed {
                    gem_id: gem.id,
                    gem_key: gem.key.clone(),
                });
                continue;
            }

            events.push(BattleEvent::GemResolved {
                gem_id: gem.id,
                gem_key: gem.key.clone(),
            });
            let percent = if gem.color == self.player.class.color() {
                100 + rules.class_bonus_percent
            } else {
                100
            };
            for effect in &gem.effects {
                apply_gem_effect(
                    &effect.scaled(percent),
                    &mut self.player,
                    &mut battle.enemy,
                    rules,
                    &mut events,
                );
                if !battle.enemy.is_alive() {
                    break;
                }
            }
        }
        self.gems.discard.extend(played);

        if !battle.enemy.is_alive() {
            self.conclude(TurnStatus::Victory, &mut events);
        } else {
            battle.status = TurnStatus::AwaitingPlayerAction;
        }
        Ok(events)
    }

    /// Rest: skip playing gems this turn and end it, earning the rest bonus.
    pub fn wait(
        &mut self,
        rules: &Rules,
        rng: &mut impl BattleRng,
    ) -> ActionResult<Vec<BattleEvent>> {
        let battle = self.awaiting_player()?;
        if battle.flags.acted {
            return Err(ActionError::AlreadyActed);
        }
        self.ensure_not_stunned()?;

        let mut events = Vec::new();
        self.finish_player_turn(rules, rng, &mut events);
        Ok(events)
    }

    /// Discard the selection without effect, earn the rest bonus and end the turn.
    pub fn discard_and_end(
        &mut self,
        indices: &[usize],
        rules: &Rules,
        rng: &mut impl BattleRng,
    ) -> ActionResult<Vec<BattleEvent>> {
        self.awaiting_player()?;
        self.ensure_not_stunned()?;
        if indices.is_empty() {
            return Err(ActionError::EmptySelection);
        }
        let sorted = self.gems.validate_selection(indices)?;

        let mut events = Vec::new();
        let discarded = self.gems.take_from_hand(&sorted);
        events.push(BattleEvent::GemsDiscarded {
            count: discarded.len(),
        });
        self.gems.discard.extend(discarded);
        self.grant_rest_bonus(rules, &mut events);
        self.finish_player_turn(rules, rng, &mut events);
        Ok(events)
    }

    /// Hand the turn to the enemy. A stunned player may still end the turn.
    pub fn end_turn(
        &mut self,
        rules: &Rules,
        rng: &mut impl BattleRng,
    ) -> ActionResult<Vec<BattleEvent>> {
        self.awaiting_player()?;
        let mut events = Vec::new();
        self.finish_player_turn(rules, rng, &mut events);
        Ok(events)
    }

    /// Leave the battle. Not possible in the dark phase.
    pub fn flee(&mut self) -> ActionResult<Vec<BattleEvent>> {
        self.awaiting_player()?;
        self.ensure_not_stunned()?;
        if !self.progress.phase.allows_flee() {
            return Err(ActionError::CannotFlee {
                phase: self.progress.phase,
            });
        }
        let mut events = Vec::new();
        self.conclude(TurnStatus::Fled, &mut events);
        Ok(events)
    }

    /// Grant the rest bonus unless this turn already got it.
    fn grant_rest_bonus(&mut self, rules: &Rules, events: &mut Vec<BattleEvent>) {
        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        if battle.flags.rest_granted {
            return;
        }
        battle.flags.rest_granted = true;
        let amount = self.player.recover_stamina(rules.rest_stamina_bonus);
        events.push(BattleEvent::StaminaRecovered {
            amount,
            stamina: self.player.stamina,
        });
    }

    /// Close the player's turn and run the enemy's.
    fn finish_player_turn(
        &mut self,
        rules: &Rules,
        rng: &mut impl BattleRng,
        events: &mut Vec<BattleEvent>,
    ) {
        let acted = match self.battle.as_ref() {
            Some(battle) => battle.flags.acted,
            None => return,
        };
        if !acted {
            self.grant_rest_bonus(rules, events);
        }

        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        let turn = battle.turn;
        events.push(BattleEvent::TurnEnded {
            side: Side::Player,
            turn,
        });

        end_of_turn(
            &mut self.player.buffs,
            &mut self.player.health,
            Side::Player,
            events,
        );
        if !self.player.is_alive() {
            self.conclude(TurnStatus::Defeat, events);
            return;
        }

        battle.status = TurnStatus::AwaitingEnemyAction;
        self.resolve_enemy_turn(rules, rng, events);
    }
}

// ==========================================
// ENEMY TURN
// ==========================================

impl GameState {
    fn resolve_enemy_turn(
        &mut self,
        rules: &Rules,
        rng: &mut impl BattleRng,
        events: &mut Vec<BattleEvent>,
    ) {
        let Some(battle) = self.battle.as_mut() else {
            return;
        };
        battle.status = TurnStatus::ResolvingEnemyAction;
        let turn = battle.turn;
        events.push(BattleEvent::TurnStarted {
            side: Side::Enemy,
            turn,
        });

        let stunned = buffs::has(&battle.enemy.buffs, BuffKind::Stunned);
        if stunned {
            events.push(BattleEvent::EnemyStunned);
        } else {
            let action = battle.enemy.next_action.clone();
            events.push(BattleEvent::EnemyActed {
                action: action.clone(),
            });
            apply_enemy_action(&action, &mut battle.enemy, &mut self.player, rules, events);
        }

        if !self.player.is_alive() {
            self.conclude(TurnStatus::Defeat, events);
            return;
        }

        events.push(BattleEvent::TurnEnded {
            side: Side::Enemy,
            turn,
        });
        let enemy = &mut battle.enemy;
        end_of_turn(&mut enemy.buffs, &mut enemy.health, Side::Enemy, events);
        if !enemy.is_alive() {
            self.conclude(TurnStatus::Victory, events);
            return;
        }

        // A stunned enemy keeps its intent for the next turn
        if !stunned {
            let intent = enemy.advance_action().clone();
            events.push(BattleEvent::EnemyIntent { action: intent });
        }

        self.begin_player_turn(turn + 1, rules, rng, events);
    }
}

// ==========================================
// EFFECT RESOLUTION
// ==========================================

/// Poison tick then buff decrement for the side whose turn just ended
fn end_of_turn(buffs: &mut Vec<Buff>, health: &mut i32, side: Side, events: &mut Vec<BattleEvent>) {
    let poison = buffs::magnitude(buffs, BuffKind::Poison);
    if poison > 0 {
        *health -= poison;
        events.push(BattleEvent::DamageTaken {
            target: side,
            amount: poison,
            blocked: 0,
            remaining_health: *health,
        });
    }
    for kind in buffs::tick(buffs) {
        events.push(BattleEvent::BuffExpired { target: side, kind });
    }
}

/// Deal outgoing damage from an attacker's buffs into a defender.
///
/// Focus and Minion add to the base, Curse cuts it, then the defender's
/// Defense and Shield mitigate.
fn strike(
    base: i32,
    attacker: &[Buff],
    defender: &mut Vec<Buff>,
    defender_health: &mut i32,
    target: Side,
    rules: &Rules,
    events: &mut Vec<BattleEvent>,
) {
    let mut raw = base
        + buffs::magnitude(attacker, BuffKind::Focus)
        + buffs::magnitude(attacker, BuffKind::Minion);
    if buffs::has(attacker, BuffKind::Curse) {
        raw = raw * (100 - rules.curse_reduction_percent) / 100;
    }
    let mitigation = buffs::mitigate(defender, raw, rules.defense_reduction_percent);
    *defender_health -= mitigation.dealt;
    events.push(BattleEvent::DamageTaken {
        target,
        amount: mitigation.dealt,
        blocked: mitigation.blocked,
        remaining_health: *defender_health,
    });
    if mitigation.shield_broken {
        events.push(BattleEvent::BuffExpired {
            target,
            kind: BuffKind::Shield,
        });
    }
}

fn heal(health: &mut i32, max_health: i32, amount: i32, target: Side, events: &mut Vec<BattleEvent>) {
    let healed = amount.min(max_health - *health).max(0);
    *health += healed;
    events.push(BattleEvent::Healed {
        target,
        amount: healed,
        health: *health,
    });
}

fn add_buff(buff_list: &mut Vec<Buff>, buff: Buff, target: Side, events: &mut Vec<BattleEvent>) {
    let merged = buffs::apply(buff_list, buff);
    events.push(BattleEvent::BuffApplied {
        target,
        buff: merged,
    });
}

fn apply_gem_effect(
    effect: &GemEffect,
    player: &mut Player,
    enemy: &mut Enemy,
    rules: &Rules,
    events: &mut Vec<BattleEvent>,
) {
    match *effect {
        GemEffect::Damage { amount } => strike(
            amount,
            &player.buffs,
            &mut enemy.buffs,
            &mut enemy.health,
            Side::Enemy,
            rules,
            events,
        ),
        GemEffect::Heal { amount } => heal(
            &mut player.health,
            player.max_health,
            amount,
            Side::Player,
            events,
        ),
        GemEffect::Shield { amount, turns } => add_buff(
            &mut player.buffs,
            Buff::self_applied(BuffKind::Shield, amount, turns),
            Side::Player,
            events,
        ),
        GemEffect::Poison { amount, turns } => add_buff(
            &mut enemy.buffs,
            Buff::new(BuffKind::Poison, amount, turns),
            Side::Enemy,
            events,
        ),
        GemEffect::Focus { amount, turns } => add_buff(
            &mut player.buffs,
            Buff::self_applied(BuffKind::Focus, amount, turns),
            Side::Player,
            events,
        ),
        GemEffect::Fortify { turns } => add_buff(
            &mut player.buffs,
            Buff::self_applied(BuffKind::Defense, rules.defense_reduction_percent, turns),
            Side::Player,
            events,
        ),
        GemEffect::Stun { turns } => add_buff(
            &mut enemy.buffs,
            Buff::new(BuffKind::Stunned, 1, turns),
            Side::Enemy,
            events,
        ),
    }
}

fn apply_enemy_action(
    action: &EnemyAction,
    enemy: &mut Enemy,
    player: &mut Player,
    rules: &Rules,
    events: &mut Vec<BattleEvent>,
) {
    match *action {
        EnemyAction::Attack { damage } => strike(
            damage,
            &enemy.buffs,
            &mut player.buffs,
            &mut player.health,
            Side::Player,
            rules,
            events,
        ),
        EnemyAction::Defend { turns } => add_buff(
            &mut enemy.buffs,
            Buff::self_applied(BuffKind::Defense, rules.defense_reduction_percent, turns),
            Side::Enemy,
            events,
        ),
        EnemyAction::Charge { bonus } => add_buff(
            &mut enemy.buffs,
            Buff::self_applied(BuffKind::Focus, bonus, rules.charge_turns),
            Side::Enemy,
            events,
        ),
        EnemyAction::Steal { zenny } => {
            let stolen = zenny.min(player.zenny).max(0);
            player.zenny -= stolen;
            events.push(BattleEvent::ZennyChanged {
                delta: -stolen,
                zenny: player.zenny,
            });
        }
        EnemyAction::Poison { amount, turns } => add_buff(
            &mut player.buffs,
            Buff::new(BuffKind::Poison, amount, turns),
            Side::Player,
            events,
        ),
        EnemyAction::Stun { turns } => add_buff(
            &mut player.buffs,
            Buff::new(BuffKind::Stunned, 1, turns),
            Side::Player,
            events,
        ),
        EnemyAction::Curse { turns } => add_buff(
            &mut player.buffs,
            Buff::new(BuffKind::Curse, rules.curse_reduction_percent, turns),
            Side::Player,
            events,
        ),
        EnemyAction::Summon { damage, turns } => add_buff(
            &mut enemy.buffs,
            Buff::self_applied(BuffKind::Minion, damage, turns),
            Side::Enemy,
            events,
        ),
        EnemyAction::Heal { amount } => heal(
            &mut enemy.health,
            enemy.max_health,
            amount,
            Side::Enemy,
            events,
        ),
    }
}
