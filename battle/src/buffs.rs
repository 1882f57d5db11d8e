//! Buff bookkeeping shared by both combatants.

use crate::types::{Buff, BuffKind};

/// Add a buff or refresh the active one of the same kind.
///
/// The duration becomes the larger of the two. Stacking kinds add their
/// magnitudes, the others keep the larger magnitude. Returns the buff as it
/// stands after the merge.
pub fn apply(buffs: &mut Vec<Buff>, incoming: Buff) -> Buff {
    if let Some(existing) = buffs.iter_mut().find(|b| b.kind == incoming.kind) {
        existing.remaining_turns = existing.remaining_turns.max(incoming.remaining_turns);
        existing.fresh |= incoming.fresh;
        existing.magnitude = if incoming.kind.stacks_magnitude() {
            existing.magnitude + incoming.magnitude
        } else {
            existing.magnitude.max(incoming.magnitude)
        };
        return existing.clone();
    }
    buffs.push(incoming.clone());
    incoming
}

/// Decrement every buff once and drop the ones reaching zero.
///
/// A fresh buff only loses its fresh mark, so a self-applied buff lasts
/// through the opponent's next turn. Returns the kinds that expired, in the
/// order they were held.
pub fn tick(buffs: &mut Vec<Buff>) -> Vec<BuffKind> {
    let mut expired = Vec::new();
    buffs.retain_mut(|buff| {
        if buff.fresh {
            buff.fresh = false;
            return true;
        }
        buff.remaining_turns = buff.remaining_turns.saturating_sub(1);
        if buff.remaining_turns == 0 {
            expired.push(buff.kind);
            false
        } else {
            true
        }
    });
    expired
}

pub fn has(buffs: &[Buff], kind: BuffKind) -> bool {
    buffs.iter().any(|b| b.kind == kind)
}

/// Magnitude of the active buff of this kind, 0 when absent
pub fn magnitude(buffs: &[Buff], kind: BuffKind) -> i32 {
    buffs
        .iter()
        .find(|b| b.kind == kind)
        .map(|b| b.magnitude)
        .unwrap_or(0)
}

/// Outcome of running damage through a target's defenses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mitigation {
    /// Damage that reaches health
    pub dealt: i32,
    /// Damage stopped by defense and shield
    pub blocked: i32,
    /// Whether the shield was used up
    pub shield_broken: bool,
}

/// Run raw damage through Defense (percentage cut) and then Shield (absorb).
///
/// The shield's magnitude is reduced by what it absorbs and the shield is
/// removed once it reaches zero.
pub fn mitigate(buffs: &mut Vec<Buff>, raw: i32, defense_reduction_percent: i32) -> Mitigation {
    let raw = raw.max(0);
    let mut remaining = raw;

    if has(buffs, BuffKind::Defense) {
        remaining = remaining * (100 - defense_reduction_percent) / 100;
    }

    let mut shield_broken = false;
    if let Some(pos) = buffs.iter().position(|b| b.kind == BuffKind::Shield) {
        let shield = &mut buffs[pos];
        let absorbed = remaining.min(shield.magnitude.max(0));
        shield.magnitude -= absorbed;
        remaining -= absorbed;
        if shield.magnitude <= 0 {
            buffs.remove(pos);
            shield_broken = true;
        }
    }

    Mitigation {
        dealt: remaining,
        blocked: raw - remaining,
        shield_broken,
    }
}
