use parity_scale_codec::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Unique identifier for a gem instance
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Encode, Decode, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GemId(pub u32);

impl core::fmt::Display for GemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Playable classes, chosen at the start of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PlayerClass {
    Knight,
    Mage,
    Rogue,
}

impl PlayerClass {
    /// Signature colour; gems of this colour get the class bonus
    pub fn color(&self) -> GemColor {
        match self {
            PlayerClass::Knight => GemColor::Red,
            PlayerClass::Mage => GemColor::Blue,
            PlayerClass::Rogue => GemColor::Green,
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "knight" => Some(PlayerClass::Knight),
            "mage" => Some(PlayerClass::Mage),
            "rogue" => Some(PlayerClass::Rogue),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GemColor {
    Red,
    Blue,
    Green,
    /// Universal base gems, never class-matched
    Grey,
}

/// What a gem does when it resolves
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum GemEffect {
    /// Damage the enemy
    Damage { amount: i32 },
    /// Heal the player, capped at max health
    Heal { amount: i32 },
    /// Shield the player
    Shield { amount: i32, turns: u32 },
    /// Poison the enemy
    Poison { amount: i32, turns: u32 },
    /// Flat bonus to the player's outgoing damage
    Focus { amount: i32, turns: u32 },
    /// Defense buff on the player
    Fortify { turns: u32 },
    /// Stun the enemy
    Stun { turns: u32 },
}

impl GemEffect {
    /// Apply a percentage multiplier to the magnitude (durations are untouched)
    pub fn scaled(&self, percent: i32) -> Self {
        let scale = |amount: i32| amount * percent / 100;
        match *self {
            GemEffect::Damage { amount } => GemEffect::Damage { amount: scale(amount) },
            GemEffect::Heal { amount } => GemEffect::Heal { amount: scale(amount) },
            GemEffect::Shield { amount, turns } => GemEffect::Shield {
                amount: scale(amount),
                turns,
            },
            GemEffect::Poison { amount, turns } => GemEffect::Poison {
                amount: scale(amount),
                turns,
            },
            GemEffect::Focus { amount, turns } => GemEffect::Focus {
                amount: scale(amount),
                turns,
            },
            GemEffect::Fortify { turns } => GemEffect::Fortify { turns },
            GemEffect::Stun { turns } => GemEffect::Stun { turns },
        }
    }

    /// The same effect with every amount raised by one
    pub fn upgraded(&self) -> Self {
        match self {
            GemEffect::Damage { amount } => GemEffect::Damage { amount: *amount + 1 },
            GemEffect::Heal { amount } => GemEffect::Heal { amount: *amount + 1 },
            GemEffect::Shield { amount, turns } => GemEffect::Shield {
                amount: *amount + 1,
                turns: *turns,
            },
            GemEffect::Poison { amount, turns } => GemEffect::Poison {
                amount: *amount + 1,
                turns: *turns,
            },
            GemEffect::Focus { amount, turns } => GemEffect::Focus {
                amount: *amount + 1,
                turns: *turns,
            },
            _ => self.clone(),
        }
    }
}

/// Static description of a gem type (content data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GemDefinition {
    pub key: String,
    pub name: String,
    pub color: GemColor,
    pub cost: i32,
    pub effects: Vec<GemEffect>,
    /// Shop price in zenny
    pub price: i32,
    /// Starter and universal base gems are always mastered
    pub mastered: bool,
}

/// A gem instance circulating through bag, hand and discard
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Gem {
    pub id: GemId,
    pub key: String,
    pub color: GemColor,
    pub cost: i32,
    pub effects: Vec<GemEffect>,
    pub upgraded: bool,
}

impl Gem {
    pub fn from_definition(id: GemId, def: &GemDefinition) -> Self {
        Self {
            id,
            key: def.key.clone(),
            color: def.color,
            cost: def.cost,
            effects: def.effects.clone(),
            upgraded: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BuffKind {
    /// Absorbs incoming damage up to its magnitude
    Shield,
    /// Flat bonus added to outgoing damage
    Focus,
    /// Damage taken at the owner's turn end
    Poison,
    /// Owner cannot act this turn
    Stunned,
    /// Halves incoming damage
    Defense,
    /// Halves outgoing damage
    Curse,
    /// Extra damage added to every enemy attack
    Minion,
}

impl BuffKind {
    /// Whether re-applying the kind adds magnitudes instead of keeping the larger
    pub fn stacks_magnitude(&self) -> bool {
        matches!(
            self,
            BuffKind::Shield | BuffKind::Poison | BuffKind::Focus | BuffKind::Minion
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Buff {
    pub kind: BuffKind,
    pub magnitude: i32,
    pub remaining_turns: u32,
    /// Given by the owner during its own turn and not yet through one of its
    /// turn ends. The first turn end clears this instead of decrementing.
    #[serde(default)]
    pub fresh: bool,
}

impl Buff {
    pub fn new(kind: BuffKind, magnitude: i32, remaining_turns: u32) -> Self {
        Self {
            kind,
            magnitude,
            remaining_turns,
            fresh: false,
        }
    }

    /// A buff a side gives itself, so it still covers the opponent's next turn
    pub fn self_applied(kind: BuffKind, magnitude: i32, remaining_turns: u32) -> Self {
        Self {
            fresh: true,
            ..Self::new(kind, magnitude, remaining_turns)
        }
    }
}

/// Which combatant an effect lands on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Player,
    Enemy,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub class: PlayerClass,
    pub health: i32,
    pub max_health: i32,
    pub stamina: i32,
    pub max_stamina: i32,
    pub zenny: i32,
    pub buffs: Vec<Buff>,
}

impl Player {
    pub fn from_class(stats: &ClassStats) -> Self {
        Self {
            class: stats.class,
            health: stats.max_health,
            max_health: stats.max_health,
            stamina: stats.max_stamina,
            max_stamina: stats.max_stamina,
            zenny: stats.starting_zenny,
            buffs: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Add stamina, capped at max. Returns the amount actually gained.
    pub fn recover_stamina(&mut self, amount: i32) -> i32 {
        let before = self.stamina;
        self.stamina = (self.stamina + amount).min(self.max_stamina);
        self.stamina - before
    }
}

/// Enemy behaviour descriptor, precomputed one turn ahead
#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EnemyAction {
    Attack { damage: i32 },
    Defend { turns: u32 },
    Charge { bonus: i32 },
    Steal { zenny: i32 },
    Poison { amount: i32, turns: u32 },
    Stun { turns: u32 },
    Curse { turns: u32 },
    Summon { damage: i32, turns: u32 },
    Heal { amount: i32 },
}

/// Static description of an enemy (content data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnemyDefinition {
    pub key: String,
    pub name: String,
    pub health: i32,
    pub reward: i32,
    /// Actions cycled in order
    pub pattern: Vec<EnemyAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Encode, Decode, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enemy {
    pub key: String,
    pub name: String,
    pub health: i32,
    pub max_health: i32,
    pub buffs: Vec<Buff>,
    pub next_action: EnemyAction,
    /// Actions after `next_action`, in order
    pub action_queue: Vec<EnemyAction>,
    pub reward: i32,
}

impl Enemy {
    /// Instantiate an enemy. Returns None when the definition has no actions.
    pub fn from_definition(def: &EnemyDefinition) -> Option<Self> {
        let (first, rest) = def.pattern.split_first()?;
        Some(Self {
            key: def.key.clone(),
            name: def.name.clone(),
            health: def.health,
            max_health: def.health,
            buffs: Vec::new(),
            next_action: first.clone(),
            action_queue: rest.to_vec(),
            reward: def.reward,
        })
    }

    pub fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Re-queue the action just taken and promote the next one.
    pub fn advance_action(&mut self) -> &EnemyAction {
        if !self.action_queue.is_empty() {
            let upcoming = self.action_queue.remove(0);
            let taken = core::mem::replace(&mut self.next_action, upcoming);
            self.action_queue.push(taken);
        }
        &self.next_action
    }
}

/// Base stats for a class (content data)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassStats {
    pub class: PlayerClass,
    pub max_health: i32,
    pub max_stamina: i32,
    pub starting_zenny: i32,
    /// Gem keys dealt into the starting bag
    pub starter_gems: Vec<String>,
}
