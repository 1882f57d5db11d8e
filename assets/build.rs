//! Build script: reads data/gems.json, data/enemies.json and data/classes.json
//! and generates Rust source that statically constructs the default content.
//! The content ships inside the wasm bundle without any runtime JSON parsing.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

// ── JSON schema types (build-time only) ──────────────────────────────────────

#[derive(Deserialize)]
struct JsonGem {
    key: String,
    name: String,
    color: String,
    cost: i32,
    price: i32,
    #[serde(default)]
    mastered: bool,
    effects: Vec<JsonEffect>,
}

#[derive(Deserialize)]
struct JsonEffect {
    #[serde(rename = "type")]
    effect_type: String,
    // Damage, Heal, Shield, Poison, Focus
    amount: Option<i32>,
    // Shield, Poison, Focus, Fortify, Stun
    turns: Option<u32>,
}

#[derive(Deserialize)]
struct JsonEnemy {
    key: String,
    name: String,
    health: i32,
    reward: i32,
    pattern: Vec<JsonAction>,
}

#[derive(Deserialize)]
struct JsonAction {
    #[serde(rename = "type")]
    action_type: String,
    damage: Option<i32>,
    amount: Option<i32>,
    bonus: Option<i32>,
    zenny: Option<i32>,
    turns: Option<u32>,
}

#[derive(Deserialize)]
struct JsonClass {
    class: String,
    max_health: i32,
    max_stamina: i32,
    starting_zenny: i32,
    starter_gems: Vec<String>,
}

// ── Code generation helpers ──────────────────────────────────────────────────

fn required<T: Copy>(field: Option<T>, name: &str, owner: &str) -> T {
    field.unwrap_or_else(|| panic!("{owner}: missing field `{name}`"))
}

fn gen_color(color: &str, owner: &str) -> String {
    match color {
        "Red" | "Blue" | "Green" | "Grey" => format!("GemColor::{color}"),
        other => panic!("{owner}: unknown colour {other}"),
    }
}

fn gen_effect(effect: &JsonEffect, owner: &str) -> String {
    let amount = || required(effect.amount, "amount", owner);
    let turns = || required(effect.turns, "turns", owner);
    match effect.effect_type.as_str() {
        "Damage" => format!("GemEffect::Damage {{ amount: {} }}", amount()),
        "Heal" => format!("GemEffect::Heal {{ amount: {} }}", amount()),
        "Shield" => format!(
            "GemEffect::Shield {{ amount: {}, turns: {} }}",
            amount(),
            turns()
        ),
        "Poison" => format!(
            "GemEffect::Poison {{ amount: {}, turns: {} }}",
            amount(),
            turns()
        ),
        "Focus" => format!(
            "GemEffect::Focus {{ amount: {}, turns: {} }}",
            amount(),
            turns()
        ),
        "Fortify" => format!("GemEffect::Fortify {{ turns: {} }}", turns()),
        "Stun" => format!("GemEffect::Stun {{ turns: {} }}", turns()),
        other => panic!("{owner}: unknown effect type {other}"),
    }
}

fn gen_action(action: &JsonAction, owner: &str) -> String {
    let turns = || required(action.turns, "turns", owner);
    match action.action_type.as_str() {
        "Attack" => format!(
            "EnemyAction::Attack {{ damage: {} }}",
            required(action.damage, "damage", owner)
        ),
        "Defend" => format!("EnemyAction::Defend {{ turns: {} }}", turns()),
        "Charge" => format!(
            "EnemyAction::Charge {{ bonus: {} }}",
            required(action.bonus, "bonus", owner)
        ),
        "Steal" => format!(
            "EnemyAction::Steal {{ zenny: {} }}",
            required(action.zenny, "zenny", owner)
        ),
        "Poison" => format!(
            "EnemyAction::Poison {{ amount: {}, turns: {} }}",
            required(action.amount, "amount", owner),
            turns()
        ),
        "Stun" => format!("EnemyAction::Stun {{ turns: {} }}", turns()),
        "Curse" => format!("EnemyAction::Curse {{ turns: {} }}", turns()),
        "Summon" => format!(
            "EnemyAction::Summon {{ damage: {}, turns: {} }}",
            required(action.damage, "damage", owner),
            turns()
        ),
        "Heal" => format!(
            "EnemyAction::Heal {{ amount: {} }}",
            required(action.amount, "amount", owner)
        ),
        other => panic!("{owner}: unknown action type {other}"),
    }
}

fn gen_gem(gem: &JsonGem) -> String {
    let key = &gem.key;
    let name = &gem.name;
    let color = gen_color(&gem.color, key);
    let cost = gem.cost;
    let price = gem.price;
    let mastered = gem.mastered;
    let effects: Vec<String> = gem.effects.iter().map(|e| gen_effect(e, key)).collect();

    format!(
        r#"        GemDefinition {{
            key: String::from("{key}"),
            name: String::from("{name}"),
            color: {color},
            cost: {cost},
            effects: vec![{}],
            price: {price},
            mastered: {mastered},
        }}"#,
        effects.join(", ")
    )
}

fn gen_enemy(enemy: &JsonEnemy) -> String {
    let key = &enemy.key;
    let name = &enemy.name;
    let health = enemy.health;
    let reward = enemy.reward;
    let pattern: Vec<String> = enemy.pattern.iter().map(|a| gen_action(a, key)).collect();

    format!(
        r#"        EnemyDefinition {{
            key: String::from("{key}"),
            name: String::from("{name}"),
            health: {health},
            reward: {reward},
            pattern: vec![
                {}
            ],
        }}"#,
        pattern.join(",\n                ")
    )
}

fn gen_class(class: &JsonClass, gems: &[JsonGem]) -> String {
    let name = &class.class;
    if !matches!(name.as_str(), "Knight" | "Mage" | "Rogue") {
        panic!("unknown class {name}");
    }
    for key in &class.starter_gems {
        if !gems.iter().any(|g| &g.key == key) {
            panic!("{name}: starter gem {key} is not defined in gems.json");
        }
    }
    let starters: Vec<String> = class
        .starter_gems
        .iter()
        .map(|k| format!("String::from(\"{k}\")"))
        .collect();

    format!(
        r#"        ClassStats {{
            class: PlayerClass::{name},
            max_health: {},
            max_stamina: {},
            starting_zenny: {},
            starter_gems: vec![{}],
        }}"#,
        class.max_health,
        class.max_stamina,
        class.starting_zenny,
        starters.join(", ")
    )
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> T {
    println!("cargo:rerun-if-changed={}", path.display());
    let text = fs::read_to_string(path)
        .unwrap_or_else(|e| panic!("Failed to read {}: {e}", path.display()));
    serde_json::from_str(&text).unwrap_or_else(|e| panic!("Failed to parse {}: {e}", path.display()))
}

// ── Main ─────────────────────────────────────────────────────────────────────

fn main() {
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").unwrap();
    let data_dir = Path::new(&manifest_dir).join("data");

    let gems: Vec<JsonGem> = read_json(&data_dir.join("gems.json"));
    let enemies: Vec<JsonEnemy> = read_json(&data_dir.join("enemies.json"));
    let classes: Vec<JsonClass> = read_json(&data_dir.join("classes.json"));

    let gem_entries: Vec<String> = gems.iter().map(gen_gem).collect();
    let enemy_entries: Vec<String> = enemies.iter().map(gen_enemy).collect();
    let class_entries: Vec<String> = classes.iter().map(|c| gen_class(c, &gems)).collect();

    // ── Write output ─────────────────────────────────────────────────────────
    let out_dir = env::var("OUT_DIR").unwrap();
    let dest = Path::new(&out_dir).join("content_generated.rs");

    let generated = format!(
        r#"// Auto-generated from data/*.json — DO NOT EDIT
use gemfall_battle::types::*;

/// Returns every gem type defined in gems.json.
pub fn gem_definitions() -> Vec<GemDefinition> {{
    vec![
{}
    ]
}}

/// Returns every enemy defined in enemies.json.
pub fn enemy_definitions() -> Vec<EnemyDefinition> {{
    vec![
{}
    ]
}}

/// Returns the base stats of every class in classes.json.
pub fn class_stats() -> Vec<ClassStats> {{
    vec![
{}
    ]
}}
"#,
        gem_entries.join(",\n"),
        enemy_entries.join(",\n"),
        class_entries.join(",\n"),
    );

    fs::write(&dest, generated).expect("Failed to write generated content file");
}
