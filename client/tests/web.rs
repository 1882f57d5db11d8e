#![cfg(target_arch = "wasm32")]

use gemfall_client::GameClient;
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;

fn client() -> GameClient {
    GameClient::new(JsValue::UNDEFINED, Some(42)).unwrap()
}

#[wasm_bindgen_test]
fn new_run_populates_the_state() {
    let client = client();
    client.new_run("knight").unwrap();

    assert_eq!(client.get("player.health").unwrap().as_f64(), Some(50.0));
    assert!(client.get("player.nothing").unwrap().is_undefined());
}

#[wasm_bindgen_test]
fn unknown_names_are_errors() {
    let client = client();
    let noop = js_sys::Function::new_no_args("");

    assert!(client.new_run("bard").is_err());
    assert!(client.on("NOT_A_CHANNEL", noop.clone()).is_err());
    assert!(client.on("BATTLE_STARTED", noop).is_ok());
}

#[wasm_bindgen_test]
fn callbacks_see_outcomes() {
    let client = client();
    let seen = js_sys::Array::new();
    let push = js_sys::Function::new_with_args("event", "this.push(event)")
        .bind(&seen);
    client.on("RUN_STARTED", push).unwrap();

    client.new_run("mage").unwrap();

    assert_eq!(seen.length(), 1);
}

#[wasm_bindgen_test]
fn state_callbacks_get_the_whole_document() {
    let client = client();
    let seen = js_sys::Array::new();
    let push = js_sys::Function::new_with_args("update", "this.push(update)")
        .bind(&seen);
    client.on_state(push);

    client.new_run("knight").unwrap();

    assert_eq!(seen.length(), 1, "one notification per command");
    let update = seen.get(0);
    let document = js_sys::Reflect::get(&update, &JsValue::from_str("document")).unwrap();
    let player = js_sys::Reflect::get(&document, &JsValue::from_str("player")).unwrap();
    let health = js_sys::Reflect::get(&player, &JsValue::from_str("health")).unwrap();
    assert_eq!(health.as_f64(), Some(50.0));
    let changes = js_sys::Reflect::get(&update, &JsValue::from_str("changes")).unwrap();
    assert!(js_sys::Array::is_array(&changes));
}

#[wasm_bindgen_test]
fn save_moves_a_run_between_clients() {
    let source = client();
    source.new_run("rogue").unwrap();
    source.start_battle("slime".into());
    let bytes = source.export_save().unwrap();

    let target = GameClient::new(JsValue::from_str("{}"), Some(1)).unwrap();
    assert!(target.export_save().is_err(), "no run yet");
    target.import_save(&bytes).unwrap();

    assert_eq!(
        target.get("battle.enemy.health").unwrap().as_f64(),
        Some(20.0)
    );
}
