//! Save files
//!
//! A save is a version byte followed by the SCALE encoding of the
//! [`GameState`]. Where the bytes are kept is up to the host page.

use gemfall_battle::GameState;
use parity_scale_codec::{Decode, Encode};

/// Bumped whenever the encoded layout of `GameState` changes
pub const SAVE_VERSION: u8 = 2;

pub fn encode(state: &GameState) -> Vec<u8> {
    let mut bytes = SAVE_VERSION.encode();
    state.encode_to(&mut bytes);
    bytes
}

pub fn decode(bytes: &[u8]) -> Result<GameState, String> {
    let mut input = bytes;
    let version =
        u8::decode(&mut input).map_err(|e| format!("Failed to decode save version: {:?}", e))?;
    if version != SAVE_VERSION {
        return Err(format!(
            "Unsupported save version {} (expected {})",
            version, SAVE_VERSION
        ));
    }
    let state = GameState::decode(&mut input)
        .map_err(|e| format!("Failed to decode GameState: {:?}", e))?;
    if !input.is_empty() {
        log::warn!("{} bytes remaining after decoding save", input.len());
    }
    Ok(state)
}
