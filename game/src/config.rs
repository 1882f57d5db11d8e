//! Game configuration.
//!
//! Every field has a default, so the host may pass a partial JSON object.

use gemfall_battle::Rules;
use serde::{Deserialize, Serialize};

use crate::bus::BusConfig;
use crate::store::StoreConfig;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GameConfig {
    pub rules: Rules,
    pub store: StoreConfig,
    pub bus: BusConfig,
}

impl GameConfig {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
