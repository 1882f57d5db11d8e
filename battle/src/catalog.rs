//! Content tables consumed by the engine.
//!
//! The tables themselves are authored elsewhere (see the `gemfall-assets`
//! crate); this is only the lookup surface.

use crate::types::{ClassStats, EnemyDefinition, GemDefinition, PlayerClass};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentCatalog {
    pub gems: Vec<GemDefinition>,
    pub enemies: Vec<EnemyDefinition>,
    pub classes: Vec<ClassStats>,
}

impl ContentCatalog {
    pub fn gem(&self, key: &str) -> Option<&GemDefinition> {
        self.gems.iter().find(|g| g.key == key)
    }

    pub fn enemy(&self, key: &str) -> Option<&EnemyDefinition> {
        self.enemies.iter().find(|e| e.key == key)
    }

    pub fn class(&self, class: PlayerClass) -> Option<&ClassStats> {
        self.classes.iter().find(|c| c.class == class)
    }

    /// Keys of every gem type that starts fully mastered
    pub fn mastered_keys(&self) -> impl Iterator<Item = &str> {
        self.gems
            .iter()
            .filter(|g| g.mastered)
            .map(|g| g.key.as_str())
    }
}
