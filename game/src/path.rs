//! Validated state paths and the document schema.

use core::fmt;
use core::str::FromStr;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::store::{StoreError, Validation};

/// A dot-separated path into the state document, e.g. `player.health`.
///
/// Segments are non-empty runs of `[A-Za-z0-9_]`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatePath(String);

impl StatePath {
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        let valid = !path.is_empty()
            && path.split('.').all(|segment| {
                !segment.is_empty()
                    && segment
                        .chars()
                        .all(|c| c.is_ascii_alphanumeric() || c == '_')
            });
        if !valid {
            return Err(StoreError::InvalidPath {
                path: path.to_string(),
            });
        }
        Ok(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    /// The top-level section this path lives in
    pub fn section(&self) -> &str {
        self.0.split('.').next().unwrap_or(&self.0)
    }
}

impl FromStr for StatePath {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for StatePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for StatePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Every path the game reads or writes
pub mod paths {
    pub const PLAYER: &str = "player";
    pub const PLAYER_HEALTH: &str = "player.health";
    pub const PLAYER_STAMINA: &str = "player.stamina";
    pub const PLAYER_ZENNY: &str = "player.zenny";
    pub const PLAYER_BUFFS: &str = "player.buffs";
    pub const GEMS: &str = "gems";
    pub const GEMS_BAG: &str = "gems.bag";
    pub const GEMS_HAND: &str = "gems.hand";
    pub const GEMS_DISCARD: &str = "gems.discard";
    pub const PROFICIENCY: &str = "proficiency";
    pub const PROGRESS: &str = "progress";
    pub const PROGRESS_DAY: &str = "progress.day";
    pub const PROGRESS_PHASE: &str = "progress.phase";
    pub const BATTLE: &str = "battle";
    pub const BATTLE_ENEMY: &str = "battle.enemy";
    pub const BATTLE_STATUS: &str = "battle.status";

    pub const ALL: &[&str] = &[
        PLAYER,
        PLAYER_HEALTH,
        PLAYER_STAMINA,
        PLAYER_ZENNY,
        PLAYER_BUFFS,
        GEMS,
        GEMS_BAG,
        GEMS_HAND,
        GEMS_DISCARD,
        PROFICIENCY,
        PROGRESS,
        PROGRESS_DAY,
        PROGRESS_PHASE,
        BATTLE,
        BATTLE_ENEMY,
        BATTLE_STATUS,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionShape {
    /// Must hold an object once a run has started
    Object,
    /// Either an object or null
    Optional,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub name: &'static str,
    pub shape: SectionShape,
}

/// The top-level sections a state document must have
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub sections: Vec<Section>,
}

impl Schema {
    pub fn game() -> Self {
        let object = |name| Section {
            name,
            shape: SectionShape::Object,
        };
        Self {
            sections: vec![
                object(paths::PLAYER),
                object(paths::GEMS),
                object(paths::PROFICIENCY),
                object(paths::PROGRESS),
                Section {
                    name: paths::BATTLE,
                    shape: SectionShape::Optional,
                },
            ],
        }
    }

    /// Every section present and null, as before a run starts
    pub fn empty_document(&self) -> Value {
        let sections: Map<String, Value> = self
            .sections
            .iter()
            .map(|s| (s.name.to_string(), Value::Null))
            .collect();
        Value::Object(sections)
    }

    /// Check that a path lives under a known section
    pub fn check(&self, path: &StatePath) -> Result<(), StoreError> {
        if self.sections.iter().any(|s| s.name == path.section()) {
            Ok(())
        } else {
            Err(StoreError::UnknownSection {
                path: path.to_string(),
            })
        }
    }

    /// Parse and check a list of paths
    pub fn check_all(&self, paths: &[&str]) -> Result<(), StoreError> {
        for path in paths {
            self.check(&StatePath::parse(path)?)?;
        }
        Ok(())
    }

    /// Structural check of a document. Sections may be null until a run
    /// starts; once any required section is set, all of them must be objects.
    /// Keys outside the schema are left alone.
    pub fn validate(&self, document: &Value) -> Validation {
        let mut issues = Vec::new();
        let Some(root) = document.as_object() else {
            return Validation {
                valid: false,
                issues: vec!["document root is not an object".to_string()],
            };
        };

        let started = self.sections.iter().any(|s| {
            s.shape == SectionShape::Object && root.get(s.name).is_some_and(|v| !v.is_null())
        });

        for section in &self.sections {
            match (root.get(section.name), section.shape) {
                (None, _) => issues.push(format!("missing section '{}'", section.name)),
                (Some(Value::Object(_)), _) => {}
                (Some(Value::Null), SectionShape::Optional) => {}
                (Some(Value::Null), SectionShape::Object) if !started => {}
                (Some(Value::Null), SectionShape::Object) => {
                    issues.push(format!("section '{}' is empty", section.name))
                }
                (Some(_), _) => issues.push(format!("section '{}' is not an object", section.name)),
            }
        }
        Validation {
            valid: issues.is_empty(),
            issues,
        }
    }
}
