//! Default content tables for Gemfall.
//!
//! The tables are authored as JSON under `data/` and compiled into static
//! constructors by `build.rs`.

use gemfall_battle::ContentCatalog;

mod generated {
    include!(concat!(env!("OUT_DIR"), "/content_generated.rs"));
}

pub use generated::{class_stats, enemy_definitions, gem_definitions};

/// Every default table bundled into one catalog
pub fn default_catalog() -> ContentCatalog {
    ContentCatalog {
        gems: gem_definitions(),
        enemies: enemy_definitions(),
        classes: class_stats(),
    }
}
