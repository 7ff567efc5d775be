//! Spell reference records. Per-class catalogs are fetched on demand and
//! installed into the repository by the engine.

use serde::{Deserialize, Serialize};

/// A spell reference record. Level 0 is a cantrip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellDef {
    pub id: String,
    pub name: String,
    pub level: u8,
}

impl SpellDef {
    pub fn new(id: impl Into<String>, name: impl Into<String>, level: u8) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            level,
        }
    }

    pub fn is_cantrip(&self) -> bool {
        self.level == 0
    }
}
