//! Background, species, and lineage reference records.

use serde::{Deserialize, Serialize};

use super::ability::Ability;
use super::class::EquipmentOption;

/// A background reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackgroundDef {
    pub id: String,
    pub name: String,
    /// Skills granted outright, not picked.
    pub skill_grants: Vec<String>,
    pub equipment: EquipmentOption,
    /// When non-empty, both ability-bonus slots must be assigned to distinct
    /// abilities from this list.
    pub bonus_abilities: Vec<Ability>,
    /// How many extra languages the character picks.
    pub language_quota: u32,
}

impl BackgroundDef {
    /// Whether this background mandates where the ability bonuses go.
    pub fn mandates_bonuses(&self) -> bool {
        !self.bonus_abilities.is_empty()
    }
}

/// A species reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesDef {
    pub id: String,
    pub name: String,
    /// Whether a lineage pick is part of choosing this species.
    pub requires_lineage: bool,
    /// Languages granted outright.
    pub languages: Vec<String>,
}

/// A lineage (species variant) reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineageDef {
    pub id: String,
    pub species_id: String,
    pub name: String,
}
