//! Class, subclass, and per-level progression reference records.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::ability::Ability;
use super::equipment::{ArmorTraining, WeaponTraining};

/// One starting-equipment alternative (classes offer two, backgrounds one).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquipmentOption {
    pub label: String,
    /// Item name (catalog key or parenthetical alias) and quantity.
    pub items: Vec<(String, u32)>,
}

/// A class reference record.
///
/// All proficiency fields are structured: the ingestion layer has already
/// translated the source's free-text proficiency lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDef {
    pub id: String,
    pub name: String,
    pub hit_die: u8,
    /// Stated primary ability; `None` when the source text matched nothing.
    pub primary_ability: Option<Ability>,
    pub armor_training: ArmorTraining,
    pub weapon_training: WeaponTraining,
    pub saving_throws: Vec<Ability>,
    /// How many class skills the player picks.
    pub skill_quota: usize,
    /// The skills those picks may be drawn from.
    pub skill_options: Vec<String>,
    /// Class-specific standard array; falls back to a fixed per-class array.
    pub standard_array: Option<[i32; 6]>,
    /// The two starting-equipment alternatives.
    pub equipment_options: Vec<EquipmentOption>,
    /// Level at which a subclass must be chosen, if the class has subclasses.
    pub subclass_level: Option<u8>,
}

/// One row of a class's level progression table, keyed `(class_id, level)`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressionRow {
    pub class_id: String,
    pub level: u8,
    pub proficiency_bonus: i32,
    /// Feature names, split from the source's comma-separated column at
    /// ingestion.
    pub features: Vec<String>,
    pub cantrips_known: Option<u32>,
    pub prepared_spells: Option<u32>,
    pub pact_slots: Option<u32>,
    pub pact_slot_level: Option<u8>,
    /// Slot counts for spell levels 1..=9.
    pub spell_slots: [u32; 9],
    /// Explicit maximum preparable spell level, when the table states one.
    pub max_spell_level: Option<u8>,
    /// Named numeric class columns (rage uses, sneak-attack dice, resource
    /// uses) surfaced by the level-transition diff when they increase.
    pub counters: BTreeMap<String, i64>,
}

impl ProgressionRow {
    /// Count of the highest spell level with at least one slot, if any.
    pub fn highest_slot_level(&self) -> Option<u8> {
        self.spell_slots
            .iter()
            .enumerate()
            .rev()
            .find(|(_, &count)| count > 0)
            .map(|(idx, _)| (idx + 1) as u8)
    }

    /// Whether the row grants any casting resource at all.
    pub fn grants_spellcasting(&self) -> bool {
        self.cantrips_known.unwrap_or(0) > 0
            || self.prepared_spells.unwrap_or(0) > 0
            || self.pact_slots.unwrap_or(0) > 0
            || self.spell_slots.iter().any(|&count| count > 0)
    }
}

/// A subclass reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubclassDef {
    pub id: String,
    pub class_id: String,
    pub name: String,
    /// Minimum class level before this subclass may be chosen.
    pub unlock_level: u8,
    /// Features granted at each level.
    pub features_by_level: BTreeMap<u8, Vec<String>>,
}
