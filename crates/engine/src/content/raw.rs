//! Raw catalog records as served by the rule-data source.
//!
//! These mirror the source documents: proficiency grants, armor-class
//! formulas, costs, and creature actions are still free text here. The
//! importer translates them into the structured domain defs.

use std::collections::BTreeMap;

use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCatalog {
    pub classes: Vec<RawClass>,
    pub progressions: Vec<RawProgression>,
    pub subclasses: Vec<RawSubclass>,
    pub backgrounds: Vec<RawBackground>,
    pub species: Vec<RawSpecies>,
    pub lineages: Vec<RawLineage>,
    pub weapons: Vec<RawWeapon>,
    pub armors: Vec<RawArmor>,
    pub gear: Vec<RawGear>,
    pub packs: Vec<RawPack>,
    pub choices: Vec<RawFeatureChoice>,
    pub languages: Vec<String>,
    pub creatures: Vec<RawCreature>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawItemLine {
    pub name: String,
    pub quantity: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawEquipmentOption {
    pub label: String,
    pub items: Vec<RawItemLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawClass {
    pub id: String,
    pub name: String,
    pub hit_die: u8,
    /// Free text, e.g. "Wisdom".
    pub primary_ability: String,
    /// Free text, e.g. "Light armor and Shields".
    pub armor_proficiencies: String,
    /// Free text, e.g. "Simple weapons, Martial melee weapons".
    pub weapon_proficiencies: String,
    /// Free text, e.g. "Intelligence, Wisdom".
    pub saving_throws: String,
    pub skill_quota: usize,
    pub skill_options: Vec<String>,
    pub standard_array: Option<[i32; 6]>,
    pub equipment_options: Vec<RawEquipmentOption>,
    pub subclass_level: Option<u8>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawProgression {
    pub class_id: String,
    pub level: u8,
    pub proficiency_bonus: i32,
    /// Comma-separated feature column.
    pub features: String,
    pub cantrips_known: Option<u32>,
    pub prepared_spells: Option<u32>,
    pub pact_slots: Option<u32>,
    pub pact_slot_level: Option<u8>,
    /// Slot counts for levels 1 upward; short rows are padded with zeros.
    pub spell_slots: Vec<u32>,
    pub max_spell_level: Option<u8>,
    pub counters: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSubclass {
    pub id: String,
    pub class_id: String,
    pub name: String,
    pub unlock_level: u8,
    pub features_by_level: BTreeMap<u8, Vec<String>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawBackground {
    pub id: String,
    pub name: String,
    pub skills: Vec<String>,
    pub equipment: RawEquipmentOption,
    /// Free text, e.g. "Constitution, Intelligence, or Wisdom"; empty means
    /// free assignment.
    pub bonus_abilities: String,
    pub languages: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSpecies {
    pub id: String,
    pub name: String,
    pub requires_lineage: bool,
    pub languages: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawLineage {
    pub id: String,
    pub species_id: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawWeapon {
    pub name: String,
    /// Free text, e.g. "Martial Melee".
    pub category: String,
    /// Dice formula, e.g. "1d8".
    pub damage: String,
    pub damage_type: String,
    /// Free text property list, e.g. "Finesse, Versatile (1d10)".
    pub properties: String,
    pub mastery: Option<String>,
    /// Free text, e.g. "15 gp".
    pub cost: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawArmor {
    pub name: String,
    /// Free text, e.g. "Medium".
    pub category: String,
    /// Free text formula, e.g. "14 + Dex modifier (max 2)".
    pub armor_class: String,
    pub cost: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawGear {
    pub name: String,
    pub cost: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawPack {
    pub name: String,
    pub cost: String,
    pub contents: Vec<RawItemLine>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawChoiceOption {
    pub key: String,
    pub name: String,
    pub bonus_cantrips: u32,
    /// Free text training grants, as in class proficiency lines.
    pub armor_training: String,
    pub weapon_training: String,
    /// Free text, e.g. "Dexterity, Wisdom".
    pub extra_saves: String,
    pub skill_grants: Vec<String>,
    pub skill_options: Vec<String>,
    pub language_count: u32,
    pub mastery_count: u32,
    pub renewable: bool,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawFeatureChoice {
    pub class_id: String,
    pub level: u8,
    pub feature: String,
    pub options: Vec<RawChoiceOption>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawCreature {
    pub name: String,
    pub creature_type: String,
    /// Free text rating, e.g. "1/4".
    pub challenge: String,
    /// Free text, e.g. "40 ft., fly 60 ft."; flight is inferred.
    pub speed: String,
    /// Free action text, one action per line.
    pub actions: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawSpell {
    pub name: String,
    pub level: u8,
}
