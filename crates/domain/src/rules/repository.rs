//! The read-only rule-data repository.
//!
//! Aggregates every reference catalog behind `Option`-returning getters. The
//! repository may be empty or partially populated while fetches are in
//! flight; every consumer falls back to built-in defaults and re-derives
//! when data arrives.

use std::collections::HashMap;

use super::choice::{ChoiceKey, FeatureChoiceDef};
use super::class::{ClassDef, ProgressionRow, SubclassDef};
use super::creature::CreatureDef;
use super::equipment::{ArmorDef, GearDef, PackDef, WeaponDef};
use super::origin::{BackgroundDef, LineageDef, SpeciesDef};
use super::spell::SpellDef;
use super::tables;

/// Normalized catalog key: lowercased, trimmed, single-spaced.
pub fn normalize_key(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strip a parenthetical alias suffix, e.g. "shortsword (weapon)" →
/// "shortsword".
pub fn strip_alias(name: &str) -> &str {
    match name.rfind('(') {
        Some(idx) if name.ends_with(')') => name[..idx].trim_end(),
        _ => name.trim(),
    }
}

/// A catalog hit for an equipment name.
#[derive(Debug, Clone, Copy)]
pub enum EquipmentRef<'a> {
    Weapon(&'a WeaponDef),
    Armor(&'a ArmorDef),
    Gear(&'a GearDef),
    Pack(&'a PackDef),
}

#[derive(Debug, Default)]
pub struct RuleRepository {
    classes: HashMap<String, ClassDef>,
    progressions: HashMap<(String, u8), ProgressionRow>,
    subclasses: HashMap<String, SubclassDef>,
    backgrounds: HashMap<String, BackgroundDef>,
    species: HashMap<String, SpeciesDef>,
    lineages: HashMap<String, LineageDef>,
    weapons: HashMap<String, WeaponDef>,
    armors: HashMap<String, ArmorDef>,
    gear: HashMap<String, GearDef>,
    packs: HashMap<String, PackDef>,
    choices: HashMap<ChoiceKey, FeatureChoiceDef>,
    languages: Vec<String>,
    creatures: HashMap<String, CreatureDef>,
    spells_by_class: HashMap<String, Vec<SpellDef>>,
}

impl RuleRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // Population, used by the ingestion layer and test fixtures.

    pub fn insert_class(&mut self, class: ClassDef) {
        self.classes.insert(class.id.clone(), class);
    }

    pub fn insert_progression(&mut self, row: ProgressionRow) {
        self.progressions
            .insert((row.class_id.clone(), row.level), row);
    }

    pub fn insert_subclass(&mut self, subclass: SubclassDef) {
        self.subclasses.insert(subclass.id.clone(), subclass);
    }

    pub fn insert_background(&mut self, background: BackgroundDef) {
        self.backgrounds.insert(background.id.clone(), background);
    }

    pub fn insert_species(&mut self, species: SpeciesDef) {
        self.species.insert(species.id.clone(), species);
    }

    pub fn insert_lineage(&mut self, lineage: LineageDef) {
        self.lineages.insert(lineage.id.clone(), lineage);
    }

    pub fn insert_weapon(&mut self, weapon: WeaponDef) {
        self.weapons.insert(normalize_key(&weapon.name), weapon);
    }

    pub fn insert_armor(&mut self, armor: ArmorDef) {
        self.armors.insert(normalize_key(&armor.name), armor);
    }

    pub fn insert_gear(&mut self, gear: GearDef) {
        self.gear.insert(normalize_key(&gear.name), gear);
    }

    pub fn insert_pack(&mut self, pack: PackDef) {
        self.packs.insert(normalize_key(&pack.name), pack);
    }

    pub fn insert_choice(&mut self, choice: FeatureChoiceDef) {
        self.choices.insert(choice.key.clone(), choice);
    }

    pub fn set_languages(&mut self, languages: Vec<String>) {
        self.languages = languages;
    }

    pub fn insert_creature(&mut self, creature: CreatureDef) {
        self.creatures.insert(creature.id.clone(), creature);
    }

    pub fn set_class_spells(&mut self, class_id: impl Into<String>, spells: Vec<SpellDef>) {
        self.spells_by_class.insert(class_id.into(), spells);
    }

    pub fn clear_class_spells(&mut self, class_id: &str) {
        self.spells_by_class.remove(class_id);
    }

    // Lookups.

    pub fn class(&self, id: &str) -> Option<&ClassDef> {
        self.classes.get(id)
    }

    pub fn classes(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    pub fn progression(&self, class_id: &str, level: u8) -> Option<&ProgressionRow> {
        self.progressions.get(&(class_id.to_string(), level))
    }

    pub fn subclass(&self, id: &str) -> Option<&SubclassDef> {
        self.subclasses.get(id)
    }

    pub fn background(&self, id: &str) -> Option<&BackgroundDef> {
        self.backgrounds.get(id)
    }

    pub fn species(&self, id: &str) -> Option<&SpeciesDef> {
        self.species.get(id)
    }

    pub fn lineage(&self, id: &str) -> Option<&LineageDef> {
        self.lineages.get(id)
    }

    pub fn weapon(&self, key: &str) -> Option<&WeaponDef> {
        self.weapons.get(&normalize_key(strip_alias(key)))
    }

    pub fn armor(&self, key: &str) -> Option<&ArmorDef> {
        self.armors.get(&normalize_key(strip_alias(key)))
    }

    pub fn choice(&self, key: &ChoiceKey) -> Option<&FeatureChoiceDef> {
        self.choices.get(key)
    }

    /// All choice definitions active for a class at or below `level`,
    /// ordered by level then feature name.
    pub fn choices_for(&self, class_id: &str, level: u8) -> Vec<&FeatureChoiceDef> {
        let mut active: Vec<&FeatureChoiceDef> = self
            .choices
            .values()
            .filter(|def| def.key.class_id == class_id && def.key.level <= level)
            .collect();
        active.sort_by(|a, b| a.key.cmp(&b.key));
        active
    }

    pub fn languages(&self) -> &[String] {
        &self.languages
    }

    pub fn creature(&self, id: &str) -> Option<&CreatureDef> {
        self.creatures.get(id)
    }

    pub fn creatures(&self) -> impl Iterator<Item = &CreatureDef> {
        self.creatures.values()
    }

    pub fn class_spells(&self, class_id: &str) -> Option<&[SpellDef]> {
        self.spells_by_class.get(class_id).map(|spells| &spells[..])
    }

    /// Resolve an item name (catalog key or parenthetical alias) to its
    /// catalog record. Weapons shadow armors shadow gear shadow packs, which
    /// only matters for pathological duplicate names.
    pub fn lookup_equipment(&self, name: &str) -> Option<EquipmentRef<'_>> {
        let key = normalize_key(strip_alias(name));
        if let Some(weapon) = self.weapons.get(&key) {
            return Some(EquipmentRef::Weapon(weapon));
        }
        if let Some(armor) = self.armors.get(&key) {
            return Some(EquipmentRef::Armor(armor));
        }
        if let Some(gear) = self.gear.get(&key) {
            return Some(EquipmentRef::Gear(gear));
        }
        self.packs.get(&key).map(EquipmentRef::Pack)
    }

    /// The standard array for a class: the class record's own array, else
    /// the fixed per-class fallback, else the default array.
    pub fn standard_array_for(&self, class_id: &str) -> [i32; 6] {
        self.classes
            .get(class_id)
            .and_then(|class| class.standard_array)
            .unwrap_or_else(|| tables::fallback_standard_array(class_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::equipment::{DamageDie, WeaponClass};

    #[test]
    fn normalize_key_collapses_case_and_spacing() {
        assert_eq!(normalize_key("  Quarter   Staff "), "quarter staff");
    }

    #[test]
    fn strip_alias_removes_trailing_parenthetical() {
        assert_eq!(strip_alias("shortsword (weapon)"), "shortsword");
        assert_eq!(strip_alias("rations (10 days) (gear)"), "rations (10 days)");
        assert_eq!(strip_alias("plain torch"), "plain torch");
    }

    #[test]
    fn lookup_resolves_aliases_against_the_weapon_catalog() {
        let mut repo = RuleRepository::new();
        repo.insert_weapon(WeaponDef {
            id: "shortsword".into(),
            name: "Shortsword".into(),
            class: WeaponClass::MartialMelee,
            damage: DamageDie::new(1, 6),
            damage_type: "piercing".into(),
            finesse: true,
            two_handed: false,
            versatile: None,
            mastery: Some("Vex".into()),
            cost_cp: 1000,
        });
        match repo.lookup_equipment("Shortsword (weapon)") {
            Some(EquipmentRef::Weapon(weapon)) => assert_eq!(weapon.id, "shortsword"),
            other => panic!("expected weapon hit, got {:?}", other.is_some()),
        }
    }

    #[test]
    fn standard_array_prefers_class_record() {
        let mut repo = RuleRepository::new();
        assert_eq!(
            repo.standard_array_for("druid"),
            tables::fallback_standard_array("druid")
        );
        repo.insert_class(ClassDef {
            id: "druid".into(),
            name: "Druid".into(),
            hit_die: 8,
            primary_ability: None,
            armor_training: Default::default(),
            weapon_training: Default::default(),
            saving_throws: vec![],
            skill_quota: 2,
            skill_options: vec![],
            standard_array: Some([10, 12, 14, 8, 15, 13]),
            equipment_options: vec![],
            subclass_level: None,
        });
        assert_eq!(repo.standard_array_for("druid"), [10, 12, 14, 8, 15, 13]);
    }

    #[test]
    fn unknown_class_uses_default_array() {
        let repo = RuleRepository::new();
        assert_eq!(
            repo.standard_array_for("artificer"),
            tables::DEFAULT_STANDARD_ARRAY
        );
    }
}
