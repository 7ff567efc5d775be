//! Weapon, armor, gear, and pack reference records, plus the training-set
//! value objects granted by classes and feature choices.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error parsing a damage-die formula.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiceParseError {
    #[error("Empty dice formula")]
    Empty,
    #[error("Invalid dice formula: {0}")]
    Invalid(String),
}

/// A damage die expression such as `1d8` or `2d6`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageDie {
    pub count: u8,
    pub sides: u8,
}

impl DamageDie {
    pub fn new(count: u8, sides: u8) -> Self {
        Self { count, sides }
    }
}

impl std::fmt::Display for DamageDie {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}d{}", self.count, self.sides)
    }
}

impl std::str::FromStr for DamageDie {
    type Err = DiceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(DiceParseError::Empty);
        }
        let (count, sides) = trimmed
            .split_once(['d', 'D'])
            .ok_or_else(|| DiceParseError::Invalid(trimmed.to_string()))?;
        let count: u8 = count
            .trim()
            .parse()
            .map_err(|_| DiceParseError::Invalid(trimmed.to_string()))?;
        let sides: u8 = sides
            .trim()
            .parse()
            .map_err(|_| DiceParseError::Invalid(trimmed.to_string()))?;
        if count == 0 || sides == 0 {
            return Err(DiceParseError::Invalid(trimmed.to_string()));
        }
        Ok(Self { count, sides })
    }
}

/// Category of an inventory item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ItemCategory {
    Weapon,
    Armor,
    Gear,
    Pack,
}

impl std::fmt::Display for ItemCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Weapon => write!(f, "weapon"),
            Self::Armor => write!(f, "armor"),
            Self::Gear => write!(f, "gear"),
            Self::Pack => write!(f, "pack"),
        }
    }
}

/// Weapon class: simple/martial crossed with melee/ranged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeaponClass {
    SimpleMelee,
    SimpleRanged,
    MartialMelee,
    MartialRanged,
}

impl WeaponClass {
    pub fn is_ranged(self) -> bool {
        matches!(self, Self::SimpleRanged | Self::MartialRanged)
    }

    pub fn is_martial(self) -> bool {
        matches!(self, Self::MartialMelee | Self::MartialRanged)
    }
}

/// Armor weight category. Shields share the catalog but occupy a hand slot
/// rather than the armor slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ArmorCategory {
    Light,
    Medium,
    Heavy,
    Shield,
}

impl std::fmt::Display for ArmorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Medium => write!(f, "medium"),
            Self::Heavy => write!(f, "heavy"),
            Self::Shield => write!(f, "shield"),
        }
    }
}

/// Armor-training grants, as structured booleans.
///
/// Ingestion translates proficiency text into this once; the core never
/// re-parses text at decision time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorTraining {
    pub light: bool,
    pub medium: bool,
    pub heavy: bool,
    pub shields: bool,
}

impl ArmorTraining {
    pub fn allows(&self, category: ArmorCategory) -> bool {
        match category {
            ArmorCategory::Light => self.light,
            ArmorCategory::Medium => self.medium,
            ArmorCategory::Heavy => self.heavy,
            ArmorCategory::Shield => self.shields,
        }
    }

    pub fn union(&mut self, other: &ArmorTraining) {
        self.light |= other.light;
        self.medium |= other.medium;
        self.heavy |= other.heavy;
        self.shields |= other.shields;
    }
}

/// Weapon-training grants, as structured booleans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponTraining {
    pub simple_melee: bool,
    pub simple_ranged: bool,
    pub martial_melee: bool,
    pub martial_ranged: bool,
}

impl WeaponTraining {
    pub fn allows(&self, class: WeaponClass) -> bool {
        match class {
            WeaponClass::SimpleMelee => self.simple_melee,
            WeaponClass::SimpleRanged => self.simple_ranged,
            WeaponClass::MartialMelee => self.martial_melee,
            WeaponClass::MartialRanged => self.martial_ranged,
        }
    }

    pub fn union(&mut self, other: &WeaponTraining) {
        self.simple_melee |= other.simple_melee;
        self.simple_ranged |= other.simple_ranged;
        self.martial_melee |= other.martial_melee;
        self.martial_ranged |= other.martial_ranged;
    }
}

/// A weapon reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeaponDef {
    pub id: String,
    pub name: String,
    pub class: WeaponClass,
    pub damage: DamageDie,
    pub damage_type: String,
    pub finesse: bool,
    pub two_handed: bool,
    /// Damage die when wielded in two hands; present only on versatile
    /// weapons.
    pub versatile: Option<DamageDie>,
    /// Mastery tag shown when the weapon is in the character's mastery picks.
    pub mastery: Option<String>,
    /// Cost in copper pieces.
    pub cost_cp: i64,
}

/// An armor (or shield) reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArmorDef {
    pub id: String,
    pub name: String,
    pub category: ArmorCategory,
    /// Base AC for body armor; flat bonus for shields.
    pub base_ac: i32,
    /// Whether the DEX modifier is added on top of the base AC.
    pub dex_scaling: bool,
    /// Cap on the DEX bonus when scaling (medium armor).
    pub max_dex_bonus: Option<i32>,
    pub cost_cp: i64,
}

/// Mundane gear with no combat statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GearDef {
    pub id: String,
    pub name: String,
    pub cost_cp: i64,
}

/// An equipment pack whose contents expand into the inventory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackDef {
    pub id: String,
    pub name: String,
    pub cost_cp: i64,
    /// Item key and quantity, resolved against the other catalogs.
    pub contents: Vec<(String, u32)>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn damage_die_round_trips_through_display() {
        let die = DamageDie::from_str("1d8").expect("parses");
        assert_eq!(die, DamageDie::new(1, 8));
        assert_eq!(die.to_string(), "1d8");
    }

    #[test]
    fn damage_die_rejects_garbage() {
        assert_eq!(DamageDie::from_str(""), Err(DiceParseError::Empty));
        assert!(DamageDie::from_str("d8").is_err());
        assert!(DamageDie::from_str("1d0").is_err());
        assert!(DamageDie::from_str("axe").is_err());
    }

    #[test]
    fn training_union_is_monotone() {
        let mut armor = ArmorTraining {
            light: true,
            ..Default::default()
        };
        armor.union(&ArmorTraining {
            medium: true,
            shields: true,
            ..Default::default()
        });
        assert!(armor.light && armor.medium && armor.shields);
        assert!(!armor.heavy);
        assert!(armor.allows(ArmorCategory::Shield));
        assert!(!armor.allows(ArmorCategory::Heavy));
    }

    #[test]
    fn weapon_class_predicates() {
        assert!(WeaponClass::MartialRanged.is_ranged());
        assert!(WeaponClass::MartialRanged.is_martial());
        assert!(!WeaponClass::SimpleMelee.is_ranged());
        assert!(!WeaponClass::SimpleMelee.is_martial());
    }
}
