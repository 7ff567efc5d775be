//! The character editing session.
//!
//! `CharacterSelections` is the single explicitly-owned selection object.
//! Every resolver takes it by reference; there is no hidden singleton. The
//! presentation adapter reads and writes typed fields here, never through
//! UI controls.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::ids::CharacterId;
use crate::rules::{Ability, ChoiceKey, ItemCategory};

/// How ability scores are generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityMethod {
    #[default]
    Standard,
    PointBuy,
    Manual,
}

/// The two background ability-bonus slots.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum BonusSlot {
    Primary,
    Secondary,
}

impl BonusSlot {
    /// Bonus value granted by the slot.
    pub fn bonus(self) -> i32 {
        match self {
            Self::Primary => 2,
            Self::Secondary => 1,
        }
    }
}

/// A resolved feature choice: the chosen option plus its nested sub-picks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Selection {
    pub option: String,
    /// One skill from the option's selectable list, when it offers one.
    pub skill: Option<String>,
    /// Distinct languages, when the option grants language picks.
    pub languages: Vec<String>,
    /// Distinct weapon keys from the trained catalog, when the option grants
    /// mastery picks.
    pub masteries: Vec<String>,
}

impl Selection {
    pub fn of(option: impl Into<String>) -> Self {
        Self {
            option: option.into(),
            ..Default::default()
        }
    }
}

/// A manually-held inventory line (additions, purchases, loot).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    pub name: String,
    /// Normalized catalog key.
    pub key: String,
    pub category: ItemCategory,
    pub quantity: u32,
    /// Nested pack contents, when the entry is a pack.
    #[serde(default)]
    pub contents: Vec<(String, u32)>,
}

/// One of the two hand slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Hand {
    Left,
    Right,
}

impl Hand {
    pub fn other(self) -> Hand {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// The two hand slots, holding equipment keys.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandSlots {
    pub left: Option<String>,
    pub right: Option<String>,
}

impl HandSlots {
    pub fn get(&self, hand: Hand) -> Option<&str> {
        match hand {
            Hand::Left => self.left.as_deref(),
            Hand::Right => self.right.as_deref(),
        }
    }

    pub fn set(&mut self, hand: Hand, key: Option<String>) {
        match hand {
            Hand::Left => self.left = key,
            Hand::Right => self.right = key,
        }
    }

    pub fn occupied(&self) -> impl Iterator<Item = &str> {
        self.left.as_deref().into_iter().chain(self.right.as_deref())
    }

    /// How many slots currently hold the given key.
    pub fn count_of(&self, key: &str) -> u32 {
        self.occupied().filter(|held| *held == key).count() as u32
    }

    pub fn clear(&mut self) {
        self.left = None;
        self.right = None;
    }
}

/// Where the companion resource draws its uses from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompanionSource {
    #[default]
    SharedPool,
    Free,
}

/// Mutable state of the class-specific limited-use transformation resource.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceState {
    pub uses_spent: u32,
    /// Stored form creature ids, bounded by the level-derived capacity.
    pub forms: Vec<String>,
    pub active_form: Option<String>,
    pub temp_hp: i32,
    pub companion_active: bool,
    pub companion_source: CompanionSource,
}

/// Coin purse in the five denominations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinPurse {
    pub cp: i64,
    pub sp: i64,
    pub ep: i64,
    pub gp: i64,
    pub pp: i64,
}

impl CoinPurse {
    pub fn total_cp(&self) -> i64 {
        self.cp + self.sp * 10 + self.ep * 50 + self.gp * 100 + self.pp * 1000
    }

    /// Gold-piece equivalent used for purchase/sale math.
    pub fn gold_equivalent(&self) -> f64 {
        self.total_cp() as f64 / 100.0
    }

    /// Spend a copper-denominated cost, paying smallest coins first and
    /// returning change in copper. Fails without mutating when the purse
    /// cannot cover the cost.
    pub fn spend(&mut self, cost_cp: i64) -> Result<(), DomainError> {
        if cost_cp <= 0 {
            return Ok(());
        }
        if self.total_cp() < cost_cp {
            return Err(DomainError::constraint(format!(
                "Cannot afford cost of {} cp (purse holds {} cp)",
                cost_cp,
                self.total_cp()
            )));
        }
        let mut remaining = cost_cp;
        remaining = Self::pay(&mut self.cp, 1, remaining);
        remaining = Self::pay(&mut self.sp, 10, remaining);
        remaining = Self::pay(&mut self.ep, 50, remaining);
        remaining = Self::pay(&mut self.gp, 100, remaining);
        remaining = Self::pay(&mut self.pp, 1000, remaining);
        if remaining < 0 {
            self.cp += -remaining;
        }
        self.normalize();
        Ok(())
    }

    fn pay(coin: &mut i64, rate_cp: i64, remaining: i64) -> i64 {
        if remaining <= 0 {
            return remaining;
        }
        let spent = (*coin).min((remaining + rate_cp - 1) / rate_cp);
        *coin -= spent;
        remaining - spent * rate_cp
    }

    pub fn earn(&mut self, amount_cp: i64) {
        self.cp += amount_cp.max(0);
        self.normalize();
    }

    /// Fold every ten copper pieces into one silver piece.
    pub fn normalize(&mut self) {
        self.sp += self.cp / 10;
        self.cp %= 10;
    }
}

/// The editing session: everything the player has selected, and nothing
/// derived.
#[derive(Debug, Clone)]
pub struct CharacterSelections {
    pub id: CharacterId,
    pub name: String,
    pub level: u8,
    pub class_id: Option<String>,
    pub subclass_id: Option<String>,
    pub background_id: Option<String>,
    pub species_id: Option<String>,
    pub lineage_id: Option<String>,

    pub ability_method: AbilityMethod,
    /// Raw scores; empty until set or auto-populated.
    pub scores: BTreeMap<Ability, i32>,
    pub bonus_assignments: BTreeMap<BonusSlot, Ability>,

    /// Resolved feature choices keyed `(class_id, level, feature)`.
    pub selections: HashMap<ChoiceKey, Selection>,
    pub class_skills: BTreeSet<String>,
    pub languages: BTreeSet<String>,

    /// Which of the class's two starting-equipment alternatives is taken.
    pub class_equipment_option: usize,
    pub manual_items: Vec<InventoryEntry>,
    pub hands: HandSlots,
    pub equipped_armor: Option<String>,
    pub coins: CoinPurse,

    pub resource: ResourceState,
    /// Expended spell slots per slot level.
    pub expended_slots: BTreeMap<u8, u32>,
    pub prepared_cantrips: BTreeSet<String>,
    pub prepared_spells: BTreeSet<String>,
    pub hit_dice_spent: u8,

    pub notes: String,
    pub inspiration: bool,
    pub created_at: DateTime<Utc>,
}

impl CharacterSelections {
    /// A fresh, empty session at level 0.
    pub fn new() -> Self {
        Self {
            id: CharacterId::new(),
            name: String::new(),
            level: 0,
            class_id: None,
            subclass_id: None,
            background_id: None,
            species_id: None,
            lineage_id: None,
            ability_method: AbilityMethod::Standard,
            scores: BTreeMap::new(),
            bonus_assignments: BTreeMap::new(),
            selections: HashMap::new(),
            class_skills: BTreeSet::new(),
            languages: BTreeSet::new(),
            class_equipment_option: 0,
            manual_items: Vec::new(),
            hands: HandSlots::default(),
            equipped_armor: None,
            coins: CoinPurse::default(),
            resource: ResourceState::default(),
            expended_slots: BTreeMap::new(),
            prepared_cantrips: BTreeSet::new(),
            prepared_spells: BTreeSet::new(),
            hit_dice_spent: 0,
            notes: String::new(),
            inspiration: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Effective score for an ability, defaulting to 10 when unset.
    pub fn score(&self, ability: Ability) -> i32 {
        self.scores.get(&ability).copied().unwrap_or(10)
    }

    /// Background bonus currently assigned to an ability.
    pub fn bonus_for(&self, ability: Ability) -> i32 {
        self.bonus_assignments
            .iter()
            .filter(|(_, assigned)| **assigned == ability)
            .map(|(slot, _)| slot.bonus())
            .sum()
    }

    /// Selection for a choice key, if resolved.
    pub fn selection(&self, key: &ChoiceKey) -> Option<&Selection> {
        self.selections.get(key)
    }
}

impl Default for CharacterSelections {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_empty_at_level_zero() {
        let session = CharacterSelections::new();
        assert_eq!(session.level, 0);
        assert!(session.class_id.is_none());
        assert!(session.scores.is_empty());
        assert_eq!(session.score(Ability::Str), 10);
    }

    #[test]
    fn bonus_for_sums_assigned_slots() {
        let mut session = CharacterSelections::new();
        session.bonus_assignments.insert(BonusSlot::Primary, Ability::Wis);
        session
            .bonus_assignments
            .insert(BonusSlot::Secondary, Ability::Con);
        assert_eq!(session.bonus_for(Ability::Wis), 2);
        assert_eq!(session.bonus_for(Ability::Con), 1);
        assert_eq!(session.bonus_for(Ability::Str), 0);
    }

    #[test]
    fn hand_slots_count_held_copies() {
        let mut hands = HandSlots::default();
        hands.set(Hand::Left, Some("scimitar".into()));
        assert_eq!(hands.count_of("scimitar"), 1);
        hands.set(Hand::Right, Some("scimitar".into()));
        assert_eq!(hands.count_of("scimitar"), 2);
        assert_eq!(hands.count_of("shield"), 0);
    }

    #[test]
    fn purse_spend_pays_small_coins_first() {
        let mut purse = CoinPurse {
            cp: 5,
            sp: 3,
            gp: 2,
            ..Default::default()
        };
        purse.spend(15).expect("affordable");
        // 5 cp + 1 sp covers 15 cp exactly.
        assert_eq!(purse.cp, 0);
        assert_eq!(purse.sp, 2);
        assert_eq!(purse.gp, 2);
    }

    #[test]
    fn purse_spend_makes_change_from_large_coins() {
        let mut purse = CoinPurse {
            gp: 1,
            ..Default::default()
        };
        purse.spend(30).expect("affordable");
        // 1 gp pays a 3 sp cost: 70 cp change folds into silver.
        assert_eq!(purse.total_cp(), 70);
        assert_eq!(purse.gp, 0);
        assert_eq!(purse.sp, 7);
        assert_eq!(purse.cp, 0);
    }

    #[test]
    fn purse_spend_rejects_unaffordable_cost() {
        let mut purse = CoinPurse {
            sp: 1,
            ..Default::default()
        };
        let before = purse;
        assert!(purse.spend(11).is_err());
        assert_eq!(purse, before);
    }

    #[test]
    fn purse_folds_ten_coppers_into_silver() {
        let mut purse = CoinPurse {
            cp: 27,
            ..Default::default()
        };
        purse.normalize();
        assert_eq!(purse.cp, 7);
        assert_eq!(purse.sp, 2);
    }

    #[test]
    fn gold_equivalent_mixes_denominations() {
        let purse = CoinPurse {
            cp: 50,
            sp: 5,
            ep: 1,
            gp: 3,
            pp: 1,
        };
        // 50/100 + 50/100 + 50/100 + 3 + 10 = 14.5 gp
        assert_eq!(purse.gold_equivalent(), 14.5);
    }
}
