//! The persistence payload.
//!
//! `CharacterProfile` is the flattened, serializable view handed to the
//! persistence collaborator. Building one never mutates the session;
//! restoring one reproduces an equivalent session, so save then load is
//! idempotent.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;
use crate::resolve::DerivedCharacterState;
use crate::rules::{Ability, ChoiceKey};
use crate::session::{
    AbilityMethod, BonusSlot, CharacterSelections, CoinPurse, InventoryEntry, ResourceState,
    Selection,
};

/// Hand and armor equip state, by catalog key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquippedState {
    pub left_hand: Option<String>,
    pub right_hand: Option<String>,
    pub armor: Option<String>,
}

/// Combat snapshot stored alongside the selections.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombatSnapshot {
    pub armor_class: i32,
    pub hit_points: i32,
    pub temp_hp: i32,
    pub inspiration: bool,
}

/// The serializable character profile.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterProfile {
    pub name: String,
    pub class: Option<String>,
    pub subclass: Option<String>,
    pub level: u8,
    pub background: Option<String>,
    pub species: Option<String>,
    pub lineage: Option<String>,

    pub ability_method: AbilityMethod,
    pub scores: BTreeMap<Ability, i32>,
    pub bonus_assignments: BTreeMap<BonusSlot, Ability>,

    pub cantrips: Vec<String>,
    pub spells: Vec<String>,
    pub class_skills: Vec<String>,
    pub languages: Vec<String>,

    pub currency: CoinPurse,
    pub notes: String,

    /// Feature selections keyed by the encoded `class:level:feature` form.
    pub selections: BTreeMap<String, Selection>,
    pub resource: ResourceState,
    /// Expended spell slots per slot level.
    pub expended_slots: BTreeMap<u8, u32>,
    pub hit_dice_spent: u8,

    pub class_equipment_option: usize,
    pub items: Vec<InventoryEntry>,
    pub equipped: EquippedState,

    pub combat: CombatSnapshot,
}

/// Flatten a session and its derived state into a profile.
pub fn build(
    session: &CharacterSelections,
    derived: &DerivedCharacterState,
) -> CharacterProfile {
    CharacterProfile {
        name: session.name.clone(),
        class: session.class_id.clone(),
        subclass: session.subclass_id.clone(),
        level: session.level,
        background: session.background_id.clone(),
        species: session.species_id.clone(),
        lineage: session.lineage_id.clone(),
        ability_method: session.ability_method,
        scores: session.scores.clone(),
        bonus_assignments: session.bonus_assignments.clone(),
        cantrips: session.prepared_cantrips.iter().cloned().collect(),
        spells: session.prepared_spells.iter().cloned().collect(),
        class_skills: session.class_skills.iter().cloned().collect(),
        languages: session.languages.iter().cloned().collect(),
        currency: session.coins,
        notes: session.notes.clone(),
        selections: session
            .selections
            .iter()
            .map(|(key, selection)| (key.to_string(), selection.clone()))
            .collect(),
        resource: session.resource.clone(),
        expended_slots: session.expended_slots.clone(),
        hit_dice_spent: session.hit_dice_spent,
        class_equipment_option: session.class_equipment_option,
        items: session.manual_items.clone(),
        equipped: EquippedState {
            left_hand: session.hands.left.clone(),
            right_hand: session.hands.right.clone(),
            armor: session.equipped_armor.clone(),
        },
        combat: CombatSnapshot {
            armor_class: derived.armor_class,
            hit_points: derived.max_hp,
            temp_hp: derived.temp_hp,
            inspiration: session.inspiration,
        },
    }
}

/// Rehydrate a session from a profile. The derived state is not trusted
/// from the payload; callers re-derive after loading.
pub fn restore(profile: &CharacterProfile) -> Result<CharacterSelections, DomainError> {
    let mut selections = std::collections::HashMap::new();
    for (encoded, selection) in &profile.selections {
        let key = ChoiceKey::from_str(encoded)?;
        selections.insert(key, selection.clone());
    }

    let mut session = CharacterSelections::new().with_name(profile.name.clone());
    session.level = profile.level;
    session.class_id = profile.class.clone();
    session.subclass_id = profile.subclass.clone();
    session.background_id = profile.background.clone();
    session.species_id = profile.species.clone();
    session.lineage_id = profile.lineage.clone();
    session.ability_method = profile.ability_method;
    session.scores = profile.scores.clone();
    session.bonus_assignments = profile.bonus_assignments.clone();
    session.selections = selections;
    session.class_skills = profile.class_skills.iter().cloned().collect();
    session.languages = profile.languages.iter().cloned().collect();
    session.class_equipment_option = profile.class_equipment_option;
    session.manual_items = profile.items.clone();
    session.hands.left = profile.equipped.left_hand.clone();
    session.hands.right = profile.equipped.right_hand.clone();
    session.equipped_armor = profile.equipped.armor.clone();
    session.coins = profile.currency;
    session.resource = profile.resource.clone();
    session.expended_slots = profile.expended_slots.clone();
    session.prepared_cantrips = profile.cantrips.iter().cloned().collect();
    session.prepared_spells = profile.spells.iter().cloned().collect();
    session.hit_dice_spent = profile.hit_dice_spent;
    session.notes = profile.notes.clone();
    session.inspiration = profile.combat.inspiration;
    Ok(session)
}
