//! Equipment and loadout: inventory composition, the hand-slot state
//! machine, derived AC and attack rows, and currency math.

use std::collections::BTreeMap;

use crate::error::DomainError;
use crate::rules::{
    proficiency_bonus, Ability, ArmorCategory, DamageDie, EquipmentRef, ItemCategory,
    RuleRepository, WeaponDef,
};
use crate::session::{CharacterSelections, Hand, InventoryEntry};

use super::{abilities, choices, proficiency::ProficiencySet};

/// Nested pack expansion stops here; deeper nesting is a data error.
const MAX_PACK_DEPTH: u32 = 4;

/// One line of the aggregated inventory: grouped by normalized key and
/// category with summed quantity.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockedItem {
    pub name: String,
    pub key: String,
    pub category: ItemCategory,
    pub quantity: u32,
}

/// A derived attack line. Equipment rows carry an ability and attack bonus;
/// rows swapped in by an active transformation carry neither.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AttackRow {
    pub name: String,
    pub ability: Option<Ability>,
    pub attack_bonus: Option<i32>,
    pub damage: DamageDie,
    pub damage_type: String,
    pub two_handed: bool,
    pub mastery: Option<String>,
}

/// Merge the chosen class equipment option, the background option, and
/// manual additions into the aggregated inventory, expanding packs and
/// resolving parenthetical aliases against the catalogs.
pub fn rebuild_inventory(
    session: &CharacterSelections,
    rules: &RuleRepository,
) -> Vec<StockedItem> {
    let mut acc: BTreeMap<(String, ItemCategory), StockedItem> = BTreeMap::new();

    if let Some(class) = session.class_id.as_deref().and_then(|id| rules.class(id)) {
        if let Some(option) = class.equipment_options.get(session.class_equipment_option) {
            for (name, quantity) in &option.items {
                add_line(&mut acc, rules, name, *quantity, 0);
            }
        }
    }
    if let Some(background) = session
        .background_id
        .as_deref()
        .and_then(|id| rules.background(id))
    {
        for (name, quantity) in &background.equipment.items {
            add_line(&mut acc, rules, name, *quantity, 0);
        }
    }
    for entry in &session.manual_items {
        if entry.category == ItemCategory::Pack && !entry.contents.is_empty() {
            for (name, quantity) in &entry.contents {
                add_line(&mut acc, rules, name, quantity * entry.quantity, 1);
            }
        } else {
            add_line(&mut acc, rules, &entry.name, entry.quantity, 0);
        }
    }

    acc.into_values().collect()
}

fn add_line(
    acc: &mut BTreeMap<(String, ItemCategory), StockedItem>,
    rules: &RuleRepository,
    name: &str,
    quantity: u32,
    depth: u32,
) {
    if quantity == 0 {
        return;
    }
    let (display, key, category) = match rules.lookup_equipment(name) {
        Some(EquipmentRef::Weapon(weapon)) => {
            (weapon.name.clone(), weapon.id.clone(), ItemCategory::Weapon)
        }
        Some(EquipmentRef::Armor(armor)) => {
            (armor.name.clone(), armor.id.clone(), ItemCategory::Armor)
        }
        Some(EquipmentRef::Gear(gear)) => (gear.name.clone(), gear.id.clone(), ItemCategory::Gear),
        Some(EquipmentRef::Pack(pack)) => {
            if depth < MAX_PACK_DEPTH {
                for (child, child_quantity) in &pack.contents {
                    add_line(acc, rules, child, child_quantity * quantity, depth + 1);
                }
                return;
            }
            (pack.name.clone(), pack.id.clone(), ItemCategory::Pack)
        }
        // Unknown items stay in the list as plain gear; an absent catalog
        // must not abort the rebuild.
        None => (
            name.trim().to_string(),
            crate::rules::normalize_key(crate::rules::strip_alias(name)),
            ItemCategory::Gear,
        ),
    };
    acc.entry((key.clone(), category))
        .and_modify(|item| item.quantity += quantity)
        .or_insert(StockedItem {
            name: display,
            key,
            category,
            quantity,
        });
}

fn stocked_quantity(inventory: &[StockedItem], key: &str) -> u32 {
    inventory
        .iter()
        .filter(|item| item.key == key)
        .map(|item| item.quantity)
        .sum()
}

/// The weapon held in both hands as a single equip, if any: a two-handed
/// weapon, or a versatile weapon paired across both hands.
pub fn two_handed_pair<'a>(
    session: &CharacterSelections,
    rules: &'a RuleRepository,
) -> Option<&'a WeaponDef> {
    let left = session.hands.left.as_deref()?;
    let right = session.hands.right.as_deref()?;
    if left != right {
        return None;
    }
    let weapon = rules.weapon(left)?;
    (weapon.two_handed || weapon.versatile.is_some()).then_some(weapon)
}

fn clear_hand(session: &mut CharacterSelections, rules: &RuleRepository, hand: Hand) {
    if let Some(held) = session.hands.get(hand) {
        let held = held.to_string();
        let fully_two_handed = rules
            .weapon(&held)
            .is_some_and(|weapon| weapon.two_handed)
            && session.hands.get(hand.other()) == Some(held.as_str());
        session.hands.set(hand, None);
        if fully_two_handed {
            session.hands.set(hand.other(), None);
        }
    }
}

/// Equip a weapon or shield into a hand.
///
/// A two-handed weapon claims both hands as one atomic transition. A
/// versatile weapon may occupy the second hand when the first already holds
/// the same item; the pair then counts as a single two-handed equip.
pub fn equip_hand(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    hand: Hand,
    key: &str,
) -> Result<(), DomainError> {
    let inventory = rebuild_inventory(session, rules);

    if let Some(weapon) = rules.weapon(key) {
        let key = weapon.id.clone();
        let available = stocked_quantity(&inventory, &key);
        if weapon.two_handed {
            if available < 1 {
                return Err(DomainError::constraint(format!(
                    "No {} in inventory",
                    weapon.name
                )));
            }
            clear_hand(session, rules, Hand::Left);
            clear_hand(session, rules, Hand::Right);
            session.hands.set(Hand::Left, Some(key.clone()));
            session.hands.set(Hand::Right, Some(key));
            return Ok(());
        }

        clear_hand(session, rules, hand);
        let other_holds_same = session.hands.get(hand.other()) == Some(key.as_str());
        let needed = if other_holds_same && weapon.versatile.is_some() {
            // Versatile pairing: the one item fills both hands.
            1
        } else {
            session.hands.count_of(&key) + 1
        };
        if available < needed {
            return Err(DomainError::constraint(format!(
                "Only {} of {} in inventory",
                available, weapon.name
            )));
        }
        session.hands.set(hand, Some(key));
        return Ok(());
    }

    if let Some(armor) = rules.armor(key) {
        if armor.category != ArmorCategory::Shield {
            return Err(DomainError::constraint(format!(
                "{} is worn, not held",
                armor.name
            )));
        }
        let key = armor.id.clone();
        clear_hand(session, rules, hand);
        let needed = session.hands.count_of(&key) + 1;
        if stocked_quantity(&inventory, &key) < needed {
            return Err(DomainError::constraint(format!(
                "No spare {} in inventory",
                armor.name
            )));
        }
        session.hands.set(hand, Some(key));
        return Ok(());
    }

    Err(DomainError::not_found("Equipment", key))
}

/// Unequip a hand. Releasing a two-handed weapon frees both hands; no state
/// may hold it in only one.
pub fn unequip_hand(session: &mut CharacterSelections, rules: &RuleRepository, hand: Hand) {
    clear_hand(session, rules, hand);
}

/// Equip body armor. Untrained equips are rejected outright, not flagged.
pub fn equip_armor(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    proficiencies: &ProficiencySet,
    key: &str,
) -> Result<(), DomainError> {
    let armor = rules
        .armor(key)
        .ok_or_else(|| DomainError::not_found("Armor", key))?;
    if armor.category == ArmorCategory::Shield {
        return Err(DomainError::constraint(format!(
            "{} is held in a hand, not worn",
            armor.name
        )));
    }
    if !proficiencies.armor.allows(armor.category) {
        return Err(DomainError::constraint(format!(
            "Not trained in {} armor",
            armor.category
        )));
    }
    session.equipped_armor = Some(armor.id.clone());
    Ok(())
}

pub fn unequip_armor(session: &mut CharacterSelections) {
    session.equipped_armor = None;
}

/// Whether the equipped body armor's category is untrained. Gates
/// spellcasting; loaded payloads may hold armor the session could not have
/// equipped directly.
pub fn wearing_untrained_armor(
    session: &CharacterSelections,
    rules: &RuleRepository,
    proficiencies: &ProficiencySet,
) -> bool {
    session
        .equipped_armor
        .as_deref()
        .and_then(|key| rules.armor(key))
        .is_some_and(|armor| !proficiencies.armor.allows(armor.category))
}

/// Derived armor class: 10 + DEX when unarmored, else the armor's base AC
/// (DEX-scaled only when its record says so) plus a shield bonus when a
/// shield is held and shields are trained.
pub fn armor_class(
    session: &CharacterSelections,
    rules: &RuleRepository,
    proficiencies: &ProficiencySet,
) -> i32 {
    let dex_mod = abilities::modifier(session, Ability::Dex);
    let base = match session
        .equipped_armor
        .as_deref()
        .and_then(|key| rules.armor(key))
    {
        Some(armor) => {
            if armor.dex_scaling {
                let dex_bonus = match armor.max_dex_bonus {
                    Some(cap) => dex_mod.min(cap),
                    None => dex_mod,
                };
                armor.base_ac + dex_bonus
            } else {
                armor.base_ac
            }
        }
        None => 10 + dex_mod,
    };

    let shield_bonus = if proficiencies.armor.shields {
        session
            .hands
            .occupied()
            .filter_map(|key| rules.armor(key))
            .find(|armor| armor.category == ArmorCategory::Shield)
            .map(|shield| shield.base_ac)
            .unwrap_or(0)
    } else {
        0
    };

    base + shield_bonus
}

fn weapon_ability(session: &CharacterSelections, weapon: &WeaponDef) -> Ability {
    if weapon.class.is_ranged() {
        Ability::Dex
    } else if weapon.finesse {
        let str_mod = abilities::modifier(session, Ability::Str);
        let dex_mod = abilities::modifier(session, Ability::Dex);
        if dex_mod > str_mod {
            Ability::Dex
        } else {
            Ability::Str
        }
    } else {
        Ability::Str
    }
}

fn weapon_row(
    session: &CharacterSelections,
    weapon: &WeaponDef,
    two_handed: bool,
    masteries: &std::collections::BTreeSet<String>,
) -> AttackRow {
    let ability = weapon_ability(session, weapon);
    let modifier = abilities::modifier(session, ability);
    let damage = match (two_handed, weapon.versatile) {
        (true, Some(versatile)) => versatile,
        _ => weapon.damage,
    };
    AttackRow {
        name: weapon.name.clone(),
        ability: Some(ability),
        attack_bonus: Some(proficiency_bonus(session.level) + modifier),
        damage,
        damage_type: weapon.damage_type.clone(),
        two_handed,
        mastery: masteries
            .contains(&weapon.id)
            .then(|| weapon.mastery.clone())
            .flatten(),
    }
}

/// One attack row per occupied hand, or a single combined row for a
/// two-handed or versatile-paired weapon. Shields produce no row.
pub fn attack_rows(session: &CharacterSelections, rules: &RuleRepository) -> Vec<AttackRow> {
    let masteries = choices::resolved_effects(session, rules).masteries;

    if let Some(weapon) = two_handed_pair(session, rules) {
        return vec![weapon_row(session, weapon, true, &masteries)];
    }

    [Hand::Left, Hand::Right]
        .into_iter()
        .filter_map(|hand| session.hands.get(hand))
        .filter_map(|key| rules.weapon(key))
        .map(|weapon| weapon_row(session, weapon, weapon.two_handed, &masteries))
        .collect()
}

fn item_cost_cp(rules: &RuleRepository, name: &str) -> Option<(String, String, ItemCategory, i64)> {
    match rules.lookup_equipment(name)? {
        EquipmentRef::Weapon(weapon) => Some((
            weapon.name.clone(),
            weapon.id.clone(),
            ItemCategory::Weapon,
            weapon.cost_cp,
        )),
        EquipmentRef::Armor(armor) => Some((
            armor.name.clone(),
            armor.id.clone(),
            ItemCategory::Armor,
            armor.cost_cp,
        )),
        EquipmentRef::Gear(gear) => Some((
            gear.name.clone(),
            gear.id.clone(),
            ItemCategory::Gear,
            gear.cost_cp,
        )),
        EquipmentRef::Pack(pack) => Some((
            pack.name.clone(),
            pack.id.clone(),
            ItemCategory::Pack,
            pack.cost_cp,
        )),
    }
}

fn merge_manual(session: &mut CharacterSelections, entry: InventoryEntry) {
    if let Some(existing) = session
        .manual_items
        .iter_mut()
        .find(|held| held.key == entry.key && held.category == entry.category)
    {
        existing.quantity += entry.quantity;
    } else {
        session.manual_items.push(entry);
    }
}

/// Add an item outside the shop flow (loot, trades, DM grants). Unknown
/// names are kept as plain gear.
pub fn add_manual_item(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    name: &str,
    quantity: u32,
) {
    if quantity == 0 {
        return;
    }
    let entry = match rules.lookup_equipment(name) {
        Some(EquipmentRef::Weapon(weapon)) => InventoryEntry {
            name: weapon.name.clone(),
            key: weapon.id.clone(),
            category: ItemCategory::Weapon,
            quantity,
            contents: Vec::new(),
        },
        Some(EquipmentRef::Armor(armor)) => InventoryEntry {
            name: armor.name.clone(),
            key: armor.id.clone(),
            category: ItemCategory::Armor,
            quantity,
            contents: Vec::new(),
        },
        Some(EquipmentRef::Gear(gear)) => InventoryEntry {
            name: gear.name.clone(),
            key: gear.id.clone(),
            category: ItemCategory::Gear,
            quantity,
            contents: Vec::new(),
        },
        Some(EquipmentRef::Pack(pack)) => InventoryEntry {
            name: pack.name.clone(),
            key: pack.id.clone(),
            category: ItemCategory::Pack,
            quantity,
            contents: pack.contents.clone(),
        },
        None => InventoryEntry {
            name: name.trim().to_string(),
            key: crate::rules::normalize_key(crate::rules::strip_alias(name)),
            category: ItemCategory::Gear,
            quantity,
            contents: Vec::new(),
        },
    };
    merge_manual(session, entry);
}

/// Purchase from the catalogs, spending mixed denominations at the standard
/// copper rates.
pub fn buy_item(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    name: &str,
    quantity: u32,
) -> Result<(), DomainError> {
    let (_, _, _, cost_cp) =
        item_cost_cp(rules, name).ok_or_else(|| DomainError::not_found("Item", name))?;
    session.coins.spend(cost_cp * quantity as i64)?;
    add_manual_item(session, rules, name, quantity);
    Ok(())
}

/// Sell from the manually-held stock at catalog price.
pub fn sell_item(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    name: &str,
    quantity: u32,
) -> Result<(), DomainError> {
    let (_, key, category, cost_cp) =
        item_cost_cp(rules, name).ok_or_else(|| DomainError::not_found("Item", name))?;
    let Some(index) = session
        .manual_items
        .iter()
        .position(|entry| entry.key == key && entry.category == category)
    else {
        return Err(DomainError::constraint(format!(
            "No {} held outside starting equipment",
            name
        )));
    };
    if session.manual_items[index].quantity < quantity {
        return Err(DomainError::constraint(format!(
            "Only {} of {} held",
            session.manual_items[index].quantity, name
        )));
    }
    session.manual_items[index].quantity -= quantity;
    if session.manual_items[index].quantity == 0 {
        session.manual_items.remove(index);
    }
    // Unequip sold copies that the remaining stock no longer covers.
    let inventory = rebuild_inventory(session, rules);
    while session.hands.count_of(&key) > stocked_quantity(&inventory, &key) {
        let hand = if session.hands.get(Hand::Left) == Some(key.as_str()) {
            Hand::Left
        } else {
            Hand::Right
        };
        clear_hand(session, rules, hand);
    }
    session.coins.earn(cost_cp * quantity as i64);
    Ok(())
}
