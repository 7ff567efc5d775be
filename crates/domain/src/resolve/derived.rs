//! The fully-derived character state and the single recompute pass that
//! produces it.

use std::collections::BTreeMap;

use crate::rules::{proficiency_bonus, Ability, RuleRepository};
use crate::session::CharacterSelections;

use super::abilities::{self, AbilityStatus};
use super::choices;
use super::loadout::{self, AttackRow, StockedItem};
use super::proficiency::{self, ProficiencySet};
use super::spellcasting::{self, SpellcastingState};
use super::wildshape::{self, ResourcePanel};

/// Everything computed from the session and the rule catalogs. Never
/// persisted directly; rebuilt whole by [`derive`] so partial recomputation
/// is never observable.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedCharacterState {
    pub modifiers: BTreeMap<Ability, i32>,
    pub ability_status: AbilityStatus,
    pub proficiency_bonus: i32,
    pub proficiencies: ProficiencySet,
    pub inventory: Vec<StockedItem>,
    pub armor_class: i32,
    pub initiative: i32,
    pub hit_die: u8,
    pub max_hp: i32,
    pub temp_hp: i32,
    pub hit_dice_total: u8,
    pub hit_dice_spent: u8,
    pub spellcasting: SpellcastingState,
    pub attacks: Vec<AttackRow>,
    pub resource: ResourcePanel,
    pub missing_required_selections: bool,
}

/// Maximum hit points: full die plus CON at first level, average-rounded-up
/// plus CON for each level after.
fn max_hit_points(hit_die: u8, level: u8, con_modifier: i32) -> i32 {
    if level == 0 || hit_die == 0 {
        return 0;
    }
    let die = hit_die as i32;
    let first = die + con_modifier;
    let per_level = die / 2 + 1 + con_modifier;
    first + (level as i32 - 1) * per_level
}

/// Recompute the whole derived state in dependency order: abilities, then
/// proficiencies, then loadout, then spellcasting, then the resource panel.
pub fn derive(session: &CharacterSelections, rules: &RuleRepository) -> DerivedCharacterState {
    let mut modifiers = BTreeMap::new();
    for ability in Ability::ALL {
        modifiers.insert(ability, abilities::modifier(session, ability));
    }
    let ability_status = abilities::validate(session, rules);

    let proficiencies = proficiency::aggregate(session, rules);
    let effects = choices::resolved_effects(session, rules);

    let inventory = loadout::rebuild_inventory(session, rules);
    let armor_class = loadout::armor_class(session, rules, &proficiencies);

    let spellcasting = spellcasting::resolve(session, rules, &proficiencies, &effects);
    let resource = wildshape::panel(session);

    // An active form replaces the equipment-derived rows with the
    // creature's own, which carry no ability or attack bonus.
    let attacks = match session
        .resource
        .active_form
        .as_deref()
        .and_then(|id| rules.creature(id))
    {
        Some(creature) => creature
            .attacks
            .iter()
            .map(|attack| AttackRow {
                name: attack.name.clone(),
                ability: None,
                attack_bonus: None,
                damage: attack.damage,
                damage_type: attack.damage_type.clone(),
                two_handed: false,
                mastery: None,
            })
            .collect(),
        None => loadout::attack_rows(session, rules),
    };

    let hit_die = session
        .class_id
        .as_deref()
        .and_then(|id| rules.class(id))
        .map(|class| class.hit_die)
        .unwrap_or(0);
    let con_modifier = modifiers.get(&Ability::Con).copied().unwrap_or(0);

    DerivedCharacterState {
        initiative: modifiers.get(&Ability::Dex).copied().unwrap_or(0),
        modifiers,
        ability_status,
        proficiency_bonus: proficiency_bonus(session.level),
        proficiencies,
        inventory,
        armor_class,
        hit_die,
        max_hp: max_hit_points(hit_die, session.level, con_modifier),
        temp_hp: session.resource.temp_hp,
        hit_dice_total: session.level,
        hit_dice_spent: session.hit_dice_spent,
        spellcasting,
        attacks,
        resource,
        missing_required_selections: choices::has_missing_required_selections(session, rules),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::{levels, wildshape};
    use crate::rules::DamageDie;
    use crate::session::Hand;
    use crate::testing::fixtures;

    #[test]
    fn derive_is_consistent_for_a_resolved_druid() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 1);
        let derived = derive(&session, &rules);

        assert!(derived.ability_status.ok);
        assert!(!derived.missing_required_selections);
        assert_eq!(derived.proficiency_bonus, 2);
        // Fallback array: WIS 15 + 2, CON 14 + 1, DEX 12.
        assert_eq!(derived.modifiers[&Ability::Wis], 3);
        assert_eq!(derived.initiative, 1);
        assert_eq!(derived.armor_class, 11);
        // d8 hit die, CON modifier 2.
        assert_eq!(derived.max_hp, 10);
        assert!(derived.spellcasting.castable);
    }

    #[test]
    fn hp_scales_with_level_by_the_average_formula() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 5);
        let derived = derive(&session, &rules);
        // 8 + 2 at first level, then 4 levels of (5 + 2).
        assert_eq!(derived.max_hp, 38);
        assert_eq!(derived.hit_dice_total, 5);
    }

    #[test]
    fn classless_session_degrades_to_defaults() {
        let rules = RuleRepository::new();
        let session = CharacterSelections::new();
        let derived = derive(&session, &rules);
        assert_eq!(derived.armor_class, 10);
        assert_eq!(derived.max_hp, 0);
        assert!(derived.attacks.is_empty());
        assert!(derived.missing_required_selections);
        assert!(!derived.resource.available);
    }

    #[test]
    fn active_form_swaps_in_creature_attack_rows() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        crate::resolve::loadout::equip_hand(&mut session, &rules, Hand::Left, "scimitar")
            .expect("equips");
        session.resource.forms = vec!["wolf".into()];
        wildshape::activate(&mut session, "wolf").expect("activates");

        let derived = derive(&session, &rules);
        assert_eq!(derived.attacks.len(), 1);
        assert_eq!(derived.attacks[0].name, "Bite");
        assert_eq!(derived.attacks[0].ability, None);
        assert_eq!(derived.attacks[0].attack_bonus, None);
        assert_eq!(derived.attacks[0].damage, DamageDie::new(2, 4));
        assert_eq!(derived.temp_hp, 2);

        wildshape::revert(&mut session);
        let derived = derive(&session, &rules);
        assert_eq!(derived.attacks[0].name, "Scimitar");
        assert!(derived.attacks[0].attack_bonus.is_some());
        assert_eq!(derived.temp_hp, 0);
    }

    #[test]
    fn level_transitions_keep_derived_state_consistent() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        levels::set_level(&mut session, &rules, 2).expect("complete");
        let derived = derive(&session, &rules);
        assert!(derived.resource.available);
        assert_eq!(derived.resource.uses_max, 2);
        assert_eq!(derived.max_hp, 17);
    }
}
