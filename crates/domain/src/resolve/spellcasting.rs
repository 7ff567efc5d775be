//! Spellcasting: eligibility, casting stats, and prepared-spell limits.

use crate::error::DomainError;
use crate::rules::{ability_modifier, proficiency_bonus, Ability, RuleRepository};
use crate::session::CharacterSelections;

use super::choices::{self, ChoiceEffectSummary};
use super::loadout;
use super::proficiency::ProficiencySet;

/// Derived spellcasting panel state.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpellcastingState {
    /// The progression row grants some casting resource.
    pub eligible: bool,
    /// Eligible and not locked out by untrained armor.
    pub castable: bool,
    pub ability: Option<Ability>,
    pub save_dc: Option<i32>,
    pub attack_bonus: Option<i32>,
    pub cantrip_limit: u32,
    pub prepared_limit: u32,
    pub max_spell_level: Option<u8>,
}

/// Per-class-name fallback when the class record states no usable primary
/// ability.
fn fallback_casting_ability(class_id: &str) -> Option<Ability> {
    match class_id.to_lowercase().as_str() {
        "wizard" => Some(Ability::Int),
        "cleric" | "druid" | "ranger" => Some(Ability::Wis),
        "bard" | "sorcerer" | "warlock" | "paladin" => Some(Ability::Cha),
        _ => None,
    }
}

/// Casting ability for a class: the structured primary ability, else the
/// name-keyed fallback table.
pub fn casting_ability(rules: &RuleRepository, class_id: &str) -> Option<Ability> {
    rules
        .class(class_id)
        .and_then(|class| class.primary_ability)
        .or_else(|| fallback_casting_ability(class_id))
}

/// Resolve the full spellcasting state for the session.
pub fn resolve(
    session: &CharacterSelections,
    rules: &RuleRepository,
    proficiencies: &ProficiencySet,
    effects: &ChoiceEffectSummary,
) -> SpellcastingState {
    let Some(class_id) = session.class_id.as_deref() else {
        return SpellcastingState::default();
    };
    let Some(row) = rules.progression(class_id, session.level) else {
        return SpellcastingState::default();
    };

    let eligible = row.grants_spellcasting();
    if !eligible {
        return SpellcastingState::default();
    }
    let castable = !loadout::wearing_untrained_armor(session, rules, proficiencies);

    let ability = casting_ability(rules, class_id);
    let (save_dc, attack_bonus) = match ability {
        Some(ability) => {
            let modifier = ability_modifier(session.score(ability));
            let bonus = proficiency_bonus(session.level);
            (Some(8 + bonus + modifier), Some(bonus + modifier))
        }
        None => (None, None),
    };

    let cantrip_limit = row.cantrips_known.unwrap_or(0) + effects.bonus_cantrips;
    let prepared_limit = match (row.prepared_spells, row.cantrips_known) {
        (Some(prepared), Some(_)) => prepared.saturating_sub(cantrip_limit),
        (Some(prepared), None) => prepared,
        (None, _) => 0,
    };
    let max_spell_level = row.max_spell_level.or_else(|| row.highest_slot_level());

    SpellcastingState {
        eligible,
        castable,
        ability,
        save_dc,
        attack_bonus,
        cantrip_limit,
        prepared_limit,
        max_spell_level,
    }
}

/// Toggle a spell's prepared flag. Preparing past the relevant limit is
/// rejected so the caller can revert the checkbox. Returns the new prepared
/// state.
pub fn toggle_prepared(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    spell_id: &str,
) -> Result<bool, DomainError> {
    let class_id = session
        .class_id
        .clone()
        .ok_or_else(|| DomainError::constraint("No class chosen"))?;
    let spell = rules
        .class_spells(&class_id)
        .and_then(|spells| spells.iter().find(|spell| spell.id == spell_id))
        .cloned()
        .ok_or_else(|| DomainError::not_found("Spell", spell_id))?;

    if spell.is_cantrip() {
        if session.prepared_cantrips.remove(spell_id) {
            return Ok(false);
        }
    } else if session.prepared_spells.remove(spell_id) {
        return Ok(false);
    }

    let proficiencies = super::proficiency::aggregate(session, rules);
    let effects = choices::resolved_effects(session, rules);
    let state = resolve(session, rules, &proficiencies, &effects);
    if !state.eligible {
        return Err(DomainError::constraint(format!(
            "{} has no spellcasting at level {}",
            class_id, session.level
        )));
    }

    if spell.is_cantrip() {
        if session.prepared_cantrips.len() as u32 >= state.cantrip_limit {
            return Err(DomainError::capacity_exhausted(
                session.prepared_cantrips.len() as u32,
                state.cantrip_limit,
            ));
        }
        session.prepared_cantrips.insert(spell_id.to_string());
    } else {
        match state.max_spell_level {
            Some(max) if spell.level <= max => {}
            _ => {
                return Err(DomainError::constraint(format!(
                    "Spell level {} is above the preparable maximum",
                    spell.level
                )))
            }
        }
        if session.prepared_spells.len() as u32 >= state.prepared_limit {
            return Err(DomainError::capacity_exhausted(
                session.prepared_spells.len() as u32,
                state.prepared_limit,
            ));
        }
        session.prepared_spells.insert(spell_id.to_string());
    }
    Ok(true)
}

/// Expend one spell slot of the given level.
pub fn expend_slot(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    slot_level: u8,
) -> Result<(), DomainError> {
    let row = session
        .class_id
        .as_deref()
        .and_then(|id| rules.progression(id, session.level))
        .ok_or_else(|| DomainError::constraint("No progression row for the current level"))?;
    let capacity = slot_capacity(row, slot_level);
    let expended = session
        .expended_slots
        .get(&slot_level)
        .copied()
        .unwrap_or(0);
    if expended >= capacity {
        return Err(DomainError::capacity_exhausted(expended, capacity));
    }
    session.expended_slots.insert(slot_level, expended + 1);
    Ok(())
}

fn slot_capacity(row: &crate::rules::ProgressionRow, slot_level: u8) -> u32 {
    let mut capacity = match slot_level {
        1..=9 => row.spell_slots[(slot_level - 1) as usize],
        _ => 0,
    };
    if row.pact_slot_level == Some(slot_level) {
        capacity += row.pact_slots.unwrap_or(0);
    }
    capacity
}

/// Restore every expended slot (long rest).
pub fn restore_slots(session: &mut CharacterSelections) {
    session.expended_slots.clear();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::proficiency;
    use crate::testing::fixtures;

    fn state_of(session: &CharacterSelections, rules: &RuleRepository) -> SpellcastingState {
        let proficiencies = proficiency::aggregate(session, rules);
        let effects = choices::resolved_effects(session, rules);
        resolve(session, rules, &proficiencies, &effects)
    }

    #[test]
    fn empty_progression_row_means_ineligible_regardless_of_armor() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::fighter_session(&rules, 1);
        session.equipped_armor = Some("chain mail".into());
        let state = state_of(&session, &rules);
        assert!(!state.eligible);
        assert!(!state.castable);
        assert_eq!(state.save_dc, None);
    }

    #[test]
    fn druid_casting_stats_at_level_one() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        session.scores.insert(Ability::Wis, 17);
        let state = state_of(&session, &rules);
        assert!(state.eligible && state.castable);
        assert_eq!(state.ability, Some(Ability::Wis));
        // 8 + proficiency 2 + WIS 3.
        assert_eq!(state.save_dc, Some(13));
        assert_eq!(state.attack_bonus, Some(5));
    }

    #[test]
    fn untrained_armor_blocks_casting_but_not_eligibility() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        session.equipped_armor = Some("chain mail".into());
        let state = state_of(&session, &rules);
        assert!(state.eligible);
        assert!(!state.castable);
    }

    #[test]
    fn cantrip_limit_includes_feature_bonus() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 1);
        // Row grants 2, Magician adds 1.
        let state = state_of(&session, &rules);
        assert_eq!(state.cantrip_limit, 3);
    }

    #[test]
    fn prepared_limit_subtracts_the_cantrip_limit() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 1);
        // Row: prepared 4, cantrips 2; Magician's bonus raises the cantrip
        // limit to 3, leaving max(4 - 3, 0) = 1.
        let state = state_of(&session, &rules);
        assert_eq!(state.prepared_limit, 1);
    }

    #[test]
    fn max_spell_level_falls_back_to_highest_slot() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 3);
        let state = state_of(&session, &rules);
        assert_eq!(state.max_spell_level, Some(2));
    }

    #[test]
    fn toggle_rejects_prepares_past_the_limit() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        assert!(toggle_prepared(&mut session, &rules, "cure-wounds").expect("within limit"));
        let err = toggle_prepared(&mut session, &rules, "entangle");
        assert!(matches!(err, Err(DomainError::CapacityExhausted { .. })));
        // Unpreparing always succeeds.
        assert!(!toggle_prepared(&mut session, &rules, "cure-wounds").expect("toggle off"));
    }

    #[test]
    fn toggle_rejects_spells_above_the_preparable_level() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        let err = toggle_prepared(&mut session, &rules, "moonbeam");
        assert!(err.is_err());
    }

    #[test]
    fn toggle_rejects_unknown_spells_when_catalog_is_loaded() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        let err = toggle_prepared(&mut session, &rules, "fireball");
        assert!(matches!(err, Err(DomainError::NotFound { .. })));
    }

    #[test]
    fn cantrip_toggles_track_their_own_limit() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        for cantrip in ["druidcraft", "guidance", "produce-flame"] {
            assert!(toggle_prepared(&mut session, &rules, cantrip).expect("within limit"));
        }
        let err = toggle_prepared(&mut session, &rules, "starry-wisp");
        assert!(err.is_err());
    }

    #[test]
    fn slot_expenditure_stops_at_capacity() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        expend_slot(&mut session, &rules, 1).expect("first slot");
        expend_slot(&mut session, &rules, 1).expect("second slot");
        assert!(expend_slot(&mut session, &rules, 1).is_err());
        assert!(expend_slot(&mut session, &rules, 2).is_err());

        restore_slots(&mut session);
        assert!(session.expended_slots.is_empty());
    }
}
