//! Feature-choice resolution: option picking, nested sub-selections, and
//! the completeness predicate that gates level-up and save.

use std::collections::BTreeSet;

use crate::error::DomainError;
use crate::rules::{
    Ability, ArmorTraining, ChoiceKey, ChoiceOption, FeatureChoiceDef, RuleRepository,
    WeaponTraining,
};
use crate::session::{CharacterSelections, Selection};

/// Aggregated effects of every resolved choice at the current level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChoiceEffectSummary {
    pub bonus_cantrips: u32,
    pub armor: ArmorTraining,
    pub weapons: WeaponTraining,
    pub extra_saves: BTreeSet<Ability>,
    /// Fixed grants plus chosen sub-skill picks.
    pub skills: BTreeSet<String>,
    /// Resolved weapon-mastery picks.
    pub masteries: BTreeSet<String>,
}

/// The effective selection for a choice: the explicit pick, or the sole
/// option of a single-option choice.
fn effective_option<'a>(
    def: &'a FeatureChoiceDef,
    selection: Option<&Selection>,
) -> Option<&'a ChoiceOption> {
    match selection {
        Some(selection) => def.option(&selection.option),
        None if def.auto_resolves() => def.options.first(),
        None => None,
    }
}

/// Walk every choice active at the session's class and level and accumulate
/// the effects of resolved options.
pub fn resolved_effects(
    session: &CharacterSelections,
    rules: &RuleRepository,
) -> ChoiceEffectSummary {
    let mut summary = ChoiceEffectSummary::default();
    let Some(class_id) = session.class_id.as_deref() else {
        return summary;
    };
    for def in rules.choices_for(class_id, session.level) {
        let selection = session.selection(&def.key);
        let Some(option) = effective_option(def, selection) else {
            continue;
        };
        let effects = &option.effects;
        summary.bonus_cantrips += effects.bonus_cantrips;
        summary.armor.union(&effects.armor_training);
        summary.weapons.union(&effects.weapon_training);
        summary.extra_saves.extend(effects.extra_saves.iter().copied());
        summary
            .skills
            .extend(effects.skill_grants.iter().cloned());
        if let Some(selection) = selection {
            if let Some(skill) = &selection.skill {
                if effects.skill_options.contains(skill) {
                    summary.skills.insert(skill.clone());
                }
            }
            if effects.mastery_count > 0 {
                summary.masteries.extend(selection.masteries.iter().cloned());
            }
        }
    }
    summary
}

/// Check a selection's nested sub-picks against its option definition.
///
/// `weapons` is the full trained-weapon set (class grants plus choice
/// effects) used to validate mastery picks.
fn sub_picks_complete(
    option: &ChoiceOption,
    selection: &Selection,
    rules: &RuleRepository,
    weapons: &WeaponTraining,
) -> bool {
    let effects = &option.effects;

    if !effects.skill_options.is_empty() {
        match &selection.skill {
            Some(skill) if effects.skill_options.contains(skill) => {}
            _ => return false,
        }
    }

    if effects.language_count > 0 {
        let distinct: BTreeSet<&String> = selection.languages.iter().collect();
        if distinct.len() != effects.language_count as usize {
            return false;
        }
        let catalog = rules.languages();
        if !catalog.is_empty()
            && !selection.languages.iter().all(|lang| catalog.contains(lang))
        {
            return false;
        }
    }

    if effects.mastery_count > 0 {
        let distinct: BTreeSet<&String> = selection.masteries.iter().collect();
        if distinct.len() != effects.mastery_count as usize {
            return false;
        }
        for key in &selection.masteries {
            match rules.weapon(key) {
                Some(weapon) if weapons.allows(weapon.class) => {}
                _ => return false,
            }
        }
    }

    true
}

fn trained_weapons(session: &CharacterSelections, rules: &RuleRepository) -> WeaponTraining {
    let mut weapons = session
        .class_id
        .as_deref()
        .and_then(|id| rules.class(id))
        .map(|class| class.weapon_training)
        .unwrap_or_default();
    weapons.union(&resolved_effects(session, rules).weapons);
    weapons
}

/// Resolve a feature choice, validating the option and its sub-picks.
pub fn set_selection(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    key: ChoiceKey,
    selection: Selection,
) -> Result<(), DomainError> {
    let def = rules
        .choice(&key)
        .ok_or_else(|| DomainError::not_found("FeatureChoice", key.to_string()))?;
    let option = def.option(&selection.option).ok_or_else(|| {
        DomainError::validation(format!(
            "{} is not an option of {}",
            selection.option, def.name
        ))
    })?;

    // Mastery validation needs the training granted by this very selection,
    // so insert first and roll back on failure.
    let previous = session.selections.insert(key.clone(), selection.clone());
    let weapons = trained_weapons(session, rules);
    if !sub_picks_complete(option, &selection, rules, &weapons) {
        match previous {
            Some(previous) => {
                session.selections.insert(key, previous);
            }
            None => {
                session.selections.remove(&key);
            }
        }
        return Err(DomainError::validation(format!(
            "Incomplete or illegal sub-selections for {}",
            def.name
        )));
    }
    Ok(())
}

/// Pick one of the class's selectable skills.
///
/// Policy: class-skill picks are cleared on every class change (see
/// DESIGN.md), so the allowed list is always the current class's.
pub fn pick_class_skill(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    skill: &str,
) -> Result<(), DomainError> {
    let class = session
        .class_id
        .as_deref()
        .and_then(|id| rules.class(id))
        .ok_or_else(|| DomainError::constraint("No class chosen"))?;
    if !class.skill_options.iter().any(|option| option == skill) {
        return Err(DomainError::validation(format!(
            "{} is not a {} class skill",
            skill, class.name
        )));
    }
    if granted_skills(session, rules).contains(skill) {
        return Err(DomainError::validation(format!(
            "{} is already granted by background or features",
            skill
        )));
    }
    if session.class_skills.contains(skill) {
        return Ok(());
    }
    if session.class_skills.len() >= class.skill_quota {
        return Err(DomainError::capacity_exhausted(
            session.class_skills.len() as u32,
            class.skill_quota as u32,
        ));
    }
    session.class_skills.insert(skill.to_string());
    Ok(())
}

pub fn remove_class_skill(session: &mut CharacterSelections, skill: &str) {
    session.class_skills.remove(skill);
}

/// Skills granted outright by background and resolved feature choices.
/// Class-skill picks must stay disjoint from this set.
pub fn granted_skills(
    session: &CharacterSelections,
    rules: &RuleRepository,
) -> BTreeSet<String> {
    let mut skills = resolved_effects(session, rules).skills;
    if let Some(background) = session
        .background_id
        .as_deref()
        .and_then(|id| rules.background(id))
    {
        skills.extend(background.skill_grants.iter().cloned());
    }
    skills
}

/// Extra-language quota from the chosen background.
pub fn language_quota(session: &CharacterSelections, rules: &RuleRepository) -> u32 {
    session
        .background_id
        .as_deref()
        .and_then(|id| rules.background(id))
        .map(|background| background.language_quota)
        .unwrap_or(0)
}

/// Languages granted outright by the chosen species. Extra-language picks
/// must stay disjoint from this set.
pub fn granted_languages(
    session: &CharacterSelections,
    rules: &RuleRepository,
) -> BTreeSet<String> {
    session
        .species_id
        .as_deref()
        .and_then(|id| rules.species(id))
        .map(|species| species.languages.iter().cloned().collect())
        .unwrap_or_default()
}

pub fn pick_language(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    language: &str,
) -> Result<(), DomainError> {
    let catalog = rules.languages();
    if !catalog.is_empty() && !catalog.iter().any(|known| known == language) {
        return Err(DomainError::not_found("Language", language));
    }
    if granted_languages(session, rules).contains(language) {
        return Err(DomainError::validation(format!(
            "{} is already granted by the chosen species",
            language
        )));
    }
    let quota = language_quota(session, rules);
    if session.languages.contains(language) {
        return Ok(());
    }
    if session.languages.len() as u32 >= quota {
        return Err(DomainError::capacity_exhausted(
            session.languages.len() as u32,
            quota,
        ));
    }
    session.languages.insert(language.to_string());
    Ok(())
}

pub fn remove_language(session: &mut CharacterSelections, language: &str) {
    session.languages.remove(language);
}

/// True while anything required at the current level is unresolved. Gates
/// both level advancement and save.
pub fn has_missing_required_selections(
    session: &CharacterSelections,
    rules: &RuleRepository,
) -> bool {
    if session.species_id.is_none() || session.background_id.is_none() {
        return true;
    }
    if let Some(species) = session.species_id.as_deref().and_then(|id| rules.species(id)) {
        if species.requires_lineage && session.lineage_id.is_none() {
            return true;
        }
    }

    if (session.languages.len() as u32) < language_quota(session, rules) {
        return true;
    }

    let Some(class_id) = session.class_id.as_deref() else {
        return false;
    };

    if let Some(class) = rules.class(class_id) {
        if session.class_skills.len() < class.skill_quota {
            return true;
        }
        if let Some(subclass_level) = class.subclass_level {
            if session.level >= subclass_level && session.subclass_id.is_none() {
                return true;
            }
        }
    }
    if let Some(subclass) = session.subclass_id.as_deref().and_then(|id| rules.subclass(id)) {
        if subclass.unlock_level > session.level {
            return true;
        }
    }

    let weapons = trained_weapons(session, rules);
    for def in rules.choices_for(class_id, session.level) {
        let selection = session.selection(&def.key);
        let Some(option) = effective_option(def, selection) else {
            return true;
        };
        match selection {
            Some(selection) => {
                if !sub_picks_complete(option, selection, rules, &weapons) {
                    return true;
                }
            }
            // Auto-resolved without an explicit record: fine only if the
            // sole option demands no sub-picks.
            None => {
                if option.effects.requires_sub_picks() {
                    return true;
                }
            }
        }
    }

    false
}

/// After a long rest, re-offer renewable choices by discarding their picks.
/// Requires explicit confirmation; non-renewable picks are never touched.
/// Returns how many selections were cleared.
pub fn renew_long_rest(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    confirmed: bool,
) -> usize {
    if !confirmed {
        return 0;
    }
    let renewable: Vec<ChoiceKey> = session
        .selections
        .iter()
        .filter(|(key, selection)| {
            rules
                .choice(key)
                .and_then(|def| def.option(&selection.option))
                .is_some_and(|option| option.effects.renewable)
        })
        .map(|(key, _)| key.clone())
        .collect();
    for key in &renewable {
        session.selections.remove(key);
    }
    renewable.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn single_option_choices_auto_resolve() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        // Veteran-style single-option choices need no explicit pick; the
        // druid at level 2 has Wild Companion (multi-option) pending.
        session
            .selections
            .remove(&ChoiceKey::new("druid", 2, "Wild Companion"));
        assert!(has_missing_required_selections(&session, &rules));
    }

    #[test]
    fn completeness_tracks_each_missing_piece() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        assert!(!has_missing_required_selections(&session, &rules));

        session.lineage_id = None;
        assert!(has_missing_required_selections(&session, &rules));
        session.lineage_id = Some("high-elf".into());

        session.languages.clear();
        assert!(has_missing_required_selections(&session, &rules));
        session.languages.insert("Draconic".into());

        let removed = session.class_skills.pop_first();
        assert!(removed.is_some());
        assert!(has_missing_required_selections(&session, &rules));
    }

    #[test]
    fn subclass_required_at_gate_level() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 3);
        session.subclass_id = None;
        assert!(has_missing_required_selections(&session, &rules));
        session.subclass_id = Some("circle-of-the-land".into());
        assert!(!has_missing_required_selections(&session, &rules));
    }

    #[test]
    fn subclass_above_current_level_blocks() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        session.subclass_id = Some("circle-of-the-land".into());
        assert!(has_missing_required_selections(&session, &rules));
    }

    #[test]
    fn unresolved_sub_picks_block_completeness() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        let key = ChoiceKey::new("druid", 1, "Primal Order");
        // Magician requires a skill sub-pick; drop it.
        session.selections.insert(key, Selection::of("magician"));
        assert!(has_missing_required_selections(&session, &rules));
    }

    #[test]
    fn set_selection_rejects_unknown_option() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        let key = ChoiceKey::new("druid", 1, "Primal Order");
        let err = set_selection(&mut session, &rules, key, Selection::of("summoner"));
        assert!(err.is_err());
    }

    #[test]
    fn set_selection_rolls_back_on_illegal_sub_picks() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        let key = ChoiceKey::new("druid", 1, "Primal Order");
        let good = session.selections.get(&key).cloned().expect("resolved");

        let mut bad = Selection::of("magician");
        bad.skill = Some("Stealth".into()); // not in the option's list
        assert!(set_selection(&mut session, &rules, key.clone(), bad).is_err());
        assert_eq!(session.selections.get(&key), Some(&good));
    }

    #[test]
    fn mastery_picks_must_be_trained_and_distinct() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::fighter_session(&rules, 1);
        let key = ChoiceKey::new("fighter", 1, "Weapon Mastery");

        let mut picks = Selection::of("masteries");
        picks.masteries = vec!["greatsword".into(), "greatsword".into()];
        assert!(set_selection(&mut session, &rules, key.clone(), picks).is_err());

        let mut picks = Selection::of("masteries");
        picks.masteries = vec!["greatsword".into(), "longbow".into()];
        set_selection(&mut session, &rules, key, picks).expect("trained martial picks");

        let effects = resolved_effects(&session, &rules);
        assert!(effects.masteries.contains("greatsword"));
        assert!(effects.masteries.contains("longbow"));
    }

    #[test]
    fn class_skill_picks_respect_quota_and_disjointness() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        session.class_skills.clear();

        // Sage already grants Arcana.
        assert!(pick_class_skill(&mut session, &rules, "Arcana").is_err());
        assert!(pick_class_skill(&mut session, &rules, "Stealth").is_err());

        pick_class_skill(&mut session, &rules, "Perception").expect("allowed");
        pick_class_skill(&mut session, &rules, "Survival").expect("allowed");
        let err = pick_class_skill(&mut session, &rules, "Medicine");
        assert!(matches!(
            err,
            Err(DomainError::CapacityExhausted { current: 2, max: 2 })
        ));
    }

    #[test]
    fn language_picks_respect_catalog_and_quota() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        session.languages.clear();

        assert!(pick_language(&mut session, &rules, "Binary").is_err());
        // Elves already speak Elvish.
        assert!(pick_language(&mut session, &rules, "Elvish").is_err());
        pick_language(&mut session, &rules, "Sylvan").expect("in catalog");
        // Sage's quota is one.
        assert!(pick_language(&mut session, &rules, "Giant").is_err());
    }

    #[test]
    fn long_rest_renews_only_renewable_choices_when_confirmed() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        let companion = ChoiceKey::new("druid", 2, "Wild Companion");
        let order = ChoiceKey::new("druid", 1, "Primal Order");
        assert!(session.selections.contains_key(&companion));

        assert_eq!(renew_long_rest(&mut session, &rules, false), 0);
        assert!(session.selections.contains_key(&companion));

        assert_eq!(renew_long_rest(&mut session, &rules, true), 1);
        assert!(!session.selections.contains_key(&companion));
        assert!(session.selections.contains_key(&order));
    }

    #[test]
    fn resolved_effects_accumulate_training_and_cantrips() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        let key = ChoiceKey::new("druid", 1, "Primal Order");

        let effects = resolved_effects(&session, &rules);
        // Fixture session picks Magician: one bonus cantrip, a skill.
        assert_eq!(effects.bonus_cantrips, 1);
        assert!(effects.skills.contains("Nature"));

        set_selection(&mut session, &rules, key, Selection::of("warden"))
            .expect("warden has no sub-picks");
        let effects = resolved_effects(&session, &rules);
        assert_eq!(effects.bonus_cantrips, 0);
        assert!(effects.armor.medium);
        assert!(effects.weapons.martial_melee);
    }
}
