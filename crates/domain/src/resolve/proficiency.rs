//! Proficiency aggregation: the sole authority consulted for "is X trained".

use std::collections::BTreeSet;

use crate::rules::{Ability, ArmorTraining, RuleRepository, WeaponTraining};
use crate::session::CharacterSelections;

use super::choices;

/// Merged training and proficiency sets from class, background, and
/// resolved feature choices.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProficiencySet {
    pub armor: ArmorTraining,
    pub weapons: WeaponTraining,
    pub saves: BTreeSet<Ability>,
    pub skills: BTreeSet<String>,
}

/// Aggregate every proficiency source for the session.
pub fn aggregate(session: &CharacterSelections, rules: &RuleRepository) -> ProficiencySet {
    let effects = choices::resolved_effects(session, rules);
    let mut set = ProficiencySet {
        armor: effects.armor,
        weapons: effects.weapons,
        saves: effects.extra_saves.clone(),
        skills: BTreeSet::new(),
    };

    if let Some(class) = session.class_id.as_deref().and_then(|id| rules.class(id)) {
        set.armor.union(&class.armor_training);
        set.weapons.union(&class.weapon_training);
        set.saves.extend(class.saving_throws.iter().copied());
    }

    set.skills = choices::granted_skills(session, rules);
    set.skills.extend(session.class_skills.iter().cloned());
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ArmorCategory, ChoiceKey, WeaponClass};
    use crate::session::Selection;
    use crate::testing::fixtures;

    #[test]
    fn class_training_is_the_baseline() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 1);
        let set = aggregate(&session, &rules);
        assert!(set.armor.allows(ArmorCategory::Light));
        assert!(set.armor.allows(ArmorCategory::Shield));
        assert!(!set.armor.allows(ArmorCategory::Heavy));
        assert!(set.weapons.allows(WeaponClass::SimpleMelee));
        assert!(!set.weapons.allows(WeaponClass::MartialMelee));
        assert!(set.saves.contains(&Ability::Int));
        assert!(set.saves.contains(&Ability::Wis));
    }

    #[test]
    fn choice_effects_extend_training() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        choices::set_selection(
            &mut session,
            &rules,
            ChoiceKey::new("druid", 1, "Primal Order"),
            Selection::of("warden"),
        )
        .expect("warden resolves");
        let set = aggregate(&session, &rules);
        assert!(set.armor.allows(ArmorCategory::Medium));
        assert!(set.weapons.allows(WeaponClass::MartialMelee));
    }

    #[test]
    fn two_extra_saves_from_a_feature_choice() {
        let rules = fixtures::sample_rules();
        let session = fixtures::fighter_session(&rules, 2);
        let set = aggregate(&session, &rules);
        // Class saves plus Veteran Grit's two extras.
        assert!(set.saves.contains(&Ability::Str));
        assert!(set.saves.contains(&Ability::Con));
        assert!(set.saves.contains(&Ability::Dex));
        assert!(set.saves.contains(&Ability::Wis));
    }

    #[test]
    fn skills_union_background_choice_and_class_picks() {
        let rules = fixtures::sample_rules();
        let session = fixtures::druid_session(&rules, 1);
        let set = aggregate(&session, &rules);
        // Sage grants Arcana and History; Magician's sub-pick adds Nature;
        // class picks add two more.
        assert!(set.skills.contains("Arcana"));
        assert!(set.skills.contains("History"));
        assert!(set.skills.contains("Nature"));
        for pick in &session.class_skills {
            assert!(set.skills.contains(pick));
        }
    }

    #[test]
    fn classless_session_still_gets_background_skills() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 1);
        session.class_id = None;
        session.class_skills.clear();
        let set = aggregate(&session, &rules);
        assert!(set.skills.contains("Arcana"));
        assert!(!set.armor.allows(ArmorCategory::Light));
    }
}
