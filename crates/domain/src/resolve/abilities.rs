//! Ability-score resolution: the three generation methods, background
//! bonuses, and validation.
//!
//! Changes here cascade through `derive()`: DEX into initiative and AC, CON
//! into HP, every ability into spellcasting stats and attack bonuses.

use crate::rules::{
    ability_modifier, point_buy_cost, Ability, RuleRepository, POINT_BUY_BUDGET, POINT_BUY_RANGE,
};
use crate::session::{AbilityMethod, BonusSlot, CharacterSelections};

/// Highest legal total score (raw + bonus) under every method.
pub const SCORE_CAP: i32 = 20;

/// Lowest legal base score under the manual method.
pub const MANUAL_FLOOR: i32 = 3;

/// Outcome of ability validation: an inline, user-correctable status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbilityStatus {
    pub ok: bool,
    pub message: String,
}

impl AbilityStatus {
    pub fn valid() -> Self {
        Self {
            ok: true,
            message: String::new(),
        }
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

pub fn set_method(session: &mut CharacterSelections, method: AbilityMethod) {
    session.ability_method = method;
}

pub fn set_raw_score(session: &mut CharacterSelections, ability: Ability, value: i32) {
    session.scores.insert(ability, value);
}

pub fn set_bonus_assignment(
    session: &mut CharacterSelections,
    slot: BonusSlot,
    ability: Ability,
) {
    session.bonus_assignments.insert(slot, ability);
}

/// Base score: the raw score with the background bonus removed.
pub fn base_score(session: &CharacterSelections, ability: Ability) -> i32 {
    session.score(ability) - session.bonus_for(ability)
}

/// Effective modifier for an ability.
pub fn modifier(session: &CharacterSelections, ability: Ability) -> i32 {
    ability_modifier(session.score(ability))
}

/// Default the scores from the class standard array once the prerequisites
/// are in place: method is standard, species and background are chosen, and
/// no score has been touched yet. Background bonuses land on top. Returns
/// whether anything was filled.
pub fn maybe_autofill(session: &mut CharacterSelections, rules: &RuleRepository) -> bool {
    if session.ability_method != AbilityMethod::Standard {
        return false;
    }
    if session.species_id.is_none() || session.background_id.is_none() {
        return false;
    }
    if !session.scores.is_empty() {
        return false;
    }
    let class_id = session.class_id.clone().unwrap_or_default();
    let array = rules.standard_array_for(&class_id);
    for (ability, score) in Ability::ALL.into_iter().zip(array) {
        let bonus = session.bonus_for(ability);
        session.scores.insert(ability, score + bonus);
    }
    true
}

/// Validate the current scores under the active method.
pub fn validate(session: &CharacterSelections, rules: &RuleRepository) -> AbilityStatus {
    if session.scores.len() < Ability::ALL.len() {
        return AbilityStatus::invalid("All six ability scores must be set");
    }

    if let Some(status) = validate_bonus_slots(session, rules) {
        return status;
    }

    for ability in Ability::ALL {
        if session.score(ability) > SCORE_CAP {
            return AbilityStatus::invalid(format!(
                "{} exceeds the maximum total score of {}",
                ability.name(),
                SCORE_CAP
            ));
        }
    }

    match session.ability_method {
        AbilityMethod::Standard => validate_standard(session, rules),
        AbilityMethod::PointBuy => validate_point_buy(session),
        AbilityMethod::Manual => validate_manual(session),
    }
}

fn validate_bonus_slots(
    session: &CharacterSelections,
    rules: &RuleRepository,
) -> Option<AbilityStatus> {
    let primary = session.bonus_assignments.get(&BonusSlot::Primary);
    let secondary = session.bonus_assignments.get(&BonusSlot::Secondary);

    if let (Some(primary), Some(secondary)) = (primary, secondary) {
        if primary == secondary {
            return Some(AbilityStatus::invalid(
                "Both ability bonuses are assigned to the same ability",
            ));
        }
    }

    let background = session
        .background_id
        .as_deref()
        .and_then(|id| rules.background(id))?;
    if !background.mandates_bonuses() {
        return None;
    }

    let (Some(primary), Some(secondary)) = (primary, secondary) else {
        return Some(AbilityStatus::invalid(format!(
            "{} requires both ability bonuses to be assigned",
            background.name
        )));
    };
    for assigned in [primary, secondary] {
        if !background.bonus_abilities.contains(assigned) {
            return Some(AbilityStatus::invalid(format!(
                "{} does not allow a bonus to {}",
                background.name,
                assigned.name()
            )));
        }
    }
    None
}

fn validate_standard(session: &CharacterSelections, rules: &RuleRepository) -> AbilityStatus {
    let class_id = session.class_id.clone().unwrap_or_default();
    let mut expected = rules.standard_array_for(&class_id);
    expected.sort_unstable();

    let mut bases: Vec<i32> = Ability::ALL
        .into_iter()
        .map(|ability| base_score(session, ability))
        .collect();
    bases.sort_unstable();

    if bases != expected {
        return AbilityStatus::invalid("Scores do not match the class standard array");
    }
    AbilityStatus::valid()
}

fn validate_point_buy(session: &CharacterSelections) -> AbilityStatus {
    let (floor, ceiling) = POINT_BUY_RANGE;
    let mut total = 0;
    for ability in Ability::ALL {
        let base = base_score(session, ability);
        if base < floor || base > ceiling {
            return AbilityStatus::invalid(format!(
                "{} base score {} is outside the point-buy range {}-{}",
                ability.name(),
                base,
                floor,
                ceiling
            ));
        }
        match point_buy_cost(base) {
            Some(cost) => total += cost,
            None => {
                return AbilityStatus::invalid(format!(
                    "{} base score {} has no point-buy cost",
                    ability.name(),
                    base
                ))
            }
        }
    }
    if total > POINT_BUY_BUDGET {
        return AbilityStatus::invalid(format!(
            "Point-buy cost {} exceeds the budget of {}",
            total, POINT_BUY_BUDGET
        ));
    }
    AbilityStatus::valid()
}

fn validate_manual(session: &CharacterSelections) -> AbilityStatus {
    for ability in Ability::ALL {
        if base_score(session, ability) < MANUAL_FLOOR {
            return AbilityStatus::invalid(format!(
                "{} base score is below the minimum of {}",
                ability.name(),
                MANUAL_FLOOR
            ));
        }
    }
    AbilityStatus::valid()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn standard_session() -> (CharacterSelections, RuleRepository) {
        let rules = fixtures::sample_rules();
        let mut session = CharacterSelections::new();
        session.class_id = Some("druid".into());
        session.species_id = Some("elf".into());
        session.background_id = Some("sage".into());
        session.bonus_assignments.insert(BonusSlot::Primary, Ability::Wis);
        session
            .bonus_assignments
            .insert(BonusSlot::Secondary, Ability::Con);
        (session, rules)
    }

    #[test]
    fn autofill_requires_species_and_background() {
        let rules = fixtures::sample_rules();
        let mut session = CharacterSelections::new();
        session.class_id = Some("druid".into());
        assert!(!maybe_autofill(&mut session, &rules));
        session.species_id = Some("elf".into());
        session.background_id = Some("sage".into());
        assert!(maybe_autofill(&mut session, &rules));
        assert_eq!(session.scores.len(), 6);
    }

    #[test]
    fn autofill_applies_background_bonuses_on_top() {
        let (mut session, rules) = standard_session();
        assert!(maybe_autofill(&mut session, &rules));
        let array = rules.standard_array_for("druid");
        assert_eq!(session.score(Ability::Wis), array[4] + 2);
        assert_eq!(session.score(Ability::Con), array[2] + 1);
        assert_eq!(session.score(Ability::Str), array[0]);
    }

    #[test]
    fn autofill_never_clobbers_existing_scores() {
        let (mut session, rules) = standard_session();
        session.scores.insert(Ability::Str, 18);
        assert!(!maybe_autofill(&mut session, &rules));
        assert_eq!(session.scores.len(), 1);
    }

    #[test]
    fn standard_accepts_any_permutation_of_the_class_array() {
        let (mut session, rules) = standard_session();
        let mut array = rules.standard_array_for("druid");
        array.rotate_left(2);
        for (ability, score) in Ability::ALL.into_iter().zip(array) {
            let bonus = session.bonus_for(ability);
            session.scores.insert(ability, score + bonus);
        }
        assert!(validate(&session, &rules).ok);
    }

    #[test]
    fn standard_rejects_scores_off_the_array() {
        let (mut session, rules) = standard_session();
        assert!(maybe_autofill(&mut session, &rules));
        session.scores.insert(Ability::Str, 16);
        let status = validate(&session, &rules);
        assert!(!status.ok);
        assert!(status.message.contains("standard array"));
    }

    #[test]
    fn point_buy_accepts_the_exact_budget() {
        let (mut session, rules) = standard_session();
        session.ability_method = AbilityMethod::PointBuy;
        // 15, 14, 13, 12, 10, 8 costs exactly 27.
        for (ability, base) in Ability::ALL.into_iter().zip([15, 14, 13, 12, 10, 8]) {
            let bonus = session.bonus_for(ability);
            session.scores.insert(ability, base + bonus);
        }
        assert!(validate(&session, &rules).ok);
    }

    #[test]
    fn point_buy_rejects_over_budget() {
        let (mut session, rules) = standard_session();
        session.ability_method = AbilityMethod::PointBuy;
        for (ability, base) in Ability::ALL.into_iter().zip([15, 15, 15, 15, 15, 8]) {
            let bonus = session.bonus_for(ability);
            session.scores.insert(ability, base + bonus);
        }
        let status = validate(&session, &rules);
        assert!(!status.ok);
        assert!(status.message.contains("budget"));
    }

    #[test]
    fn point_buy_rejects_bases_outside_range() {
        let (mut session, rules) = standard_session();
        session.ability_method = AbilityMethod::PointBuy;
        for (ability, base) in Ability::ALL.into_iter().zip([16, 14, 13, 12, 10, 8]) {
            let bonus = session.bonus_for(ability);
            session.scores.insert(ability, base + bonus);
        }
        assert!(!validate(&session, &rules).ok);
    }

    #[test]
    fn manual_allows_anything_above_the_floor() {
        let (mut session, rules) = standard_session();
        session.ability_method = AbilityMethod::Manual;
        for (ability, base) in Ability::ALL.into_iter().zip([18, 3, 11, 9, 17, 6]) {
            let bonus = session.bonus_for(ability);
            session.scores.insert(ability, base + bonus);
        }
        assert!(validate(&session, &rules).ok);
        session.scores.insert(Ability::Dex, 2);
        assert!(!validate(&session, &rules).ok);
    }

    #[test]
    fn total_score_cap_applies_to_every_method() {
        let (mut session, rules) = standard_session();
        session.ability_method = AbilityMethod::Manual;
        for ability in Ability::ALL {
            session.scores.insert(ability, 10);
        }
        session.scores.insert(Ability::Wis, 21);
        let status = validate(&session, &rules);
        assert!(!status.ok);
        assert!(status.message.contains("maximum total"));
    }

    #[test]
    fn mandated_bonus_slots_must_be_assigned_and_distinct() {
        let (mut session, rules) = standard_session();
        assert!(maybe_autofill(&mut session, &rules));
        session.bonus_assignments.clear();
        let status = validate(&session, &rules);
        assert!(!status.ok);
        assert!(status.message.contains("both ability bonuses"));

        session.bonus_assignments.insert(BonusSlot::Primary, Ability::Wis);
        session
            .bonus_assignments
            .insert(BonusSlot::Secondary, Ability::Wis);
        assert!(!validate(&session, &rules).ok);
    }

    #[test]
    fn mandated_bonus_slots_must_come_from_the_allowed_list() {
        let (mut session, rules) = standard_session();
        assert!(maybe_autofill(&mut session, &rules));
        // Sage allows CON/INT/WIS; STR is off-list.
        session.bonus_assignments.insert(BonusSlot::Primary, Ability::Str);
        let status = validate(&session, &rules);
        assert!(!status.ok);
        assert!(status.message.contains("does not allow"));
    }
}
