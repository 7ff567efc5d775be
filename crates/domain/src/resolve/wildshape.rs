//! The shapeshifting resource: a level-indexed tier table, stored forms,
//! activation against a shared use pool, and the companion toggle.

use crate::error::DomainError;
use crate::rules::{ChallengeRating, CreatureDef, RuleRepository};
use crate::session::{CharacterSelections, CompanionSource};

/// Level below which the resource has zero capacity.
pub const UNLOCK_LEVEL: u8 = 2;

/// One tier of the resource table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShapeTier {
    /// Uses restored on a long rest and shared with the companion when its
    /// source is the pool.
    pub uses: u32,
    /// How many forms may be stored.
    pub max_forms: u8,
    /// Highest usable challenge rating.
    pub max_challenge: ChallengeRating,
    /// Whether flying forms are permitted.
    pub flight: bool,
}

/// The tier active at a character level, or `None` below the threshold.
pub fn tier_for(level: u8) -> Option<ShapeTier> {
    let tier = match level {
        0..=1 => return None,
        2..=3 => ShapeTier {
            uses: 2,
            max_forms: 4,
            max_challenge: ChallengeRating::from_eighths(2),
            flight: false,
        },
        4..=5 => ShapeTier {
            uses: 2,
            max_forms: 6,
            max_challenge: ChallengeRating::from_eighths(4),
            flight: false,
        },
        6..=7 => ShapeTier {
            uses: 3,
            max_forms: 6,
            max_challenge: ChallengeRating::from_eighths(4),
            flight: false,
        },
        8..=16 => ShapeTier {
            uses: 3,
            max_forms: 8,
            max_challenge: ChallengeRating::from_whole(1),
            flight: true,
        },
        _ => ShapeTier {
            uses: 4,
            max_forms: 8,
            max_challenge: ChallengeRating::from_whole(1),
            flight: true,
        },
    };
    Some(tier)
}

/// Uses left in the shared pool at the session's level.
pub fn uses_remaining(session: &CharacterSelections) -> u32 {
    tier_for(session.level)
        .map(|tier| tier.uses.saturating_sub(session.resource.uses_spent))
        .unwrap_or(0)
}

fn eligible_form(tier: ShapeTier, creature: &CreatureDef) -> bool {
    creature.creature_type.eq_ignore_ascii_case("beast")
        && creature.challenge <= tier.max_challenge
        && (tier.flight || !creature.flying)
}

/// Creatures usable as forms at a level: beasts under the tier's challenge
/// ceiling, flyers only once the tier permits flight.
pub fn available_forms(rules: &RuleRepository, level: u8) -> Vec<&CreatureDef> {
    let Some(tier) = tier_for(level) else {
        return Vec::new();
    };
    let mut forms: Vec<&CreatureDef> = rules
        .creatures()
        .filter(|creature| eligible_form(tier, creature))
        .collect();
    forms.sort_by(|a, b| a.name.cmp(&b.name));
    forms
}

/// Store a form. Rejected past the tier capacity or for creatures the tier
/// does not allow; storing an already-stored form is a no-op.
pub fn add_form(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    creature_id: &str,
) -> Result<(), DomainError> {
    let tier = tier_for(session.level).ok_or_else(|| {
        DomainError::constraint(format!(
            "Shapeshifting unlocks at level {}",
            UNLOCK_LEVEL
        ))
    })?;
    if session.resource.forms.iter().any(|held| held == creature_id) {
        return Ok(());
    }
    // An unpopulated creature catalog defers eligibility to the data layer.
    if rules.creatures().next().is_some() {
        let creature = rules
            .creature(creature_id)
            .ok_or_else(|| DomainError::not_found("Creature", creature_id))?;
        if !eligible_form(tier, creature) {
            return Err(DomainError::constraint(format!(
                "{} is not a usable form at level {}",
                creature.name, session.level
            )));
        }
    }
    if session.resource.forms.len() >= tier.max_forms as usize {
        return Err(DomainError::capacity_exhausted(
            session.resource.forms.len() as u32,
            tier.max_forms as u32,
        ));
    }
    session.resource.forms.push(creature_id.to_string());
    Ok(())
}

/// Drop a stored form, reverting first if it is the active one.
pub fn remove_form(session: &mut CharacterSelections, creature_id: &str) {
    if session.resource.active_form.as_deref() == Some(creature_id) {
        revert(session);
    }
    session.resource.forms.retain(|held| held != creature_id);
}

/// Take a stored form: consumes one use from the pool and grants temporary
/// hit points equal to the character level. Rejected when the pool is empty,
/// leaving the session untouched.
pub fn activate(
    session: &mut CharacterSelections,
    creature_id: &str,
) -> Result<(), DomainError> {
    let tier = tier_for(session.level).ok_or_else(|| {
        DomainError::constraint(format!(
            "Shapeshifting unlocks at level {}",
            UNLOCK_LEVEL
        ))
    })?;
    if !session.resource.forms.iter().any(|held| held == creature_id) {
        return Err(DomainError::constraint(format!(
            "{} is not a stored form",
            creature_id
        )));
    }
    if session.resource.uses_spent >= tier.uses {
        return Err(DomainError::capacity_exhausted(
            session.resource.uses_spent,
            tier.uses,
        ));
    }
    session.resource.uses_spent += 1;
    session.resource.active_form = Some(creature_id.to_string());
    session.resource.temp_hp = session.level as i32;
    Ok(())
}

/// Drop the active form. Equipment-derived attack rows take over again.
pub fn revert(session: &mut CharacterSelections) {
    session.resource.active_form = None;
    session.resource.temp_hp = 0;
}

pub fn set_companion_source(session: &mut CharacterSelections, source: CompanionSource) {
    session.resource.companion_source = source;
}

/// Toggle the companion. Summoning draws from the shared pool or is free
/// per the source setting; dismissing never refunds. Returns the new state.
pub fn toggle_companion(session: &mut CharacterSelections) -> Result<bool, DomainError> {
    if session.resource.companion_active {
        session.resource.companion_active = false;
        return Ok(false);
    }
    let tier = tier_for(session.level).ok_or_else(|| {
        DomainError::constraint(format!(
            "The companion unlocks at level {}",
            UNLOCK_LEVEL
        ))
    })?;
    if session.resource.companion_source == CompanionSource::SharedPool {
        if session.resource.uses_spent >= tier.uses {
            return Err(DomainError::capacity_exhausted(
                session.resource.uses_spent,
                tier.uses,
            ));
        }
        session.resource.uses_spent += 1;
    }
    session.resource.companion_active = true;
    Ok(true)
}

/// Restore the full use pool (long rest).
pub fn restore_uses(session: &mut CharacterSelections) {
    session.resource.uses_spent = 0;
}

/// Derived panel state for the resource.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourcePanel {
    pub available: bool,
    pub uses_max: u32,
    pub uses_spent: u32,
    pub form_capacity: u8,
    pub stored_forms: Vec<String>,
    pub max_challenge: Option<ChallengeRating>,
    pub flight_allowed: bool,
    pub active_form: Option<String>,
    pub companion_active: bool,
}

pub fn panel(session: &CharacterSelections) -> ResourcePanel {
    let Some(tier) = tier_for(session.level) else {
        return ResourcePanel::default();
    };
    ResourcePanel {
        available: true,
        uses_max: tier.uses,
        uses_spent: session.resource.uses_spent,
        form_capacity: tier.max_forms,
        stored_forms: session.resource.forms.clone(),
        max_challenge: Some(tier.max_challenge),
        flight_allowed: tier.flight,
        active_form: session.resource.active_form.clone(),
        companion_active: session.resource.companion_active,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[test]
    fn no_tier_below_the_unlock_level() {
        assert_eq!(tier_for(0), None);
        assert_eq!(tier_for(1), None);
        assert!(tier_for(2).is_some());
    }

    #[test]
    fn tiers_raise_capacity_challenge_and_flight() {
        let low = tier_for(2).expect("tier");
        let mid = tier_for(4).expect("tier");
        let high = tier_for(8).expect("tier");
        assert_eq!(low.max_forms, 4);
        assert_eq!(mid.max_forms, 6);
        assert_eq!(high.max_forms, 8);
        assert!(low.max_challenge < mid.max_challenge);
        assert!(mid.max_challenge < high.max_challenge);
        assert!(!low.flight && !mid.flight);
        assert!(high.flight);
    }

    #[test]
    fn form_filter_applies_type_challenge_and_flight() {
        let rules = fixtures::sample_rules();
        let names = |level: u8| -> Vec<&str> {
            available_forms(&rules, level)
                .into_iter()
                .map(|creature| creature.id.as_str())
                .collect()
        };
        // Level 2: beasts at CR 1/4 or below, no flyers. The imp is a fiend
        // and never qualifies.
        assert_eq!(names(2), vec!["boar", "panther", "rat", "wolf"]);
        // Level 8 admits CR 1 and flyers.
        assert_eq!(
            names(8),
            vec![
                "boar",
                "brown-bear",
                "giant-eagle",
                "owl",
                "panther",
                "rat",
                "wolf"
            ]
        );
        assert!(names(1).is_empty());
    }

    #[test]
    fn add_form_enforces_tier_capacity() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.forms.clear();
        add_form(&mut session, &rules, "wolf").expect("eligible");
        // Re-adding is a no-op, not a duplicate.
        add_form(&mut session, &rules, "wolf").expect("idempotent");
        assert_eq!(session.resource.forms.len(), 1);

        session.resource.forms =
            vec!["wolf".into(), "panther".into(), "owl".into(), "rat".into()];
        let err = add_form(&mut session, &rules, "boar");
        assert!(matches!(err, Err(DomainError::CapacityExhausted { .. })));
    }

    #[test]
    fn add_form_rejects_forms_the_tier_does_not_allow() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.forms.clear();
        // CR 1 at a CR 1/4 tier.
        assert!(add_form(&mut session, &rules, "brown-bear").is_err());
        // Flyer before flight unlocks.
        assert!(add_form(&mut session, &rules, "owl").is_err());
        // Wrong creature type at any level.
        let mut high = fixtures::druid_session(&rules, 8);
        high.resource.forms.clear();
        assert!(add_form(&mut high, &rules, "imp").is_err());
        assert!(add_form(&mut high, &rules, "owl").is_ok());
    }

    #[test]
    fn activation_spends_a_use_and_grants_temp_hp() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 5);
        session.resource.forms = vec!["wolf".into()];
        activate(&mut session, "wolf").expect("pool has uses");
        assert_eq!(session.resource.uses_spent, 1);
        assert_eq!(session.resource.active_form.as_deref(), Some("wolf"));
        assert_eq!(session.resource.temp_hp, 5);
    }

    #[test]
    fn activation_with_an_empty_pool_changes_nothing() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.forms = vec!["wolf".into()];
        session.resource.uses_spent = 2;
        let before = session.resource.clone();
        let err = activate(&mut session, "wolf");
        assert!(matches!(err, Err(DomainError::CapacityExhausted { .. })));
        assert_eq!(session.resource, before);
    }

    #[test]
    fn activation_requires_a_stored_form() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.forms = vec!["wolf".into()];
        assert!(activate(&mut session, "panther").is_err());
    }

    #[test]
    fn revert_clears_the_active_form_and_temp_hp() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.forms = vec!["wolf".into()];
        activate(&mut session, "wolf").expect("activates");
        revert(&mut session);
        assert_eq!(session.resource.active_form, None);
        assert_eq!(session.resource.temp_hp, 0);
        // The use stays spent.
        assert_eq!(session.resource.uses_spent, 1);
    }

    #[test]
    fn removing_the_active_form_reverts_first() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.forms = vec!["wolf".into(), "panther".into()];
        activate(&mut session, "wolf").expect("activates");
        remove_form(&mut session, "wolf");
        assert_eq!(session.resource.active_form, None);
        assert_eq!(session.resource.forms, vec!["panther".to_string()]);
    }

    #[test]
    fn companion_draws_from_the_shared_pool() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        assert!(toggle_companion(&mut session).expect("pool has uses"));
        assert_eq!(session.resource.uses_spent, 1);
        // Dismissing does not refund.
        assert!(!toggle_companion(&mut session).expect("dismiss"));
        assert_eq!(session.resource.uses_spent, 1);

        session.resource.uses_spent = 2;
        assert!(toggle_companion(&mut session).is_err());
        assert!(!session.resource.companion_active);
    }

    #[test]
    fn free_companion_costs_nothing() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        set_companion_source(&mut session, CompanionSource::Free);
        session.resource.uses_spent = 2;
        assert!(toggle_companion(&mut session).expect("free source"));
        assert_eq!(session.resource.uses_spent, 2);
    }

    #[test]
    fn long_rest_restores_the_pool() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 2);
        session.resource.uses_spent = 2;
        restore_uses(&mut session);
        assert_eq!(uses_remaining(&session), 2);
    }

    #[test]
    fn panel_reflects_the_tier_and_session() {
        let rules = fixtures::sample_rules();
        let mut session = fixtures::druid_session(&rules, 8);
        session.resource.forms = vec!["owl".into()];
        let panel = panel(&session);
        assert!(panel.available);
        assert_eq!(panel.uses_max, 3);
        assert_eq!(panel.form_capacity, 8);
        assert!(panel.flight_allowed);
        assert_eq!(panel.max_challenge, Some(ChallengeRating::from_whole(1)));

        let low = fixtures::druid_session(&rules, 1);
        assert_eq!(super::panel(&low), ResourcePanel::default());
    }
}
