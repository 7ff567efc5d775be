//! Level transitions: progression diffing, gated level-up, and the clamping
//! pass on the way down.

use crate::error::DomainError;
use crate::rules::{ProgressionRow, RuleRepository};
use crate::session::CharacterSelections;

use super::{abilities, choices, wildshape};

/// One entry of the ordered change list surfaced after a transition.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum ProgressionChange {
    ProficiencyBonus { from: i32, to: i32 },
    NewFeature { name: String },
    CounterIncrease { name: String, from: i64, to: i64 },
}

/// Diff two progression rows: a changed proficiency bonus, features present
/// only in the new row, and every numeric column that increased.
pub fn diff_rows(old: Option<&ProgressionRow>, new: &ProgressionRow) -> Vec<ProgressionChange> {
    let mut changes = Vec::new();

    let old_bonus = old.map(|row| row.proficiency_bonus).unwrap_or(0);
    if new.proficiency_bonus != old_bonus {
        changes.push(ProgressionChange::ProficiencyBonus {
            from: old_bonus,
            to: new.proficiency_bonus,
        });
    }

    for feature in &new.features {
        let already_had = old.is_some_and(|row| row.features.contains(feature));
        if !already_had {
            changes.push(ProgressionChange::NewFeature {
                name: feature.clone(),
            });
        }
    }

    let numeric_columns = [
        ("cantrips known", new.cantrips_known, old.and_then(|row| row.cantrips_known)),
        (
            "prepared spells",
            new.prepared_spells,
            old.and_then(|row| row.prepared_spells),
        ),
        ("pact slots", new.pact_slots, old.and_then(|row| row.pact_slots)),
    ];
    for (name, new_value, old_value) in numeric_columns {
        let new_value = new_value.unwrap_or(0) as i64;
        let old_value = old_value.unwrap_or(0) as i64;
        if new_value > old_value {
            changes.push(ProgressionChange::CounterIncrease {
                name: name.to_string(),
                from: old_value,
                to: new_value,
            });
        }
    }
    for slot_level in 1..=9u8 {
        let idx = (slot_level - 1) as usize;
        let new_value = new.spell_slots[idx] as i64;
        let old_value = old.map(|row| row.spell_slots[idx] as i64).unwrap_or(0);
        if new_value > old_value {
            changes.push(ProgressionChange::CounterIncrease {
                name: format!("level-{} spell slots", slot_level),
                from: old_value,
                to: new_value,
            });
        }
    }
    for (name, &new_value) in &new.counters {
        let old_value = old
            .and_then(|row| row.counters.get(name).copied())
            .unwrap_or(0);
        if new_value > old_value {
            changes.push(ProgressionChange::CounterIncrease {
                name: name.clone(),
                from: old_value,
                to: new_value,
            });
        }
    }

    changes
}

/// Clamp every counter that exceeds its new level-derived maximum. Leveling
/// down never un-resolves earlier choices.
fn clamp_counters(session: &mut CharacterSelections, rules: &RuleRepository) {
    session.hit_dice_spent = session.hit_dice_spent.min(session.level);

    let tier = wildshape::tier_for(session.level);
    let (max_uses, max_forms) = tier
        .map(|tier| (tier.uses, tier.max_forms as usize))
        .unwrap_or((0, 0));
    session.resource.uses_spent = session.resource.uses_spent.min(max_uses);
    session.resource.forms.truncate(max_forms);
    if let Some(active) = session.resource.active_form.clone() {
        if !session.resource.forms.contains(&active) {
            wildshape::revert(session);
        }
    }

    let row = session
        .class_id
        .as_deref()
        .and_then(|id| rules.progression(id, session.level));
    let capacities: Vec<(u8, u32)> = session
        .expended_slots
        .keys()
        .map(|&slot_level| {
            let capacity = row
                .map(|row| {
                    let mut capacity = match slot_level {
                        1..=9 => row.spell_slots[(slot_level - 1) as usize],
                        _ => 0,
                    };
                    if row.pact_slot_level == Some(slot_level) {
                        capacity += row.pact_slots.unwrap_or(0);
                    }
                    capacity
                })
                .unwrap_or(0);
            (slot_level, capacity)
        })
        .collect();
    for (slot_level, capacity) in capacities {
        match capacity {
            0 => {
                session.expended_slots.remove(&slot_level);
            }
            capacity => {
                let expended = session
                    .expended_slots
                    .get(&slot_level)
                    .copied()
                    .unwrap_or(0);
                session.expended_slots.insert(slot_level, expended.min(capacity));
            }
        }
    }
}

/// Move to a new level. Advancement is gated on choice completeness at the
/// current level; descent re-derives from the lower row and clamps.
pub fn set_level(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    new_level: u8,
) -> Result<Vec<ProgressionChange>, DomainError> {
    if new_level > 20 {
        return Err(DomainError::validation("Level cannot exceed 20"));
    }
    if new_level > session.level && choices::has_missing_required_selections(session, rules) {
        return Err(DomainError::invalid_state_transition(
            "Resolve all required selections before leveling up",
        ));
    }

    let Some(class_id) = session.class_id.clone() else {
        session.level = new_level;
        return Ok(Vec::new());
    };
    let old_level = session.level;
    let old_row = rules.progression(&class_id, old_level).cloned();
    session.level = new_level;
    clamp_counters(session, rules);

    // A missing row degrades to an empty change list.
    let mut changes = match rules.progression(&class_id, new_level) {
        Some(new_row) => diff_rows(old_row.as_ref(), new_row),
        None => Vec::new(),
    };
    if let Some(subclass) = session.subclass_id.as_deref().and_then(|id| rules.subclass(id)) {
        for (&level, features) in &subclass.features_by_level {
            if level > old_level && level <= new_level {
                changes.extend(features.iter().map(|feature| {
                    ProgressionChange::NewFeature {
                        name: feature.clone(),
                    }
                }));
            }
        }
    }
    Ok(changes)
}

/// Choose (or switch) the class.
///
/// A first pick at level 0 auto-transitions to level 1 so that level-1
/// feature choices surface before standard-array defaulting runs. Class
/// skills and the subclass are cleared on every switch; feature selections
/// for other classes stay in the map but are inert.
pub fn choose_class(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    class_id: &str,
) -> Result<Vec<ProgressionChange>, DomainError> {
    let catalog_loaded = rules.classes().next().is_some();
    if catalog_loaded && rules.class(class_id).is_none() {
        return Err(DomainError::not_found("Class", class_id));
    }

    let old_row = session
        .class_id
        .as_deref()
        .and_then(|id| rules.progression(id, session.level))
        .cloned();

    session.class_id = Some(class_id.to_string());
    session.subclass_id = None;
    session.class_skills.clear();
    session.prepared_cantrips.clear();
    session.prepared_spells.clear();
    if session.level == 0 {
        session.level = 1;
    }
    clamp_counters(session, rules);
    abilities::maybe_autofill(session, rules);

    let changes = match rules.progression(class_id, session.level) {
        Some(new_row) => diff_rows(old_row.as_ref(), new_row),
        None => Vec::new(),
    };
    Ok(changes)
}
