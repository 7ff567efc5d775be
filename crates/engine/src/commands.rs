//! Explicit command handlers for every user action.
//!
//! Each action is one `Command`; `apply` mutates the session, then
//! re-derives the full state before returning, so callers never observe a
//! partial recomputation. Rejected commands leave the session unchanged.

use sheetforge_domain::payload::{self, CharacterProfile};
use sheetforge_domain::resolve::levels::ProgressionChange;
use sheetforge_domain::resolve::{
    abilities, choices, derive, levels, loadout, proficiency, spellcasting, wildshape,
    DerivedCharacterState,
};
use sheetforge_domain::rules::{Ability, ChoiceKey, RuleRepository};
use sheetforge_domain::session::{
    AbilityMethod, BonusSlot, CharacterSelections, CompanionSource, Hand, Selection,
};
use sheetforge_domain::DomainError;

use crate::error::CommandError;

/// A discrete user action against the editing session.
#[derive(Debug, Clone)]
pub enum Command {
    SetName(String),
    SetMethod(AbilityMethod),
    SetRawScore { ability: Ability, value: i32 },
    AssignBonus { slot: BonusSlot, ability: Ability },

    ChooseClass(String),
    ChooseSubclass(String),
    ChooseSpecies(String),
    ChooseLineage(String),
    ChooseBackground(String),
    SetLevel(u8),

    ResolveChoice { key: ChoiceKey, selection: Selection },
    PickClassSkill(String),
    RemoveClassSkill(String),
    PickLanguage(String),
    RemoveLanguage(String),

    SetEquipmentOption(usize),
    AddItem { name: String, quantity: u32 },
    BuyItem { name: String, quantity: u32 },
    SellItem { name: String, quantity: u32 },
    EquipHand { hand: Hand, key: String },
    UnequipHand(Hand),
    EquipArmor(String),
    UnequipArmor,

    TogglePrepared(String),
    ExpendSlot(u8),

    AddForm(String),
    RemoveForm(String),
    ActivateForm(String),
    RevertForm,
    ToggleCompanion,
    SetCompanionSource(CompanionSource),

    SetInspiration(bool),
    SetNotes(String),
    LongRest { renew_choices: bool },
    Save,
}

/// Result of a successfully applied command.
#[derive(Debug)]
pub struct CommandOutcome {
    /// The freshly-derived state after the mutation.
    pub derived: DerivedCharacterState,
    /// Progression changes surfaced by class/level transitions.
    pub changes: Vec<ProgressionChange>,
    /// Inline, user-correctable statuses (never fatal).
    pub diagnostics: Vec<String>,
    /// The serializable profile, present only for `Save`.
    pub profile: Option<CharacterProfile>,
}

/// Unequip hands whose keys the rebuilt inventory no longer covers, e.g.
/// after switching the starting-equipment option.
fn drop_unstocked_hands(session: &mut CharacterSelections, rules: &RuleRepository) {
    let inventory = loadout::rebuild_inventory(session, rules);
    for hand in [Hand::Left, Hand::Right] {
        if let Some(key) = session.hands.get(hand).map(str::to_string) {
            let stocked: u32 = inventory
                .iter()
                .filter(|item| item.key == key)
                .map(|item| item.quantity)
                .sum();
            if session.hands.count_of(&key) > stocked {
                loadout::unequip_hand(session, rules, hand);
            }
        }
    }
}

/// Apply one command to the session.
pub fn apply(
    session: &mut CharacterSelections,
    rules: &RuleRepository,
    command: Command,
) -> Result<CommandOutcome, CommandError> {
    let mut changes = Vec::new();
    let mut diagnostics = Vec::new();
    let mut profile = None;

    match command {
        Command::SetName(name) => session.name = name,
        Command::SetMethod(method) => abilities::set_method(session, method),
        Command::SetRawScore { ability, value } => {
            abilities::set_raw_score(session, ability, value)
        }
        Command::AssignBonus { slot, ability } => {
            abilities::set_bonus_assignment(session, slot, ability)
        }

        Command::ChooseClass(class_id) => {
            changes = levels::choose_class(session, rules, &class_id)?;
        }
        Command::ChooseSubclass(subclass_id) => {
            let class_id = session
                .class_id
                .as_deref()
                .ok_or_else(|| DomainError::constraint("No class chosen"))?
                .to_string();
            if let Some(subclass) = rules.subclass(&subclass_id) {
                if subclass.class_id != class_id {
                    return Err(DomainError::validation(format!(
                        "{} is not a {} subclass",
                        subclass.name, class_id
                    ))
                    .into());
                }
                if subclass.unlock_level > session.level {
                    diagnostics.push(format!(
                        "{} unlocks at level {}",
                        subclass.name, subclass.unlock_level
                    ));
                }
            }
            session.subclass_id = Some(subclass_id);
        }
        Command::ChooseSpecies(species_id) => {
            if session.species_id.as_deref() != Some(species_id.as_str()) {
                session.lineage_id = None;
            }
            session.species_id = Some(species_id);
            abilities::maybe_autofill(session, rules);
        }
        Command::ChooseLineage(lineage_id) => {
            if let Some(lineage) = rules.lineage(&lineage_id) {
                if session.species_id.as_deref() != Some(lineage.species_id.as_str()) {
                    return Err(DomainError::validation(format!(
                        "{} is not a lineage of the chosen species",
                        lineage.name
                    ))
                    .into());
                }
            }
            session.lineage_id = Some(lineage_id);
        }
        Command::ChooseBackground(background_id) => {
            session.background_id = Some(background_id);
            abilities::maybe_autofill(session, rules);
        }
        Command::SetLevel(level) => {
            changes = levels::set_level(session, rules, level)?;
        }

        Command::ResolveChoice { key, selection } => {
            choices::set_selection(session, rules, key, selection)?;
        }
        Command::PickClassSkill(skill) => choices::pick_class_skill(session, rules, &skill)?,
        Command::RemoveClassSkill(skill) => choices::remove_class_skill(session, &skill),
        Command::PickLanguage(language) => choices::pick_language(session, rules, &language)?,
        Command::RemoveLanguage(language) => choices::remove_language(session, &language),

        Command::SetEquipmentOption(option) => {
            if let Some(class) = session.class_id.as_deref().and_then(|id| rules.class(id)) {
                if option >= class.equipment_options.len() {
                    return Err(DomainError::validation(format!(
                        "{} has no equipment option {}",
                        class.name, option
                    ))
                    .into());
                }
            }
            session.class_equipment_option = option;
            drop_unstocked_hands(session, rules);
        }
        Command::AddItem { name, quantity } => {
            loadout::add_manual_item(session, rules, &name, quantity)
        }
        Command::BuyItem { name, quantity } => {
            loadout::buy_item(session, rules, &name, quantity)?
        }
        Command::SellItem { name, quantity } => {
            loadout::sell_item(session, rules, &name, quantity)?
        }
        Command::EquipHand { hand, key } => loadout::equip_hand(session, rules, hand, &key)?,
        Command::UnequipHand(hand) => loadout::unequip_hand(session, rules, hand),
        Command::EquipArmor(key) => {
            let proficiencies = proficiency::aggregate(session, rules);
            loadout::equip_armor(session, rules, &proficiencies, &key)?;
        }
        Command::UnequipArmor => loadout::unequip_armor(session),

        Command::TogglePrepared(spell_id) => {
            spellcasting::toggle_prepared(session, rules, &spell_id)?;
        }
        Command::ExpendSlot(slot_level) => spellcasting::expend_slot(session, rules, slot_level)?,

        Command::AddForm(creature_id) => wildshape::add_form(session, rules, &creature_id)?,
        Command::RemoveForm(creature_id) => wildshape::remove_form(session, &creature_id),
        Command::ActivateForm(creature_id) => wildshape::activate(session, &creature_id)?,
        Command::RevertForm => wildshape::revert(session),
        Command::ToggleCompanion => {
            wildshape::toggle_companion(session)?;
        }
        Command::SetCompanionSource(source) => wildshape::set_companion_source(session, source),

        Command::SetInspiration(flag) => session.inspiration = flag,
        Command::SetNotes(notes) => session.notes = notes,
        Command::LongRest { renew_choices } => {
            spellcasting::restore_slots(session);
            wildshape::restore_uses(session);
            wildshape::revert(session);
            // Half the hit dice come back, minimum one.
            let regained = (session.level / 2).max(1);
            session.hit_dice_spent = session.hit_dice_spent.saturating_sub(regained);
            let renewed = choices::renew_long_rest(session, rules, renew_choices);
            if renewed > 0 {
                diagnostics.push(format!("{} renewable choice(s) reopened", renewed));
            }
        }
        Command::Save => {
            if choices::has_missing_required_selections(session, rules) {
                return Err(CommandError::IncompleteSelections);
            }
            let status = abilities::validate(session, rules);
            if !status.ok {
                return Err(CommandError::InvalidAbilities(status.message));
            }
            profile = Some(payload::build(session, &derive(session, rules)));
        }
    }

    let derived = derive(session, rules);
    if !derived.ability_status.ok {
        diagnostics.push(derived.ability_status.message.clone());
    }
    if derived.missing_required_selections {
        diagnostics.push("Required selections are unresolved".to_string());
    }
    Ok(CommandOutcome {
        derived,
        changes,
        diagnostics,
        profile,
    })
}
