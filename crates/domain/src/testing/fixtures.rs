//! A small but complete rule catalog and fully-resolved sessions.
//!
//! The catalog covers two classes end to end: a caster with the
//! shapeshifting resource (druid) and a martial with mastery picks
//! (fighter), plus enough equipment, creatures, and spells to exercise
//! every resolver.

use std::collections::BTreeMap;
use std::str::FromStr;

use crate::resolve::{choices, levels};
use crate::rules::{
    ArmorCategory, ArmorDef, ArmorTraining, BackgroundDef, ChallengeRating, ChoiceKey,
    ChoiceOption, ClassDef, CreatureAttack, CreatureDef, DamageDie, EquipmentOption,
    FeatureChoiceDef, GearDef, LineageDef, OptionEffects, PackDef, ProgressionRow,
    RuleRepository, SpeciesDef, SpellDef, SubclassDef, WeaponClass, WeaponDef, WeaponTraining,
};
use crate::rules::Ability;
use crate::session::{BonusSlot, CharacterSelections, Selection};

fn weapon(
    id: &str,
    class: WeaponClass,
    damage: &str,
    damage_type: &str,
    mastery: &str,
    cost_cp: i64,
) -> WeaponDef {
    WeaponDef {
        id: id.to_string(),
        name: title_case(id),
        class,
        damage: DamageDie::from_str(damage).expect("fixture dice"),
        damage_type: damage_type.to_string(),
        finesse: false,
        two_handed: false,
        versatile: None,
        mastery: Some(mastery.to_string()),
        cost_cp,
    }
}

fn title_case(id: &str) -> String {
    id.split(['-', ' '])
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn beast(id: &str, challenge: &str, flying: bool, attacks: Vec<CreatureAttack>) -> CreatureDef {
    CreatureDef {
        id: id.to_string(),
        name: title_case(id),
        creature_type: "beast".to_string(),
        challenge: ChallengeRating::from_str(challenge).expect("fixture rating"),
        flying,
        attacks,
    }
}

fn attack(name: &str, damage: &str, damage_type: &str) -> CreatureAttack {
    CreatureAttack {
        name: name.to_string(),
        damage: DamageDie::from_str(damage).expect("fixture dice"),
        damage_type: damage_type.to_string(),
    }
}

fn druid_row(level: u8) -> ProgressionRow {
    let mut row = ProgressionRow {
        class_id: "druid".to_string(),
        level,
        proficiency_bonus: crate::rules::proficiency_bonus(level),
        ..Default::default()
    };
    row.features = match level {
        1 => vec![
            "Spellcasting".into(),
            "Druidic".into(),
            "Primal Order".into(),
        ],
        2 => vec!["Wild Shape".into(), "Wild Companion".into()],
        3 => vec!["Druid Subclass".into()],
        4 => vec!["Ability Score Improvement".into()],
        5 => vec!["Wild Resurgence".into()],
        7 => vec!["Elemental Fury".into()],
        8 => vec!["Ability Score Improvement".into()],
        _ => Vec::new(),
    };
    row.cantrips_known = Some(match level {
        1..=3 => 2,
        4..=9 => 3,
        _ => 4,
    });
    row.prepared_spells = Some(match level {
        1 => 4,
        2 => 5,
        3 => 6,
        4 => 7,
        5 => 9,
        6 => 10,
        7 => 11,
        8 => 12,
        _ => 14,
    });
    row.spell_slots = match level {
        1 => [2, 0, 0, 0, 0, 0, 0, 0, 0],
        2 => [3, 0, 0, 0, 0, 0, 0, 0, 0],
        3 => [4, 2, 0, 0, 0, 0, 0, 0, 0],
        4 => [4, 3, 0, 0, 0, 0, 0, 0, 0],
        5 => [4, 3, 2, 0, 0, 0, 0, 0, 0],
        6 => [4, 3, 3, 0, 0, 0, 0, 0, 0],
        7 => [4, 3, 3, 1, 0, 0, 0, 0, 0],
        _ => [4, 3, 3, 2, 0, 0, 0, 0, 0],
    };
    if level >= 2 {
        let tier = crate::resolve::wildshape::tier_for(level).expect("tier above threshold");
        row.counters
            .insert("wild shape uses".to_string(), tier.uses as i64);
    }
    row
}

fn fighter_row(level: u8) -> ProgressionRow {
    let mut row = ProgressionRow {
        class_id: "fighter".to_string(),
        level,
        proficiency_bonus: crate::rules::proficiency_bonus(level),
        ..Default::default()
    };
    row.features = match level {
        1 => vec![
            "Fighting Style".into(),
            "Second Wind".into(),
            "Weapon Mastery".into(),
        ],
        2 => vec!["Action Surge".into(), "Veteran Grit".into()],
        3 => vec!["Fighter Subclass".into()],
        _ => Vec::new(),
    };
    row.counters.insert(
        "second wind uses".to_string(),
        match level {
            1 => 2,
            2..=3 => 3,
            _ => 4,
        },
    );
    row
}

/// Build the full sample catalog.
pub fn sample_rules() -> RuleRepository {
    let mut repo = RuleRepository::new();

    repo.insert_class(ClassDef {
        id: "druid".into(),
        name: "Druid".into(),
        hit_die: 8,
        primary_ability: Some(Ability::Wis),
        armor_training: ArmorTraining {
            light: true,
            shields: true,
            ..Default::default()
        },
        weapon_training: WeaponTraining {
            simple_melee: true,
            simple_ranged: true,
            ..Default::default()
        },
        saving_throws: vec![Ability::Int, Ability::Wis],
        skill_quota: 2,
        skill_options: vec![
            "Arcana".into(),
            "Animal Handling".into(),
            "Insight".into(),
            "Medicine".into(),
            "Nature".into(),
            "Perception".into(),
            "Religion".into(),
            "Survival".into(),
        ],
        standard_array: None,
        equipment_options: vec![
            EquipmentOption {
                label: "A".into(),
                items: vec![
                    ("Leather Armor".into(), 1),
                    ("Shield".into(), 1),
                    ("Scimitar (weapon)".into(), 1),
                    ("Explorer's Pack".into(), 1),
                ],
            },
            EquipmentOption {
                label: "B".into(),
                items: vec![("Quarterstaff".into(), 1), ("Backpack".into(), 1)],
            },
        ],
        subclass_level: Some(3),
    });
    for level in 1..=20 {
        repo.insert_progression(druid_row(level));
    }

    repo.insert_class(ClassDef {
        id: "fighter".into(),
        name: "Fighter".into(),
        hit_die: 10,
        primary_ability: Some(Ability::Str),
        armor_training: ArmorTraining {
            light: true,
            medium: true,
            heavy: true,
            shields: true,
        },
        weapon_training: WeaponTraining {
            simple_melee: true,
            simple_ranged: true,
            martial_melee: true,
            martial_ranged: true,
        },
        saving_throws: vec![Ability::Str, Ability::Con],
        skill_quota: 2,
        skill_options: vec![
            "Acrobatics".into(),
            "Animal Handling".into(),
            "Athletics".into(),
            "History".into(),
            "Insight".into(),
            "Intimidation".into(),
            "Perception".into(),
            "Survival".into(),
        ],
        standard_array: None,
        equipment_options: vec![
            EquipmentOption {
                label: "A".into(),
                items: vec![
                    ("Chain Mail".into(), 1),
                    ("Greatsword".into(), 1),
                    ("Longsword".into(), 1),
                    ("Longbow".into(), 1),
                ],
            },
            EquipmentOption {
                label: "B".into(),
                items: vec![("Leather Armor".into(), 1), ("Longbow".into(), 1)],
            },
        ],
        subclass_level: Some(3),
    });
    for level in 1..=3 {
        repo.insert_progression(fighter_row(level));
    }

    repo.insert_subclass(SubclassDef {
        id: "circle-of-the-land".into(),
        class_id: "druid".into(),
        name: "Circle of the Land".into(),
        unlock_level: 3,
        features_by_level: BTreeMap::from([
            (3, vec!["Circle Spells".into(), "Land's Aid".into()]),
            (6, vec!["Natural Recovery".into()]),
        ]),
    });

    repo.insert_background(BackgroundDef {
        id: "sage".into(),
        name: "Sage".into(),
        skill_grants: vec!["Arcana".into(), "History".into()],
        equipment: EquipmentOption {
            label: "Sage".into(),
            items: vec![("Quarterstaff".into(), 1), ("Book".into(), 1)],
        },
        bonus_abilities: vec![Ability::Con, Ability::Int, Ability::Wis],
        language_quota: 1,
    });
    repo.insert_background(BackgroundDef {
        id: "soldier".into(),
        name: "Soldier".into(),
        skill_grants: vec!["Athletics".into(), "Intimidation".into()],
        equipment: EquipmentOption {
            label: "Soldier".into(),
            items: vec![("Torch".into(), 2)],
        },
        bonus_abilities: vec![Ability::Str, Ability::Dex, Ability::Con],
        language_quota: 0,
    });

    repo.insert_species(SpeciesDef {
        id: "elf".into(),
        name: "Elf".into(),
        requires_lineage: true,
        languages: vec!["Common".into(), "Elvish".into()],
    });
    repo.insert_species(SpeciesDef {
        id: "human".into(),
        name: "Human".into(),
        requires_lineage: false,
        languages: vec!["Common".into()],
    });
    repo.insert_lineage(LineageDef {
        id: "high-elf".into(),
        species_id: "elf".into(),
        name: "High Elf".into(),
    });

    repo.insert_weapon(WeaponDef {
        finesse: true,
        ..weapon("scimitar", WeaponClass::MartialMelee, "1d6", "slashing", "Nick", 2500)
    });
    repo.insert_weapon(WeaponDef {
        versatile: Some(DamageDie::new(1, 8)),
        ..weapon(
            "quarterstaff",
            WeaponClass::SimpleMelee,
            "1d6",
            "bludgeoning",
            "Topple",
            20,
        )
    });
    repo.insert_weapon(WeaponDef {
        two_handed: true,
        ..weapon("greatsword", WeaponClass::MartialMelee, "2d6", "slashing", "Graze", 5000)
    });
    repo.insert_weapon(WeaponDef {
        versatile: Some(DamageDie::new(1, 10)),
        ..weapon("longsword", WeaponClass::MartialMelee, "1d8", "slashing", "Sap", 1500)
    });
    repo.insert_weapon(WeaponDef {
        two_handed: true,
        ..weapon("longbow", WeaponClass::MartialRanged, "1d8", "piercing", "Slow", 5000)
    });

    repo.insert_armor(ArmorDef {
        id: "leather armor".into(),
        name: "Leather Armor".into(),
        category: ArmorCategory::Light,
        base_ac: 11,
        dex_scaling: true,
        max_dex_bonus: None,
        cost_cp: 1000,
    });
    repo.insert_armor(ArmorDef {
        id: "scale mail".into(),
        name: "Scale Mail".into(),
        category: ArmorCategory::Medium,
        base_ac: 14,
        dex_scaling: true,
        max_dex_bonus: Some(2),
        cost_cp: 5000,
    });
    repo.insert_armor(ArmorDef {
        id: "chain mail".into(),
        name: "Chain Mail".into(),
        category: ArmorCategory::Heavy,
        base_ac: 16,
        dex_scaling: false,
        max_dex_bonus: None,
        cost_cp: 7500,
    });
    repo.insert_armor(ArmorDef {
        id: "shield".into(),
        name: "Shield".into(),
        category: ArmorCategory::Shield,
        base_ac: 2,
        dex_scaling: false,
        max_dex_bonus: None,
        cost_cp: 1000,
    });

    for (id, cost_cp) in [("rations", 50), ("torch", 1), ("backpack", 200), ("book", 2500)] {
        repo.insert_gear(GearDef {
            id: id.into(),
            name: title_case(id),
            cost_cp,
        });
    }
    repo.insert_pack(PackDef {
        id: "explorer's pack".into(),
        name: "Explorer's Pack".into(),
        cost_cp: 1000,
        contents: vec![
            ("Rations".into(), 10),
            ("Torch".into(), 10),
            ("Backpack".into(), 1),
        ],
    });

    repo.insert_choice(FeatureChoiceDef {
        key: ChoiceKey::new("druid", 1, "Primal Order"),
        name: "Primal Order".into(),
        options: vec![
            ChoiceOption {
                key: "magician".into(),
                name: "Magician".into(),
                effects: OptionEffects {
                    bonus_cantrips: 1,
                    skill_options: vec!["Arcana".into(), "Nature".into()],
                    ..Default::default()
                },
            },
            ChoiceOption {
                key: "warden".into(),
                name: "Warden".into(),
                effects: OptionEffects {
                    armor_training: ArmorTraining {
                        medium: true,
                        ..Default::default()
                    },
                    weapon_training: WeaponTraining {
                        martial_melee: true,
                        martial_ranged: true,
                        ..Default::default()
                    },
                    ..Default::default()
                },
            },
        ],
    });
    repo.insert_choice(FeatureChoiceDef {
        key: ChoiceKey::new("druid", 2, "Wild Companion"),
        name: "Wild Companion".into(),
        options: vec![
            ChoiceOption {
                key: "beast-bond".into(),
                name: "Beast Bond".into(),
                effects: OptionEffects {
                    renewable: true,
                    ..Default::default()
                },
            },
            ChoiceOption {
                key: "fey-spirit".into(),
                name: "Fey Spirit".into(),
                effects: OptionEffects {
                    renewable: true,
                    ..Default::default()
                },
            },
        ],
    });
    repo.insert_choice(FeatureChoiceDef {
        key: ChoiceKey::new("fighter", 1, "Fighting Style"),
        name: "Fighting Style".into(),
        options: vec![
            ChoiceOption {
                key: "defense".into(),
                name: "Defense".into(),
                effects: OptionEffects::default(),
            },
            ChoiceOption {
                key: "archery".into(),
                name: "Archery".into(),
                effects: OptionEffects::default(),
            },
        ],
    });
    repo.insert_choice(FeatureChoiceDef {
        key: ChoiceKey::new("fighter", 1, "Weapon Mastery"),
        name: "Weapon Mastery".into(),
        options: vec![ChoiceOption {
            key: "masteries".into(),
            name: "Weapon Masteries".into(),
            effects: OptionEffects {
                mastery_count: 2,
                ..Default::default()
            },
        }],
    });
    repo.insert_choice(FeatureChoiceDef {
        key: ChoiceKey::new("fighter", 2, "Veteran Grit"),
        name: "Veteran Grit".into(),
        options: vec![ChoiceOption {
            key: "veteran-grit".into(),
            name: "Veteran Grit".into(),
            effects: OptionEffects {
                extra_saves: vec![Ability::Dex, Ability::Wis],
                ..Default::default()
            },
        }],
    });

    repo.set_languages(vec![
        "Common".into(),
        "Draconic".into(),
        "Dwarvish".into(),
        "Elvish".into(),
        "Giant".into(),
        "Sylvan".into(),
    ]);

    repo.insert_creature(beast(
        "wolf",
        "1/4",
        false,
        vec![attack("Bite", "2d4", "piercing")],
    ));
    repo.insert_creature(beast(
        "panther",
        "1/4",
        false,
        vec![attack("Claw", "1d6", "slashing")],
    ));
    repo.insert_creature(beast("boar", "1/4", false, vec![attack("Tusk", "1d6", "slashing")]));
    repo.insert_creature(beast("rat", "0", false, vec![attack("Bite", "1d4", "piercing")]));
    repo.insert_creature(beast("owl", "0", true, vec![attack("Talons", "1d4", "slashing")]));
    repo.insert_creature(beast(
        "brown-bear",
        "1",
        false,
        vec![
            attack("Bite", "1d8", "piercing"),
            attack("Claws", "2d6", "slashing"),
        ],
    ));
    repo.insert_creature(beast(
        "giant-eagle",
        "1",
        true,
        vec![attack("Talons", "2d6", "slashing")],
    ));
    repo.insert_creature(CreatureDef {
        id: "imp".into(),
        name: "Imp".into(),
        creature_type: "fiend".into(),
        challenge: ChallengeRating::from_whole(1),
        flying: true,
        attacks: vec![attack("Sting", "1d4", "piercing")],
    });

    repo.set_class_spells(
        "druid",
        vec![
            SpellDef::new("druidcraft", "Druidcraft", 0),
            SpellDef::new("guidance", "Guidance", 0),
            SpellDef::new("produce-flame", "Produce Flame", 0),
            SpellDef::new("starry-wisp", "Starry Wisp", 0),
            SpellDef::new("cure-wounds", "Cure Wounds", 1),
            SpellDef::new("entangle", "Entangle", 1),
            SpellDef::new("moonbeam", "Moonbeam", 2),
        ],
    );

    repo
}

/// A fully-resolved druid at the given level: elf sage with the Magician
/// order, class skills picked, and the language quota met.
pub fn druid_session(rules: &RuleRepository, level: u8) -> CharacterSelections {
    let mut session = CharacterSelections::new().with_name("Melora");
    session.species_id = Some("elf".into());
    session.lineage_id = Some("high-elf".into());
    session.background_id = Some("sage".into());
    session
        .bonus_assignments
        .insert(BonusSlot::Primary, Ability::Wis);
    session
        .bonus_assignments
        .insert(BonusSlot::Secondary, Ability::Con);

    levels::choose_class(&mut session, rules, "druid").expect("druid exists");
    choices::set_selection(
        &mut session,
        rules,
        ChoiceKey::new("druid", 1, "Primal Order"),
        Selection {
            option: "magician".into(),
            skill: Some("Nature".into()),
            ..Default::default()
        },
    )
    .expect("magician with a skill pick");
    choices::pick_class_skill(&mut session, rules, "Perception").expect("class skill");
    choices::pick_class_skill(&mut session, rules, "Survival").expect("class skill");
    choices::pick_language(&mut session, rules, "Draconic").expect("language");

    if level > 1 {
        levels::set_level(&mut session, rules, level).expect("complete at level 1");
    }
    if level >= 2 {
        choices::set_selection(
            &mut session,
            rules,
            ChoiceKey::new("druid", 2, "Wild Companion"),
            Selection::of("fey-spirit"),
        )
        .expect("companion pick");
    }
    if level >= 3 {
        session.subclass_id = Some("circle-of-the-land".into());
    }
    session
}

/// A fully-resolved fighter: human soldier with Defense and two mastery
/// picks.
pub fn fighter_session(rules: &RuleRepository, level: u8) -> CharacterSelections {
    let mut session = CharacterSelections::new().with_name("Brant");
    session.species_id = Some("human".into());
    session.background_id = Some("soldier".into());
    session
        .bonus_assignments
        .insert(BonusSlot::Primary, Ability::Str);
    session
        .bonus_assignments
        .insert(BonusSlot::Secondary, Ability::Con);

    levels::choose_class(&mut session, rules, "fighter").expect("fighter exists");
    choices::set_selection(
        &mut session,
        rules,
        ChoiceKey::new("fighter", 1, "Fighting Style"),
        Selection::of("defense"),
    )
    .expect("fighting style");
    let mut masteries = Selection::of("masteries");
    masteries.masteries = vec!["greatsword".into(), "longbow".into()];
    choices::set_selection(
        &mut session,
        rules,
        ChoiceKey::new("fighter", 1, "Weapon Mastery"),
        masteries,
    )
    .expect("mastery picks");
    choices::pick_class_skill(&mut session, rules, "Acrobatics").expect("class skill");
    choices::pick_class_skill(&mut session, rules, "Perception").expect("class skill");

    if level > 1 {
        levels::set_level(&mut session, rules, level).expect("complete at level 1");
    }
    session
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_sessions_start_complete() {
        let rules = sample_rules();
        let druid = druid_session(&rules, 1);
        assert!(!choices::has_missing_required_selections(&druid, &rules));
        let fighter = fighter_session(&rules, 2);
        assert!(!choices::has_missing_required_selections(&fighter, &rules));
    }
}
