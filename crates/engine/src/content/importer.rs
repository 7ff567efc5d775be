//! Translation from raw catalog records to structured domain defs.
//!
//! Malformed records degrade: the record is dropped with a `warn`
//! diagnostic and the rest of the import continues. Strict mode turns the
//! first malformed record into an error instead, for use in content tests.

use std::str::FromStr;
use std::sync::OnceLock;

use regex_lite::Regex;

use sheetforge_domain::rules::{
    normalize_key, Ability, ArmorCategory, ArmorDef, ArmorTraining, BackgroundDef,
    ChallengeRating, ChoiceKey, ChoiceOption, ClassDef, CreatureAttack, CreatureDef, DamageDie,
    EquipmentOption, FeatureChoiceDef, GearDef, LineageDef, OptionEffects, PackDef,
    ProgressionRow, RuleRepository, SpeciesDef, SpellDef, SubclassDef, WeaponClass, WeaponDef,
    WeaponTraining,
};

use super::raw::{
    RawArmor, RawBackground, RawCatalog, RawChoiceOption, RawClass, RawCreature,
    RawEquipmentOption, RawFeatureChoice, RawProgression, RawSpell, RawWeapon,
};

static VERSATILE_RE: OnceLock<Regex> = OnceLock::new();
static ARMOR_CLASS_RE: OnceLock<Regex> = OnceLock::new();
static COST_RE: OnceLock<Regex> = OnceLock::new();
static ACTION_RE: OnceLock<Regex> = OnceLock::new();

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("Malformed {kind} record '{name}': {detail}")]
    Malformed {
        kind: &'static str,
        name: String,
        detail: String,
    },
}

/// Ingestion options.
#[derive(Debug, Clone)]
pub struct ImporterConfig {
    /// Fail on the first malformed record instead of dropping it.
    pub strict: bool,
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self { strict: false }
    }
}

/// Counts for one import pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub dropped: usize,
}

/// Translate free-text armor proficiency into structured training.
pub fn parse_armor_training(text: &str) -> ArmorTraining {
    let lower = text.to_lowercase();
    ArmorTraining {
        light: lower.contains("light"),
        medium: lower.contains("medium"),
        heavy: lower.contains("heavy"),
        shields: lower.contains("shield"),
    }
}

/// Translate free-text weapon proficiency into structured training. A
/// clause without a melee/ranged qualifier grants both rows of its tier.
pub fn parse_weapon_training(text: &str) -> WeaponTraining {
    let mut training = WeaponTraining::default();
    for clause in text.to_lowercase().split([',', ';']) {
        let melee = clause.contains("melee");
        let ranged = clause.contains("ranged");
        let (grant_melee, grant_ranged) = if melee || ranged {
            (melee, ranged)
        } else {
            (true, true)
        };
        if clause.contains("simple") {
            training.simple_melee |= grant_melee;
            training.simple_ranged |= grant_ranged;
        }
        if clause.contains("martial") {
            training.martial_melee |= grant_melee;
            training.martial_ranged |= grant_ranged;
        }
    }
    training
}

/// First ability named in the text, by position.
pub fn parse_primary_ability(text: &str) -> Option<Ability> {
    let lower = text.to_lowercase();
    Ability::ALL
        .into_iter()
        .filter_map(|ability| {
            lower
                .find(&ability.name().to_lowercase())
                .map(|idx| (idx, ability))
        })
        .min_by_key(|(idx, _)| *idx)
        .map(|(_, ability)| ability)
}

/// Every ability named in the text, in order of appearance.
pub fn parse_abilities(text: &str) -> Vec<Ability> {
    let lower = text.to_lowercase();
    let mut found: Vec<(usize, Ability)> = Ability::ALL
        .into_iter()
        .filter_map(|ability| {
            lower
                .find(&ability.name().to_lowercase())
                .map(|idx| (idx, ability))
        })
        .collect();
    found.sort_by_key(|(idx, _)| *idx);
    found.into_iter().map(|(_, ability)| ability).collect()
}

/// Split a comma-separated feature column into names.
pub fn split_features(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// Total cost in copper, summing every denomination mentioned. `None` when
/// no denomination is found.
pub fn parse_cost_cp(text: &str) -> Option<i64> {
    let re = COST_RE
        .get_or_init(|| Regex::new(r"(?i)(\d+)\s*(cp|sp|ep|gp|pp)\b").expect("static pattern"));
    let mut total = None;
    for cap in re.captures_iter(text) {
        let amount: i64 = cap[1].parse().ok()?;
        let rate = match cap[2].to_lowercase().as_str() {
            "cp" => 1,
            "sp" => 10,
            "ep" => 50,
            "gp" => 100,
            _ => 1000,
        };
        *total.get_or_insert(0) += amount * rate;
    }
    total
}

/// Parse an armor-class formula: base, whether DEX scales it, and the cap.
pub fn parse_armor_class(text: &str) -> Option<(i32, bool, Option<i32>)> {
    let re = ARMOR_CLASS_RE.get_or_init(|| {
        Regex::new(r"(?i)^\s*(\d+)(\s*\+\s*dex(?:terity)?\s+modifier)?(?:\s*\(max\s+(\d+)\))?")
            .expect("static pattern")
    });
    let cap = re.captures(text)?;
    let base: i32 = cap[1].parse().ok()?;
    let dex_scaling = cap.get(2).is_some();
    let max_dex = cap.get(3).and_then(|m| m.as_str().parse().ok());
    Some((base, dex_scaling, max_dex))
}

fn parse_weapon_class(text: &str) -> Option<WeaponClass> {
    let lower = text.to_lowercase();
    let martial = lower.contains("martial");
    let simple = lower.contains("simple");
    let ranged = lower.contains("ranged");
    match (simple, martial, ranged) {
        (true, false, false) => Some(WeaponClass::SimpleMelee),
        (true, false, true) => Some(WeaponClass::SimpleRanged),
        (false, true, false) => Some(WeaponClass::MartialMelee),
        (false, true, true) => Some(WeaponClass::MartialRanged),
        _ => None,
    }
}

fn parse_armor_category(text: &str) -> Option<ArmorCategory> {
    let lower = text.to_lowercase();
    if lower.contains("shield") {
        Some(ArmorCategory::Shield)
    } else if lower.contains("light") {
        Some(ArmorCategory::Light)
    } else if lower.contains("medium") {
        Some(ArmorCategory::Medium)
    } else if lower.contains("heavy") {
        Some(ArmorCategory::Heavy)
    } else {
        None
    }
}

/// Parse a creature's action text, one action per line. Each attack is an
/// action name followed by a `Hit: (dice) <type> damage` clause; lines that
/// do not match are returned as dropped.
pub fn parse_creature_actions(text: &str) -> (Vec<CreatureAttack>, Vec<String>) {
    let re = ACTION_RE.get_or_init(|| {
        Regex::new(
            r"^([A-Z][A-Za-z' -]*?)\.\s.*?Hit:\s*\(?(\d+[dD]\d+)\)?(?:\s*[+-]\s*\d+)?\s+([A-Za-z]+)\s+damage",
        )
        .expect("static pattern")
    });
    let mut attacks = Vec::new();
    let mut dropped = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        match re.captures(line) {
            Some(cap) => {
                match DamageDie::from_str(&cap[2]) {
                    Ok(damage) => attacks.push(CreatureAttack {
                        name: cap[1].trim().to_string(),
                        damage,
                        damage_type: cap[3].to_lowercase(),
                    }),
                    Err(_) => dropped.push(line.to_string()),
                }
            }
            None => dropped.push(line.to_string()),
        }
    }
    (attacks, dropped)
}

fn equipment_option(raw: &RawEquipmentOption) -> EquipmentOption {
    EquipmentOption {
        label: raw.label.clone(),
        items: raw
            .items
            .iter()
            .map(|line| (line.name.clone(), line.quantity))
            .collect(),
    }
}

/// Translates raw catalogs into the repository.
#[derive(Debug, Default)]
pub struct CatalogImporter {
    config: ImporterConfig,
}

impl CatalogImporter {
    pub fn new(config: ImporterConfig) -> Self {
        Self { config }
    }

    fn drop_record(
        &self,
        summary: &mut ImportSummary,
        kind: &'static str,
        name: &str,
        detail: impl Into<String>,
    ) -> Result<(), ImportError> {
        let detail = detail.into();
        if self.config.strict {
            return Err(ImportError::Malformed {
                kind,
                name: name.to_string(),
                detail,
            });
        }
        tracing::warn!(kind, name, detail = %detail, "Dropping malformed catalog record");
        summary.dropped += 1;
        Ok(())
    }

    fn import_class(&self, raw: &RawClass) -> ClassDef {
        ClassDef {
            id: raw.id.clone(),
            name: raw.name.clone(),
            hit_die: raw.hit_die,
            primary_ability: parse_primary_ability(&raw.primary_ability),
            armor_training: parse_armor_training(&raw.armor_proficiencies),
            weapon_training: parse_weapon_training(&raw.weapon_proficiencies),
            saving_throws: parse_abilities(&raw.saving_throws),
            skill_quota: raw.skill_quota,
            skill_options: raw.skill_options.clone(),
            standard_array: raw.standard_array,
            equipment_options: raw.equipment_options.iter().map(equipment_option).collect(),
            subclass_level: raw.subclass_level,
        }
    }

    fn import_progression(&self, raw: &RawProgression) -> ProgressionRow {
        let mut spell_slots = [0u32; 9];
        for (idx, count) in raw.spell_slots.iter().take(9).enumerate() {
            spell_slots[idx] = *count;
        }
        ProgressionRow {
            class_id: raw.class_id.clone(),
            level: raw.level,
            proficiency_bonus: raw.proficiency_bonus,
            features: split_features(&raw.features),
            cantrips_known: raw.cantrips_known,
            prepared_spells: raw.prepared_spells,
            pact_slots: raw.pact_slots,
            pact_slot_level: raw.pact_slot_level,
            spell_slots,
            max_spell_level: raw.max_spell_level,
            counters: raw.counters.clone(),
        }
    }

    fn import_weapon(&self, raw: &RawWeapon) -> Result<WeaponDef, String> {
        let class = parse_weapon_class(&raw.category)
            .ok_or_else(|| format!("unknown weapon category '{}'", raw.category))?;
        let damage =
            DamageDie::from_str(&raw.damage).map_err(|err| err.to_string())?;
        let properties = raw.properties.to_lowercase();
        let versatile_re = VERSATILE_RE.get_or_init(|| {
            Regex::new(r"(?i)versatile\s*\((\d+[dD]\d+)\)").expect("static pattern")
        });
        let versatile = match versatile_re.captures(&raw.properties) {
            Some(cap) => Some(DamageDie::from_str(&cap[1]).map_err(|err| err.to_string())?),
            None => None,
        };
        Ok(WeaponDef {
            id: normalize_key(&raw.name),
            name: raw.name.clone(),
            class,
            damage,
            damage_type: raw.damage_type.to_lowercase(),
            finesse: properties.contains("finesse"),
            two_handed: properties.contains("two-handed"),
            versatile,
            mastery: raw.mastery.clone(),
            cost_cp: parse_cost_cp(&raw.cost).unwrap_or(0),
        })
    }

    fn import_armor(&self, raw: &RawArmor) -> Result<ArmorDef, String> {
        let category = parse_armor_category(&raw.category)
            .ok_or_else(|| format!("unknown armor category '{}'", raw.category))?;
        let (base_ac, dex_scaling, max_dex_bonus) = parse_armor_class(&raw.armor_class)
            .ok_or_else(|| format!("unparseable armor class '{}'", raw.armor_class))?;
        Ok(ArmorDef {
            id: normalize_key(&raw.name),
            name: raw.name.clone(),
            category,
            base_ac,
            dex_scaling,
            max_dex_bonus,
            cost_cp: parse_cost_cp(&raw.cost).unwrap_or(0),
        })
    }

    fn import_choice_option(&self, raw: &RawChoiceOption) -> ChoiceOption {
        ChoiceOption {
            key: raw.key.clone(),
            name: raw.name.clone(),
            effects: OptionEffects {
                bonus_cantrips: raw.bonus_cantrips,
                armor_training: parse_armor_training(&raw.armor_training),
                weapon_training: parse_weapon_training(&raw.weapon_training),
                extra_saves: parse_abilities(&raw.extra_saves),
                skill_grants: raw.skill_grants.clone(),
                skill_options: raw.skill_options.clone(),
                language_count: raw.language_count,
                mastery_count: raw.mastery_count,
                renewable: raw.renewable,
            },
        }
    }

    fn import_choice(&self, raw: &RawFeatureChoice) -> FeatureChoiceDef {
        FeatureChoiceDef {
            key: ChoiceKey::new(raw.class_id.clone(), raw.level, raw.feature.clone()),
            name: raw.feature.clone(),
            options: raw
                .options
                .iter()
                .map(|option| self.import_choice_option(option))
                .collect(),
        }
    }

    fn import_creature(&self, raw: &RawCreature) -> Result<CreatureDef, String> {
        let challenge =
            ChallengeRating::from_str(&raw.challenge).map_err(|err| err.to_string())?;
        let (attacks, dropped) = parse_creature_actions(&raw.actions);
        for line in dropped {
            tracing::warn!(
                creature = %raw.name,
                line = %line,
                "Dropping unparseable creature action"
            );
        }
        Ok(CreatureDef {
            id: normalize_key(&raw.name),
            name: raw.name.clone(),
            creature_type: raw.creature_type.to_lowercase(),
            challenge,
            flying: raw.speed.to_lowercase().contains("fly"),
            attacks,
        })
    }

    fn import_background(&self, raw: &RawBackground) -> BackgroundDef {
        BackgroundDef {
            id: raw.id.clone(),
            name: raw.name.clone(),
            skill_grants: raw.skills.clone(),
            equipment: equipment_option(&raw.equipment),
            bonus_abilities: parse_abilities(&raw.bonus_abilities),
            language_quota: raw.languages,
        }
    }

    /// Translate a per-class spell catalog.
    pub fn import_spells(&self, raw: Vec<RawSpell>) -> Vec<SpellDef> {
        raw.into_iter()
            .map(|spell| SpellDef::new(normalize_key(&spell.name), spell.name, spell.level))
            .collect()
    }

    /// Translate the full catalog into the repository. Malformed records are
    /// dropped with a diagnostic (or fail the pass in strict mode); the
    /// repository keeps whatever imported cleanly.
    pub fn import_into(
        &self,
        repo: &mut RuleRepository,
        raw: RawCatalog,
    ) -> Result<ImportSummary, ImportError> {
        let mut summary = ImportSummary::default();

        for class in &raw.classes {
            repo.insert_class(self.import_class(class));
            summary.imported += 1;
        }
        for row in &raw.progressions {
            repo.insert_progression(self.import_progression(row));
            summary.imported += 1;
        }
        for subclass in &raw.subclasses {
            repo.insert_subclass(SubclassDef {
                id: subclass.id.clone(),
                class_id: subclass.class_id.clone(),
                name: subclass.name.clone(),
                unlock_level: subclass.unlock_level,
                features_by_level: subclass.features_by_level.clone(),
            });
            summary.imported += 1;
        }
        for background in &raw.backgrounds {
            repo.insert_background(self.import_background(background));
            summary.imported += 1;
        }
        for species in &raw.species {
            repo.insert_species(SpeciesDef {
                id: species.id.clone(),
                name: species.name.clone(),
                requires_lineage: species.requires_lineage,
                languages: species.languages.clone(),
            });
            summary.imported += 1;
        }
        for lineage in &raw.lineages {
            repo.insert_lineage(LineageDef {
                id: lineage.id.clone(),
                species_id: lineage.species_id.clone(),
                name: lineage.name.clone(),
            });
            summary.imported += 1;
        }
        for weapon in &raw.weapons {
            match self.import_weapon(weapon) {
                Ok(def) => {
                    repo.insert_weapon(def);
                    summary.imported += 1;
                }
                Err(detail) => self.drop_record(&mut summary, "weapon", &weapon.name, detail)?,
            }
        }
        for armor in &raw.armors {
            match self.import_armor(armor) {
                Ok(def) => {
                    repo.insert_armor(def);
                    summary.imported += 1;
                }
                Err(detail) => self.drop_record(&mut summary, "armor", &armor.name, detail)?,
            }
        }
        for gear in &raw.gear {
            repo.insert_gear(GearDef {
                id: normalize_key(&gear.name),
                name: gear.name.clone(),
                cost_cp: parse_cost_cp(&gear.cost).unwrap_or(0),
            });
            summary.imported += 1;
        }
        for pack in &raw.packs {
            repo.insert_pack(PackDef {
                id: normalize_key(&pack.name),
                name: pack.name.clone(),
                cost_cp: parse_cost_cp(&pack.cost).unwrap_or(0),
                contents: pack
                    .contents
                    .iter()
                    .map(|line| (line.name.clone(), line.quantity))
                    .collect(),
            });
            summary.imported += 1;
        }
        for choice in &raw.choices {
            repo.insert_choice(self.import_choice(choice));
            summary.imported += 1;
        }
        if !raw.languages.is_empty() {
            repo.set_languages(raw.languages.clone());
        }
        for creature in &raw.creatures {
            match self.import_creature(creature) {
                Ok(def) => {
                    repo.insert_creature(def);
                    summary.imported += 1;
                }
                Err(detail) => {
                    self.drop_record(&mut summary, "creature", &creature.name, detail)?
                }
            }
        }

        tracing::info!(
            imported = summary.imported,
            dropped = summary.dropped,
            "Catalog import finished"
        );
        Ok(summary)
    }
}
