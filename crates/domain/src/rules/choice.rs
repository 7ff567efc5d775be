//! Feature-choice reference records: class/level-gated decision points and
//! the typed effects their options carry.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::ability::Ability;
use super::equipment::{ArmorTraining, WeaponTraining};

/// Key of a feature choice: `(class_id, level, feature)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChoiceKey {
    pub class_id: String,
    pub level: u8,
    pub feature: String,
}

impl ChoiceKey {
    pub fn new(class_id: impl Into<String>, level: u8, feature: impl Into<String>) -> Self {
        Self {
            class_id: class_id.into(),
            level,
            feature: feature.into(),
        }
    }
}

impl std::fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.class_id, self.level, self.feature)
    }
}

impl std::str::FromStr for ChoiceKey {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.splitn(3, ':');
        let (Some(class_id), Some(level), Some(feature)) =
            (parts.next(), parts.next(), parts.next())
        else {
            return Err(DomainError::parse(format!("Invalid choice key: {}", s)));
        };
        let level: u8 = level
            .parse()
            .map_err(|_| DomainError::parse(format!("Invalid choice key level: {}", s)))?;
        Ok(Self::new(class_id, level, feature))
    }
}

/// The typed effect set an option grants once chosen.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptionEffects {
    /// Extra prepared cantrips on top of the progression row's count.
    pub bonus_cantrips: u32,
    pub armor_training: ArmorTraining,
    pub weapon_training: WeaponTraining,
    /// Extra saving-throw proficiencies (the named two-save special case).
    pub extra_saves: Vec<Ability>,
    /// Skills granted outright.
    pub skill_grants: Vec<String>,
    /// When non-empty, the selection must pick exactly one skill from here.
    pub skill_options: Vec<String>,
    /// Number of distinct languages the selection must pick.
    pub language_count: u32,
    /// Number of distinct weapon-mastery picks drawn from the trained
    /// weapon catalog.
    pub mastery_count: u32,
    /// Whether the choice may be re-offered after a long rest.
    pub renewable: bool,
}

impl OptionEffects {
    /// Whether choosing this option demands further nested sub-selections.
    pub fn requires_sub_picks(&self) -> bool {
        !self.skill_options.is_empty() || self.language_count > 0 || self.mastery_count > 0
    }
}

/// One selectable option of a feature choice.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub key: String,
    pub name: String,
    pub effects: OptionEffects,
}

/// A feature-choice decision point.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureChoiceDef {
    pub key: ChoiceKey,
    pub name: String,
    pub options: Vec<ChoiceOption>,
}

impl FeatureChoiceDef {
    pub fn option(&self, key: &str) -> Option<&ChoiceOption> {
        self.options.iter().find(|option| option.key == key)
    }

    /// A single-option choice resolves without an explicit pick.
    pub fn auto_resolves(&self) -> bool {
        self.options.len() == 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn choice_key_round_trips() {
        let key = ChoiceKey::new("druid", 1, "Primal Order");
        let encoded = key.to_string();
        assert_eq!(encoded, "druid:1:Primal Order");
        assert_eq!(ChoiceKey::from_str(&encoded), Ok(key));
    }

    #[test]
    fn choice_key_feature_may_contain_colons() {
        let key = ChoiceKey::from_str("warlock:3:Pact Boon: Blade").expect("parses");
        assert_eq!(key.feature, "Pact Boon: Blade");
    }

    #[test]
    fn choice_key_rejects_short_input() {
        assert!(ChoiceKey::from_str("druid:1").is_err());
        assert!(ChoiceKey::from_str("druid:one:Order").is_err());
    }

    #[test]
    fn effects_without_sub_picks() {
        let effects = OptionEffects {
            bonus_cantrips: 1,
            ..Default::default()
        };
        assert!(!effects.requires_sub_picks());
    }

    #[test]
    fn effects_with_language_count_require_sub_picks() {
        let effects = OptionEffects {
            language_count: 2,
            ..Default::default()
        };
        assert!(effects.requires_sub_picks());
    }
}
