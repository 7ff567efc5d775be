//! The six abilities and score math shared by every resolver.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// One of the six core abilities.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Str,
    Dex,
    Con,
    Int,
    Wis,
    Cha,
}

impl Ability {
    /// All abilities in canonical sheet order.
    pub const ALL: [Ability; 6] = [
        Ability::Str,
        Ability::Dex,
        Ability::Con,
        Ability::Int,
        Ability::Wis,
        Ability::Cha,
    ];

    pub fn abbrev(self) -> &'static str {
        match self {
            Self::Str => "STR",
            Self::Dex => "DEX",
            Self::Con => "CON",
            Self::Int => "INT",
            Self::Wis => "WIS",
            Self::Cha => "CHA",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Str => "Strength",
            Self::Dex => "Dexterity",
            Self::Con => "Constitution",
            Self::Int => "Intelligence",
            Self::Wis => "Wisdom",
            Self::Cha => "Charisma",
        }
    }
}

impl std::fmt::Display for Ability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.abbrev())
    }
}

impl std::str::FromStr for Ability {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "str" | "strength" => Ok(Self::Str),
            "dex" | "dexterity" => Ok(Self::Dex),
            "con" | "constitution" => Ok(Self::Con),
            "int" | "intelligence" => Ok(Self::Int),
            "wis" | "wisdom" => Ok(Self::Wis),
            "cha" | "charisma" => Ok(Self::Cha),
            other => Err(DomainError::parse(format!("Unknown ability: {}", other))),
        }
    }
}

/// Modifier for an ability score.
///
/// Uses floor division: floor((score - 10) / 2). Rust's `/` rounds toward
/// zero, which is wrong for scores below 10.
pub fn ability_modifier(score: i32) -> i32 {
    let diff = score - 10;
    if diff >= 0 {
        diff / 2
    } else {
        (diff - 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn ability_modifier_calculation() {
        assert_eq!(ability_modifier(1), -5);
        assert_eq!(ability_modifier(8), -1);
        assert_eq!(ability_modifier(10), 0);
        assert_eq!(ability_modifier(11), 0);
        assert_eq!(ability_modifier(12), 1);
        assert_eq!(ability_modifier(15), 2);
        assert_eq!(ability_modifier(18), 4);
        assert_eq!(ability_modifier(20), 5);
    }

    #[test]
    fn parses_full_names_and_abbreviations() {
        assert_eq!(Ability::from_str("Wisdom"), Ok(Ability::Wis));
        assert_eq!(Ability::from_str("dex"), Ok(Ability::Dex));
        assert!(Ability::from_str("luck").is_err());
    }

    #[test]
    fn canonical_order_is_stable() {
        assert_eq!(Ability::ALL[0], Ability::Str);
        assert_eq!(Ability::ALL[5], Ability::Cha);
    }
}
