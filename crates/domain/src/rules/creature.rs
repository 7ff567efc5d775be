//! Creature reference records used by the shapeshifting resource.
//!
//! Attack rows arrive pre-parsed from the ingestion layer; the core never
//! touches the source's free-text action descriptions.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

use super::equipment::DamageDie;

/// Challenge rating, stored in eighths so that fractional ratings (1/8, 1/4,
/// 1/2) stay exact and ordered.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct ChallengeRating(u16);

impl ChallengeRating {
    pub const ZERO: ChallengeRating = ChallengeRating(0);

    pub fn from_eighths(eighths: u16) -> Self {
        Self(eighths)
    }

    pub fn from_whole(rating: u16) -> Self {
        Self(rating * 8)
    }

    pub fn as_eighths(self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for ChallengeRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            1 => write!(f, "1/8"),
            2 => write!(f, "1/4"),
            4 => write!(f, "1/2"),
            n if n % 8 == 0 => write!(f, "{}", n / 8),
            n => write!(f, "{}/8", n),
        }
    }
}

impl std::str::FromStr for ChallengeRating {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Some((num, den)) = trimmed.split_once('/') {
            let num: u16 = num
                .trim()
                .parse()
                .map_err(|_| DomainError::parse(format!("Invalid challenge rating: {}", s)))?;
            let den: u16 = den
                .trim()
                .parse()
                .map_err(|_| DomainError::parse(format!("Invalid challenge rating: {}", s)))?;
            if den == 0 || 8 % den != 0 {
                return Err(DomainError::parse(format!(
                    "Invalid challenge rating: {}",
                    s
                )));
            }
            Ok(Self(num * (8 / den)))
        } else {
            let whole: u16 = trimmed
                .parse()
                .map_err(|_| DomainError::parse(format!("Invalid challenge rating: {}", s)))?;
            Ok(Self::from_whole(whole))
        }
    }
}

/// A structured attack row parsed from a creature's action text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureAttack {
    pub name: String,
    pub damage: DamageDie,
    pub damage_type: String,
}

/// A creature reference record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatureDef {
    pub id: String,
    pub name: String,
    /// Creature type used by the form filter (e.g. "beast").
    pub creature_type: String,
    pub challenge: ChallengeRating,
    pub flying: bool,
    pub attacks: Vec<CreatureAttack>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn challenge_rating_fractions_round_trip() {
        for text in ["1/8", "1/4", "1/2", "1", "6"] {
            let rating = ChallengeRating::from_str(text).expect("parses");
            assert_eq!(rating.to_string(), text);
        }
    }

    #[test]
    fn challenge_rating_orders_fractions_below_whole() {
        let quarter = ChallengeRating::from_str("1/4").expect("parses");
        let half = ChallengeRating::from_str("1/2").expect("parses");
        let one = ChallengeRating::from_whole(1);
        assert!(quarter < half);
        assert!(half < one);
    }

    #[test]
    fn challenge_rating_rejects_garbage() {
        assert!(ChallengeRating::from_str("1/3").is_err());
        assert!(ChallengeRating::from_str("fast").is_err());
    }
}
