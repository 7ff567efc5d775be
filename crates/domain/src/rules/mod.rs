//! Immutable rule-data reference records and the repository that serves
//! them.

pub mod ability;
pub mod choice;
pub mod class;
pub mod creature;
pub mod equipment;
pub mod origin;
pub mod repository;
pub mod spell;
pub mod tables;

pub use ability::{ability_modifier, Ability};
pub use choice::{ChoiceKey, ChoiceOption, FeatureChoiceDef, OptionEffects};
pub use class::{ClassDef, EquipmentOption, ProgressionRow, SubclassDef};
pub use creature::{ChallengeRating, CreatureAttack, CreatureDef};
pub use equipment::{
    ArmorCategory, ArmorDef, ArmorTraining, DamageDie, DiceParseError, GearDef, ItemCategory,
    PackDef, WeaponClass, WeaponDef, WeaponTraining,
};
pub use origin::{BackgroundDef, LineageDef, SpeciesDef};
pub use repository::{normalize_key, strip_alias, EquipmentRef, RuleRepository};
pub use spell::SpellDef;
pub use tables::{
    fallback_standard_array, point_buy_cost, proficiency_bonus, DEFAULT_STANDARD_ARRAY,
    POINT_BUY_BUDGET, POINT_BUY_RANGE,
};
