//! Rule-data ingestion.
//!
//! The single place where free-text catalog fields (proficiency lines,
//! comma-separated feature columns, creature action descriptions, cost and
//! armor-class strings) are translated into structured domain records. The
//! domain core never re-parses text at decision time.

pub mod importer;
pub mod raw;

pub use importer::{CatalogImporter, ImportError, ImportSummary, ImporterConfig};
pub use raw::{
    RawArmor, RawBackground, RawCatalog, RawChoiceOption, RawClass, RawCreature,
    RawEquipmentOption, RawFeatureChoice, RawGear, RawItemLine, RawLineage, RawPack,
    RawProgression, RawSpecies, RawSpell, RawSubclass, RawWeapon,
};
