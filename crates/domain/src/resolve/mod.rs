//! Resolvers that turn raw selections into legal, derived character state.
//!
//! Each module owns one concern; [`derived::derive`] runs them in
//! dependency order so callers never observe a partial recomputation.

pub mod abilities;
pub mod choices;
pub mod derived;
pub mod levels;
pub mod loadout;
pub mod proficiency;
pub mod spellcasting;
pub mod wildshape;

pub use derived::{derive, DerivedCharacterState};
