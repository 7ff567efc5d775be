//! Sheetforge domain: the character-build rules core.
//!
//! Pure rules, invariants, and derived state. No I/O, no async, no logging;
//! the engine crate owns ingestion, command dispatch, and the async rule
//! data ports.

extern crate self as sheetforge_domain;

pub mod error;
pub mod ids;
pub mod payload;
pub mod resolve;
pub mod rules;
pub mod session;
pub mod testing;

pub use error::DomainError;
pub use ids::CharacterId;
pub use payload::CharacterProfile;
pub use resolve::{derive, DerivedCharacterState};
pub use rules::RuleRepository;
pub use session::CharacterSelections;
