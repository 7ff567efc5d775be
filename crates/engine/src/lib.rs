//! Sheetforge engine: everything around the pure rules core.
//!
//! Command dispatch for user actions, the single free-text translation
//! layer that turns raw catalog records into structured domain defs, and
//! the editing-session service with its async rule-data port.

pub mod commands;
pub mod content;
pub mod error;
pub mod service;

pub use commands::{apply, Command, CommandOutcome};
pub use error::CommandError;
pub use service::{FetchError, RuleDataSource, SessionService, SpellFetch};
