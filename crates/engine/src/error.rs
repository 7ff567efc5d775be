//! Command-handler errors.

use sheetforge_domain::DomainError;

/// Errors surfaced by [`crate::commands::apply`]. All are recoverable: the
/// session is left unchanged and the user can correct the input.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("Rule violation: {0}")]
    Domain(#[from] DomainError),
    #[error("Cannot save: required selections are unresolved")]
    IncompleteSelections,
    #[error("Cannot save: {0}")]
    InvalidAbilities(String),
}
