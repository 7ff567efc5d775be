//! Unified error types for the domain layer
//!
//! Provides a common error type usable across all rules-engine operations,
//! enabling consistent error handling without forcing adapters to use String
//! or anyhow.

use thiserror::Error;

use crate::rules::DiceParseError;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Validation failed (e.g., illegal ability-score combination)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Entity not found in the rule catalogs
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Business rule violation (e.g., untrained armor, over-quota picks)
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Parse error (for value objects)
    #[error("Parse error: {0}")]
    Parse(String),

    /// State transition not allowed (e.g., level-up with unresolved choices)
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    /// A limited-use pool or capacity is exhausted
    #[error("Capacity exhausted: {current}/{max}")]
    CapacityExhausted { current: u32, max: u32 },
}

impl DomainError {
    /// Creates a validation error for field-level rule violations.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a constraint violation error
    pub fn constraint(msg: impl Into<String>) -> Self {
        Self::Constraint(msg.into())
    }

    /// Creates a parse error for string-to-type conversion failures.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    /// Create an invalid state transition error
    pub fn invalid_state_transition(msg: impl Into<String>) -> Self {
        Self::InvalidStateTransition(msg.into())
    }

    /// Create a capacity exhausted error
    pub fn capacity_exhausted(current: u32, max: u32) -> Self {
        Self::CapacityExhausted { current, max }
    }
}

impl From<DiceParseError> for DomainError {
    fn from(err: DiceParseError) -> Self {
        Self::Parse(err.to_string())
    }
}
