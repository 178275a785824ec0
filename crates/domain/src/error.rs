//! Unified error types for the domain layer
//!
//! Entity constructors, field validation and row mapping all report through
//! `DomainError` so the store can translate failures without string matching.

use thiserror::Error;

/// Unified error type for domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Validation failed (required field empty, value too long)
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Invalid ID format
    #[error("Invalid ID format: {0}")]
    InvalidId(String),

    /// Entity not found
    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Referential rule violation
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A stored row could not be mapped back onto an entity
    #[error("Parse error: {0}")]
    Parse(String),
}

impl DomainError {
    /// Creates a validation error for field constraint violations.
    ///
    /// Use this when a declared field constraint is not met:
    /// - Required fields are empty or missing
    /// - Text exceeds its declared maximum length
    /// - An element of a set-valued field exceeds its maximum length
    ///
    /// # Example
    /// ```ignore
    /// if name.trim().is_empty() {
    ///     return Err(DomainError::validation("profile_organization.name is required"));
    /// }
    /// ```
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

    /// Create an invalid ID error
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    /// Creates a parse error for row-to-entity conversion failures.
    ///
    /// Raised by `Row` accessors when a column is absent or holds a value of
    /// the wrong type, and by `FromStr` impls on unknown names.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}
