//! Error types for store operations.

use townsquare_domain::DomainError;

/// Failures surfaced by `EntityStore` and the datastore drivers.
///
/// Errors are propagated unchanged to the caller; nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A required field is missing or a value breaks a declared limit.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// A referenced row does not exist, or a uniqueness rule was broken.
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// Entity not found - includes entity type and ID for actionable error messages.
    #[error("{entity_type} not found: {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// The datastore could not complete the operation - includes operation name for tracing.
    #[error("Persistence error in {operation}: {message}")]
    Persistence {
        operation: &'static str,
        message: String,
    },

    /// A stored value could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn validation(message: impl ToString) -> Self {
        Self::Validation(message.to_string())
    }

    pub fn constraint(message: impl ToString) -> Self {
        Self::Constraint(message.to_string())
    }

    /// Create a NotFound error with entity type and ID context.
    pub fn not_found(entity_type: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type,
            id: id.to_string(),
        }
    }

    /// Create a Persistence error with operation context.
    pub fn persistence(operation: &'static str, message: impl ToString) -> Self {
        Self::Persistence {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<DomainError> for StoreError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) | DomainError::InvalidId(msg) => Self::Validation(msg),
            DomainError::Constraint(msg) => Self::Constraint(msg),
            DomainError::NotFound { entity_type, id } => Self::NotFound { entity_type, id },
            DomainError::Parse(msg) => Self::Serialization(msg),
        }
    }
}
