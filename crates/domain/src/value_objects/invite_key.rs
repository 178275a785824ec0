//! Invitation tokens.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Maximum stored key length (column is `varchar(1024)`).
pub const INVITE_KEY_MAX_LEN: usize = 1024;

/// Opaque token carried in an invitation link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct InviteKey(String);

impl InviteKey {
    /// A fresh random token (32 lowercase hex characters).
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing token.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if the token is blank or longer than
    /// [`INVITE_KEY_MAX_LEN`].
    pub fn new(key: impl Into<String>) -> Result<Self, DomainError> {
        let key = key.into();
        if key.trim().is_empty() {
            return Err(DomainError::validation("Invite key cannot be empty"));
        }
        if key.len() > INVITE_KEY_MAX_LEN {
            return Err(DomainError::validation(format!(
                "Invite key cannot exceed {} characters",
                INVITE_KEY_MAX_LEN
            )));
        }
        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InviteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for InviteKey {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<InviteKey> for String {
    fn from(key: InviteKey) -> String {
        key.0
    }
}
