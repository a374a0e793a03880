//! Team member types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::PublicKey;
use crate::error::ValidationError;

/// A validated team member identifier.
///
/// Non-empty and free of whitespace. Surrounding whitespace is trimmed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MemberId(String);

impl MemberId {
    /// Validate and wrap a member identifier.
    pub fn new(id: &str) -> Result<Self, ValidationError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(ValidationError::EmptyMemberId);
        }
        if id.chars().any(char::is_whitespace) {
            return Err(ValidationError::MemberIdWhitespace(id.to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for MemberId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<MemberId> for String {
    fn from(id: MemberId) -> Self {
        id.0
    }
}

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for MemberId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for MemberId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A team member and their current age recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    /// Public key every file in the member's scopes is encrypted for.
    pub age_key: PublicKey,
    /// When the current key was created; anchors the key-age policy.
    pub created: DateTime<Utc>,
}

impl Member {
    pub fn new(id: MemberId, age_key: impl Into<PublicKey>, created: DateTime<Utc>) -> Self {
        Self {
            id,
            age_key: age_key.into(),
            created,
        }
    }

    /// Abbreviated public key for display.
    pub fn short_key(&self) -> String {
        match self.age_key.get(..16) {
            Some(prefix) if self.age_key.len() > 16 => format!("{}...", prefix),
            _ => self.age_key.clone(),
        }
    }
}
