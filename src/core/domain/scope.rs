//! Scope type.

use serde::{Deserialize, Serialize};

use crate::core::domain::MemberId;
use crate::core::types::{Pattern, ScopeName};
use crate::error::ValidationError;

/// Binds a set of file glob patterns to the members allowed to decrypt them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scope {
    pub name: ScopeName,
    /// Glob patterns, expanded in order relative to the working directory.
    #[serde(default)]
    pub patterns: Vec<Pattern>,
    /// Member references, resolved in order to recipients when planning.
    #[serde(default)]
    pub members: Vec<MemberId>,
}

impl Scope {
    pub fn new(name: impl Into<ScopeName>) -> Self {
        Self {
            name: name.into(),
            patterns: Vec::new(),
            members: Vec::new(),
        }
    }

    pub fn with_patterns<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Pattern>,
    {
        self.patterns.extend(patterns.into_iter().map(Into::into));
        self
    }

    pub fn with_members<I>(mut self, members: I) -> Self
    where
        I: IntoIterator<Item = MemberId>,
    {
        self.members.extend(members);
        self
    }

    /// Whether the scope references the given member.
    pub fn contains(&self, id: &MemberId) -> bool {
        self.members.iter().any(|m| m == id)
    }

    /// Drop every reference to a member. Returns whether anything was removed.
    pub fn remove_member(&mut self, id: &MemberId) -> bool {
        let before = self.members.len();
        self.members.retain(|m| m != id);
        self.members.len() != before
    }
}

/// Validate a scope name: non-empty, no whitespace.
pub fn validate_scope_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::EmptyScopeName);
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ValidationError::ScopeNameWhitespace(name.to_string()));
    }
    Ok(())
}
