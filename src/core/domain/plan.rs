//! Plan and action types.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::core::types::{PublicKey, ScopeName};

/// What the executor does with a single file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ActionKind {
    /// Encrypt a plaintext file for the scope's recipients.
    #[serde(rename = "encrypt")]
    Encrypt,
    /// Re-key an already encrypted file to the scope's recipients.
    #[serde(rename = "re-encrypt")]
    Reencrypt,
    /// Leave the file alone (no members in scope).
    #[serde(rename = "skip")]
    Skip,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypt => "encrypt",
            Self::Reencrypt => "re-encrypt",
            Self::Skip => "skip",
        }
    }

    /// One-character marker used in plan listings.
    pub fn symbol(&self) -> char {
        match self {
            Self::Encrypt => '+',
            Self::Reencrypt => '~',
            Self::Skip => '-',
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One planned file-level operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    #[serde(rename = "type")]
    pub kind: ActionKind,
    /// Path relative to the working directory the plan was computed in.
    pub file: PathBuf,
    pub scope: ScopeName,
    /// Empty iff `kind` is `Skip`.
    pub recipients: Vec<PublicKey>,
    pub description: String,
}

impl Action {
    pub fn skip(file: PathBuf, scope: &str) -> Self {
        Self {
            kind: ActionKind::Skip,
            file,
            scope: scope.to_string(),
            recipients: Vec::new(),
            description: "no members in scope".to_string(),
        }
    }

    pub fn encrypt(file: PathBuf, scope: &str, recipients: Vec<PublicKey>) -> Self {
        Self {
            kind: ActionKind::Encrypt,
            file,
            scope: scope.to_string(),
            recipients,
            description: "encrypt with current team".to_string(),
        }
    }

    pub fn reencrypt(file: PathBuf, scope: &str, recipients: Vec<PublicKey>) -> Self {
        Self {
            kind: ActionKind::Reencrypt,
            file,
            scope: scope.to_string(),
            recipients,
            description: "re-encrypt with updated team".to_string(),
        }
    }

    pub fn is_skip(&self) -> bool {
        self.kind == ActionKind::Skip
    }
}

/// Ordered actions, concatenated per scope in manifest order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Plan {
    pub actions: Vec<Action>,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        Self { actions }
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Action> {
        self.actions.iter()
    }

    /// Number of actions of the given kind.
    pub fn count(&self, kind: ActionKind) -> usize {
        self.actions.iter().filter(|a| a.kind == kind).count()
    }

    /// Number of actions that touch a file.
    pub fn pending(&self) -> usize {
        self.actions.iter().filter(|a| !a.is_skip()).count()
    }
}
