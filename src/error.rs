//! Error types.
//!
//! One enum per failure category, wrapped by the top-level [`Error`].

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error returned by every engine operation.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Plan(#[from] PlanError),

    #[error(transparent)]
    Key(#[from] KeyError),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// An operation failed and restoring the previous state also failed.
    ///
    /// `source` is the original failure; `failures` lists every restore step
    /// that could not be completed.
    #[error("{source}; rollback incomplete: {}", .failures.join("; "))]
    Rollback {
        source: Box<Error>,
        failures: Vec<String>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Attach restore failures to an error, if there were any.
    pub fn with_rollback_failures(self, failures: Vec<String>) -> Self {
        if failures.is_empty() {
            self
        } else {
            Error::Rollback {
                source: Box::new(self),
                failures,
            }
        }
    }
}

/// Manifest load/save/validate failures.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("not initialized: {} not found", .0.display())]
    NotInitialized(PathBuf),

    #[error("{} already exists (use --force to overwrite)", .0.display())]
    AlreadyInitialized(PathBuf),

    #[error("manifest load failed for {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("manifest parse failed for {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },

    #[error("manifest serialize failed: {0}")]
    Serialize(#[source] serde_yaml::Error),

    #[error("manifest save failed for {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("member {0} already exists")]
    DuplicateMember(String),

    #[error("scope {0} defined more than once")]
    DuplicateScope(String),

    #[error("member {0} not found")]
    MemberNotFound(String),

    #[error("no team members found in configuration")]
    NoMembers,
}

/// Plan computation failures.
#[derive(Error, Debug)]
pub enum PlanError {
    #[error("invalid pattern {pattern} in scope {scope}: {source}")]
    InvalidPattern {
        scope: String,
        pattern: String,
        source: glob::PatternError,
    },

    #[error("failed to get members for scope {scope}: member {member} not found")]
    UnknownMember { scope: String, member: String },
}

/// Key generation, lookup and rotation failures.
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("{tool} not found. {hint}")]
    ToolUnavailable { tool: String, hint: &'static str },

    #[error("key generate failed: {0}")]
    GenerationFailed(String),

    #[error("key generate failed: unparseable {tool} output")]
    UnparseableOutput { tool: String },

    #[error("failed to extract public key from {}: {reason}", path.display())]
    DeriveFailed { path: PathBuf, reason: String },

    #[error("no private key found for public key {0}")]
    NoPrivateKey(String),

    #[error("no private key found in {}", .0.display())]
    NoKeyFiles(PathBuf),

    #[error("member {0} not found in team")]
    MemberNotFound(String),

    #[error(
        "key has expired (age: {age_days} days, max: {max_days} days). Use --force to rotate anyway"
    )]
    Expired { age_days: i64, max_days: i64 },

    #[error("invalid age public key: {0}")]
    InvalidPublicKey(String),

    #[error("key store failed for {}: {source}", path.display())]
    Store {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// External encryption tool failures.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("sops {operation} failed for {}: {output}", file.display())]
    ToolFailed {
        operation: &'static str,
        file: PathBuf,
        output: String,
    },

    #[error("failed to run {tool}: {source}")]
    Spawn {
        tool: String,
        source: std::io::Error,
    },

    #[error("incomplete sops invocation: {0}")]
    InvalidInvocation(&'static str),

    #[error("failed to backup {}: {source}", path.display())]
    Backup {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("file {} does not exist", .0.display())]
    FileNotFound(PathBuf),
}

/// Input validation failures.
#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("member ID cannot be empty")]
    EmptyMemberId,

    #[error("member ID cannot contain whitespace: {0:?}")]
    MemberIdWhitespace(String),

    #[error("scope name cannot be empty")]
    EmptyScopeName,

    #[error("scope name cannot contain whitespace: {0:?}")]
    ScopeNameWhitespace(String),

    #[error("invalid {tool} path: {path}")]
    InvalidToolPath { tool: &'static str, path: String },

    #[error("cannot use both --regex and --iregex at the same time")]
    ConflictingRegex,

    #[error("git working tree is not clean. Commit or stash changes first, or use --force")]
    DirtyWorkingTree,

    #[error("not in a git repository")]
    NotGitRepository,
}

pub type Result<T> = std::result::Result<T, Error>;
