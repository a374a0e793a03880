//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// An age public key string (starts with "age1...").
///
/// Used as a sops recipient for every file a member can decrypt.
pub type PublicKey = String;

/// A scope name as written in the manifest.
pub type ScopeName = String;

/// A filesystem glob pattern (e.g. `secrets/*.yaml`).
pub type Pattern = String;
