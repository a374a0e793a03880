//! Key pair generation and private key storage.
//!
//! Key pairs are produced by an external generator (`age-keygen`) behind the
//! [`Keygen`] trait. Private keys live in the project's secrets directory,
//! one `key-<hash>.txt` file per key, managed by [`KeyRing`].

mod age_keygen;
mod keyring;

use std::path::Path;

use zeroize::Zeroizing;

use crate::core::types::PublicKey;
use crate::error::{KeyError, Result};

pub use age_keygen::AgeKeygen;
pub use keyring::KeyRing;

const PUBLIC_KEY_PREFIX: &str = "# public key: ";
const SECRET_KEY_PREFIX: &str = "AGE-SECRET-KEY-";

/// A freshly generated key pair.
pub struct GeneratedKey {
    pub public: PublicKey,
    /// The `AGE-SECRET-KEY-...` line.
    pub private: Zeroizing<String>,
}

impl std::fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratedKey")
            .field("public", &self.public)
            .field("private", &"<redacted>")
            .finish()
    }
}

/// Key pair generator.
pub trait Keygen {
    /// Generate a new key pair.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::ToolUnavailable`, `KeyError::GenerationFailed` or
    /// `KeyError::UnparseableOutput`.
    fn generate(&self) -> Result<GeneratedKey>;

    /// Derive the public key of a private key file.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::DeriveFailed` if the file is not a valid key.
    fn public_key(&self, key_file: &Path) -> Result<PublicKey>;
}

impl<K: Keygen + ?Sized> Keygen for &K {
    fn generate(&self) -> Result<GeneratedKey> {
        (**self).generate()
    }

    fn public_key(&self, key_file: &Path) -> Result<PublicKey> {
        (**self).public_key(key_file)
    }
}

/// Parse generator output for the public key comment and the secret line.
///
/// # Errors
///
/// Returns `KeyError::UnparseableOutput` if either line is missing.
pub fn parse_keygen_output(output: &str, tool: &str) -> Result<GeneratedKey> {
    let mut public = None;
    let mut private = None;

    for line in output.lines().map(str::trim) {
        if let Some(key) = line.strip_prefix(PUBLIC_KEY_PREFIX) {
            public = Some(key.trim().to_string());
        } else if line.starts_with(SECRET_KEY_PREFIX) {
            private = Some(Zeroizing::new(line.to_string()));
        }
    }

    match (public, private) {
        (Some(public), Some(private)) if !public.is_empty() => Ok(GeneratedKey { public, private }),
        _ => Err(KeyError::UnparseableOutput {
            tool: tool.to_string(),
        }
        .into()),
    }
}

/// Check that `key` is a valid age X25519 recipient.
///
/// # Errors
///
/// Returns `KeyError::InvalidPublicKey`.
pub fn validate_public_key(key: &str) -> Result<()> {
    key.trim()
        .parse::<age::x25519::Recipient>()
        .map_err(|e| KeyError::InvalidPublicKey(format!("{}: {}", key, e)))?;
    Ok(())
}
