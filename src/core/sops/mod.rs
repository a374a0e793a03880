//! sops integration.
//!
//! Encryption never happens in-process: files are encrypted, re-keyed and
//! decrypted by the external `sops` binary. The [`Crypter`] trait is the seam
//! the executor works against, so tests can substitute an in-process fake.

mod command;
mod detect;

use std::path::Path;

use tracing::debug;

use crate::core::tool::ToolPath;
use crate::core::types::PublicKey;
use crate::error::Result;

pub use command::{Invocation, SopsCommand};
pub use detect::SopsConfig;

/// In-place file encryption backend.
pub trait Crypter {
    /// Encrypt a plaintext file in place for `recipients`.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::ToolFailed` if the backend rejects the file.
    fn encrypt(&self, file: &Path, recipients: &[PublicKey]) -> Result<()>;

    /// Re-key an already encrypted file in place to exactly `recipients`.
    ///
    /// `identity` is a private key file able to open the current file, for
    /// when the caller's usual key no longer matches.
    fn reencrypt(&self, file: &Path, recipients: &[PublicKey], identity: Option<&Path>)
        -> Result<()>;
}

/// The `sops` binary.
#[derive(Debug, Clone)]
pub struct Sops {
    tool: ToolPath,
}

impl Sops {
    pub fn new(tool: ToolPath) -> Self {
        Self { tool }
    }

    pub fn tool(&self) -> &ToolPath {
        &self.tool
    }

    /// Start a builder bound to this binary.
    pub fn command(&self) -> SopsCommand<'_> {
        SopsCommand::new(&self.tool)
    }

    /// Encrypt in place, optionally limiting encryption to matching keys.
    pub fn encrypt_with_regex(
        &self,
        file: &Path,
        recipients: &[PublicKey],
        regex: Option<&str>,
    ) -> Result<()> {
        let invocation = self
            .command()
            .file(file)
            .recipients(recipients)
            .encrypted_regex(regex)
            .build_encrypt()?;
        debug!(command = %invocation, "running sops");
        invocation.run()?;
        Ok(())
    }

    /// Decrypt with `key_file`.
    ///
    /// Returns the plaintext when not decrypting in place, otherwise an
    /// empty buffer.
    pub fn decrypt(&self, file: &Path, key_file: &Path, in_place: bool) -> Result<Vec<u8>> {
        let invocation = self
            .command()
            .file(file)
            .identity(Some(key_file))
            .in_place(in_place)
            .build_decrypt()?;
        debug!(command = %invocation, "running sops");
        let output = invocation.run()?;
        Ok(if in_place { Vec::new() } else { output.stdout })
    }
}

impl Crypter for Sops {
    fn encrypt(&self, file: &Path, recipients: &[PublicKey]) -> Result<()> {
        self.encrypt_with_regex(file, recipients, None)
    }

    fn reencrypt(
        &self,
        file: &Path,
        recipients: &[PublicKey],
        identity: Option<&Path>,
    ) -> Result<()> {
        let invocation = self
            .command()
            .file(file)
            .recipients(recipients)
            .identity(identity)
            .build_rotate()?;
        debug!(command = %invocation, "running sops");
        invocation.run()?;
        Ok(())
    }
}

impl<C: Crypter + ?Sized> Crypter for &C {
    fn encrypt(&self, file: &Path, recipients: &[PublicKey]) -> Result<()> {
        (**self).encrypt(file, recipients)
    }

    fn reencrypt(
        &self,
        file: &Path,
        recipients: &[PublicKey],
        identity: Option<&Path>,
    ) -> Result<()> {
        (**self).reencrypt(file, recipients, identity)
    }
}
