//! Workspace initialization.

use std::path::PathBuf;

use chrono::Utc;
use tracing::debug;

use super::Workspace;
use crate::core::domain::MemberId;
use crate::core::git;
use crate::core::identity::resolve_member_id;
use crate::core::keys::Keygen;
use crate::core::manifest::Manifest;
use crate::core::sops::Crypter;
use crate::core::types::PublicKey;
use crate::error::{ManifestError, Result};

/// What `init` did.
#[derive(Debug, Clone)]
pub struct InitReport {
    pub member: MemberId,
    pub public_key: PublicKey,
    pub key_file: PathBuf,
    /// False when an existing key file was reused.
    pub generated: bool,
    pub gitignore_updated: bool,
    pub manifest: Manifest,
}

impl<C: Crypter, K: Keygen> Workspace<C, K> {
    /// Initialize team management in the workspace.
    ///
    /// Creates `.secrets`, ignores it in git, reuses the first existing key
    /// file or generates a new one, and writes a manifest with the acting
    /// member in the `default` scope.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::AlreadyInitialized` if a manifest exists and
    /// `force` is false.
    pub fn init(&self, force: bool, user: Option<&str>) -> Result<InitReport> {
        if self.is_initialized() && !force {
            return Err(ManifestError::AlreadyInitialized(self.manifest_path()).into());
        }

        let member = resolve_member_id(user)?;
        let keyring = self.keyring();
        keyring.ensure_dir()?;
        let gitignore_updated = git::ensure_gitignore(&self.root)?;

        let (key_file, public_key, generated) = match keyring.first() {
            Ok(existing) => {
                debug!(path = %existing.display(), "reusing existing key");
                let public = self.keygen.public_key(&existing)?;
                (existing, public, false)
            }
            Err(_) => {
                let key = self.keygen.generate()?;
                let path = keyring.store(&key)?;
                (path, key.public.clone(), true)
            }
        };

        let manifest = Manifest::initial(member.clone(), public_key.clone(), Utc::now());
        self.save(&manifest)?;

        Ok(InitReport {
            member,
            public_key,
            key_file,
            generated,
            gitignore_updated,
            manifest,
        })
    }
}
