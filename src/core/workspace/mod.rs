//! The primary interface for sopsistry operations.
//!
//! A [`Workspace`] is a working directory holding `sopsistry.yaml` and the
//! `.secrets` key directory, plus the external tools used on it. Every
//! operation reads the manifest fresh and writes it back only if it changed.

mod apply;
mod files;
mod lifecycle;
mod members;

use std::path::{Path, PathBuf};

use crate::core::constants::{MANIFEST_FILE, SECRETS_DIR};
use crate::core::keys::{AgeKeygen, KeyRing, Keygen};
use crate::core::manifest::Manifest;
use crate::core::sops::{Crypter, Sops};
use crate::core::tool::ToolPath;
use crate::error::Result;

pub use files::{encrypted_regex, TeamCommand};
pub use lifecycle::InitReport;
pub use members::KeyLocation;

/// A managed working directory.
pub struct Workspace<C = Sops, K = AgeKeygen> {
    root: PathBuf,
    crypter: C,
    keygen: K,
}

impl<C, K> std::fmt::Debug for Workspace<C, K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Workspace")
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

impl Workspace {
    /// Workspace driven by the real `sops` and `age-keygen` binaries.
    pub fn with_tools(root: impl Into<PathBuf>, sops: ToolPath, age_keygen: ToolPath) -> Self {
        Self::new(root, Sops::new(sops), AgeKeygen::new(age_keygen))
    }
}

impl<C: Crypter, K: Keygen> Workspace<C, K> {
    pub fn new(root: impl Into<PathBuf>, crypter: C, keygen: K) -> Self {
        Self {
            root: root.into(),
            crypter,
            keygen,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    pub fn secrets_dir(&self) -> PathBuf {
        self.root.join(SECRETS_DIR)
    }

    pub fn keyring(&self) -> KeyRing {
        KeyRing::new(self.secrets_dir())
    }

    pub fn is_initialized(&self) -> bool {
        self.manifest_path().exists()
    }

    /// Load and validate the manifest.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotInitialized` if `init` hasn't been run.
    pub fn manifest(&self) -> Result<Manifest> {
        Manifest::load(&self.manifest_path())
    }

    fn save(&self, manifest: &Manifest) -> Result<()> {
        manifest.save(&self.manifest_path())
    }
}
