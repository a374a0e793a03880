//! Key rotation.
//!
//! Rotating a member's key replaces their key pair, records the new public
//! key in the manifest and re-keys every managed file. The whole sequence is
//! one transaction: if anything fails after the new key is generated, the old
//! key file and the exact previous manifest bytes are put back.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::core::domain::expiry;
use crate::core::domain::MemberId;
use crate::core::executor::{ExecutionReport, Executor};
use crate::core::keys::{KeyRing, Keygen};
use crate::core::manifest::Manifest;
use crate::core::planner::Planner;
use crate::core::sops::Crypter;
use crate::core::types::PublicKey;
use crate::error::{KeyError, ManifestError, Result};

/// Outcome of a successful rotation.
#[derive(Debug, Clone)]
pub struct Rotation {
    pub member: MemberId,
    pub old_public: PublicKey,
    pub new_public: PublicKey,
    /// The new private key file.
    pub key_file: PathBuf,
    /// The manifest as persisted after rotation.
    pub manifest: Manifest,
    pub report: ExecutionReport,
}

/// Rotates member keys within one working directory.
pub struct KeyRotator<C, K> {
    crypter: C,
    keygen: K,
    root: PathBuf,
    manifest_path: PathBuf,
    keyring: KeyRing,
}

/// State the rollback needs to undo a partial rotation.
struct Undo<'a> {
    old_key: &'a Path,
    backup: &'a Path,
    new_key: Option<PathBuf>,
    manifest_path: &'a Path,
    manifest_bytes: &'a [u8],
}

impl<C: Crypter, K: Keygen> KeyRotator<C, K> {
    pub fn new(
        crypter: C,
        keygen: K,
        root: impl Into<PathBuf>,
        manifest_path: impl Into<PathBuf>,
        keyring: KeyRing,
    ) -> Self {
        Self {
            crypter,
            keygen,
            root: root.into(),
            manifest_path: manifest_path.into(),
            keyring,
        }
    }

    /// Rotate `member`'s key now.
    pub fn rotate(&self, manifest: &Manifest, member: &MemberId, force: bool) -> Result<Rotation> {
        self.rotate_at(manifest, member, force, Utc::now())
    }

    /// Rotate `member`'s key, judging key age at `now`.
    ///
    /// # Errors
    ///
    /// - `KeyError::MemberNotFound` if `member` is not on the team
    /// - `KeyError::Expired` if the key is past its maximum age and `force`
    ///   is false; nothing is changed
    /// - `KeyError::NoPrivateKey` if the member's private key file is missing
    /// - any generation, manifest or execution failure, after rollback
    pub fn rotate_at(
        &self,
        manifest: &Manifest,
        member: &MemberId,
        force: bool,
        now: DateTime<Utc>,
    ) -> Result<Rotation> {
        let current = manifest
            .member(member)
            .ok_or_else(|| KeyError::MemberNotFound(member.to_string()))?;

        let max_days = manifest.settings.effective_max_key_age_days();
        let status = expiry::member_status(current, max_days, now);
        if status.status.is_expired() && !force {
            return Err(KeyError::Expired {
                age_days: now.signed_duration_since(current.created).num_days(),
                max_days,
            }
            .into());
        }
        if status.status.is_warning() {
            warn!(member = %member, status = %status.status, "key is close to expiry");
        }

        let manifest_bytes =
            fs::read(&self.manifest_path).map_err(|source| ManifestError::Read {
                path: self.manifest_path.clone(),
                source,
            })?;

        let old_key = self.keyring.find(&current.age_key, &self.keygen)?;
        let backup = self.keyring.backup(&old_key)?;
        debug!(key = %old_key.display(), backup = %backup.display(), "backed up private key");

        let mut undo = Undo {
            old_key: &old_key,
            backup: &backup,
            new_key: None,
            manifest_path: &self.manifest_path,
            manifest_bytes: &manifest_bytes,
        };

        match self.replace_key(manifest, member, now, &mut undo) {
            Ok(rotation) => {
                remove_quietly(&backup);
                Ok(rotation)
            }
            Err(e) => {
                warn!(member = %member, error = %e, "rotation failed, restoring previous key");
                let failures = undo.rollback();
                if failures.is_empty() {
                    remove_quietly(&backup);
                }
                Err(e.with_rollback_failures(failures))
            }
        }
    }

    fn replace_key(
        &self,
        manifest: &Manifest,
        member: &MemberId,
        now: DateTime<Utc>,
        undo: &mut Undo<'_>,
    ) -> Result<Rotation> {
        let generated = self.keygen.generate()?;
        let key_file = self.keyring.store(&generated)?;
        undo.new_key = Some(key_file.clone());
        debug!(key = %key_file.display(), "generated replacement key");

        if key_file != undo.old_key {
            match fs::remove_file(undo.old_key) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => warn!(path = %undo.old_key.display(), error = %e, "failed to remove old key"),
            }
        }

        let mut updated = manifest.clone();
        let entry = updated
            .member_mut(member)
            .ok_or_else(|| KeyError::MemberNotFound(member.to_string()))?;
        let old_public = std::mem::replace(&mut entry.age_key, generated.public.clone());
        entry.created = now;
        updated.save(&self.manifest_path)?;

        let plan = Planner::new(&self.root).compute_plan(&updated)?;
        let report = Executor::new(&self.crypter, &self.root)
            .with_identity(Some(undo.backup.to_path_buf()))
            .execute(&plan)?;

        debug!(
            member = %member,
            encrypted = report.encrypted,
            reencrypted = report.reencrypted,
            "rotation complete"
        );

        Ok(Rotation {
            member: member.clone(),
            old_public,
            new_public: generated.public.clone(),
            key_file,
            manifest: updated,
            report,
        })
    }
}

impl Undo<'_> {
    /// Restore the old key and manifest. Returns every step that failed.
    fn rollback(&self) -> Vec<String> {
        let mut failures = Vec::new();

        if let Err(e) = restore_key(self.backup, self.old_key) {
            failures.push(format!(
                "failed to restore {}: {}",
                self.old_key.display(),
                e
            ));
        }

        if let Some(new_key) = &self.new_key {
            if new_key != self.old_key {
                if let Err(e) = fs::remove_file(new_key) {
                    if e.kind() != io::ErrorKind::NotFound {
                        failures.push(format!("failed to remove {}: {}", new_key.display(), e));
                    }
                }
            }
        }

        if let Err(e) = fs::write(self.manifest_path, self.manifest_bytes) {
            failures.push(format!(
                "failed to restore {}: {}",
                self.manifest_path.display(),
                e
            ));
        }

        failures
    }
}

fn restore_key(backup: &Path, key: &Path) -> io::Result<()> {
    fs::copy(backup, key)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(key, fs::Permissions::from_mode(0o600))?;
    }
    Ok(())
}

fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        warn!(path = %path.display(), error = %e, "failed to remove key backup");
    }
}
