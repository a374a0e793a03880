//! Plan execution with backup and rollback.
//!
//! Every file an action is about to touch is first copied into a private
//! backup directory, one slot per action index. If any action fails, every
//! action executed so far (the failing one included) is restored from its
//! slot in reverse order, so a file touched twice ends up with its earliest
//! backup.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::constants::BACKUP_DIR_PREFIX;
use crate::core::domain::{ActionKind, Plan};
use crate::core::sops::Crypter;
use crate::error::{CryptoError, Error, Result};

/// Counts of what an execution did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecutionReport {
    pub encrypted: usize,
    pub reencrypted: usize,
    pub skipped: usize,
}

impl ExecutionReport {
    pub fn changed(&self) -> usize {
        self.encrypted + self.reencrypted
    }
}

/// A file touched by the current execution and where its original bytes are.
struct Touched {
    target: PathBuf,
    slot: Option<PathBuf>,
}

/// Applies plans through a [`Crypter`].
pub struct Executor<C> {
    crypter: C,
    root: PathBuf,
    identity: Option<PathBuf>,
}

impl<C: Crypter> Executor<C> {
    /// Executor resolving action paths against `root`.
    pub fn new(crypter: C, root: impl Into<PathBuf>) -> Self {
        Self {
            crypter,
            root: root.into(),
            identity: None,
        }
    }

    /// Private key file handed to every re-encrypt.
    pub fn with_identity(mut self, key_file: Option<PathBuf>) -> Self {
        self.identity = key_file;
        self
    }

    /// Apply every action in order.
    ///
    /// Either every non-skip target ends up in its new state, or every
    /// touched file is restored byte for byte and an error is returned.
    ///
    /// # Errors
    ///
    /// Returns the first action's failure. Files that could not be restored
    /// are reported through `Error::Rollback`.
    pub fn execute(&self, plan: &Plan) -> Result<ExecutionReport> {
        let mut report = ExecutionReport::default();
        if plan.is_empty() {
            return Ok(report);
        }

        let backup_dir = tempfile::Builder::new()
            .prefix(BACKUP_DIR_PREFIX)
            .tempdir_in(&self.root)
            .map_err(|source| CryptoError::Backup {
                path: self.root.clone(),
                source,
            })?;
        debug!(dir = %backup_dir.path().display(), actions = plan.len(), "executing plan");

        let mut touched: Vec<Touched> = Vec::new();

        for (index, action) in plan.iter().enumerate() {
            if action.is_skip() {
                debug!(file = %action.file.display(), scope = %action.scope, "skipping");
                report.skipped += 1;
                continue;
            }

            let target = self.root.join(&action.file);
            let slot = match backup(&target, &backup_dir.path().join(index.to_string())) {
                Ok(slot) => slot,
                Err(e) => return Err(fail(e, &touched)),
            };
            touched.push(Touched {
                target: target.clone(),
                slot,
            });

            debug!(
                file = %action.file.display(),
                kind = %action.kind,
                recipients = action.recipients.len(),
                "applying action"
            );

            let result = match action.kind {
                ActionKind::Encrypt => self.crypter.encrypt(&target, &action.recipients),
                ActionKind::Reencrypt => self.crypter.reencrypt(
                    &target,
                    &action.recipients,
                    self.identity.as_deref(),
                ),
                ActionKind::Skip => Ok(()),
            };

            if let Err(e) = result {
                warn!(file = %action.file.display(), error = %e, "action failed, rolling back");
                return Err(fail(e, &touched));
            }

            match action.kind {
                ActionKind::Encrypt => report.encrypted += 1,
                ActionKind::Reencrypt => report.reencrypted += 1,
                ActionKind::Skip => {}
            }
        }

        if let Err(e) = backup_dir.close() {
            warn!(error = %e, "failed to remove backup directory");
        }
        Ok(report)
    }
}

/// Copy `target` into `slot` if it exists.
fn backup(target: &Path, slot: &Path) -> Result<Option<PathBuf>> {
    if !target.exists() {
        return Ok(None);
    }
    fs::copy(target, slot).map_err(|source| CryptoError::Backup {
        path: target.to_path_buf(),
        source,
    })?;
    Ok(Some(slot.to_path_buf()))
}

/// Restore everything touched so far and attach any restore failures.
fn fail(error: Error, touched: &[Touched]) -> Error {
    let failures = restore(touched);
    error.with_rollback_failures(failures)
}

fn restore(touched: &[Touched]) -> Vec<String> {
    let mut failures = Vec::new();
    for entry in touched.iter().rev() {
        let Some(slot) = &entry.slot else {
            continue;
        };
        debug!(file = %entry.target.display(), "restoring from backup");
        if let Err(e) = fs::copy(slot, &entry.target) {
            failures.push(format!(
                "failed to restore {}: {}",
                entry.target.display(),
                e
            ));
        }
    }
    failures
}
