//! Single-file operations outside the plan.
//!
//! These talk to sops directly, so they are only available on a workspace
//! backed by the real binary.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use tracing::debug;

use super::Workspace;
use crate::core::constants::{SOPS_AGE_KEY_FILE_ENV, SOPS_AGE_RECIPIENTS_ENV};
use crate::core::keys::Keygen;
use crate::core::sops::Sops;
use crate::error::{CryptoError, ManifestError, Result, ValidationError};

/// Combine `--regex` and `--iregex` into one `--encrypted-regex` value.
///
/// # Errors
///
/// Returns `ValidationError::ConflictingRegex` if both are given.
pub fn encrypted_regex(regex: Option<&str>, iregex: Option<&str>) -> Result<Option<String>> {
    match (regex, iregex) {
        (Some(_), Some(_)) => Err(ValidationError::ConflictingRegex.into()),
        (Some(re), None) => Ok(Some(re.to_string())),
        (None, Some(re)) => Ok(Some(format!("(?i){}", re))),
        (None, None) => Ok(None),
    }
}

/// A raw sops invocation carrying the team's recipients and key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeamCommand {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub env: Vec<(String, String)>,
}

impl TeamCommand {
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

impl fmt::Display for TeamCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

impl<K: Keygen> Workspace<Sops, K> {
    /// Encrypt one file in place for every team member.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::FileNotFound` for a missing file and
    /// `ManifestError::NoMembers` for an empty team.
    pub fn encrypt_file(&self, file: &Path, regex: Option<&str>) -> Result<()> {
        let path = self.root.join(file);
        if !path.exists() {
            return Err(CryptoError::FileNotFound(file.to_path_buf()).into());
        }

        let manifest = self.manifest()?;
        let recipients = manifest.recipients();
        if recipients.is_empty() {
            return Err(ManifestError::NoMembers.into());
        }

        self.crypter.tool().ensure_available()?;
        debug!(file = %file.display(), recipients = recipients.len(), "encrypting file");
        self.crypter.encrypt_with_regex(&path, &recipients, regex)
    }

    /// Decrypt one file with the first key in `.secrets`.
    ///
    /// Returns the plaintext, or an empty buffer when decrypting in place.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::NoKeyFiles` if there is no local key.
    pub fn decrypt_file(&self, file: &Path, in_place: bool) -> Result<Vec<u8>> {
        let path = self.root.join(file);
        if !path.exists() {
            return Err(CryptoError::FileNotFound(file.to_path_buf()).into());
        }

        let key_file = self.keyring().first()?;
        self.crypter.tool().ensure_available()?;
        debug!(file = %file.display(), key = %key_file.display(), "decrypting file");
        self.crypter.decrypt(&path, &key_file, in_place)
    }

    /// Build a sops command with the team environment set.
    pub fn sops_command(&self, args: &[String]) -> Result<TeamCommand> {
        let manifest = self.manifest()?;
        let mut env = vec![(
            SOPS_AGE_RECIPIENTS_ENV.to_string(),
            manifest.recipients().join(","),
        )];
        if let Ok(key_file) = self.keyring().first() {
            env.push((
                SOPS_AGE_KEY_FILE_ENV.to_string(),
                key_file.display().to_string(),
            ));
        }

        Ok(TeamCommand {
            program: self.crypter.tool().path().to_path_buf(),
            args: args.to_vec(),
            env,
        })
    }

    /// Run a command from [`Workspace::sops_command`] with inherited stdio.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::ToolUnavailable` if sops can't be found and
    /// `CryptoError::Spawn` if it can't be started.
    pub fn run_sops_command(&self, command: &TeamCommand) -> Result<ExitStatus> {
        self.crypter.tool().ensure_available()?;
        debug!(command = %command, "running sops with team environment");
        command.to_command().status().map_err(|source| {
            CryptoError::Spawn {
                tool: command.program.display().to_string(),
                source,
            }
            .into()
        })
    }
}
