//! Git working tree helpers.

use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::core::constants::{GITIGNORE_ENTRIES, GITIGNORE_EQUIVALENTS};
use crate::error::{Result, ValidationError};

/// Ensure `.gitignore` under `root` ignores the secrets directory.
///
/// Existing equivalent spellings (`.secrets/`, `/.secrets`) count as present.
/// Returns whether the file was changed.
///
/// # Errors
///
/// Returns error if file operations fail.
pub fn ensure_gitignore(root: &Path) -> Result<bool> {
    let gitignore = root.join(".gitignore");

    let existing = if gitignore.exists() {
        std::fs::read_to_string(&gitignore)?
    } else {
        String::new()
    };

    let ignored = existing
        .lines()
        .any(|l| GITIGNORE_EQUIVALENTS.contains(&l.trim()));

    let mut updated = existing.clone();
    if !ignored {
        for entry in GITIGNORE_ENTRIES {
            if !updated.is_empty() && !updated.ends_with('\n') {
                updated.push('\n');
            }
            updated.push_str(entry);
            updated.push('\n');
        }
    }

    if updated != existing {
        debug!(path = %gitignore.display(), "updating .gitignore");
        std::fs::write(&gitignore, updated)?;
        return Ok(true);
    }

    Ok(false)
}

/// Require a clean git working tree at `root`.
///
/// # Errors
///
/// Returns `ValidationError::NotGitRepository` outside a repository (or
/// without git) and `ValidationError::DirtyWorkingTree` when there are
/// uncommitted changes.
pub fn ensure_clean(root: &Path) -> Result<()> {
    let inside = Command::new("git")
        .args(["rev-parse", "--git-dir"])
        .current_dir(root)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false);
    if !inside {
        return Err(ValidationError::NotGitRepository.into());
    }

    let output = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(root)
        .output()?;
    if !output.status.success() {
        return Err(ValidationError::NotGitRepository.into());
    }
    if !String::from_utf8_lossy(&output.stdout).trim().is_empty() {
        return Err(ValidationError::DirtyWorkingTree.into());
    }

    Ok(())
}
