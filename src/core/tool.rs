//! External tool locations.
//!
//! `sops` and `age-keygen` paths come from the user, so they are validated
//! before anything is spawned: either the bare tool name (resolved via
//! `PATH`) or an absolute path whose file name is the tool.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::constants::{AGE_KEYGEN_BINARY, SOPS_BINARY};
use crate::error::{KeyError, Result, ValidationError};

const FORBIDDEN: &[char] = &[';', '|', '&', '$', '`', '\n', '\r'];

/// A validated path to an external tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPath {
    tool: &'static str,
    path: PathBuf,
}

impl ToolPath {
    /// Validate `path` as a location for `tool`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidToolPath` if the path contains shell
    /// metacharacters, is relative but not the bare name, or names another
    /// binary.
    pub fn new(tool: &'static str, path: &str) -> std::result::Result<Self, ValidationError> {
        let invalid = || ValidationError::InvalidToolPath {
            tool,
            path: path.to_string(),
        };

        if path.is_empty() || path.contains(FORBIDDEN) {
            return Err(invalid());
        }
        if path != tool {
            let p = Path::new(path);
            if !p.is_absolute() || p.file_name().and_then(|n| n.to_str()) != Some(tool) {
                return Err(invalid());
            }
        }

        Ok(Self {
            tool,
            path: PathBuf::from(path),
        })
    }

    pub fn sops(path: &str) -> std::result::Result<Self, ValidationError> {
        Self::new(SOPS_BINARY, path)
    }

    pub fn age_keygen(path: &str) -> std::result::Result<Self, ValidationError> {
        Self::new(AGE_KEYGEN_BINARY, path)
    }

    pub fn tool(&self) -> &'static str {
        self.tool
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Check the tool can be found before invoking it.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::ToolUnavailable` with an install hint.
    pub fn ensure_available(&self) -> Result<()> {
        which::which(&self.path).map_err(|_| KeyError::ToolUnavailable {
            tool: self.path.display().to_string(),
            hint: install_hint(self.tool),
        })?;
        Ok(())
    }
}

impl fmt::Display for ToolPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}

fn install_hint(tool: &str) -> &'static str {
    if tool == SOPS_BINARY {
        "Install sops from https://github.com/getsops/sops"
    } else {
        "Install age from https://github.com/FiloSottile/age"
    }
}
