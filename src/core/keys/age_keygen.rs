//! `age-keygen` backed key generation.

use std::path::Path;
use std::process::Command;

use tracing::debug;
use zeroize::Zeroizing;

use super::{parse_keygen_output, GeneratedKey, Keygen};
use crate::core::tool::ToolPath;
use crate::core::types::PublicKey;
use crate::error::{KeyError, Result};

/// The `age-keygen` binary.
#[derive(Debug, Clone)]
pub struct AgeKeygen {
    tool: ToolPath,
}

impl AgeKeygen {
    pub fn new(tool: ToolPath) -> Self {
        Self { tool }
    }
}

impl Keygen for AgeKeygen {
    fn generate(&self) -> Result<GeneratedKey> {
        self.tool.ensure_available()?;
        debug!(tool = %self.tool, "generating key pair");

        let output = Command::new(self.tool.path())
            .output()
            .map_err(|e| KeyError::GenerationFailed(e.to_string()))?;
        if !output.status.success() {
            return Err(KeyError::GenerationFailed(
                String::from_utf8_lossy(&output.stderr).trim().to_string(),
            )
            .into());
        }

        let stdout = Zeroizing::new(String::from_utf8_lossy(&output.stdout).into_owned());
        parse_keygen_output(&stdout, self.tool.tool())
    }

    fn public_key(&self, key_file: &Path) -> Result<PublicKey> {
        self.tool.ensure_available()?;

        let derive_failed = |reason: String| KeyError::DeriveFailed {
            path: key_file.to_path_buf(),
            reason,
        };

        let output = Command::new(self.tool.path())
            .arg("-y")
            .arg(key_file)
            .output()
            .map_err(|e| derive_failed(e.to_string()))?;
        if !output.status.success() {
            return Err(derive_failed(String::from_utf8_lossy(&output.stderr).trim().to_string()).into());
        }

        let public = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if public.is_empty() {
            return Err(derive_failed("empty output".to_string()).into());
        }
        Ok(public)
    }
}
