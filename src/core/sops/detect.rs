//! Existing `.sops.yaml` detection.
//!
//! Projects that already drive sops through creation rules can conflict with
//! team-managed recipients. Detection is a plain content scan.

use std::path::{Path, PathBuf};

use tracing::debug;

const CONFIG_FILES: &[&str] = &[".sops.yaml", ".sops.yml"];

/// Summary of a sops configuration file found in the working directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SopsConfig {
    pub path: PathBuf,
    pub has_creation_rules: bool,
    pub has_age_keys: bool,
    pub has_kms_keys: bool,
    pub has_pgp_keys: bool,
}

impl SopsConfig {
    /// Look for `.sops.yaml`, then `.sops.yml`, under `root`.
    pub fn detect(root: &Path) -> Option<Self> {
        CONFIG_FILES.iter().find_map(|name| {
            let path = root.join(name);
            let contents = std::fs::read_to_string(&path).ok()?;
            debug!(path = %path.display(), "found sops config");
            Some(Self::from_contents(path, &contents))
        })
    }

    fn from_contents(path: PathBuf, contents: &str) -> Self {
        Self {
            path,
            has_creation_rules: contents.contains("creation_rules"),
            has_age_keys: contents.contains("age:"),
            has_kms_keys: contents.contains("kms:") || contents.contains("arn:aws:kms"),
            has_pgp_keys: contents.contains("pgp:"),
        }
    }

    /// Creation rules or age keys may override team recipients.
    pub fn may_conflict(&self) -> bool {
        self.has_creation_rules || self.has_age_keys
    }

    /// Human-readable notes about what the file contains.
    pub fn concerns(&self) -> Vec<&'static str> {
        let mut notes = Vec::new();
        if self.has_age_keys {
            notes.push("contains age keys that may conflict with team settings");
        }
        if self.has_kms_keys {
            notes.push("contains KMS keys (consider using sops directly for these files)");
        }
        if self.has_pgp_keys {
            notes.push("contains PGP keys (consider using sops directly for these files)");
        }
        notes
    }

    /// Ways forward when a conflicting config is present.
    pub fn options() -> &'static [&'static str] {
        &[
            "use sops directly for files managed by .sops.yaml",
            "remove or rename .sops.yaml for full team management",
            "continue anyway (team settings will be used)",
        ]
    }

    /// Advice for running both tools side by side.
    pub fn coexistence_advice() -> &'static [&'static str] {
        &[
            "use 'sistry encrypt' for team-managed files",
            "use 'sops -e' directly for files with complex key requirements",
            "team settings override .sops.yaml for sistry commands",
        ]
    }
}
