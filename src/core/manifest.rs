//! Manifest file management.
//!
//! Handles reading, writing, and validating the `sopsistry.yaml` team
//! manifest. The manifest is read fresh at the start of every operation and
//! written back only by operations that change it.

use std::collections::HashSet;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::constants;
use crate::core::domain::{validate_scope_name, Member, MemberId, Scope};
use crate::core::types::PublicKey;
use crate::error::{ManifestError, PlanError, Result};

/// Global settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// sops version the team works with. Informational only.
    #[serde(default)]
    pub sops_version: String,
    /// Maximum key age before rotation is required, floored to 180 days.
    #[serde(default = "default_max_key_age_days")]
    pub max_key_age_days: u32,
}

fn default_max_key_age_days() -> u32 {
    constants::DEFAULT_MAX_KEY_AGE_DAYS
}

impl Settings {
    /// Maximum key age with the policy floor applied.
    pub fn effective_max_key_age_days(&self) -> i64 {
        i64::from(
            self.max_key_age_days
                .max(constants::DEFAULT_MAX_KEY_AGE_DAYS),
        )
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            sops_version: constants::DEFAULT_SOPS_VERSION.to_string(),
            max_key_age_days: constants::DEFAULT_MAX_KEY_AGE_DAYS,
        }
    }
}

/// Team manifest stored in `sopsistry.yaml`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub scopes: Vec<Scope>,
    #[serde(default)]
    pub settings: Settings,
}

impl Manifest {
    /// Manifest for a freshly initialized team with a single member.
    ///
    /// The member is placed in the `default` scope, which covers the usual
    /// sops file naming conventions.
    pub fn initial(id: MemberId, public_key: impl Into<PublicKey>, created: DateTime<Utc>) -> Self {
        let scope = Scope::new(constants::DEFAULT_SCOPE)
            .with_patterns(constants::DEFAULT_PATTERNS.iter().copied())
            .with_members([id.clone()]);

        Self {
            members: vec![Member::new(id, public_key, created)],
            scopes: vec![scope],
            settings: Settings::default(),
        }
    }

    /// Load and validate a manifest.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::NotInitialized` if the file doesn't exist,
    /// `ManifestError::Parse` if the YAML is malformed, or a validation error.
    pub fn load(path: &Path) -> Result<Self> {
        debug!(path = %path.display(), "loading manifest");

        if !path.exists() {
            return Err(ManifestError::NotInitialized(path.to_path_buf()).into());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest: Self =
            serde_yaml::from_str(&contents).map_err(|source| ManifestError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(
            members = manifest.members.len(),
            scopes = manifest.scopes.len(),
            "manifest loaded"
        );

        manifest.validate()?;
        Ok(manifest)
    }

    /// Write the manifest to `path`.
    ///
    /// The file is replaced atomically: contents go to a temporary file in
    /// the same directory which is then renamed over the target.
    pub fn save(&self, path: &Path) -> Result<()> {
        debug!(path = %path.display(), "saving manifest");

        let contents = serde_yaml::to_string(self).map_err(ManifestError::Serialize)?;
        let write_err = |source| ManifestError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(write_err)?;
        tmp.write_all(contents.as_bytes()).map_err(write_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(std::fs::Permissions::from_mode(0o644))
                .map_err(write_err)?;
        }

        tmp.persist(path).map_err(|e| write_err(e.error))?;
        Ok(())
    }

    /// Check structural invariants that hold regardless of the filesystem.
    ///
    /// Checks:
    /// - Member IDs are unique
    /// - Scope names are valid and unique
    ///
    /// Scope member references are resolved by the planner, which reports
    /// unknown members as planning errors.
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for member in &self.members {
            if !ids.insert(&member.id) {
                return Err(ManifestError::DuplicateMember(member.id.to_string()).into());
            }
        }

        let mut names = HashSet::new();
        for scope in &self.scopes {
            validate_scope_name(&scope.name)?;
            if !names.insert(scope.name.as_str()) {
                return Err(ManifestError::DuplicateScope(scope.name.clone()).into());
            }
        }

        Ok(())
    }

    pub fn member(&self, id: &MemberId) -> Option<&Member> {
        self.members.iter().find(|m| &m.id == id)
    }

    pub fn member_mut(&mut self, id: &MemberId) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| &m.id == id)
    }

    /// Resolve a scope's member references to recipients, in listed order.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::UnknownMember` for the first reference that is not
    /// a team member.
    pub fn scope_recipients(&self, scope: &Scope) -> Result<Vec<PublicKey>> {
        scope
            .members
            .iter()
            .map(|id| {
                self.member(id)
                    .map(|m| m.age_key.clone())
                    .ok_or_else(|| {
                        PlanError::UnknownMember {
                            scope: scope.name.clone(),
                            member: id.to_string(),
                        }
                        .into()
                    })
            })
            .collect()
    }

    /// Every member's public key, in member order.
    pub fn recipients(&self) -> Vec<PublicKey> {
        self.members.iter().map(|m| m.age_key.clone()).collect()
    }

    /// Add a member and grant them the `default` scope, if there is one.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::DuplicateMember` if the ID is taken.
    pub fn add_member(&mut self, member: Member) -> Result<()> {
        if self.member(&member.id).is_some() {
            return Err(ManifestError::DuplicateMember(member.id.to_string()).into());
        }

        if let Some(scope) = self
            .scopes
            .iter_mut()
            .find(|s| s.name == constants::DEFAULT_SCOPE)
        {
            if !scope.contains(&member.id) {
                scope.members.push(member.id.clone());
            }
        }

        self.members.push(member);
        Ok(())
    }

    /// Remove a member from the team and from every scope.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::MemberNotFound` if the ID is unknown.
    pub fn remove_member(&mut self, id: &MemberId) -> Result<Member> {
        let index = self
            .members
            .iter()
            .position(|m| &m.id == id)
            .ok_or_else(|| ManifestError::MemberNotFound(id.to_string()))?;

        let member = self.members.remove(index);
        for scope in &mut self.scopes {
            scope.remove_member(id);
        }
        Ok(member)
    }
}
