//! Team membership operations.
//!
//! Adding or removing a member only edits the manifest. Files are brought in
//! line by a later `apply`.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::Workspace;
use crate::core::domain::{expiry, ExpiryReport, Member, MemberId};
use crate::core::identity::resolve_member_id;
use crate::core::keys::{validate_public_key, Keygen};
use crate::core::rotation::{KeyRotator, Rotation};
use crate::core::sops::Crypter;
use crate::error::Result;

/// Where a member's private key lives on this machine, if anywhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyLocation {
    pub member: MemberId,
    pub key_file: Option<PathBuf>,
}

impl<C: Crypter, K: Keygen> Workspace<C, K> {
    /// Add a member with their age public key.
    ///
    /// The member joins the `default` scope if there is one.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad ID, `KeyError::InvalidPublicKey`
    /// for a malformed key and `ManifestError::DuplicateMember` if the ID is
    /// taken.
    pub fn add_member(&self, id: &str, key: &str) -> Result<Member> {
        let id = MemberId::new(id)?;
        validate_public_key(key)?;

        let mut manifest = self.manifest()?;
        let member = Member::new(id, key.trim(), Utc::now());
        manifest.add_member(member.clone())?;
        self.save(&manifest)?;
        Ok(member)
    }

    /// Remove a member from the team and every scope.
    ///
    /// # Errors
    ///
    /// Returns `ManifestError::MemberNotFound` if the ID is unknown.
    pub fn remove_member(&self, id: &str) -> Result<Member> {
        let id = MemberId::new(id)?;
        let mut manifest = self.manifest()?;
        let member = manifest.remove_member(&id)?;
        self.save(&manifest)?;
        Ok(member)
    }

    /// Classify every member's key age.
    pub fn check_expiry(&self, now: DateTime<Utc>) -> Result<ExpiryReport> {
        Ok(expiry::audit(&self.manifest()?, now))
    }

    /// Map each member to their private key file in `.secrets`, if present.
    pub fn key_locations(&self) -> Result<Vec<KeyLocation>> {
        let manifest = self.manifest()?;
        let keyring = self.keyring();

        Ok(manifest
            .members
            .iter()
            .map(|m| KeyLocation {
                member: m.id.clone(),
                key_file: keyring.find(&m.age_key, &self.keygen).ok(),
            })
            .collect())
    }

    /// Rotate the acting member's key and re-key every managed file.
    ///
    /// # Errors
    ///
    /// See [`KeyRotator::rotate_at`].
    pub fn rotate_key(&self, user: Option<&str>, force: bool) -> Result<Rotation> {
        let member = resolve_member_id(user)?;
        let manifest = self.manifest()?;
        KeyRotator::new(
            &self.crypter,
            &self.keygen,
            &self.root,
            self.manifest_path(),
            self.keyring(),
        )
        .rotate(&manifest, &member, force)
    }
}
