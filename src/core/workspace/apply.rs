//! Plan and apply.

use std::path::PathBuf;

use tracing::debug;

use super::Workspace;
use crate::core::domain::Plan;
use crate::core::executor::{ExecutionReport, Executor};
use crate::core::git;
use crate::core::identity::resolve_member_id;
use crate::core::keys::Keygen;
use crate::core::manifest::Manifest;
use crate::core::planner::Planner;
use crate::core::sops::Crypter;
use crate::error::Result;

impl<C: Crypter, K: Keygen> Workspace<C, K> {
    /// Compute the actions needed to match the manifest.
    pub fn plan(&self) -> Result<Plan> {
        let manifest = self.manifest()?;
        Planner::new(&self.root).compute_plan(&manifest)
    }

    /// Execute a previously computed plan as `user`.
    ///
    /// Re-encryption opens files with the acting member's key. Without one,
    /// any team member's key in `.secrets` is used, then the first key file.
    pub fn execute(&self, plan: &Plan, user: Option<&str>) -> Result<ExecutionReport> {
        let manifest = self.manifest()?;
        let identity = self.local_identity(&manifest, user);
        debug!(identity = ?identity, "executing with identity");
        Executor::new(&self.crypter, &self.root)
            .with_identity(identity)
            .execute(plan)
    }

    /// Require a clean git working tree before touching files.
    pub fn ensure_clean(&self) -> Result<()> {
        git::ensure_clean(&self.root)
    }

    /// Plan and execute in one step.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DirtyWorkingTree` when `require_clean_git`
    /// is set and the tree has changes, or any planning or execution error.
    pub fn apply(
        &self,
        require_clean_git: bool,
        user: Option<&str>,
    ) -> Result<(Plan, ExecutionReport)> {
        if require_clean_git {
            self.ensure_clean()?;
        }
        let plan = self.plan()?;
        let report = self.execute(&plan, user)?;
        Ok((plan, report))
    }

    fn local_identity(&self, manifest: &Manifest, user: Option<&str>) -> Option<PathBuf> {
        let keyring = self.keyring();
        let acting = resolve_member_id(user)
            .ok()
            .and_then(|id| manifest.member(&id));

        acting
            .into_iter()
            .chain(manifest.members.iter())
            .find_map(|member| keyring.find(&member.age_key, &self.keygen).ok())
            .or_else(|| keyring.first().ok())
    }
}
