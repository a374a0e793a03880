//! Plan computation.
//!
//! Turns a manifest and the files on disk into the ordered list of actions
//! needed to bring every matched file in line with its scope's membership.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::core::constants::{BACKUP_DIR_PREFIX, ENCRYPTION_MARKERS, MANIFEST_FILE, SECRETS_DIR};
use crate::core::domain::{Action, Plan, Scope};
use crate::core::manifest::Manifest;
use crate::error::{PlanError, Result};

/// Computes plans relative to a working directory.
#[derive(Debug, Clone)]
pub struct Planner {
    root: PathBuf,
}

impl Planner {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Compute the actions implied by `manifest`.
    ///
    /// Scopes are processed in manifest order and their actions concatenated.
    /// A file matched by two scopes appears once per scope.
    ///
    /// # Errors
    ///
    /// Returns `PlanError::InvalidPattern` for a malformed glob and
    /// `PlanError::UnknownMember` for a scope member missing from the team.
    /// No partial plan is returned.
    pub fn compute_plan(&self, manifest: &Manifest) -> Result<Plan> {
        let mut actions = Vec::new();

        for scope in &manifest.scopes {
            let files = self.expand(scope)?;
            let recipients = manifest.scope_recipients(scope)?;

            debug!(
                scope = %scope.name,
                files = files.len(),
                recipients = recipients.len(),
                "planning scope"
            );

            for file in files {
                let action = if recipients.is_empty() {
                    Action::skip(file, &scope.name)
                } else if is_encrypted(&self.root.join(&file)) {
                    Action::reencrypt(file, &scope.name, recipients.clone())
                } else {
                    Action::encrypt(file, &scope.name, recipients.clone())
                };
                trace!(file = %action.file.display(), kind = %action.kind, "planned");
                actions.push(action);
            }
        }

        Ok(Plan::new(actions))
    }

    /// Regular files matched by any of the scope's patterns, first match first.
    ///
    /// The manifest, the key directory and leftover backup directories are
    /// never matched.
    fn expand(&self, scope: &Scope) -> Result<Vec<PathBuf>> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for pattern in &scope.patterns {
            let full = self.absolute_pattern(pattern);
            let paths = glob::glob(&full).map_err(|source| PlanError::InvalidPattern {
                scope: scope.name.clone(),
                pattern: pattern.clone(),
                source,
            })?;

            for entry in paths {
                let path = match entry {
                    Ok(path) => path,
                    Err(e) => {
                        trace!(error = %e, "skipping unreadable glob entry");
                        continue;
                    }
                };
                if !path.is_file() {
                    continue;
                }
                let relative = path
                    .strip_prefix(&self.root)
                    .map(Path::to_path_buf)
                    .unwrap_or(path);
                if is_reserved(&relative) {
                    trace!(file = %relative.display(), "skipping reserved path");
                    continue;
                }
                if seen.insert(relative.clone()) {
                    files.push(relative);
                }
            }
        }

        Ok(files)
    }

    fn absolute_pattern(&self, pattern: &str) -> String {
        if Path::new(pattern).is_absolute() {
            return pattern.to_string();
        }
        let root = glob::Pattern::escape(&self.root.to_string_lossy());
        if root.is_empty() {
            pattern.to_string()
        } else {
            format!("{}/{}", root.trim_end_matches('/'), pattern)
        }
    }
}

/// Files sopsistry owns itself.
fn is_reserved(relative: &Path) -> bool {
    if relative == Path::new(MANIFEST_FILE) {
        return true;
    }
    relative
        .components()
        .next()
        .and_then(|c| c.as_os_str().to_str())
        .is_some_and(|first| first == SECRETS_DIR || first.starts_with(BACKUP_DIR_PREFIX))
}

/// Whether a file looks like it was already encrypted by sops.
///
/// Heuristic substring search over the file contents. Unreadable files count
/// as plaintext.
pub fn is_encrypted(path: &Path) -> bool {
    match std::fs::read(path) {
        Ok(bytes) => {
            let contents = String::from_utf8_lossy(&bytes);
            ENCRYPTION_MARKERS.iter().any(|m| contents.contains(m))
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{ActionKind, Member, MemberId};
    use chrono::Utc;
    use std::fs;
    use tempfile::TempDir;

    fn id(s: &str) -> MemberId {
        MemberId::new(s).unwrap()
    }

    fn manifest(scopes: Vec<Scope>) -> Manifest {
        let mut manifest = Manifest {
            scopes,
            ..Manifest::default()
        };
        manifest
            .members
            .push(Member::new(id("alice"), "age1alice", Utc::now()));
        manifest
            .members
            .push(Member::new(id("bob"), "age1bob", Utc::now()));
        manifest
    }

    #[test]
    fn test_plaintext_is_encrypted_for_all_recipients() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("db.enc.yaml"), "password: hunter2\n").unwrap();

        let m = manifest(vec![Scope::new("s")
            .with_patterns(["*.enc.yaml"])
            .with_members([id("alice"), id("bob")])]);
        let plan = Planner::new(tmp.path()).compute_plan(&m).unwrap();

        assert_eq!(plan.len(), 1);
        let action = &plan.actions[0];
        assert_eq!(action.kind, ActionKind::Encrypt);
        assert_eq!(action.file, PathBuf::from("db.enc.yaml"));
        assert_eq!(action.recipients, vec!["age1alice", "age1bob"]);
    }

    #[test]
    fn test_encrypted_file_is_reencrypted() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("db.enc.yaml"),
            "password: ENC[AES256_GCM]\nsops:\n  version: 3.8.0\n",
        )
        .unwrap();

        let m = manifest(vec![Scope::new("s")
            .with_patterns(["*.enc.yaml"])
            .with_members([id("alice")])]);
        let plan = Planner::new(tmp.path()).compute_plan(&m).unwrap();

        assert_eq!(plan.actions[0].kind, ActionKind::Reencrypt);
    }

    #[test]
    fn test_overlapping_patterns_do_not_duplicate() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.yaml"), "x: 1\n").unwrap();
        fs::write(tmp.path().join("b.yaml"), "y: 2\n").unwrap();

        let m = manifest(vec![Scope::new("s")
            .with_patterns(["*.yaml", "a.*", "a.yaml"])
            .with_members([id("alice")])]);
        let plan = Planner::new(tmp.path()).compute_plan(&m).unwrap();

        let files: Vec<_> = plan.iter().map(|a| a.file.clone()).collect();
        assert_eq!(files, vec![PathBuf::from("a.yaml"), PathBuf::from("b.yaml")]);
    }

    #[test]
    fn test_empty_scope_skips() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.yaml"), "x: 1\n").unwrap();

        let m = manifest(vec![Scope::new("empty").with_patterns(["*.yaml"])]);
        let plan = Planner::new(tmp.path()).compute_plan(&m).unwrap();

        assert_eq!(plan.len(), 1);
        assert!(plan.actions[0].is_skip());
        assert!(plan.actions[0].recipients.is_empty());
    }

    #[test]
    fn test_reserved_paths() {
        assert!(is_reserved(Path::new("sopsistry.yaml")));
        assert!(is_reserved(Path::new(".secrets/key-0123abcd.txt")));
        assert!(is_reserved(Path::new(".sopsistry-backup-x1/0")));
        assert!(!is_reserved(Path::new("config/sopsistry.yaml")));
        assert!(!is_reserved(Path::new("secrets/api.json")));
    }

    #[test]
    fn test_directories_are_excluded() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("secrets")).unwrap();
        fs::create_dir(tmp.path().join("secrets/nested")).unwrap();
        fs::write(tmp.path().join("secrets/api.json"), "{}").unwrap();

        let m = manifest(vec![Scope::new("s")
            .with_patterns(["secrets/*"])
            .with_members([id("alice")])]);
        let plan = Planner::new(tmp.path()).compute_plan(&m).unwrap();

        assert_eq!(plan.len(), 1);
        assert_eq!(plan.actions[0].file, PathBuf::from("secrets/api.json"));
    }

    #[test]
    fn test_cross_scope_duplicates_are_kept() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.yaml"), "x: 1\n").unwrap();

        let m = manifest(vec![
            Scope::new("one")
                .with_patterns(["*.yaml"])
                .with_members([id("alice")]),
            Scope::new("two")
                .with_patterns(["a.yaml"])
                .with_members([id("bob")]),
        ]);
        let plan = Planner::new(tmp.path()).compute_plan(&m).unwrap();

        assert_eq!(plan.len(), 2);
        assert_eq!(plan.actions[0].scope, "one");
        assert_eq!(plan.actions[1].scope, "two");
        assert_eq!(plan.actions[1].recipients, vec!["age1bob"]);
    }

    #[test]
    fn test_unknown_member_fails_whole_plan() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.yaml"), "x: 1\n").unwrap();

        let m = manifest(vec![
            Scope::new("ok")
                .with_patterns(["*.yaml"])
                .with_members([id("alice")]),
            Scope::new("bad")
                .with_patterns(["*.yaml"])
                .with_members([id("ghost")]),
        ]);
        let err = Planner::new(tmp.path()).compute_plan(&m).unwrap_err();
        assert!(err.to_string().contains("member ghost not found"));
    }

    #[test]
    fn test_invalid_pattern() {
        let tmp = TempDir::new().unwrap();
        let m = manifest(vec![Scope::new("s")
            .with_patterns(["[unclosed"])
            .with_members([id("alice")])]);

        let err = Planner::new(tmp.path()).compute_plan(&m).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("[unclosed"));
        assert!(msg.contains("scope s"));
    }

    #[test]
    fn test_is_encrypted_markers() {
        let tmp = TempDir::new().unwrap();
        let plain = tmp.path().join("plain.json");
        let json = tmp.path().join("enc.json");
        fs::write(&plain, "{\"user\": \"root\"}").unwrap();
        fs::write(&json, "{\"data\": \"ENC[]\", \"sops\": {}}").unwrap();

        assert!(!is_encrypted(&plain));
        assert!(is_encrypted(&json));
        assert!(!is_encrypted(&tmp.path().join("missing")));
    }
}
