//! Test support utilities for sopsistry integration tests.
//!
//! Provides isolated workspaces, in-process fake tools for the library
//! tests, and fake `sops`/`age-keygen` scripts for the CLI tests.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fakes;
pub mod fixtures;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fakes::*;
#[allow(unused_imports)]
pub use fixtures::*;

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

use sopsistry::core::constants::{MANIFEST_FILE, SECRETS_DIR};
use sopsistry::core::keys::KeyRing;
use sopsistry::core::manifest::Manifest;
use sopsistry::core::workspace::Workspace;

/// Test environment with an isolated working directory.
///
/// Nothing mutates process-global state: the library is handed the
/// directory explicitly and child processes use `.current_dir()`, so tests
/// can safely run in parallel.
pub struct Test {
    /// Temporary project directory
    pub dir: TempDir,
    /// Fake tool scripts and their state, for CLI tests
    pub tools: TempDir,
}

impl Test {
    /// Create a new empty test environment.
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let tools = TempDir::new().expect("failed to create tools dir");
        Self { dir, tools }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file relative to the project, creating parent directories.
    pub fn write(&self, rel: &str, contents: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, contents).unwrap();
    }

    pub fn read(&self, rel: &str) -> String {
        fs::read_to_string(self.path(rel)).unwrap()
    }

    pub fn read_bytes(&self, rel: &str) -> Vec<u8> {
        fs::read(self.path(rel)).unwrap()
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.path(MANIFEST_FILE)
    }

    pub fn manifest(&self) -> Manifest {
        Manifest::load(&self.manifest_path()).unwrap()
    }

    pub fn save_manifest(&self, manifest: &Manifest) {
        manifest.save(&self.manifest_path()).unwrap();
    }

    pub fn keyring(&self) -> KeyRing {
        KeyRing::new(self.path(SECRETS_DIR))
    }

    /// Key file names and contents in `.secrets`, sorted by name.
    pub fn key_files(&self) -> Vec<(String, String)> {
        let dir = self.path(SECRETS_DIR);
        let Ok(entries) = fs::read_dir(&dir) else {
            return Vec::new();
        };
        let mut files: Vec<(String, String)> = entries
            .map(|e| e.unwrap().path())
            .filter(|p| p.is_file())
            .map(|p| {
                (
                    p.file_name().unwrap().to_string_lossy().into_owned(),
                    fs::read_to_string(&p).unwrap(),
                )
            })
            .collect();
        files.sort();
        files
    }

    /// Library workspace driven by in-process fakes.
    pub fn workspace<'a>(
        &self,
        sops: &'a FakeSops,
        keygen: &'a FakeKeygen,
    ) -> Workspace<&'a FakeSops, &'a FakeKeygen> {
        Workspace::new(self.root(), sops, keygen)
    }

    /// Initialize with `user` as the first member using fakes.
    pub fn init(&self, user: &str, sops: &FakeSops, keygen: &FakeKeygen) {
        self.workspace(sops, keygen)
            .init(false, Some(user))
            .expect("failed to initialize workspace");
    }
}
