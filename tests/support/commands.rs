//! CLI helpers for Test.
//!
//! CLI tests run the real `sistry` binary against shell-script stand-ins
//! for `sops` and `age-keygen`. The fake keygen hands out pre-generated age
//! keys from a pool and derives public keys from a lookup table, so every
//! key the binary sees is a valid age key.

use std::fs;
use std::path::PathBuf;
use std::process::Output;

use assert_cmd::Command;

use super::{keygen_output, Test};

const FAKE_SOPS: &str = r#"#!/bin/sh
mode=""; age=""; inplace=0; prev=""; file=""
for arg in "$@"; do
  if [ "$prev" = "--age" ]; then age="$arg"; fi
  case "$arg" in
    -e) mode=encrypt ;;
    -d) mode=decrypt ;;
    --rotate) mode=rotate ;;
    --in-place) inplace=1 ;;
  esac
  prev="$arg"
  file="$arg"
done
if [ -n "$FAKE_SOPS_FAIL" ] && [ "$(basename "$file")" = "$FAKE_SOPS_FAIL" ]; then
  echo "injected failure" >&2
  exit 1
fi
case "$mode" in
  encrypt)
    { printf 'sops:\n  recipients: %s\n---\n' "$SOPS_AGE_RECIPIENTS"; cat "$file"; } > "$file.fake" && mv "$file.fake" "$file"
    ;;
  rotate)
    head -n 1 "$file" | grep -q '^sops:' || { echo "not encrypted" >&2; exit 1; }
    { printf 'sops:\n  recipients: %s\n---\n' "$age"; tail -n +4 "$file"; } > "$file.fake" && mv "$file.fake" "$file"
    ;;
  decrypt)
    [ -n "$SOPS_AGE_KEY_FILE" ] || { echo "no key file" >&2; exit 1; }
    if [ "$inplace" = 1 ]; then
      tail -n +4 "$file" > "$file.fake" && mv "$file.fake" "$file"
    else
      tail -n +4 "$file"
    fi
    ;;
  *)
    echo "fake sops $*"
    ;;
esac
"#;

const FAKE_AGE_KEYGEN: &str = r#"#!/bin/sh
dir="$FAKE_AGE_DIR"
if [ "$1" = "-y" ]; then
  secret=$(grep '^AGE-SECRET-KEY-' "$2" | head -n 1)
  [ -n "$secret" ] || { echo "no identity in $2" >&2; exit 1; }
  public=$(grep "^$secret " "$dir/map" | cut -d' ' -f2)
  [ -n "$public" ] || { echo "unknown identity" >&2; exit 1; }
  echo "$public"
  exit 0
fi
next=$(ls "$dir/pool" | sort | head -n 1)
[ -n "$next" ] || { echo "key pool empty" >&2; exit 1; }
cat "$dir/pool/$next"
rm "$dir/pool/$next"
"#;

impl Test {
    /// Create a test environment with fake tools installed.
    pub fn with_fake_tools() -> Self {
        let t = Self::new();
        t.install_fake_tools();
        t
    }

    /// Create a test environment initialized through the CLI as `user`.
    pub fn cli_init(user: &str) -> Self {
        let t = Self::with_fake_tools();
        let output = t.run(&["init", "--user", user]);
        assert!(
            output.status.success(),
            "Failed to initialize: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    fn bin_dir(&self) -> PathBuf {
        self.tools.path().join("bin")
    }

    fn age_dir(&self) -> PathBuf {
        self.tools.path().join("age")
    }

    pub fn sops_path(&self) -> PathBuf {
        self.bin_dir().join("sops")
    }

    pub fn age_keygen_path(&self) -> PathBuf {
        self.bin_dir().join("age-keygen")
    }

    fn install_fake_tools(&self) {
        fs::create_dir_all(self.bin_dir()).unwrap();
        fs::create_dir_all(self.age_dir().join("pool")).unwrap();
        fs::write(self.age_dir().join("map"), "").unwrap();

        for (path, script) in [
            (self.sops_path(), FAKE_SOPS),
            (self.age_keygen_path(), FAKE_AGE_KEYGEN),
        ] {
            fs::write(&path, script).unwrap();
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
            }
        }

        for _ in 0..4 {
            self.add_pool_key();
        }
    }

    /// Queue another key for the fake keygen. Returns its public key.
    pub fn add_pool_key(&self) -> String {
        let identity = age::x25519::Identity::generate();
        let output = keygen_output(&identity);
        let public = identity.to_public().to_string();
        let secret = output
            .lines()
            .find(|l| l.starts_with("AGE-SECRET-KEY-"))
            .unwrap()
            .to_string();

        let pool = self.age_dir().join("pool");
        let n = self.map_len();
        fs::write(pool.join(format!("{:04}", n)), output).unwrap();

        let map = self.age_dir().join("map");
        let mut lines = fs::read_to_string(&map).unwrap();
        lines.push_str(&format!("{} {}\n", secret, public));
        fs::write(map, lines).unwrap();
        public
    }

    fn map_len(&self) -> usize {
        fs::read_to_string(self.age_dir().join("map"))
            .map(|s| s.lines().count())
            .unwrap_or(0)
    }

    /// Create a sistry command wired to the fake tools.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("sistry").expect("failed to find sistry binary");
        cmd.current_dir(self.dir.path());
        cmd.env("SOPSISTRY_SOPS_PATH", self.sops_path());
        cmd.env("SOPSISTRY_AGE_KEYGEN_PATH", self.age_keygen_path());
        cmd.env("FAKE_AGE_DIR", self.age_dir());
        cmd.env("NO_COLOR", "1");
        cmd.env_remove("SOPSISTRY_LOG");
        cmd.env_remove("SOPSISTRY_USER_ID");
        cmd
    }

    /// Run sistry with `args` and capture its output.
    pub fn run(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(args)
            .output()
            .expect("failed to run sistry")
    }

    /// Shortcut for `sistry apply --yes --no-require-clean-git`.
    pub fn apply(&self) -> Output {
        self.run(&["apply", "--yes", "--no-require-clean-git"])
    }

    /// Whether a `git` binary is on PATH.
    pub fn git_available(&self) -> bool {
        std::process::Command::new("git")
            .arg("--version")
            .output()
            .map(|o| o.status.success())
            .unwrap_or(false)
    }

    /// Run git in the project directory, panicking on failure.
    pub fn git(&self, args: &[&str]) {
        let output = std::process::Command::new("git")
            .args(["-c", "user.name=Test", "-c", "user.email=test@example.com"])
            .args(args)
            .current_dir(self.root())
            .output()
            .expect("failed to run git");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }

    /// Turn the project into a repository with everything committed.
    pub fn git_commit_all(&self) {
        self.git(&["init", "-q"]);
        self.git(&["add", "-A"]);
        self.git(&["commit", "-q", "-m", "initial"]);
    }
}
