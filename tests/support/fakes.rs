//! In-process stand-ins for sops and age-keygen.
//!
//! `FakeSops` rewrites files into a recognizable "encrypted" layout that
//! records the recipient list, so tests can check who a file is encrypted
//! for. `FakeKeygen` produces real age X25519 key pairs.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};

use age::secrecy::ExposeSecret;
use sopsistry::core::keys::{parse_keygen_output, GeneratedKey, Keygen};
use sopsistry::core::sops::Crypter;
use sopsistry::error::{CryptoError, KeyError, Result};

const HEADER: &str = "sops:\n  recipients: ";
const BODY_MARKER: &str = "\n---\n";

/// One recorded tool call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub operation: &'static str,
    pub file: PathBuf,
    pub recipients: Vec<String>,
    pub identity: Option<PathBuf>,
}

/// Fake encryption tool.
#[derive(Default)]
pub struct FakeSops {
    calls: RefCell<Vec<Call>>,
    /// Fail the call whose 1-based index equals this.
    fail_on_call: Option<usize>,
    /// Fail any call on a file whose name contains this.
    fail_on_file: Option<String>,
}

impl FakeSops {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on_call(n: usize) -> Self {
        Self {
            fail_on_call: Some(n),
            ..Self::default()
        }
    }

    pub fn failing_on_file(name: &str) -> Self {
        Self {
            fail_on_file: Some(name.to_string()),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.borrow().clone()
    }

    fn record(
        &self,
        operation: &'static str,
        file: &Path,
        recipients: &[String],
        identity: Option<&Path>,
    ) -> Result<()> {
        let n = {
            let mut calls = self.calls.borrow_mut();
            calls.push(Call {
                operation,
                file: file.to_path_buf(),
                recipients: recipients.to_vec(),
                identity: identity.map(Path::to_path_buf),
            });
            calls.len()
        };

        let by_name = self.fail_on_file.as_deref().is_some_and(|name| {
            file.file_name()
                .is_some_and(|f| f.to_string_lossy().contains(name))
        });
        if self.fail_on_call == Some(n) || by_name {
            // Leave the file damaged, like a tool dying halfway through.
            let _ = fs::write(file, "corrupted");
            return Err(CryptoError::ToolFailed {
                operation,
                file: file.to_path_buf(),
                output: "injected failure".to_string(),
            }
            .into());
        }
        Ok(())
    }
}

impl Crypter for FakeSops {
    fn encrypt(&self, file: &Path, recipients: &[String]) -> Result<()> {
        self.record("encrypt", file, recipients, None)?;
        let plaintext = fs::read_to_string(file)?;
        fs::write(file, encode(recipients, &plaintext))?;
        Ok(())
    }

    fn reencrypt(&self, file: &Path, recipients: &[String], identity: Option<&Path>) -> Result<()> {
        self.record("re-encrypt", file, recipients, identity)?;
        let contents = fs::read_to_string(file)?;
        let body = decode(&contents).ok_or_else(|| CryptoError::ToolFailed {
            operation: "re-encrypt",
            file: file.to_path_buf(),
            output: "file is not encrypted".to_string(),
        })?;
        fs::write(file, encode(recipients, &body))?;
        Ok(())
    }
}

fn encode(recipients: &[String], body: &str) -> String {
    format!("{}{}{}{}", HEADER, recipients.join(","), BODY_MARKER, body)
}

fn decode(contents: &str) -> Option<String> {
    let rest = contents.strip_prefix(HEADER)?;
    let (_, body) = rest.split_once(BODY_MARKER)?;
    Some(body.to_string())
}

/// Recipients a fake-encrypted file was encrypted for.
pub fn fake_recipients(contents: &str) -> Vec<String> {
    contents
        .strip_prefix(HEADER)
        .and_then(|rest| rest.split_once(BODY_MARKER))
        .map(|(line, _)| line.split(',').map(str::to_string).collect())
        .unwrap_or_default()
}

/// Fake key generator backed by the age crate.
#[derive(Default)]
pub struct FakeKeygen {
    fail: bool,
    generated: RefCell<Vec<String>>,
}

impl FakeKeygen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Public keys generated so far.
    pub fn generated(&self) -> Vec<String> {
        self.generated.borrow().clone()
    }
}

impl Keygen for FakeKeygen {
    fn generate(&self) -> Result<GeneratedKey> {
        if self.fail {
            return Err(KeyError::GenerationFailed("injected failure".to_string()).into());
        }
        let output = keygen_output(&age::x25519::Identity::generate());
        let key = parse_keygen_output(&output, "age-keygen")?;
        self.generated.borrow_mut().push(key.public.clone());
        Ok(key)
    }

    fn public_key(&self, key_file: &Path) -> Result<String> {
        let derive_failed = |reason: &str| KeyError::DeriveFailed {
            path: key_file.to_path_buf(),
            reason: reason.to_string(),
        };
        let contents = fs::read_to_string(key_file).map_err(|e| derive_failed(&e.to_string()))?;
        let line = contents
            .lines()
            .find(|l| l.starts_with("AGE-SECRET-KEY-"))
            .ok_or_else(|| derive_failed("no secret key line"))?;
        let identity: age::x25519::Identity =
            line.trim().parse().map_err(|e: &str| derive_failed(e))?;
        Ok(identity.to_public().to_string())
    }
}

/// Output in the format `age-keygen` prints.
pub fn keygen_output(identity: &age::x25519::Identity) -> String {
    format!(
        "# created: 2024-01-01T00:00:00Z\n# public key: {}\n{}\n",
        identity.to_public(),
        identity.to_string().expose_secret()
    )
}
