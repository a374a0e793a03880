//! sops invocation builder.
//!
//! Every call to sops goes through [`SopsCommand`]. The only ways to finish
//! a builder are [`SopsCommand::build_encrypt`], [`SopsCommand::build_rotate`]
//! and [`SopsCommand::build_decrypt`], each of which checks that the fields
//! its operation needs are present.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use crate::core::constants::{SOPS_AGE_KEY_FILE_ENV, SOPS_AGE_RECIPIENTS_ENV};
use crate::core::tool::ToolPath;
use crate::core::types::PublicKey;
use crate::error::{CryptoError, Result};

/// Builder for a single sops invocation.
#[derive(Debug, Clone)]
pub struct SopsCommand<'a> {
    tool: &'a ToolPath,
    file: Option<PathBuf>,
    recipients: Vec<PublicKey>,
    identity: Option<PathBuf>,
    encrypted_regex: Option<String>,
    in_place: bool,
}

impl<'a> SopsCommand<'a> {
    pub fn new(tool: &'a ToolPath) -> Self {
        Self {
            tool,
            file: None,
            recipients: Vec::new(),
            identity: None,
            encrypted_regex: None,
            in_place: false,
        }
    }

    pub fn file(mut self, file: impl Into<PathBuf>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn recipients(mut self, recipients: &[PublicKey]) -> Self {
        self.recipients = recipients.to_vec();
        self
    }

    /// Private key file sops should use to open the file.
    pub fn identity(mut self, key_file: Option<&Path>) -> Self {
        self.identity = key_file.map(Path::to_path_buf);
        self
    }

    pub fn encrypted_regex(mut self, regex: Option<&str>) -> Self {
        self.encrypted_regex = regex.map(str::to_string);
        self
    }

    pub fn in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place;
        self
    }

    /// `sops -e --in-place [--encrypted-regex RE] FILE`, recipients via env.
    pub fn build_encrypt(self) -> Result<Invocation> {
        let file = self.require_file()?;
        self.require_recipients()?;

        let mut args = vec!["-e".to_string(), "--in-place".to_string()];
        if let Some(regex) = &self.encrypted_regex {
            args.push("--encrypted-regex".to_string());
            args.push(regex.clone());
        }
        args.push(file.display().to_string());

        Ok(Invocation {
            operation: "encrypt",
            program: self.tool.path().to_path_buf(),
            args,
            env: vec![(
                SOPS_AGE_RECIPIENTS_ENV.to_string(),
                self.recipients.join(","),
            )],
            file,
        })
    }

    /// `sops --rotate --in-place --age R1,R2 FILE`.
    pub fn build_rotate(self) -> Result<Invocation> {
        let file = self.require_file()?;
        self.require_recipients()?;

        let args = vec![
            "--rotate".to_string(),
            "--in-place".to_string(),
            "--age".to_string(),
            self.recipients.join(","),
            file.display().to_string(),
        ];

        Ok(Invocation {
            operation: "re-encrypt",
            program: self.tool.path().to_path_buf(),
            args,
            env: self.identity_env(),
            file,
        })
    }

    /// `sops -d [--in-place] FILE` with the identity key file.
    pub fn build_decrypt(self) -> Result<Invocation> {
        let file = self.require_file()?;
        if self.identity.is_none() {
            return Err(CryptoError::InvalidInvocation("decrypt requires a key file").into());
        }

        let mut args = vec!["-d".to_string()];
        if self.in_place {
            args.push("--in-place".to_string());
        }
        args.push(file.display().to_string());

        Ok(Invocation {
            operation: "decrypt",
            program: self.tool.path().to_path_buf(),
            args,
            env: self.identity_env(),
            file,
        })
    }

    fn require_file(&self) -> Result<PathBuf> {
        self.file
            .clone()
            .ok_or_else(|| CryptoError::InvalidInvocation("no file given").into())
    }

    fn require_recipients(&self) -> Result<()> {
        if self.recipients.is_empty() {
            return Err(CryptoError::InvalidInvocation("no recipients given").into());
        }
        Ok(())
    }

    fn identity_env(&self) -> Vec<(String, String)> {
        self.identity
            .iter()
            .map(|p| (SOPS_AGE_KEY_FILE_ENV.to_string(), p.display().to_string()))
            .collect()
    }
}

/// A complete, validated sops invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    operation: &'static str,
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    file: PathBuf,
}

impl Invocation {
    pub fn program(&self) -> &Path {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }

    /// Run to completion, capturing output.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::Spawn` if sops can't be started and
    /// `CryptoError::ToolFailed` with its combined output if it exits
    /// non-zero.
    pub fn run(&self) -> Result<Output> {
        let output = self
            .to_command()
            .output()
            .map_err(|source| CryptoError::Spawn {
                tool: self.program.display().to_string(),
                source,
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(CryptoError::ToolFailed {
                operation: self.operation,
                file: self.file.clone(),
                output: combined.trim().to_string(),
            }
            .into());
        }

        Ok(output)
    }
}

impl fmt::Display for Invocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.env {
            write!(f, "{}={} ", key, value)?;
        }
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}
