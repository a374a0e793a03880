//! Command-line interface.

pub mod apply;
pub mod check;
pub mod completions;
pub mod files;
pub mod init;
pub mod member;
pub mod notice;
pub mod output;
pub mod rotate;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::core::tool::ToolPath;
use crate::core::workspace::Workspace;
use crate::error::Result;

/// sistry - team access and key rotation for sops-encrypted files.
#[derive(Parser)]
#[command(
    name = "sistry",
    about = "Team access and key rotation for sops-encrypted files",
    version
)]
pub struct Cli {
    #[command(flatten)]
    pub globals: Globals,

    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct Globals {
    /// Path to the sops binary
    #[arg(long, global = true, env = "SOPSISTRY_SOPS_PATH", default_value = "sops")]
    pub sops_path: String,

    /// Path to the age-keygen binary
    #[arg(
        long,
        global = true,
        env = "SOPSISTRY_AGE_KEYGEN_PATH",
        default_value = "age-keygen"
    )]
    pub age_keygen_path: String,

    /// Act as this member instead of the OS user
    #[arg(long, global = true, env = "SOPSISTRY_USER_ID")]
    pub user: Option<String>,

    /// Verbose output and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

impl Globals {
    /// Workspace rooted at the current directory.
    pub fn workspace(&self) -> Result<Workspace> {
        let root = std::env::current_dir()?;
        self.workspace_at(root)
    }

    pub fn workspace_at(&self, root: PathBuf) -> Result<Workspace> {
        let sops = ToolPath::sops(&self.sops_path)?;
        let age_keygen = ToolPath::age_keygen(&self.age_keygen_path)?;
        Ok(Workspace::with_tools(root, sops, age_keygen))
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Initialize team management in the current directory
    Init {
        /// Overwrite an existing sopsistry.yaml
        #[arg(short, long)]
        force: bool,
    },

    /// Show the actions needed to match the manifest
    Plan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encrypt and re-encrypt files to match the manifest
    Apply {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
        /// Skip the clean git working tree check
        #[arg(short, long)]
        force: bool,
        /// Don't require a clean git working tree
        #[arg(long)]
        no_require_clean_git: bool,
    },

    /// Add a team member
    #[command(visible_alias = "add")]
    AddMember {
        /// Member ID
        id: String,
        /// age public key (age1...)
        #[arg(short, long)]
        key: String,
    },

    /// Remove a team member
    #[command(visible_alias = "rm")]
    RemoveMember {
        /// Member ID
        id: String,
    },

    /// List team members and scopes
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Encrypt a single file for the whole team
    Encrypt {
        /// File to encrypt
        file: PathBuf,
        /// Only encrypt keys matching this regex
        #[arg(long, conflicts_with = "iregex")]
        regex: Option<String>,
        /// Only encrypt keys matching this regex, case-insensitively
        #[arg(long)]
        iregex: Option<String>,
    },

    /// Decrypt a single file with your local key
    Decrypt {
        /// File to decrypt
        file: PathBuf,
        /// Decrypt in place instead of printing
        #[arg(long)]
        in_place: bool,
    },

    /// Rotate your key and re-encrypt every managed file
    #[command(visible_alias = "rot")]
    RotateKey {
        /// Rotate even if the key has expired
        #[arg(short, long)]
        force: bool,
    },

    /// Check tools, key ages and sops configuration
    Check,

    /// Show or run a sops command with the team environment
    SopsCmd {
        /// Run the command instead of printing it
        #[arg(long)]
        exec: bool,
        /// Arguments passed to sops
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command, globals: &Globals) -> Result<()> {
    use Command::*;

    match command {
        Init { force } => init::execute(globals, force),
        Plan { json } => apply::plan(globals, json),
        Apply {
            yes,
            force,
            no_require_clean_git,
        } => apply::apply(globals, yes, !(force || no_require_clean_git)),
        AddMember { id, key } => member::add(globals, &id, &key),
        RemoveMember { id } => member::remove(globals, &id),
        List { json } => member::list(globals, json),
        Encrypt {
            file,
            regex,
            iregex,
        } => files::encrypt(globals, &file, regex.as_deref(), iregex.as_deref()),
        Decrypt { file, in_place } => files::decrypt(globals, &file, in_place),
        RotateKey { force } => rotate::execute(globals, force),
        Check => check::execute(globals),
        SopsCmd { exec, args } => files::sops_cmd(globals, &args, exec),
        Completions { shell } => completions::execute(shell),
    }
}
