//! Constants used throughout sopsistry.
//!
//! Centralizes file names, tool names and policy values.

/// Manifest file name (sopsistry.yaml).
pub const MANIFEST_FILE: &str = "sopsistry.yaml";

/// Directory holding team members' private age keys.
pub const SECRETS_DIR: &str = ".secrets";

/// Private key files in the secrets directory are named `key-<hash>.txt`.
pub const KEY_FILE_PREFIX: &str = "key-";

/// Extension for private key files.
pub const KEY_FILE_SUFFIX: &str = ".txt";

/// Number of hex characters of the private key hash used in key file names.
pub const KEY_HASH_LEN: usize = 8;

/// Suffix for the private key backup taken during rotation.
pub const KEY_BACKUP_SUFFIX: &str = ".backup";

/// Prefix for the per-apply backup directory.
pub const BACKUP_DIR_PREFIX: &str = ".sopsistry-backup-";

/// Default encryption tool binary.
pub const SOPS_BINARY: &str = "sops";

/// Default key generation tool binary.
pub const AGE_KEYGEN_BINARY: &str = "age-keygen";

/// Environment variable sops reads the recipient list from.
pub const SOPS_AGE_RECIPIENTS_ENV: &str = "SOPS_AGE_RECIPIENTS";

/// Environment variable sops reads the private key file path from.
pub const SOPS_AGE_KEY_FILE_ENV: &str = "SOPS_AGE_KEY_FILE";

/// Floor (and default) for the maximum key age policy, in days.
pub const DEFAULT_MAX_KEY_AGE_DAYS: u32 = 180;

/// Keys this close to expiry are reported as warnings, in days.
pub const EXPIRY_WARNING_DAYS: i64 = 14;

/// Informational sops version written to new manifests.
pub const DEFAULT_SOPS_VERSION: &str = "3.8.0";

/// Scope that new members are added to.
pub const DEFAULT_SCOPE: &str = "default";

/// Patterns of the default scope created by `init`.
pub const DEFAULT_PATTERNS: &[&str] = &["*.sops.yaml", "*.sops.json", "secrets/*"];

/// Member ID used when the operating system reports no user name.
pub const FALLBACK_MEMBER_ID: &str = "me";

/// Gitignore entries that keep private keys out of version control.
pub const GITIGNORE_ENTRIES: &[&str] = &[".secrets"];

/// Lines already in a .gitignore that count as ignoring the secrets directory.
pub const GITIGNORE_EQUIVALENTS: &[&str] = &[".secrets", ".secrets/", "/.secrets", "/.secrets/"];

/// Substrings whose presence marks a file as already sops-encrypted.
pub const ENCRYPTION_MARKERS: &[&str] = &["sops:", "\"sops\"", "lastmodified", "mac"];
