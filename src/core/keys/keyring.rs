//! Private key files in the secrets directory.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, trace};

use super::{GeneratedKey, Keygen};
use crate::core::constants::{KEY_BACKUP_SUFFIX, KEY_FILE_PREFIX, KEY_FILE_SUFFIX, KEY_HASH_LEN};
use crate::error::{KeyError, Result};

/// The set of `key-*.txt` files in one secrets directory.
#[derive(Debug, Clone)]
pub struct KeyRing {
    dir: PathBuf,
}

impl KeyRing {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Create the directory with owner-only permissions.
    pub fn ensure_dir(&self) -> Result<()> {
        let store_err = |source| KeyError::Store {
            path: self.dir.clone(),
            source,
        };
        fs::create_dir_all(&self.dir).map_err(store_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.dir, fs::Permissions::from_mode(0o700)).map_err(store_err)?;
        }
        Ok(())
    }

    /// Every key file, sorted by name. Missing directory means no keys.
    pub fn key_files(&self) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.path())
            .filter(|p| p.is_file() && is_key_file_name(p))
            .collect();
        files.sort();
        files
    }

    /// The first key file, used when no specific identity is needed.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::NoKeyFiles` if the directory holds no keys.
    pub fn first(&self) -> Result<PathBuf> {
        self.key_files()
            .into_iter()
            .next()
            .ok_or_else(|| KeyError::NoKeyFiles(self.dir.clone()).into())
    }

    /// Locate the private key file for `public`.
    ///
    /// Derives the public key of each candidate in turn. Candidates that
    /// can't be read or derived are skipped.
    ///
    /// # Errors
    ///
    /// Returns `KeyError::NoPrivateKey` if no candidate matches.
    pub fn find<K: Keygen>(&self, public: &str, keygen: &K) -> Result<PathBuf> {
        for file in self.key_files() {
            match keygen.public_key(&file) {
                Ok(derived) if derived == public => {
                    debug!(path = %file.display(), "found private key");
                    return Ok(file);
                }
                Ok(_) => {}
                Err(e) => trace!(path = %file.display(), error = %e, "skipping key candidate"),
            }
        }
        Err(KeyError::NoPrivateKey(public.to_string()).into())
    }

    /// Persist a generated key under its content-derived name.
    ///
    /// The key is written to a temporary file in the directory first, then
    /// renamed into place.
    pub fn store(&self, key: &GeneratedKey) -> Result<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(key_file_name(&key.private));
        let store_err = |source| KeyError::Store {
            path: path.clone(),
            source,
        };

        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir).map_err(store_err)?;
        tmp.write_all(key.private.as_bytes()).map_err(store_err)?;
        tmp.write_all(b"\n").map_err(store_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tmp.as_file()
                .set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(store_err)?;
        }

        tmp.persist(&path).map_err(|e| store_err(e.error))?;
        debug!(path = %path.display(), "stored private key");
        Ok(path)
    }

    /// Copy a key file to `<path>.backup` with owner-only permissions.
    pub fn backup(&self, key_file: &Path) -> Result<PathBuf> {
        let backup = backup_path(key_file);
        let store_err = |source| KeyError::Store {
            path: backup.clone(),
            source,
        };

        fs::copy(key_file, &backup).map_err(store_err)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&backup, fs::Permissions::from_mode(0o600)).map_err(store_err)?;
        }
        Ok(backup)
    }
}

/// `key-<first 8 hex chars of sha256(private key)>.txt`.
pub fn key_file_name(private: &str) -> String {
    let digest = Sha256::digest(private.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
    format!(
        "{}{}{}",
        KEY_FILE_PREFIX,
        &hex[..KEY_HASH_LEN],
        KEY_FILE_SUFFIX
    )
}

fn backup_path(key_file: &Path) -> PathBuf {
    let mut name = key_file.as_os_str().to_os_string();
    name.push(KEY_BACKUP_SUFFIX);
    PathBuf::from(name)
}

fn is_key_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(KEY_FILE_PREFIX) && n.ends_with(KEY_FILE_SUFFIX))
}
