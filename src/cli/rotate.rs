//! Key rotation command.
//!
//! Replace your key pair and re-encrypt every managed file for the new key.

use crate::cli::{output, Globals};
use crate::error::Result;

/// Rotate the acting member's key.
pub fn execute(globals: &Globals, force: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    output::section("Key Rotation");

    let rotation = workspace.rotate_key(globals.user(), force)?;

    output::success(&format!("rotated key for {}", rotation.member));
    output::kv("old key:", output::key(&rotation.old_public));
    output::kv("new key:", output::key(&rotation.new_public));
    output::kv("private key:", output::path(rotation.key_file.display()));
    output::kv(
        "files:",
        format!(
            "{} re-encrypted, {} encrypted, {} skipped",
            rotation.report.reencrypted, rotation.report.encrypted, rotation.report.skipped
        ),
    );
    output::blank();
    output::hint("commit sopsistry.yaml and the re-encrypted files");
    Ok(())
}
