//! Init command.

use crate::cli::{notice, output, Globals};
use crate::core::constants::{MANIFEST_FILE, SECRETS_DIR};
use crate::error::Result;

/// Initialize team management in the current directory.
pub fn execute(globals: &Globals, force: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    notice::sops_config_warning(workspace.root());

    let report = workspace.init(force, globals.user())?;

    output::success(&format!("initialized {}", output::path(MANIFEST_FILE)));
    output::kv("member:", &report.member);
    output::kv("public key:", output::key(&report.public_key));
    if report.generated {
        output::kv("private key:", output::path(report.key_file.display()));
    } else {
        output::kv(
            "private key:",
            format!("{} (existing)", output::path(report.key_file.display())),
        );
    }
    if report.gitignore_updated {
        output::dimmed(&format!("  added {} to .gitignore", SECRETS_DIR));
    }

    output::blank();
    output::hint(&format!(
        "share your public key with the team, then run: {}",
        output::cmd("sistry apply")
    ));
    Ok(())
}
