//! Single-file commands: encrypt, decrypt and sops-cmd.

use std::io::Write;
use std::path::Path;

use crate::cli::{notice, output, Globals};
use crate::core::workspace::encrypted_regex;
use crate::error::Result;

/// Encrypt one file for the whole team.
pub fn encrypt(
    globals: &Globals,
    file: &Path,
    regex: Option<&str>,
    iregex: Option<&str>,
) -> Result<()> {
    let regex = encrypted_regex(regex, iregex)?;
    let workspace = globals.workspace()?;
    notice::sops_config_warning(workspace.root());

    workspace.encrypt_file(file, regex.as_deref())?;
    output::success(&format!("encrypted {}", output::path(file.display())));
    Ok(())
}

/// Decrypt one file to stdout or in place.
pub fn decrypt(globals: &Globals, file: &Path, in_place: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    let plaintext = workspace.decrypt_file(file, in_place)?;

    if in_place {
        output::success(&format!("decrypted {}", output::path(file.display())));
    } else {
        std::io::stdout().write_all(&plaintext)?;
    }
    Ok(())
}

/// Print or run a sops command with the team environment.
pub fn sops_cmd(globals: &Globals, args: &[String], exec: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    let command = workspace.sops_command(args)?;

    if exec {
        output::dimmed(&format!("executing: {}", command));
        let status = workspace.run_sops_command(&command)?;
        if !status.success() {
            std::process::exit(status.code().unwrap_or(1));
        }
        return Ok(());
    }

    output::header("sops command with team environment");
    output::blank();
    for (key, value) in &command.env {
        output::data(&format!("export {}={}", key, value));
    }
    output::data(&command.to_string());

    let sops = command.program.display().to_string();
    output::blank();
    output::dimmed("# encrypt only password/key fields in .env:");
    output::data(&format!(
        "{} -e --encrypted-regex '^(.*password.*|.*key.*)$' .env",
        sops
    ));
    output::dimmed("# encrypt specific fields in YAML:");
    output::data(&format!(
        "{} -e --encrypted-regex '^(password|secret|key)$' config.yaml",
        sops
    ));
    output::dimmed("# decrypt a file:");
    output::data(&format!("{} -d encrypted-file.yaml", sops));
    Ok(())
}
