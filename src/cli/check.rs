//! Check command.
//!
//! Reports tool availability, key ages against the rotation policy, and any
//! existing sops configuration. With `--verbose`, also shows where each
//! member's private key lives on this machine.

use chrono::Utc;

use crate::cli::{notice, output, Globals};
use crate::core::domain::KeyStatus;
use crate::core::tool::ToolPath;
use crate::error::Result;

/// Run all checks.
pub fn execute(globals: &Globals) -> Result<()> {
    let workspace = globals.workspace()?;

    output::section("Tools");
    let sops = ToolPath::sops(&globals.sops_path)?;
    let keygen = ToolPath::age_keygen(&globals.age_keygen_path)?;
    for tool in [&sops, &keygen] {
        match tool.ensure_available() {
            Ok(()) => output::success(&format!("{} found", tool)),
            Err(e) => output::warn(&e.to_string()),
        }
    }

    let report = workspace.check_expiry(Utc::now())?;
    output::section(&format!("Keys (max age {} days)", report.max_age_days));
    for member in &report.members {
        let line = format!("{}: {}", member.id, member.status);
        match member.status {
            KeyStatus::Ok { .. } => output::success(&line),
            KeyStatus::Warning { .. } => output::warn(&line),
            KeyStatus::Expired { .. } => output::error(&line),
        }
    }

    if globals.verbose {
        output::section("Key files");
        for location in workspace.key_locations()? {
            let file = match &location.key_file {
                Some(path) => output::path(path.display()),
                None => "not found".to_string(),
            };
            output::kv(&format!("{}:", location.member), file);
        }
    }

    output::section("sops configuration");
    notice::sops_config_summary(workspace.root());

    output::blank();
    if report.is_healthy() {
        output::success("all keys are within policy");
    } else {
        if report.expired() > 0 {
            output::warn(&format!("{} expired keys", report.expired()));
        }
        if report.warnings() > 0 {
            output::warn(&format!("{} keys expiring soon", report.warnings()));
        }
        output::hint(&format!(
            "each affected member should run: {}",
            output::cmd("sistry rotate-key")
        ));
    }
    Ok(())
}
