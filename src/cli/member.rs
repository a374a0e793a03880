//! Team membership commands.

use chrono::Utc;
use serde_json::json;

use crate::cli::{output, Globals};
use crate::core::domain::KeyStatus;
use crate::error::Result;

/// Add a member.
pub fn add(globals: &Globals, id: &str, key: &str) -> Result<()> {
    let workspace = globals.workspace()?;
    let member = workspace.add_member(id, key)?;

    output::success(&format!("added {}", member.id));
    output::kv("key:", output::key(&member.short_key()));
    output::hint(&format!(
        "run: {} to grant access to existing files",
        output::cmd("sistry apply")
    ));
    Ok(())
}

/// Remove a member.
pub fn remove(globals: &Globals, id: &str) -> Result<()> {
    let workspace = globals.workspace()?;
    let member = workspace.remove_member(id)?;

    output::success(&format!("removed {}", member.id));
    output::hint(&format!(
        "run: {} to revoke access to existing files",
        output::cmd("sistry apply")
    ));
    Ok(())
}

/// List members and scopes.
pub fn list(globals: &Globals, json: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    let manifest = workspace.manifest()?;

    if json {
        let value = json!({
            "members": manifest.members,
            "scopes": manifest.scopes,
        });
        output::data(&serde_json::to_string_pretty(&value)?);
        return Ok(());
    }

    let now = Utc::now();
    let max_days = manifest.settings.effective_max_key_age_days();

    output::section(&format!("Members ({})", manifest.members.len()));
    if manifest.members.is_empty() {
        output::dimmed("  no members");
    }
    for member in &manifest.members {
        let status = KeyStatus::classify(member.created, max_days, now);
        let status = match status {
            KeyStatus::Ok { .. } => console::style(status.to_string()).dim(),
            KeyStatus::Warning { .. } => console::style(status.to_string()).yellow(),
            KeyStatus::Expired { .. } => console::style(status.to_string()).red(),
        };
        println!(
            "  {}  {}  {}",
            console::style(&member.id).bold(),
            output::key(&member.short_key()),
            status
        );
    }

    output::section(&format!("Scopes ({})", manifest.scopes.len()));
    for scope in &manifest.scopes {
        output::header(&format!("  {}", scope.name));
        output::kv(
            "  patterns:",
            if scope.patterns.is_empty() {
                "-".to_string()
            } else {
                scope.patterns.join(", ")
            },
        );
        let members: Vec<&str> = scope.members.iter().map(|m| m.as_str()).collect();
        output::kv(
            "  members: ",
            if members.is_empty() {
                "-".to_string()
            } else {
                members.join(", ")
            },
        );
    }
    Ok(())
}
