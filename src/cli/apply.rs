//! Plan and apply commands.

use dialoguer::Confirm;

use crate::cli::{output, Globals};
use crate::core::domain::{ActionKind, Plan};
use crate::error::Result;

/// Show the actions needed to match the manifest.
pub fn plan(globals: &Globals, json: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    let plan = workspace.plan()?;

    if json {
        output::data(&serde_json::to_string_pretty(&plan)?);
        return Ok(());
    }

    print_plan(&plan);
    if plan.pending() > 0 {
        output::blank();
        output::hint(&format!("run: {}", output::cmd("sistry apply")));
    }
    Ok(())
}

/// Compute the plan, confirm, and execute it.
pub fn apply(globals: &Globals, yes: bool, require_clean_git: bool) -> Result<()> {
    let workspace = globals.workspace()?;
    if require_clean_git {
        workspace.ensure_clean()?;
    }

    let plan = workspace.plan()?;
    print_plan(&plan);
    if plan.pending() == 0 {
        return Ok(());
    }

    if !yes {
        output::blank();
        let confirmed = Confirm::new()
            .with_prompt(format!("apply {} changes?", plan.pending()))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirmed {
            output::dimmed("cancelled");
            return Ok(());
        }
    }

    let report = workspace.execute(&plan, globals.user())?;
    output::blank();
    output::success(&format!(
        "applied {} changes ({} encrypted, {} re-encrypted, {} skipped)",
        report.changed(),
        report.encrypted,
        report.reencrypted,
        report.skipped
    ));
    Ok(())
}

fn print_plan(plan: &Plan) {
    if plan.is_empty() {
        output::dimmed("no files match any scope");
        return;
    }

    output::header("Plan");
    output::rule();
    for action in plan.iter() {
        let marker = match action.kind {
            ActionKind::Encrypt => console::style(action.kind.symbol()).green(),
            ActionKind::Reencrypt => console::style(action.kind.symbol()).yellow(),
            ActionKind::Skip => console::style(action.kind.symbol()).dim(),
        };
        println!(
            "  {} {}  {}",
            marker,
            output::path(action.file.display()),
            console::style(format!("[{}] {}", action.scope, action.description)).dim()
        );
    }
    output::rule();
    output::data(&format!(
        "{} to encrypt, {} to re-encrypt, {} skipped",
        plan.count(ActionKind::Encrypt),
        plan.count(ActionKind::Reencrypt),
        plan.count(ActionKind::Skip)
    ));
}
