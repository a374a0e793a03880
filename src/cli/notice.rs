//! Notices about an existing `.sops.yaml`.

use std::path::Path;

use crate::cli::output;
use crate::core::sops::SopsConfig;

/// Warn about a `.sops.yaml` that may override team recipients.
pub fn sops_config_warning(root: &Path) {
    let Some(config) = SopsConfig::detect(root) else {
        return;
    };
    if !config.may_conflict() {
        return;
    }

    output::warn(&format!(
        "detected existing {}",
        output::path(config.path.display())
    ));
    for concern in config.concerns() {
        output::list_item(concern);
    }
    output::dimmed("options:");
    for option in SopsConfig::options() {
        output::list_item(option);
    }
}

/// Describe a `.sops.yaml` and how to use it alongside team management.
pub fn sops_config_summary(root: &Path) {
    let Some(config) = SopsConfig::detect(root) else {
        output::kv("sops config:", "none");
        return;
    };

    output::kv("sops config:", config.path.display());
    let yes_no = |b: bool| if b { "yes" } else { "no" };
    output::kv("  creation rules:", yes_no(config.has_creation_rules));
    output::kv("  age keys:", yes_no(config.has_age_keys));
    output::kv("  kms keys:", yes_no(config.has_kms_keys));
    output::kv("  pgp keys:", yes_no(config.has_pgp_keys));

    output::blank();
    output::dimmed("coexistence:");
    for advice in SopsConfig::coexistence_advice() {
        output::list_item(advice);
    }
}
