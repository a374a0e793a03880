//! Acting identity resolution.

use tracing::debug;

use crate::core::constants::FALLBACK_MEMBER_ID;
use crate::core::domain::MemberId;
use crate::error::Result;

/// Resolve the member ID of whoever is running the command.
///
/// An explicit override wins. Otherwise the OS user name is used, and `me`
/// when that is empty.
///
/// # Errors
///
/// Returns a validation error if the chosen ID contains whitespace.
pub fn resolve_member_id(override_id: Option<&str>) -> Result<MemberId> {
    let id = match override_id.map(str::trim).filter(|s| !s.is_empty()) {
        Some(id) => id.to_string(),
        None => os_user(),
    };
    debug!(id = %id, "resolved acting identity");
    Ok(MemberId::new(&id)?)
}

fn os_user() -> String {
    let name = whoami::username();
    if name.trim().is_empty() {
        FALLBACK_MEMBER_ID.to_string()
    } else {
        name
    }
}
