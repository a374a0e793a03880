//! Domain types.

pub mod expiry;
mod member;
mod plan;
mod scope;

pub use expiry::{ExpiryReport, KeyStatus, MemberKeyStatus};
pub use member::{Member, MemberId};
pub use plan::{Action, ActionKind, Plan};
pub use scope::{validate_scope_name, Scope};
