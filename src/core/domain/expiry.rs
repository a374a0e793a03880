//! Key expiry types.
//!
//! Read-only classification of member key ages against the manifest's
//! key-age policy. Used by `check` and as the warning step of rotation.

use std::fmt;

use chrono::{DateTime, Duration, Utc};

use crate::core::constants::EXPIRY_WARNING_DAYS;
use crate::core::domain::{Member, MemberId};
use crate::core::manifest::Manifest;

/// Age status of one key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// Within policy; `age_days` old.
    Ok { age_days: i64 },
    /// Inside the warning window; expires in `days_left` days.
    Warning { days_left: i64 },
    /// Past the maximum age by `days_over` days.
    Expired { days_over: i64 },
}

impl KeyStatus {
    /// Classify a key created at `created` against `max_age_days` at `now`.
    ///
    /// `age > max` is expired, `max - 14d < age <= max` is a warning,
    /// anything younger is ok. Day counts are truncated to whole days.
    pub fn classify(created: DateTime<Utc>, max_age_days: i64, now: DateTime<Utc>) -> Self {
        let age = now.signed_duration_since(created);
        let max_age = Duration::days(max_age_days);
        let warning_threshold = max_age - Duration::days(EXPIRY_WARNING_DAYS);

        if age > max_age {
            KeyStatus::Expired {
                days_over: (age - max_age).num_days(),
            }
        } else if age > warning_threshold {
            KeyStatus::Warning {
                days_left: (max_age - age).num_days(),
            }
        } else {
            KeyStatus::Ok {
                age_days: age.num_days(),
            }
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, KeyStatus::Expired { .. })
    }

    pub fn is_warning(&self) -> bool {
        matches!(self, KeyStatus::Warning { .. })
    }
}

impl fmt::Display for KeyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyStatus::Ok { age_days } => write!(f, "key is {} days old", age_days),
            KeyStatus::Warning { days_left } => write!(f, "expires in {} days", days_left),
            KeyStatus::Expired { days_over } => write!(f, "expired {} days ago", days_over),
        }
    }
}

/// Status of a single member's key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberKeyStatus {
    pub id: MemberId,
    pub created: DateTime<Utc>,
    pub status: KeyStatus,
}

/// Key statuses for a whole team.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpiryReport {
    pub max_age_days: i64,
    pub members: Vec<MemberKeyStatus>,
}

impl ExpiryReport {
    pub fn expired(&self) -> usize {
        self.members.iter().filter(|m| m.status.is_expired()).count()
    }

    pub fn warnings(&self) -> usize {
        self.members.iter().filter(|m| m.status.is_warning()).count()
    }

    pub fn is_healthy(&self) -> bool {
        self.expired() == 0 && self.warnings() == 0
    }
}

/// Classify one member against the manifest's effective policy.
pub fn member_status(member: &Member, max_age_days: i64, now: DateTime<Utc>) -> MemberKeyStatus {
    MemberKeyStatus {
        id: member.id.clone(),
        created: member.created,
        status: KeyStatus::classify(member.created, max_age_days, now),
    }
}

/// Classify every member's key. Never mutates anything.
pub fn audit(manifest: &Manifest, now: DateTime<Utc>) -> ExpiryReport {
    let max_age_days = manifest.settings.effective_max_key_age_days();
    ExpiryReport {
        max_age_days,
        members: manifest
            .members
            .iter()
            .map(|m| member_status(m, max_age_days, now))
            .collect(),
    }
}
