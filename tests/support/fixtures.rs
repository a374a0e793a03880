//! Test fixtures and constants.

use chrono::{DateTime, Duration, Utc};

use sopsistry::core::domain::{Member, MemberId, Scope};
use sopsistry::core::manifest::Manifest;

/// A valid age public key for testing team operations.
pub const BOB_PUBLIC_KEY: &str = "age1ql3z7hjy54pw3hyww5ayyfg7zqgvc7w3j2elw8zmrj2kg5sfn9aqmcac8p";

/// An invalid public key for negative tests.
pub const INVALID_PUBLIC_KEY: &str = "not-a-valid-age-key";

/// Plaintext YAML secrets. Free of anything that looks like sops metadata.
pub const PLAIN_YAML: &str = "database:\n  user: app\n  password: hunter2\n";

/// Plaintext JSON secrets.
pub const PLAIN_JSON: &str = "{\"api_token\": \"tok-12345\"}\n";

pub fn id(s: &str) -> MemberId {
    MemberId::new(s).unwrap()
}

/// A fresh random age recipient.
pub fn recipient() -> String {
    age::x25519::Identity::generate().to_public().to_string()
}

pub fn days_ago(days: i64) -> DateTime<Utc> {
    Utc::now() - Duration::days(days)
}

/// Manifest with the given members (fresh keys) and scopes.
pub fn manifest_with(members: &[&str], scopes: Vec<Scope>) -> Manifest {
    let mut manifest = Manifest {
        scopes,
        ..Manifest::default()
    };
    for m in members {
        manifest.members.push(Member::new(id(m), recipient(), Utc::now()));
    }
    manifest
}

pub fn scope(name: &str, patterns: &[&str], members: &[&str]) -> Scope {
    Scope::new(name)
        .with_patterns(patterns.iter().copied())
        .with_members(members.iter().map(|m| id(m)))
}
