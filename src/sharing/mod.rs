//! Shared-access authorization core.
//!
//! Decides whose data an authenticated principal may read or write. An owner
//! grants delegated access by email; the grant stays pending until the
//! delegate's first login resolves it to a principal id; the owner can revoke
//! it at any time. The [`gate::AuthorizationGate`] is the single choke point
//! every data-access path goes through.

pub mod approval;
pub mod gate;
pub mod registry;
pub mod resolver;
pub mod store;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use store::StoreError;

/// Ordered access level carried by a grant. Ordering is by declaration:
/// `Read < Write < Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Read,
    Write,
    Admin,
}

impl AccessLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessLevel::Read => "read",
            AccessLevel::Write => "write",
            AccessLevel::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "read" => Some(AccessLevel::Read),
            "write" => Some(AccessLevel::Write),
            "admin" => Some(AccessLevel::Admin),
            _ => None,
        }
    }

    /// Numeric rank used for level comparisons: read=1 < write=2 < admin=3.
    pub fn rank(self) -> u8 {
        match self {
            AccessLevel::Read => 1,
            AccessLevel::Write => 2,
            AccessLevel::Admin => 3,
        }
    }

    /// Whether this level satisfies a required level.
    pub fn satisfies(self, required: AccessLevel) -> bool {
        self.rank() >= required.rank()
    }
}

impl Default for AccessLevel {
    fn default() -> Self {
        AccessLevel::Read
    }
}

/// One delegate's permission on an owner's data.
///
/// `principal_id` stays `None` from the grant action until the delegate's
/// first login resolves it. The durable key before resolution is the
/// lower-cased email; at most one grant exists per (owner, email).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessGrant {
    pub owner_id: Uuid,
    pub email: String,
    pub principal_id: Option<Uuid>,
    pub access_level: AccessLevel,
    pub granted_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn is_pending(&self) -> bool {
        self.principal_id.is_none()
    }
}

#[derive(Debug, Error)]
pub enum SharingError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    InvalidEmail(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Database(#[from] DatabaseError),
}

impl SharingError {
    /// The one message every denied sharing operation returns. Responses must
    /// not reveal whether the target resource or grant exists.
    pub fn forbidden() -> Self {
        SharingError::Forbidden("Access denied".to_string())
    }
}

/// Canonical email form used everywhere: trimmed and lower-cased. The
/// original system lower-cased on some paths and matched case-sensitively on
/// the login-resolution path; one rule is applied uniformly here.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Minimal shape check for emails accepted into grants.
pub fn validate_email(email: &str) -> Result<(), SharingError> {
    let ok = email.len() <= 254
        && email.split_once('@').is_some_and(|(local, domain)| {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        });
    if ok {
        Ok(())
    } else {
        Err(SharingError::InvalidEmail(format!("Invalid email address: {email}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_levels_are_ordered() {
        assert!(AccessLevel::Read < AccessLevel::Write);
        assert!(AccessLevel::Write < AccessLevel::Admin);
        assert!(AccessLevel::Admin.satisfies(AccessLevel::Read));
        assert!(AccessLevel::Admin.satisfies(AccessLevel::Write));
        assert!(!AccessLevel::Read.satisfies(AccessLevel::Write));
        assert!(AccessLevel::Read.satisfies(AccessLevel::Read));
    }

    #[test]
    fn access_level_round_trips_as_text() {
        for level in [AccessLevel::Read, AccessLevel::Write, AccessLevel::Admin] {
            assert_eq!(AccessLevel::parse(level.as_str()), Some(level));
        }
        assert_eq!(AccessLevel::parse("root"), None);
    }

    #[test]
    fn email_normalization_lowercases_and_trims() {
        assert_eq!(normalize_email("  Assistant@Example.COM "), "assistant@example.com");
    }

    #[test]
    fn email_validation_rejects_garbage() {
        assert!(validate_email("assistant@example.com").is_ok());
        assert!(validate_email("").is_err());
        assert!(validate_email("no-at-sign").is_err());
        assert!(validate_email("@example.com").is_err());
        assert!(validate_email("user@.com").is_err());
    }
}
