use std::collections::HashSet;

use super::normalize_email;
use super::store::{SharingStore, StoreError};

/// Global product gate, consulted before the authorization gate: is this
/// email allowed to use the product at all, independent of whose data it
/// would see. Read-only; no side effects.
#[derive(Debug, Clone)]
pub struct ApprovalList {
    emails: HashSet<String>,
}

impl ApprovalList {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails.into_iter().map(|e| normalize_email(e.as_ref())).collect(),
        }
    }

    /// Static allow-list membership, case-insensitive exact match.
    pub fn is_allow_listed(&self, email: &str) -> bool {
        self.emails.contains(&normalize_email(email))
    }

    /// Full approval check: on the static list, or granted access by any
    /// owner. A store failure propagates so the caller fails closed.
    pub async fn is_approved(&self, store: &dyn SharingStore, email: &str) -> Result<bool, StoreError> {
        let email = normalize_email(email);
        if self.emails.contains(&email) {
            return Ok(true);
        }
        store.email_has_any_grant(&email).await
    }
}
