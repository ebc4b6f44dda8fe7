use std::sync::Arc;

use chrono::Utc;
use tracing::info;
use uuid::Uuid;

use crate::database::manager::DatabaseManager;

use super::store::{PgSharingStore, SharingStore};
use super::{normalize_email, validate_email, AccessGrant, AccessLevel, SharingError};

/// Owner-side CRUD over access grants.
///
/// The owner-only precondition (caller must be the configured primary owner)
/// is enforced by the authorization gate before any of these operations run.
pub struct AccessRegistry {
    store: Arc<dyn SharingStore>,
}

impl AccessRegistry {
    /// Registry over the service role: grant bookkeeping crosses ownership
    /// boundaries, so it cannot run under row-level security.
    pub async fn new() -> Result<Self, SharingError> {
        let pool = DatabaseManager::service_pool().await?;
        Ok(Self { store: Arc::new(PgSharingStore::new(pool)) })
    }

    pub fn with_store(store: Arc<dyn SharingStore>) -> Self {
        Self { store }
    }

    /// All grants the owner has issued; empty when none exist yet.
    pub async fn list_grants(&self, owner_id: Uuid) -> Result<Vec<AccessGrant>, SharingError> {
        Ok(self.store.grants_for_owner(owner_id).await?)
    }

    /// Grant or re-grant access for an email. Re-granting an existing email
    /// updates its level and timestamp in place; it never duplicates the
    /// entry and keeps an already-resolved principal id.
    pub async fn grant(
        &self,
        owner_id: Uuid,
        email: &str,
        access_level: AccessLevel,
    ) -> Result<AccessGrant, SharingError> {
        let email = normalize_email(email);
        validate_email(&email)?;

        let grant = AccessGrant {
            owner_id,
            email,
            principal_id: None,
            access_level,
            granted_at: Utc::now(),
        };
        let stored = self.store.upsert_grant(&grant).await?;

        info!(owner = %owner_id, email = %stored.email, level = stored.access_level.as_str(), "access granted");
        Ok(stored)
    }

    /// Revoke the grant matching this email. When the grant was already
    /// resolved, the delegate's delegation pointer is cleared in the same
    /// operation so no dangling pointer survives. Revoking an email with no
    /// grant is a no-op, so responses cannot reveal which grants exist.
    pub async fn revoke(&self, owner_id: Uuid, email: &str) -> Result<Option<AccessGrant>, SharingError> {
        let email = normalize_email(email);

        let deleted = self.store.delete_grant(owner_id, &email).await?;
        if let Some(grant) = &deleted {
            if let Some(principal_id) = grant.principal_id {
                self.store.clear_delegation_pointer(principal_id, owner_id).await?;
            }
            info!(owner = %owner_id, email = %grant.email, "access revoked");
        }
        Ok(deleted)
    }
}
