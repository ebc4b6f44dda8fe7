use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::database::manager::DatabaseManager;

use super::store::{PgSharingStore, SharingStore, StoreError};
use super::{normalize_email, AccessGrant, SharingError};

/// Turns pending (email-only) grants into resolved ones at login time.
pub struct GrantResolver {
    store: Arc<dyn SharingStore>,
}

impl GrantResolver {
    pub async fn new() -> Result<Self, SharingError> {
        let pool = DatabaseManager::service_pool().await?;
        Ok(Self { store: Arc::new(PgSharingStore::new(pool)) })
    }

    pub fn with_store(store: Arc<dyn SharingStore>) -> Self {
        Self { store }
    }

    /// Login-completed hook, invoked once per successful authentication.
    ///
    /// Every pending grant matching the email gets its principal id filled
    /// in, and the delegate's own profile gets its delegation pointer set to
    /// the granting owner. When several owners granted the same email, all
    /// grants resolve and the last pointer write wins. A failure against one
    /// owner is logged and does not abort the remaining matches; only the
    /// initial scan failing surfaces to the caller.
    ///
    /// Idempotent: a second run for the same login finds no unresolved
    /// matches and leaves state unchanged.
    pub async fn resolve_pending_grants(&self, principal_id: Uuid, email: &str) -> Result<(), SharingError> {
        let email = normalize_email(email);
        let pending = self.store.pending_grants_for_email(&email).await?;
        if pending.is_empty() {
            return Ok(());
        }

        for grant in &pending {
            match self.resolve_one(grant, principal_id, &email).await {
                Ok(()) => {
                    info!(owner = %grant.owner_id, principal = %principal_id, "resolved pending access grant");
                }
                Err(err) => {
                    warn!(owner = %grant.owner_id, principal = %principal_id, error = %err,
                        "failed to resolve pending grant, continuing with remaining owners");
                }
            }
        }
        Ok(())
    }

    async fn resolve_one(&self, grant: &AccessGrant, principal_id: Uuid, email: &str) -> Result<(), StoreError> {
        self.store.resolve_grant(grant.owner_id, email, principal_id).await?;
        self.store.set_delegation_pointer(principal_id, grant.owner_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing::registry::AccessRegistry;
    use crate::sharing::AccessLevel;
    use crate::testing::MemorySharingStore;

    fn fixture() -> (Arc<MemorySharingStore>, AccessRegistry, GrantResolver) {
        let store = Arc::new(MemorySharingStore::new());
        let registry = AccessRegistry::with_store(store.clone());
        let resolver = GrantResolver::with_store(store.clone());
        (store, registry, resolver)
    }

    #[tokio::test]
    async fn resolves_pending_grant_and_sets_pointer() {
        let (store, registry, resolver) = fixture();
        let owner = Uuid::new_v4();
        let delegate = Uuid::new_v4();

        registry.grant(owner, "assistant@example.com", AccessLevel::Read).await.unwrap();
        resolver.resolve_pending_grants(delegate, "assistant@example.com").await.unwrap();

        let grants = registry.list_grants(owner).await.unwrap();
        assert_eq!(grants.len(), 1);
        assert_eq!(grants[0].principal_id, Some(delegate));
        assert_eq!(store.delegation_pointer(delegate).await.unwrap(), Some(owner));
    }

    #[tokio::test]
    async fn resolution_matches_case_insensitively() {
        let (store, registry, resolver) = fixture();
        let owner = Uuid::new_v4();
        let delegate = Uuid::new_v4();

        registry.grant(owner, "Assistant@Example.com", AccessLevel::Write).await.unwrap();
        resolver.resolve_pending_grants(delegate, "ASSISTANT@example.COM").await.unwrap();

        let grants = registry.list_grants(owner).await.unwrap();
        assert_eq!(grants[0].principal_id, Some(delegate));
        assert_eq!(store.delegation_pointer(delegate).await.unwrap(), Some(owner));
    }

    #[tokio::test]
    async fn resolution_is_idempotent_under_relogin() {
        let (store, registry, resolver) = fixture();
        let owner = Uuid::new_v4();
        let delegate = Uuid::new_v4();

        registry.grant(owner, "assistant@example.com", AccessLevel::Read).await.unwrap();
        resolver.resolve_pending_grants(delegate, "assistant@example.com").await.unwrap();
        let after_first = registry.list_grants(owner).await.unwrap();

        resolver.resolve_pending_grants(delegate, "assistant@example.com").await.unwrap();
        let after_second = registry.list_grants(owner).await.unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(store.delegation_pointer(delegate).await.unwrap(), Some(owner));
    }

    #[tokio::test]
    async fn multiple_owners_all_resolve_last_pointer_wins() {
        let (store, registry, resolver) = fixture();
        let owner_a = Uuid::new_v4();
        let owner_b = Uuid::new_v4();
        let delegate = Uuid::new_v4();

        registry.grant(owner_a, "assistant@example.com", AccessLevel::Read).await.unwrap();
        registry.grant(owner_b, "assistant@example.com", AccessLevel::Read).await.unwrap();
        resolver.resolve_pending_grants(delegate, "assistant@example.com").await.unwrap();

        assert_eq!(registry.list_grants(owner_a).await.unwrap()[0].principal_id, Some(delegate));
        assert_eq!(registry.list_grants(owner_b).await.unwrap()[0].principal_id, Some(delegate));
        // Both grants resolved; the pointer holds whichever owner was
        // processed last.
        let pointer = store.delegation_pointer(delegate).await.unwrap();
        assert!(pointer == Some(owner_a) || pointer == Some(owner_b));
    }

    #[tokio::test]
    async fn no_pending_grants_is_a_quiet_no_op() {
        let (_store, _registry, resolver) = fixture();
        resolver
            .resolve_pending_grants(Uuid::new_v4(), "nobody@example.com")
            .await
            .unwrap();
    }
}
