use std::sync::Arc;

use uuid::Uuid;

use crate::config::SharingConfig;
use crate::database::context::DatabaseContext;
use crate::database::manager::{DatabaseManager, DatabaseRole};
use crate::middleware::auth::AuthUser;

use super::approval::ApprovalList;
use super::store::{PgSharingStore, SharingStore};
use super::{normalize_email, AccessLevel, SharingError};

/// Which database role serves a principal's data requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextKind {
    /// The primary owner: application role, row-level security enforced.
    OwnerScoped,
    /// An approved delegate: service role, row-level security bypassed.
    /// Delegates own no rows, so ownership policies can never match for
    /// them; on this path the gate is the sole remaining guard.
    ServiceDelegate,
}

/// Single choke point every data-access path calls before touching a domain
/// table. Resolves the effective data-owner id for the authenticated
/// principal and hands out the matching database context.
pub struct AuthorizationGate {
    store: Arc<dyn SharingStore>,
    approval: ApprovalList,
    primary_owner_id: Uuid,
    primary_owner_email: String,
}

impl AuthorizationGate {
    pub async fn new() -> Result<Self, SharingError> {
        let pool = DatabaseManager::service_pool().await?;
        Ok(Self::with_store(
            Arc::new(PgSharingStore::new(pool)),
            &crate::config::config().sharing,
        ))
    }

    pub fn with_store(store: Arc<dyn SharingStore>, sharing: &SharingConfig) -> Self {
        Self {
            store,
            approval: ApprovalList::new(&sharing.approved_emails),
            primary_owner_id: sharing.primary_owner_id,
            primary_owner_email: normalize_email(&sharing.primary_owner_email),
        }
    }

    pub fn is_primary_owner(&self, auth: &AuthUser) -> bool {
        !self.primary_owner_email.is_empty()
            && normalize_email(&auth.email) == self.primary_owner_email
    }

    /// Gate for owner-only operations (grant, revoke, list grants). The
    /// refusal is identical for every non-owner, regardless of what they
    /// asked about.
    pub fn require_primary_owner(&self, auth: &AuthUser) -> Result<(), SharingError> {
        if self.is_primary_owner(auth) {
            Ok(())
        } else {
            Err(SharingError::forbidden())
        }
    }

    /// The id whose rows all data operations for this principal run against.
    ///
    /// Every approved principal currently maps to the one configured primary
    /// owner; per-delegate scoping by individual grant is deliberately not
    /// applied at this layer (see DESIGN.md). A principal that fails the
    /// approval check gets `Forbidden`, including a delegate whose grant
    /// was just revoked: that fails closed here rather than falling back
    /// to its own empty dataset.
    pub async fn data_owner_id(&self, auth: &AuthUser) -> Result<Uuid, SharingError> {
        self.check_approved(auth).await?;
        if self.is_primary_owner(auth) {
            Ok(auth.user_id)
        } else {
            Ok(self.primary_owner_id)
        }
    }

    /// Pure role decision, split out from pool acquisition for testability.
    pub async fn context_kind(&self, auth: &AuthUser) -> Result<ContextKind, SharingError> {
        self.check_approved(auth).await?;
        if self.is_primary_owner(auth) {
            Ok(ContextKind::OwnerScoped)
        } else {
            Ok(ContextKind::ServiceDelegate)
        }
    }

    /// Database context for this request: the pool for the caller's role
    /// plus the effective owner id used as the row-filter key everywhere.
    pub async fn database_context(&self, auth: &AuthUser) -> Result<DatabaseContext, SharingError> {
        let (pool, role, owner_id) = match self.context_kind(auth).await? {
            ContextKind::OwnerScoped => {
                (DatabaseManager::app_pool().await?, DatabaseRole::App, auth.user_id)
            }
            ContextKind::ServiceDelegate => (
                DatabaseManager::service_pool().await?,
                DatabaseRole::Service,
                self.primary_owner_id,
            ),
        };
        Ok(DatabaseContext::new(pool, role, owner_id))
    }

    /// General-purpose check used outside the single-owner shortcut: does
    /// the caller hold at least `required` access on the target owner's
    /// data? Owners always pass on their own data.
    pub async fn can_access(
        &self,
        auth: &AuthUser,
        target_owner_id: Uuid,
        required: AccessLevel,
    ) -> Result<bool, SharingError> {
        if auth.user_id == target_owner_id {
            return Ok(true);
        }
        let grant = self.store.grant_for_principal(target_owner_id, auth.user_id).await?;
        Ok(grant.is_some_and(|g| g.access_level.satisfies(required)))
    }

    /// Product-level approval check, also used at login before a session
    /// token is issued.
    pub async fn require_approved_email(&self, email: &str) -> Result<(), SharingError> {
        if self.approval.is_approved(self.store.as_ref(), email).await? {
            Ok(())
        } else {
            Err(SharingError::forbidden())
        }
    }

    async fn check_approved(&self, auth: &AuthUser) -> Result<(), SharingError> {
        self.require_approved_email(&auth.email).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sharing::registry::AccessRegistry;
    use crate::sharing::resolver::GrantResolver;
    use crate::testing::MemorySharingStore;

    const OWNER_EMAIL: &str = "owner@example.com";

    fn sharing_config(owner_id: Uuid) -> SharingConfig {
        SharingConfig {
            primary_owner_id: owner_id,
            primary_owner_email: OWNER_EMAIL.to_string(),
            approved_emails: vec![OWNER_EMAIL.to_string()],
        }
    }

    fn auth(user_id: Uuid, email: &str) -> AuthUser {
        AuthUser { user_id, email: email.to_string() }
    }

    fn fixture() -> (Uuid, Arc<MemorySharingStore>, AuthorizationGate, AccessRegistry, GrantResolver) {
        let owner_id = Uuid::new_v4();
        let store = Arc::new(MemorySharingStore::new());
        let gate = AuthorizationGate::with_store(store.clone(), &sharing_config(owner_id));
        let registry = AccessRegistry::with_store(store.clone());
        let resolver = GrantResolver::with_store(store.clone());
        (owner_id, store, gate, registry, resolver)
    }

    #[tokio::test]
    async fn owner_resolves_to_own_id_and_scoped_role() {
        let (owner_id, _store, gate, _registry, _resolver) = fixture();
        let owner = auth(owner_id, "Owner@Example.COM");

        assert!(gate.is_primary_owner(&owner));
        assert_eq!(gate.data_owner_id(&owner).await.unwrap(), owner_id);
        assert_eq!(gate.context_kind(&owner).await.unwrap(), ContextKind::OwnerScoped);
    }

    #[tokio::test]
    async fn unapproved_principal_is_forbidden() {
        let (_owner_id, _store, gate, _registry, _resolver) = fixture();
        let stranger = auth(Uuid::new_v4(), "stranger@example.com");

        assert!(matches!(
            gate.data_owner_id(&stranger).await,
            Err(SharingError::Forbidden(_))
        ));
        assert!(!gate.is_primary_owner(&stranger));
        assert!(gate.require_primary_owner(&stranger).is_err());
    }

    #[tokio::test]
    async fn resolved_delegate_reads_as_primary_owner_via_service_role() {
        let (owner_id, _store, gate, registry, resolver) = fixture();
        let delegate_id = Uuid::new_v4();

        registry.grant(owner_id, "assistant@example.com", AccessLevel::Read).await.unwrap();
        resolver.resolve_pending_grants(delegate_id, "assistant@example.com").await.unwrap();

        let delegate = auth(delegate_id, "assistant@example.com");
        assert_eq!(gate.data_owner_id(&delegate).await.unwrap(), owner_id);
        assert_eq!(
            gate.context_kind(&delegate).await.unwrap(),
            ContextKind::ServiceDelegate
        );
    }

    #[tokio::test]
    async fn revoked_delegate_fails_closed() {
        let (owner_id, _store, gate, registry, resolver) = fixture();
        let delegate_id = Uuid::new_v4();

        registry.grant(owner_id, "assistant@example.com", AccessLevel::Read).await.unwrap();
        resolver.resolve_pending_grants(delegate_id, "assistant@example.com").await.unwrap();

        let delegate = auth(delegate_id, "assistant@example.com");
        assert_eq!(gate.data_owner_id(&delegate).await.unwrap(), owner_id);

        registry.revoke(owner_id, "assistant@example.com").await.unwrap();

        // No fallback to the delegate's own dataset: the request is refused.
        assert!(matches!(
            gate.data_owner_id(&delegate).await,
            Err(SharingError::Forbidden(_))
        ));
        assert!(matches!(
            gate.context_kind(&delegate).await,
            Err(SharingError::Forbidden(_))
        ));
    }

    #[tokio::test]
    async fn can_access_respects_level_ordering() {
        let (owner_id, _store, gate, registry, resolver) = fixture();
        let delegate_id = Uuid::new_v4();

        registry.grant(owner_id, "assistant@example.com", AccessLevel::Read).await.unwrap();
        resolver.resolve_pending_grants(delegate_id, "assistant@example.com").await.unwrap();

        let delegate = auth(delegate_id, "assistant@example.com");
        assert!(gate.can_access(&delegate, owner_id, AccessLevel::Read).await.unwrap());
        assert!(!gate.can_access(&delegate, owner_id, AccessLevel::Write).await.unwrap());

        registry.grant(owner_id, "assistant@example.com", AccessLevel::Admin).await.unwrap();
        assert!(gate.can_access(&delegate, owner_id, AccessLevel::Write).await.unwrap());
        assert!(gate.can_access(&delegate, owner_id, AccessLevel::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn owners_always_access_their_own_data() {
        let (owner_id, _store, gate, _registry, _resolver) = fixture();
        let owner = auth(owner_id, OWNER_EMAIL);
        assert!(gate.can_access(&owner, owner_id, AccessLevel::Admin).await.unwrap());
    }

    #[tokio::test]
    async fn backend_failure_fails_closed_not_open() {
        let (owner_id, store, gate, _registry, _resolver) = fixture();
        store.fail_next("grant scan down");

        let delegate = auth(Uuid::new_v4(), "assistant@example.com");
        assert!(matches!(gate.data_owner_id(&delegate).await, Err(SharingError::Store(_))));
        // The owner is on the static list and never reaches the store scan.
        let owner = auth(owner_id, OWNER_EMAIL);
        assert_eq!(gate.data_owner_id(&owner).await.unwrap(), owner_id);
    }
}
