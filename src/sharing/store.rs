use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use super::{AccessGrant, AccessLevel};

/// Store failures with a machine-readable kind. `NotFound` is recovered
/// locally by callers (absent profile reads as empty state); `Unavailable`
/// always propagates so callers fail closed.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,

    #[error("malformed stored state: {0}")]
    Malformed(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                StoreError::Malformed(err.to_string())
            }
            other => StoreError::Unavailable(other.to_string()),
        }
    }
}

/// Persistence seam for the sharing core.
///
/// Backed by Postgres in production and by an in-memory double in unit
/// tests. Grant mutations are single-row atomic operations keyed by
/// (owner_id, email); none of them read-modify-write shared state.
#[async_trait]
pub trait SharingStore: Send + Sync {
    /// All grants issued by an owner. Absent owner reads as an empty list.
    async fn grants_for_owner(&self, owner_id: Uuid) -> Result<Vec<AccessGrant>, StoreError>;

    /// Insert or update the grant for (owner_id, email). An update replaces
    /// `access_level` and `granted_at` but keeps a resolved `principal_id`.
    async fn upsert_grant(&self, grant: &AccessGrant) -> Result<AccessGrant, StoreError>;

    /// Delete the grant for (owner_id, email), returning it if it existed.
    async fn delete_grant(&self, owner_id: Uuid, email: &str) -> Result<Option<AccessGrant>, StoreError>;

    /// Grants for this email whose principal id is still unresolved.
    async fn pending_grants_for_email(&self, email: &str) -> Result<Vec<AccessGrant>, StoreError>;

    /// Fill in the principal id of a still-pending grant.
    async fn resolve_grant(&self, owner_id: Uuid, email: &str, principal_id: Uuid) -> Result<(), StoreError>;

    /// The grant an owner holds for a resolved principal, if any.
    async fn grant_for_principal(&self, owner_id: Uuid, principal_id: Uuid) -> Result<Option<AccessGrant>, StoreError>;

    /// Whether any owner has granted this email (resolved or pending).
    async fn email_has_any_grant(&self, email: &str) -> Result<bool, StoreError>;

    /// Point a delegate's profile at an owner, creating the profile lazily.
    async fn set_delegation_pointer(&self, principal_id: Uuid, owner_id: Uuid) -> Result<(), StoreError>;

    /// Clear the pointer, constrained to the given owner (no-op otherwise).
    async fn clear_delegation_pointer(&self, principal_id: Uuid, owner_id: Uuid) -> Result<(), StoreError>;

    /// The owner this principal currently points at, if any.
    async fn delegation_pointer(&self, principal_id: Uuid) -> Result<Option<Uuid>, StoreError>;

    /// The principal's preference bag. Absent profile or malformed content
    /// reads as an empty bag; this call never fails for bad data.
    async fn profile_preferences(&self, user_id: Uuid) -> Result<Map<String, Value>, StoreError>;

    /// Replace the principal's preference bag, creating the profile lazily.
    async fn put_profile_preferences(&self, user_id: Uuid, prefs: &Map<String, Value>) -> Result<(), StoreError>;
}

/// Postgres-backed store over the `access_grants` and `profiles` tables.
pub struct PgSharingStore {
    pool: PgPool,
}

type GrantRow = (Uuid, String, Option<Uuid>, String, DateTime<Utc>);

impl PgSharingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn grant_from_row(row: GrantRow) -> AccessGrant {
        let (owner_id, email, principal_id, level, granted_at) = row;
        AccessGrant {
            owner_id,
            email,
            principal_id,
            // Unknown level text in the column reads as the weakest level
            access_level: AccessLevel::parse(&level).unwrap_or(AccessLevel::Read),
            granted_at,
        }
    }
}

const GRANT_COLUMNS: &str = "owner_id, email, principal_id, access_level, granted_at";

#[async_trait]
impl SharingStore for PgSharingStore {
    async fn grants_for_owner(&self, owner_id: Uuid) -> Result<Vec<AccessGrant>, StoreError> {
        let rows: Vec<GrantRow> = sqlx::query_as(&format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE owner_id = $1 ORDER BY granted_at"
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::grant_from_row).collect())
    }

    async fn upsert_grant(&self, grant: &AccessGrant) -> Result<AccessGrant, StoreError> {
        let row: GrantRow = sqlx::query_as(&format!(
            "INSERT INTO access_grants (owner_id, email, principal_id, access_level, granted_at)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (owner_id, email)
             DO UPDATE SET access_level = EXCLUDED.access_level, granted_at = EXCLUDED.granted_at
             RETURNING {GRANT_COLUMNS}"
        ))
        .bind(grant.owner_id)
        .bind(&grant.email)
        .bind(grant.principal_id)
        .bind(grant.access_level.as_str())
        .bind(grant.granted_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(Self::grant_from_row(row))
    }

    async fn delete_grant(&self, owner_id: Uuid, email: &str) -> Result<Option<AccessGrant>, StoreError> {
        let row: Option<GrantRow> = sqlx::query_as(&format!(
            "DELETE FROM access_grants WHERE owner_id = $1 AND email = $2 RETURNING {GRANT_COLUMNS}"
        ))
        .bind(owner_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::grant_from_row))
    }

    async fn pending_grants_for_email(&self, email: &str) -> Result<Vec<AccessGrant>, StoreError> {
        let rows: Vec<GrantRow> = sqlx::query_as(&format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE email = $1 AND principal_id IS NULL"
        ))
        .bind(email)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Self::grant_from_row).collect())
    }

    async fn resolve_grant(&self, owner_id: Uuid, email: &str, principal_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE access_grants SET principal_id = $3
             WHERE owner_id = $1 AND email = $2 AND principal_id IS NULL",
        )
        .bind(owner_id)
        .bind(email)
        .bind(principal_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn grant_for_principal(&self, owner_id: Uuid, principal_id: Uuid) -> Result<Option<AccessGrant>, StoreError> {
        let row: Option<GrantRow> = sqlx::query_as(&format!(
            "SELECT {GRANT_COLUMNS} FROM access_grants WHERE owner_id = $1 AND principal_id = $2"
        ))
        .bind(owner_id)
        .bind(principal_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Self::grant_from_row))
    }

    async fn email_has_any_grant(&self, email: &str) -> Result<bool, StoreError> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS(SELECT 1 FROM access_grants WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(exists)
    }

    async fn set_delegation_pointer(&self, principal_id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO profiles (id, user_id, preferences, shared_access_to)
             VALUES ($1, $2, '{}'::jsonb, $3)
             ON CONFLICT (user_id)
             DO UPDATE SET shared_access_to = EXCLUDED.shared_access_to, updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(principal_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn clear_delegation_pointer(&self, principal_id: Uuid, owner_id: Uuid) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE profiles SET shared_access_to = NULL, updated_at = now()
             WHERE user_id = $1 AND shared_access_to = $2",
        )
        .bind(principal_id)
        .bind(owner_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delegation_pointer(&self, principal_id: Uuid) -> Result<Option<Uuid>, StoreError> {
        let row: Option<(Option<Uuid>,)> =
            sqlx::query_as("SELECT shared_access_to FROM profiles WHERE user_id = $1")
                .bind(principal_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.and_then(|(p,)| p))
    }

    async fn profile_preferences(&self, user_id: Uuid) -> Result<Map<String, Value>, StoreError> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT preferences FROM profiles WHERE user_id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        // JSONB guarantees well-formed JSON; a non-object bag is the
        // malformed case and reads as empty rather than failing the caller.
        match row {
            Some((Value::Object(map),)) => Ok(map),
            Some((other,)) => {
                tracing::warn!(%user_id, "non-object preference bag ({}), treating as empty", kind_of(&other));
                Ok(Map::new())
            }
            None => Ok(Map::new()),
        }
    }

    async fn put_profile_preferences(&self, user_id: Uuid, prefs: &Map<String, Value>) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO profiles (id, user_id, preferences)
             VALUES ($1, $2, $3)
             ON CONFLICT (user_id)
             DO UPDATE SET preferences = EXCLUDED.preferences, updated_at = now()",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(Value::Object(prefs.clone()))
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
