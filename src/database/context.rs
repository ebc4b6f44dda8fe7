use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseRole};

/// Per-request database handle resolved by the authorization gate.
///
/// Bundles the pool for the caller's role with the effective owner id that
/// every data query must use as its row-filter key. For the `App` role,
/// `begin` pins the owner id into the `atrium.user_id` session setting so
/// row-level security policies line up with the explicit filters.
#[derive(Clone)]
pub struct DatabaseContext {
    pool: PgPool,
    role: DatabaseRole,
    pub owner_id: Uuid,
}

impl DatabaseContext {
    pub fn new(pool: PgPool, role: DatabaseRole, owner_id: Uuid) -> Self {
        Self { pool, role, owner_id }
    }

    pub fn role(&self) -> DatabaseRole {
        self.role
    }

    /// Start a transaction scoped to the effective owner.
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        if self.role == DatabaseRole::App {
            sqlx::query("SELECT set_config('atrium.user_id', $1, true)")
                .bind(self.owner_id.to_string())
                .execute(&mut *tx)
                .await?;
        }
        Ok(tx)
    }
}
