use axum::{extract::Path, response::IntoResponse, Extension, Json};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::record::Record;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::sharing::gate::AuthorizationGate;

use super::validate_collection;

const RECORD_COLUMNS: &str = "id, owner_id, collection, data, created_at, updated_at, trashed_at";

/// GET /api/data/:collection/:id - show a single record
pub async fn record_get(
    Extension(auth): Extension<AuthUser>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    validate_collection(&collection)?;

    let gate = AuthorizationGate::new().await?;
    let ctx = gate.database_context(&auth).await?;

    let mut tx = ctx.begin().await?;
    let record: Option<Record> = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM records
         WHERE id = $1 AND owner_id = $2 AND collection = $3 AND trashed_at IS NULL"
    ))
    .bind(id)
    .bind(ctx.owner_id)
    .bind(&collection)
    .fetch_optional(&mut *tx)
    .await
    .map_err(DatabaseError::Sqlx)?;
    tx.commit().await.map_err(DatabaseError::Sqlx)?;

    let record = record.ok_or_else(|| ApiError::not_found("Record not found"))?;
    Ok(Json(json!({ "success": true, "data": record })))
}

/// PUT /api/data/:collection/:id - replace a record's data
pub async fn record_put(
    Extension(auth): Extension<AuthUser>,
    Path((collection, id)): Path<(String, Uuid)>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    validate_collection(&collection)?;
    if !body.is_object() {
        return Err(ApiError::invalid_json("Record body must be a JSON object"));
    }

    let gate = AuthorizationGate::new().await?;
    let ctx = gate.database_context(&auth).await?;

    let mut tx = ctx.begin().await?;
    let record: Option<Record> = sqlx::query_as(&format!(
        "UPDATE records SET data = $4, updated_at = now()
         WHERE id = $1 AND owner_id = $2 AND collection = $3 AND trashed_at IS NULL
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(id)
    .bind(ctx.owner_id)
    .bind(&collection)
    .bind(&body)
    .fetch_optional(&mut *tx)
    .await
    .map_err(DatabaseError::Sqlx)?;
    tx.commit().await.map_err(DatabaseError::Sqlx)?;

    let record = record.ok_or_else(|| ApiError::not_found("Record not found"))?;
    Ok(Json(json!({ "success": true, "data": record })))
}

/// DELETE /api/data/:collection/:id - soft-delete a record
pub async fn record_delete(
    Extension(auth): Extension<AuthUser>,
    Path((collection, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    validate_collection(&collection)?;

    let gate = AuthorizationGate::new().await?;
    let ctx = gate.database_context(&auth).await?;

    let mut tx = ctx.begin().await?;
    let result = sqlx::query(
        "UPDATE records SET trashed_at = now()
         WHERE id = $1 AND owner_id = $2 AND collection = $3 AND trashed_at IS NULL",
    )
    .bind(id)
    .bind(ctx.owner_id)
    .bind(&collection)
    .execute(&mut *tx)
    .await
    .map_err(DatabaseError::Sqlx)?;
    tx.commit().await.map_err(DatabaseError::Sqlx)?;

    if result.rows_affected() == 0 {
        return Err(ApiError::not_found("Record not found"));
    }
    Ok(Json(json!({ "success": true, "data": { "trashed": true } })))
}
