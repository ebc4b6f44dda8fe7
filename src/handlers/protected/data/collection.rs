use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::record::Record;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::sharing::gate::AuthorizationGate;

use super::validate_collection;

const RECORD_COLUMNS: &str = "id, owner_id, collection, data, created_at, updated_at, trashed_at";

/// GET /api/data/:collection - list records for the effective owner
pub async fn collection_get(
    Extension(auth): Extension<AuthUser>,
    Path(collection): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_collection(&collection)?;

    let gate = AuthorizationGate::new().await?;
    let ctx = gate.database_context(&auth).await?;

    let mut tx = ctx.begin().await?;
    let records: Vec<Record> = sqlx::query_as(&format!(
        "SELECT {RECORD_COLUMNS} FROM records
         WHERE owner_id = $1 AND collection = $2 AND trashed_at IS NULL
         ORDER BY created_at"
    ))
    .bind(ctx.owner_id)
    .bind(&collection)
    .fetch_all(&mut *tx)
    .await
    .map_err(DatabaseError::Sqlx)?;
    tx.commit().await.map_err(DatabaseError::Sqlx)?;

    Ok(Json(json!({ "success": true, "data": records })))
}

/// POST /api/data/:collection - create a record under the effective owner
pub async fn collection_post(
    Extension(auth): Extension<AuthUser>,
    Path(collection): Path<String>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    validate_collection(&collection)?;
    if !body.is_object() {
        return Err(ApiError::invalid_json("Record body must be a JSON object"));
    }

    let gate = AuthorizationGate::new().await?;
    let ctx = gate.database_context(&auth).await?;

    let mut tx = ctx.begin().await?;
    let record: Record = sqlx::query_as(&format!(
        "INSERT INTO records (id, owner_id, collection, data)
         VALUES ($1, $2, $3, $4)
         RETURNING {RECORD_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(ctx.owner_id)
    .bind(&collection)
    .bind(&body)
    .fetch_one(&mut *tx)
    .await
    .map_err(DatabaseError::Sqlx)?;
    tx.commit().await.map_err(DatabaseError::Sqlx)?;

    Ok((StatusCode::CREATED, Json(json!({ "success": true, "data": record }))))
}
