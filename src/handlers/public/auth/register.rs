use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::error::ApiError;
use crate::sharing::{normalize_email, validate_email};

use super::utils::password_digest;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/register - create a principal
pub async fn register_post(Json(body): Json<RegisterRequest>) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&body.email);
    validate_email(&email)?;
    if body.password.len() < 8 {
        return Err(ApiError::bad_request("Password must be at least 8 characters"));
    }

    let pool = DatabaseManager::app_pool().await?;
    let salt = Uuid::new_v4().simple().to_string();
    let digest = password_digest(&salt, &body.password);

    let inserted: Result<(Uuid,), sqlx::Error> = sqlx::query_as(
        "INSERT INTO users (id, email, password_salt, password_digest)
         VALUES ($1, $2, $3, $4)
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(&email)
    .bind(&salt)
    .bind(&digest)
    .fetch_one(&pool)
    .await;

    match inserted {
        Ok((id,)) => Ok((
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "data": { "id": id, "email": email }
            })),
        )),
        Err(err) if is_unique_violation(&err) => Err(ApiError::conflict("Email already registered")),
        Err(err) => Err(DatabaseError::Sqlx(err).into()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23505")
}
