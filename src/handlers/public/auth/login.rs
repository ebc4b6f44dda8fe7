use axum::{response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::auth::{generate_jwt, Claims};
use crate::config;
use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::sharing::gate::AuthorizationGate;
use crate::sharing::normalize_email;
use crate::sharing::resolver::GrantResolver;

use super::utils::verify_password;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /auth/login - authenticate and receive a JWT
///
/// On success this is also the login-completed hook: any access grants still
/// pending for this email get resolved to the principal id before the token
/// is returned. Resolution is best-effort; a partial failure there never
/// fails the login itself.
pub async fn login_post(Json(body): Json<LoginRequest>) -> Result<impl IntoResponse, ApiError> {
    let email = normalize_email(&body.email);
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password are required"));
    }

    let pool = DatabaseManager::app_pool().await?;
    let user: Option<User> = sqlx::query_as(
        "SELECT id, email, password_salt, password_digest, created_at, updated_at
         FROM users WHERE email = $1",
    )
    .bind(&email)
    .fetch_optional(&pool)
    .await
    .map_err(DatabaseError::Sqlx)?;

    // Same response for unknown email and wrong password
    let user = user.ok_or_else(|| ApiError::unauthorized("Invalid email or password"))?;
    if !verify_password(&user.password_salt, &body.password, &user.password_digest) {
        return Err(ApiError::unauthorized("Invalid email or password"));
    }

    // Product gate: not everyone with credentials may use the product
    let gate = AuthorizationGate::new().await?;
    gate.require_approved_email(&email).await?;

    // Login-completed hook: resolve pending grants for this email
    match GrantResolver::new().await {
        Ok(resolver) => {
            if let Err(err) = resolver.resolve_pending_grants(user.id, &email).await {
                warn!(user = %user.id, error = %err, "pending grant resolution failed during login");
            }
        }
        Err(err) => warn!(user = %user.id, error = %err, "grant resolver unavailable during login"),
    }

    let token = generate_jwt(Claims::new(user.id, email.clone()))?;
    let expires_in = config::config().security.jwt_expiry_hours * 3600;

    Ok(Json(json!({
        "success": true,
        "data": {
            "token": token,
            "user": { "id": user.id, "email": email },
            "expires_in": expires_in
        }
    })))
}
