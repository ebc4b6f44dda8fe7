use axum::{response::IntoResponse, Extension, Json};
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::sharing::gate::AuthorizationGate;

/// GET /api/auth/whoami - current session identity
pub async fn session_whoami(Extension(auth): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    let gate = AuthorizationGate::new().await?;

    Ok(Json(json!({
        "success": true,
        "data": {
            "id": auth.user_id,
            "email": auth.email,
            "primary_owner": gate.is_primary_owner(&auth)
        }
    })))
}
