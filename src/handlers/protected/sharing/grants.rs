use axum::{response::IntoResponse, Extension, Json};
use serde::Deserialize;
use serde_json::json;

use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::sharing::gate::AuthorizationGate;
use crate::sharing::registry::AccessRegistry;
use crate::sharing::AccessLevel;

#[derive(Debug, Deserialize)]
pub struct GrantRequest {
    pub email: String,
    pub access_level: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRequest {
    pub email: String,
}

/// GET /api/sharing/grants - list the owner's access grants
pub async fn grants_get(Extension(auth): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    let gate = AuthorizationGate::new().await?;
    gate.require_primary_owner(&auth)?;

    let registry = AccessRegistry::new().await?;
    let grants = registry.list_grants(auth.user_id).await?;

    Ok(Json(json!({ "success": true, "data": grants })))
}

/// POST /api/sharing/grants - grant or update delegated access for an email
pub async fn grants_post(
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<GrantRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gate = AuthorizationGate::new().await?;
    // Ownership is checked before the payload so a non-owner learns nothing
    // about which emails or levels would have been valid
    gate.require_primary_owner(&auth)?;

    let access_level = match body.access_level.as_deref() {
        None => AccessLevel::default(),
        Some(raw) => AccessLevel::parse(raw)
            .ok_or_else(|| ApiError::bad_request("access_level must be one of: read, write, admin"))?,
    };

    let registry = AccessRegistry::new().await?;
    let grant = registry.grant(auth.user_id, &body.email, access_level).await?;

    Ok(Json(json!({ "success": true, "data": grant })))
}

/// DELETE /api/sharing/grants - revoke delegated access for an email
///
/// Responds 200 whether or not a grant existed, so the response does not
/// reveal which emails have access.
pub async fn grants_delete(
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<RevokeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let gate = AuthorizationGate::new().await?;
    gate.require_primary_owner(&auth)?;

    let registry = AccessRegistry::new().await?;
    registry.revoke(auth.user_id, &body.email).await?;

    Ok(Json(json!({ "success": true, "data": { "revoked": true } })))
}
