use axum::{response::IntoResponse, Extension, Json};
use serde_json::{json, Value};

use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::middleware::auth::AuthUser;
use crate::sharing::store::{PgSharingStore, SharingStore};

/// GET /api/profile/preferences - the principal's own preference bag.
/// An absent profile or a malformed bag reads as empty.
pub async fn preferences_get(Extension(auth): Extension<AuthUser>) -> Result<impl IntoResponse, ApiError> {
    let store = PgSharingStore::new(DatabaseManager::service_pool().await?);
    let prefs = store.profile_preferences(auth.user_id).await?;

    Ok(Json(json!({ "success": true, "data": prefs })))
}

/// PUT /api/profile/preferences - replace the preference bag
pub async fn preferences_put(
    Extension(auth): Extension<AuthUser>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let Value::Object(prefs) = body else {
        return Err(ApiError::invalid_json("Preferences must be a JSON object"));
    };

    let store = PgSharingStore::new(DatabaseManager::service_pool().await?);
    store.put_profile_preferences(auth.user_id, &prefs).await?;

    Ok(Json(json!({ "success": true, "data": prefs })))
}
