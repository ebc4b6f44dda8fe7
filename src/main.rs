use axum::{routing::get, Router};
use serde_json::{json, Value};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use atrium_api::handlers;
use atrium_api::middleware::auth::jwt_auth_middleware;

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Initialize configuration (this loads the config singleton)
    let config = atrium_api::config::config();
    tracing::info!("Starting Atrium API in {:?} mode", config.environment);

    let app = app();

    // Allow tests or deployments to override port via env
    let port = std::env::var("ATRIUM_API_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    tracing::info!("Atrium API server listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}

fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        // Public auth routes (token acquisition)
        .merge(auth_public_routes())
        // Protected API behind JWT extraction
        .merge(protected_routes().layer(axum::middleware::from_fn(jwt_auth_middleware)))
        // Global middleware
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn auth_public_routes() -> Router {
    use axum::routing::post;
    use handlers::public::auth;

    Router::new()
        .route("/auth/register", post(auth::register_post))
        .route("/auth/login", post(auth::login_post))
}

fn protected_routes() -> Router {
    use handlers::protected::{auth, data, profile, sharing};

    Router::new()
        // Session
        .route("/api/auth/whoami", get(auth::session_whoami))
        // Shared-access management (primary owner only)
        .route(
            "/api/sharing/grants",
            get(sharing::grants_get)
                .post(sharing::grants_post)
                .delete(sharing::grants_delete),
        )
        // Profile preference bag
        .route(
            "/api/profile/preferences",
            get(profile::preferences_get).put(profile::preferences_put),
        )
        // Owner-scoped record collections
        .route(
            "/api/data/:collection",
            get(data::collection_get).post(data::collection_post),
        )
        .route(
            "/api/data/:collection/:id",
            get(data::record_get)
                .put(data::record_put)
                .delete(data::record_delete),
        )
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "success": true,
        "data": {
            "name": "Atrium API",
            "version": version,
            "description": "Personal dashboard backend with delegated shared access",
            "endpoints": {
                "home": "/ (public)",
                "public_auth": "/auth/register, /auth/login (public - token acquisition)",
                "auth": "/api/auth/whoami (protected)",
                "sharing": "/api/sharing/grants (protected, primary owner only)",
                "profile": "/api/profile/preferences (protected)",
                "data": "/api/data/:collection[/:record] (protected)",
            }
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match atrium_api::database::manager::DatabaseManager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "success": true,
                "data": {
                    "status": "ok",
                    "timestamp": now,
                    "database": "ok"
                }
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "success": false,
                "error": "database unavailable",
                "data": {
                    "status": "degraded",
                    "timestamp": now,
                    "database_error": e.to_string()
                }
            })),
        ),
    }
}
