pub mod api;
pub mod auth;
pub mod cli;
pub mod db;
pub mod denylist;
pub mod jwt;
pub mod password;
pub mod validate;

use api::create_api_router;
use axum::http::{HeaderValue, Method, header};
use axum::{Json, Router, routing::get};
use db::CredentialStore;
use denylist::TokenDenylist;
use jwt::JwtConfig;
use serde_json::json;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

pub struct ServerConfig {
    /// Credential store shared by every request
    pub users: Arc<dyn CredentialStore>,
    /// Denylist of revoked session tokens
    pub denylist: Arc<dyn TokenDenylist>,
    /// JWT secret for signing tokens
    pub jwt_secret: Vec<u8>,
    /// Whether to set Secure flag on cookies (should be true in production with HTTPS)
    pub secure_cookies: bool,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
}

/// Create the application router with the given configuration.
pub fn create_app(config: &ServerConfig) -> Router {
    let jwt = Arc::new(JwtConfig::new(&config.jwt_secret));

    let api_router = create_api_router(
        config.users.clone(),
        config.denylist.clone(),
        jwt,
        config.secure_cookies,
    );

    let router = Router::new()
        .route("/", get(health))
        .nest("/api", api_router)
        .layer(TraceLayer::new_for_http());

    match cors_layer(&config.allowed_origins) {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "message": "Backend is working!" }))
}

/// Credentialed CORS for the configured origins. No origins means no CORS headers.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin.trim()) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring invalid allowed origin");
                None
            }
        })
        .collect();

    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE])
            .allow_credentials(true),
    )
}

/// Run the server on the given listener. This function blocks until the server exits.
pub async fn run_server(config: ServerConfig, listener: TcpListener) -> Result<(), std::io::Error> {
    let app = create_app(&config);
    axum::serve(listener, app).await
}
