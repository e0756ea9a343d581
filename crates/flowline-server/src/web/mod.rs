pub mod api;

use crate::config::ServerConfig;
use crate::state::AppState;
use axum::http::{HeaderValue, Method, header};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;

/// GET /health
async fn health() -> impl IntoResponse {
    Json(json!({"status": "healthy"}))
}

/// GET / when no frontend build is being served
async fn root_info() -> impl IntoResponse {
    Json(json!({
        "message": "Flowline API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "healthy",
    }))
}

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let frontend_dist = state
        .config
        .frontend
        .as_ref()
        .map(|f| PathBuf::from(&f.dist_dir));
    let state = Arc::new(state);

    let router = Router::new()
        .route("/health", get(health))
        .nest("/api", api::build_api_routes(state.clone()));

    // Serve the frontend build when present, falling back to index.html so
    // client-side routes resolve. Without a build this is an API-only server.
    let router = match frontend_dist.filter(|dist| dist.is_dir()) {
        Some(dist) => {
            let index = ServeFile::new(dist.join("index.html"));
            router.fallback_service(ServeDir::new(dist).not_found_service(index))
        }
        None => router.route("/", get(root_info)),
    };

    router.layer(cors).layer(TraceLayer::new_for_http())
}

/// When a frontend origin is configured, allow it (plus the dev server) with
/// credentials; otherwise stay permissive for API-only deployments.
fn cors_layer(config: &ServerConfig) -> CorsLayer {
    match config.frontend.as_ref().and_then(|f| f.url.as_deref()) {
        Some(url) => {
            let origins: Vec<HeaderValue> = [url, "http://localhost:3000"]
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
                .allow_credentials(true)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthConfig, DbConfig, FrontendConfig};

    fn base_config(frontend: Option<FrontendConfig>) -> ServerConfig {
        ServerConfig {
            listen: "127.0.0.1:0".to_string(),
            db: DbConfig {
                url: "postgres://invalid:5432/db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "secret".to_string(),
                disabled: false,
                initial_user: None,
            },
            frontend,
        }
    }

    #[test]
    fn test_cors_layer_permissive_without_frontend() {
        // Building the layer must not panic (Any + credentials would)
        let _ = cors_layer(&base_config(None));
    }

    #[test]
    fn test_cors_layer_with_frontend_origin() {
        let config = base_config(Some(FrontendConfig {
            dist_dir: "./dist".to_string(),
            url: Some("https://flowline.example.com".to_string()),
        }));
        let _ = cors_layer(&config);
    }
}
