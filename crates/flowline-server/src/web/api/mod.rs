pub mod auth;
pub mod flows;
pub mod middleware;
pub mod users;

use crate::state::AppState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::{Json, Router, routing::get, routing::post, routing::put};
use serde_json::json;
use std::sync::Arc;

/// GET /api/config -- public endpoint returning server configuration for the UI
async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "auth_disabled": state.config.auth.disabled,
    }))
}

pub fn build_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        // Public config endpoint
        .route("/config", get(get_config))
        // Auth routes
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        // User routes
        .route("/users", get(users::list_users))
        .route("/users/me", get(users::me))
        .route("/users/me/tasks", get(users::my_tasks))
        // Flow template routes
        .route("/flows", get(flows::list_flows).post(flows::create_flow))
        .route(
            "/flows/{id}",
            get(flows::get_flow)
                .put(flows::update_flow)
                .delete(flows::delete_flow),
        )
        // Stage routes
        .route("/flows/{id}/stages", post(flows::create_stage))
        .route(
            "/flows/{id}/stages/{stage_id}",
            put(flows::update_stage).delete(flows::delete_stage),
        )
        .with_state(state)
}
