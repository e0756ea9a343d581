use crate::auth::{create_access_token, hash_password, verify_password};
use crate::state::AppState;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use flowline_db::UserRepo;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

fn invalid_credentials() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid email or password"})),
    )
        .into_response()
}

fn internal_error() -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({"error": "Internal server error"})),
    )
        .into_response()
}

/// POST /api/auth/register
#[tracing::instrument(skip(state, req))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    match UserRepo::get_by_email(&state.pool, &req.email).await {
        Ok(Some(_)) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({"error": "Email already registered"})),
            )
                .into_response();
        }
        Ok(None) => {}
        Err(e) => {
            tracing::error!("DB error during registration: {:#}", e);
            return internal_error();
        }
    }

    let password_hash = match hash_password(&req.password) {
        Ok(h) => h,
        Err(e) => {
            tracing::error!("Failed to hash password: {:#}", e);
            return internal_error();
        }
    };

    if let Err(e) = UserRepo::create(
        &state.pool,
        Uuid::new_v4(),
        &req.email,
        Some(&password_hash),
        req.name.as_deref(),
    )
    .await
    {
        tracing::error!("Failed to create user: {:#}", e);
        return internal_error();
    }

    match create_access_token(&req.email, &state.config.auth.jwt_secret) {
        Ok(token) => (StatusCode::CREATED, Json(TokenResponse::bearer(token))).into_response(),
        Err(e) => {
            tracing::error!("Failed to create access token: {:#}", e);
            internal_error()
        }
    }
}

/// POST /api/auth/login
#[tracing::instrument(skip(state, req))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    let user = match UserRepo::get_by_email(&state.pool, &req.email).await {
        Ok(Some(u)) => u,
        Ok(None) => return invalid_credentials(),
        Err(e) => {
            tracing::error!("DB error during login: {:#}", e);
            return internal_error();
        }
    };

    // Accounts without a password hash (e.g. the dev user) cannot log in
    let password_hash = match &user.password_hash {
        Some(h) => h,
        None => return invalid_credentials(),
    };

    match verify_password(&req.password, password_hash) {
        Ok(true) => {}
        Ok(false) => return invalid_credentials(),
        Err(e) => {
            tracing::error!("Password verification error: {:#}", e);
            return internal_error();
        }
    }

    if let Err(e) = UserRepo::touch_last_login(&state.pool, user.user_id).await {
        tracing::warn!("Failed to update last_login_at: {:#}", e);
    }

    match create_access_token(&user.email, &state.config.auth.jwt_secret) {
        Ok(token) => Json(TokenResponse::bearer(token)).into_response(),
        Err(e) => {
            tracing::error!("Failed to create access token: {:#}", e);
            internal_error()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_type() {
        let response = TokenResponse::bearer("abc".to_string());
        assert_eq!(response.access_token, "abc");
        assert_eq!(response.token_type, "bearer");
    }
}
