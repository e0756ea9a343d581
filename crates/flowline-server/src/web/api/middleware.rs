use crate::identity::{self, IdentityError};
use crate::state::AppState;
use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use flowline_db::UserRow;
use serde_json::json;
use std::sync::Arc;

/// Extractor resolving the caller to an active user account.
/// Rejects with 401 (missing/invalid credentials) or 400 (inactive account).
#[derive(Debug)]
pub struct AuthUser(pub UserRow);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts);
        match identity::resolve_active_user(&state.pool, &state.config.auth, token).await {
            Ok(user) => Ok(AuthUser(user)),
            Err(e) => Err(deny(e)),
        }
    }
}

/// Extract the bearer token from the Authorization header, if any.
/// A missing or malformed header yields None; the pipeline treats both as
/// absent credentials.
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

fn deny(err: IdentityError) -> Response {
    match err {
        IdentityError::Unauthenticated => {
            let mut response = (
                StatusCode::UNAUTHORIZED,
                Json(json!({"error": "Could not validate credentials"})),
            )
                .into_response();
            response.headers_mut().insert(
                header::WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer"),
            );
            response
        }
        IdentityError::Inactive => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Inactive user"})),
        )
            .into_response(),
        IdentityError::Internal(e) => {
            tracing::error!("Identity resolution failed: {:#}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Internal server error"})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts_with_header(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(header::AUTHORIZATION, v);
        }
        builder.body(()).unwrap().into_parts().0
    }

    #[test]
    fn test_bearer_token_missing_header() {
        let parts = parts_with_header(None);
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_bearer_token_present() {
        let parts = parts_with_header(Some("Bearer abc123"));
        assert_eq!(bearer_token(&parts), Some("abc123"));
    }

    #[test]
    fn test_bearer_token_wrong_scheme() {
        let parts = parts_with_header(Some("Basic dXNlcjpwYXNz"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_bearer_token_case_sensitive_prefix() {
        let parts = parts_with_header(Some("bearer abc123"));
        assert_eq!(bearer_token(&parts), None);
    }

    #[test]
    fn test_deny_unauthenticated_carries_challenge() {
        let response = deny(IdentityError::Unauthenticated);
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response
                .headers()
                .get(header::WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok()),
            Some("Bearer")
        );
    }

    #[test]
    fn test_deny_inactive_is_bad_request() {
        let response = deny(IdentityError::Inactive);
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
    }
}
