use crate::auth::decode_access_token;
use crate::config::AuthConfig;
use flowline_db::{UserRepo, UserRow};
use sqlx::PgPool;

/// Fixed identity every request resolves to while auth is disabled
pub const DEV_USER_EMAIL: &str = "test@example.com";
pub const DEV_USER_NAME: &str = "Test User";

/// Why authentication was denied. All variants except `Db` collapse into a
/// single Unauthenticated error at the public boundary so callers cannot
/// tell a bad token from an unknown account.
#[derive(Debug)]
enum Denied {
    MissingToken,
    DecodeFailed,
    SubjectMissing,
    UnknownUser,
    Db(anyhow::Error),
}

/// Failure surfaced to the web layer
#[derive(Debug)]
pub enum IdentityError {
    /// Missing or invalid credentials; maps to 401 with a Bearer challenge
    Unauthenticated,
    /// Identity established but the account is deactivated; maps to 400
    Inactive,
    /// Lower-layer failure; maps to 500, never masked as Unauthenticated
    Internal(anyhow::Error),
}

/// Resolve the caller's identity from an optional bearer token.
///
/// With auth disabled the token is ignored entirely and the fixed
/// development user is returned, created on first use.
pub async fn resolve_current_user(
    pool: &PgPool,
    auth: &AuthConfig,
    token: Option<&str>,
) -> Result<UserRow, IdentityError> {
    if auth.disabled {
        return UserRepo::find_or_create(pool, DEV_USER_EMAIL, None, Some(DEV_USER_NAME))
            .await
            .map_err(IdentityError::Internal);
    }

    match authenticate(pool, &auth.jwt_secret, token).await {
        Ok(user) => Ok(user),
        Err(Denied::Db(e)) => Err(IdentityError::Internal(e)),
        Err(denied) => {
            tracing::debug!("Authentication denied: {:?}", denied);
            Err(IdentityError::Unauthenticated)
        }
    }
}

/// Resolve the caller's identity and require the account to be active
pub async fn resolve_active_user(
    pool: &PgPool,
    auth: &AuthConfig,
    token: Option<&str>,
) -> Result<UserRow, IdentityError> {
    let user = resolve_current_user(pool, auth, token).await?;
    if !user.is_active {
        return Err(IdentityError::Inactive);
    }
    Ok(user)
}

async fn authenticate(
    pool: &PgPool,
    jwt_secret: &str,
    token: Option<&str>,
) -> Result<UserRow, Denied> {
    let token = token.ok_or(Denied::MissingToken)?;
    let claims = decode_access_token(token, jwt_secret).ok_or(Denied::DecodeFailed)?;
    let email = claims
        .get("sub")
        .and_then(|v| v.as_str())
        .ok_or(Denied::SubjectMissing)?;
    match UserRepo::get_by_email(pool, email).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(Denied::UnknownUser),
        Err(e) => Err(Denied::Db(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowline_common::models::auth::Claims;
    use jsonwebtoken::{EncodingKey, Header};

    const SECRET: &str = "test-jwt-secret";

    // The directory is never reached by these tests; they exercise the
    // denial branches that short-circuit before any query runs.
    fn lazy_pool() -> PgPool {
        PgPool::connect_lazy("postgres://invalid:5432/db").unwrap()
    }

    fn auth_config(disabled: bool) -> AuthConfig {
        AuthConfig {
            jwt_secret: SECRET.to_string(),
            disabled,
            initial_user: None,
        }
    }

    fn token_without_subject() -> String {
        let now = chrono::Utc::now().timestamp();
        jsonwebtoken::encode(
            &Header::default(),
            &serde_json::json!({"iat": now, "exp": now + 900}),
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn valid_token(email: &str) -> String {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: email.to_string(),
            iat: now,
            exp: now + 900,
        };
        jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_denied() {
        let result = authenticate(&lazy_pool(), SECRET, None).await;
        assert!(matches!(result, Err(Denied::MissingToken)));
    }

    #[tokio::test]
    async fn test_garbage_token_denied() {
        let result = authenticate(&lazy_pool(), SECRET, Some("not-a-jwt")).await;
        assert!(matches!(result, Err(Denied::DecodeFailed)));
    }

    #[tokio::test]
    async fn test_wrong_secret_denied() {
        let token = valid_token("someone@example.com");
        let result = authenticate(&lazy_pool(), "other-secret", Some(&token)).await;
        assert!(matches!(result, Err(Denied::DecodeFailed)));
    }

    #[tokio::test]
    async fn test_token_without_subject_denied() {
        let token = token_without_subject();
        let result = authenticate(&lazy_pool(), SECRET, Some(&token)).await;
        assert!(matches!(result, Err(Denied::SubjectMissing)));
    }

    #[tokio::test]
    async fn test_denials_collapse_to_unauthenticated() {
        let pool = lazy_pool();
        let auth = auth_config(false);

        for token in [None, Some("garbage")] {
            let result = resolve_current_user(&pool, &auth, token).await;
            assert!(
                matches!(result, Err(IdentityError::Unauthenticated)),
                "Denial should surface as Unauthenticated"
            );
        }

        let token = token_without_subject();
        let result = resolve_current_user(&pool, &auth, Some(&token)).await;
        assert!(matches!(result, Err(IdentityError::Unauthenticated)));
    }
}
