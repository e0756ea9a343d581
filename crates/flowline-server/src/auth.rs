use anyhow::{Context, Result};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use flowline_common::models::auth::Claims;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};

/// Hash a password using argon2id
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a password against a hash
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Create an access token (JWT) with 15-minute TTL; `sub` carries the email
pub fn create_access_token(email: &str, jwt_secret: &str) -> Result<String> {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        sub: email.to_string(),
        iat: now,
        exp: now + 900, // 15 minutes
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(jwt_secret.as_bytes()),
    )
    .context("Failed to create access token")
}

/// Verify an access token's signature and expiry and return its claims
/// mapping. Any failure (malformed token, bad signature, expired) yields
/// `None`; translating that into an error is the caller's job.
pub fn decode_access_token(token: &str, jwt_secret: &str) -> Option<serde_json::Value> {
    jsonwebtoken::decode::<serde_json::Value>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_password_hash_and_verify_correct() {
        let password = "my-secure-password";
        let hash = hash_password(password).unwrap();
        assert!(verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_password_verify_wrong() {
        let hash = hash_password("correct-password").unwrap();
        assert!(!verify_password("wrong-password", &hash).unwrap());
    }

    #[test]
    fn test_password_different_salts() {
        let password = "same-password";
        let hash1 = hash_password(password).unwrap();
        let hash2 = hash_password(password).unwrap();
        assert_ne!(hash1, hash2);
        // Both still verify
        assert!(verify_password(password, &hash1).unwrap());
        assert!(verify_password(password, &hash2).unwrap());
    }

    #[test]
    fn test_jwt_create_and_decode() {
        let secret = "test-jwt-secret";
        let token = create_access_token("test@example.com", secret).unwrap();
        let claims = decode_access_token(&token, secret).unwrap();
        assert_eq!(
            claims.get("sub").and_then(|v| v.as_str()),
            Some("test@example.com")
        );
    }

    #[test]
    fn test_jwt_wrong_secret_fails() {
        let token = create_access_token("test@example.com", "secret-1").unwrap();
        assert!(decode_access_token(&token, "secret-2").is_none());
    }

    #[test]
    fn test_jwt_garbage_token_fails() {
        assert!(decode_access_token("not-a-jwt", "secret").is_none());
        assert!(decode_access_token("", "secret").is_none());
        assert!(decode_access_token("a.b.c", "secret").is_none());
    }

    #[test]
    fn test_jwt_expired_token_fails() {
        let secret = "test-jwt-secret";
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "test@example.com".to_string(),
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        assert!(decode_access_token(&token, secret).is_none());
    }

    #[test]
    fn test_jwt_without_subject_still_decodes() {
        let secret = "test-jwt-secret";
        let now = chrono::Utc::now().timestamp();
        let token = jsonwebtoken::encode(
            &Header::default(),
            &json!({"iat": now, "exp": now + 900}),
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap();
        let claims = decode_access_token(&token, secret).unwrap();
        assert!(claims.get("sub").is_none());
    }
}
