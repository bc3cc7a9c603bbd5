//! Session tokens, password hashing and the authenticated-user extractor.
//!
//! Tokens are compact HS256 JWTs: `base64url(header).base64url(claims).base64url(hmac)`
//! with no padding. The token travels in an HttpOnly cookie or an
//! `Authorization: Bearer` header.

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use trade_journal_core::AuthConfig;
use trade_journal_data::{Role, UserRecord};

use crate::error::ApiError;
use crate::state::AppState;

type HmacSha256 = Hmac<Sha256>;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Malformed token")]
    Malformed,

    #[error("Invalid token signature")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("Token signing failed: {0}")]
    Signing(String),
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenHeader {
    alg: String,
    typ: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: i64,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Signs and verifies session tokens with a shared HMAC secret.
pub struct TokenSigner {
    secret: SecretString,
    ttl_seconds: i64,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner")
            .field("secret", &"[REDACTED]")
            .field("ttl_seconds", &self.ttl_seconds)
            .finish()
    }
}

impl TokenSigner {
    #[must_use]
    pub fn new(secret: &str, ttl_hours: i64) -> Self {
        Self {
            secret: SecretString::from(secret.to_string()),
            ttl_seconds: ttl_hours.max(1) * 3600,
        }
    }

    #[must_use]
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(&config.token_secret, config.token_ttl_hours)
    }

    #[must_use]
    pub const fn ttl_seconds(&self) -> i64 {
        self.ttl_seconds
    }

    fn mac(&self) -> Result<HmacSha256, AuthError> {
        HmacSha256::new_from_slice(self.secret.expose_secret().as_bytes())
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// # Errors
    /// Returns `Signing` if the claims cannot be encoded.
    pub fn sign(&self, user: &UserRecord) -> Result<String, AuthError> {
        self.sign_at(user, Utc::now().timestamp())
    }

    /// # Errors
    /// Returns `Signing` if the claims cannot be encoded.
    pub fn sign_at(&self, user: &UserRecord, now: i64) -> Result<String, AuthError> {
        let claims = Claims {
            sub: user.id,
            email: user.email.clone(),
            role: user.role,
            iat: now,
            exp: now + self.ttl_seconds,
        };
        let header = TokenHeader {
            alg: "HS256".to_string(),
            typ: "JWT".to_string(),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| AuthError::Signing(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| AuthError::Signing(e.to_string()))?;
        let signing_input = format!(
            "{}.{}",
            BASE64_URL.encode(header_json),
            BASE64_URL.encode(claims_json)
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = BASE64_URL.encode(mac.finalize().into_bytes());

        Ok(format!("{signing_input}.{signature}"))
    }

    /// # Errors
    /// Returns `Malformed`, `BadSignature` or `Expired`.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// # Errors
    /// Returns `Malformed`, `BadSignature` or `Expired`.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, AuthError> {
        let mut parts = token.split('.');
        let (Some(header_b64), Some(claims_b64), Some(signature_b64), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(AuthError::Malformed);
        };

        let signature = BASE64_URL
            .decode(signature_b64)
            .map_err(|_| AuthError::Malformed)?;
        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let header: TokenHeader = BASE64_URL
            .decode(header_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(AuthError::Malformed)?;
        if header.alg != "HS256" {
            return Err(AuthError::Malformed);
        }

        let claims: Claims = BASE64_URL
            .decode(claims_b64)
            .ok()
            .and_then(|bytes| serde_json::from_slice(&bytes).ok())
            .ok_or(AuthError::Malformed)?;
        if claims.exp <= now {
            return Err(AuthError::Expired);
        }

        Ok(claims)
    }
}

/// Hashes a password on the blocking pool.
///
/// # Errors
/// Returns an error if hashing fails or the blocking task panics.
pub async fn hash_password(password: String, cost: u32) -> anyhow::Result<String> {
    let hash = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(hash)
}

/// Checks a password against a stored bcrypt hash. A malformed hash never matches.
///
/// # Errors
/// Returns an error if the blocking task panics.
pub async fn verify_password(password: String, hash: String) -> anyhow::Result<bool> {
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash).unwrap_or(false))
        .await?;
    Ok(matches)
}

/// # Errors
/// Returns `BadRequest` for a password shorter than [`MIN_PASSWORD_LEN`].
pub fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::BadRequest(format!(
            "password: must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

/// Reads the session token from the named cookie, falling back to a bearer header.
#[must_use]
pub fn token_from_headers(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let from_cookie = headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == cookie_name)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty());

    from_cookie.or_else(|| {
        headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
    })
}

#[must_use]
pub fn session_cookie(config: &AuthConfig, token: &str, max_age: i64) -> String {
    let secure = if config.cookie_secure { "; Secure" } else { "" };
    format!(
        "{}={token}; HttpOnly; Path=/; SameSite=Lax; Max-Age={max_age}{secure}",
        config.cookie_name
    )
}

#[must_use]
pub fn clear_cookie(config: &AuthConfig) -> String {
    session_cookie(config, "", 0)
}

/// The caller, resolved from a valid token to a user that still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
}

impl AuthUser {
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// # Errors
    /// Returns `Forbidden` for non-admins.
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Administrator access required".to_string()))
        }
    }

    /// Owner whose rows a request acts on: the caller, or anyone an admin names.
    ///
    /// # Errors
    /// Returns `Forbidden` when a non-admin names another user.
    pub fn scope(&self, requested: Option<i64>) -> Result<i64, ApiError> {
        match requested {
            None => Ok(self.id),
            Some(id) if id == self.id || self.is_admin() => Ok(id),
            Some(_) => Err(ApiError::forbidden()),
        }
    }

    /// # Errors
    /// Returns `Forbidden` unless the caller owns the row or is an admin.
    pub fn ensure_owner(&self, owner_id: i64) -> Result<(), ApiError> {
        if owner_id == self.id || self.is_admin() {
            Ok(())
        } else {
            Err(ApiError::forbidden())
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = token_from_headers(&parts.headers, &state.config.auth.cookie_name)
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))?;

        let claims = state.signer.verify(&token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected session token");
            ApiError::Unauthorized(e.to_string())
        })?;

        let user = state
            .repos
            .users
            .find_by_id(claims.sub)
            .await?
            .ok_or_else(|| ApiError::Unauthorized("Account no longer exists".to_string()))?;

        Ok(Self {
            id: user.id,
            email: user.email,
            role: user.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn user(role: Role) -> UserRecord {
        UserRecord {
            id: 7,
            email: "trader@example.com".to_string(),
            name: "Trader".to_string(),
            password_hash: String::new(),
            role,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_sign_and_verify() {
        let signer = TokenSigner::new("test-secret", 1);
        let token = signer.sign_at(&user(Role::Admin), 1_000).unwrap();
        assert_eq!(token.split('.').count(), 3);

        let claims = signer.verify_at(&token, 1_001).unwrap();
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp, 1_000 + 3600);
    }

    #[test]
    fn test_expired_token() {
        let signer = TokenSigner::new("test-secret", 1);
        let token = signer.sign_at(&user(Role::User), 1_000).unwrap();
        assert_eq!(signer.verify_at(&token, 1_000 + 3600), Err(AuthError::Expired));
    }

    #[test]
    fn test_wrong_secret_and_tampering() {
        let signer = TokenSigner::new("test-secret", 1);
        let other = TokenSigner::new("other-secret", 1);
        let token = signer.sign_at(&user(Role::User), 1_000).unwrap();
        assert_eq!(other.verify_at(&token, 1_001), Err(AuthError::BadSignature));

        // Swap in admin claims but keep the original signature.
        let forged_claims = signer.sign_at(&user(Role::Admin), 1_000).unwrap();
        let mut original = token.split('.');
        let mut forged = forged_claims.split('.');
        let tampered = format!(
            "{}.{}.{}",
            original.next().unwrap(),
            forged.nth(1).unwrap(),
            original.nth(1).unwrap()
        );
        assert_eq!(signer.verify_at(&tampered, 1_001), Err(AuthError::BadSignature));
    }

    #[test]
    fn test_malformed_token() {
        let signer = TokenSigner::new("test-secret", 1);
        assert_eq!(signer.verify_at("abc", 0), Err(AuthError::Malformed));
        assert_eq!(signer.verify_at("a.b.c.d", 0), Err(AuthError::Malformed));
        assert_eq!(signer.verify_at("a.b.!!", 0), Err(AuthError::Malformed));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let signer = TokenSigner::new("super-secret-value", 1);
        let debug = format!("{signer:?}");
        assert!(!debug.contains("super-secret-value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn test_token_from_cookie_then_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer from-header"));
        assert_eq!(token_from_headers(&headers, "token").as_deref(), Some("from-header"));

        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; token=from-cookie"),
        );
        assert_eq!(token_from_headers(&headers, "token").as_deref(), Some("from-cookie"));
        assert!(token_from_headers(&HeaderMap::new(), "token").is_none());
    }

    #[test]
    fn test_scope_and_ownership() {
        let plain = AuthUser {
            id: 1,
            email: "a@b.co".to_string(),
            role: Role::User,
        };
        let admin = AuthUser {
            id: 2,
            email: "root@b.co".to_string(),
            role: Role::Admin,
        };

        assert_eq!(plain.scope(None).unwrap(), 1);
        assert_eq!(plain.scope(Some(1)).unwrap(), 1);
        assert!(plain.scope(Some(2)).is_err());
        assert_eq!(admin.scope(Some(1)).unwrap(), 1);

        assert!(plain.ensure_owner(1).is_ok());
        assert!(plain.ensure_owner(2).is_err());
        assert!(admin.ensure_owner(1).is_ok());
        assert!(plain.require_admin().is_err());
    }

    #[test]
    fn test_cookie_format() {
        let config = AuthConfig {
            cookie_secure: true,
            ..AuthConfig::default()
        };
        let cookie = session_cookie(&config, "abc", 60);
        assert!(cookie.starts_with(&format!("{}=abc;", config.cookie_name)));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.ends_with("; Secure"));
        assert!(clear_cookie(&config).contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse".to_string(), 4).await.unwrap();
        assert!(verify_password("correct horse".to_string(), hash.clone()).await.unwrap());
        assert!(!verify_password("wrong".to_string(), hash).await.unwrap());
        assert!(!verify_password("x".to_string(), "not-a-hash".to_string()).await.unwrap());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough").is_ok());
    }
}
