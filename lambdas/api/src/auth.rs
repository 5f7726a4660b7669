//! Token and password handling.
//!
//! Tokens are self-contained: a URL-safe base64 JSON payload plus an
//! HMAC-SHA256 signature over it, carried in the `x-auth-token` header.
//! Every request outside `/api/auth/*` must present one; there are no
//! fallback identities.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Utc;
use domain::users::Role;
use hmac::{Hmac, Mac};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::{error::ApiError, state::AppState};

type HmacSha256 = Hmac<Sha256>;

pub const AUTH_HEADER: &str = "x-auth-token";

const TOKEN_TTL_SECS: i64 = 3600;
const SALT_LEN: usize = 16;

/// Server-side signing key, shared by every handler through the state.
#[derive(Clone)]
pub struct TokenKey(Arc<Vec<u8>>);

impl TokenKey {
    pub fn new(secret: impl Into<Vec<u8>>) -> Self {
        Self(Arc::new(secret.into()))
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        let secret = std::env::var("AUTH_TOKEN_SECRET")
            .map_err(|_| anyhow::anyhow!("AUTH_TOKEN_SECRET environment variable not set"))?;
        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "AUTH_TOKEN_SECRET must be at least 32 characters"
            ));
        }
        Ok(Self::new(secret))
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.0).expect("HMAC accepts any key length")
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Token is not valid")]
    Malformed,

    #[error("Token signature mismatch")]
    BadSignature,

    #[error("Token has expired")]
    Expired,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User email
    pub sub: String,
    /// Display name
    pub name: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn issue(sub: String, name: String, role: Role, now: i64) -> Self {
        Self {
            sub,
            name,
            role,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        }
    }
}

/// Identity attached to the request by the auth middleware.
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub email: String,
    pub username: String,
    pub role: Role,
}

pub fn sign_token(claims: &Claims, key: &TokenKey) -> Result<String, ApiError> {
    let payload = serde_json::to_vec(claims).map_err(|e| ApiError::Internal(e.to_string()))?;
    let payload = URL_SAFE_NO_PAD.encode(payload);

    let mut mac = key.mac();
    mac.update(payload.as_bytes());
    let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

    Ok(format!("{}.{}", payload, signature))
}

pub fn verify_token(token: &str, key: &TokenKey, now: i64) -> Result<Claims, TokenError> {
    let (payload, signature) = token.split_once('.').ok_or(TokenError::Malformed)?;
    let signature = URL_SAFE_NO_PAD
        .decode(signature)
        .map_err(|_| TokenError::Malformed)?;

    let mut mac = key.mac();
    mac.update(payload.as_bytes());
    mac.verify_slice(&signature)
        .map_err(|_| TokenError::BadSignature)?;

    let payload = URL_SAFE_NO_PAD
        .decode(payload)
        .map_err(|_| TokenError::Malformed)?;
    let claims: Claims = serde_json::from_slice(&payload).map_err(|_| TokenError::Malformed)?;

    if claims.exp <= now {
        return Err(TokenError::Expired);
    }

    Ok(claims)
}

/// Salted SHA-256, stored as `salt$digest` in base64.
pub fn hash_password(password: &str) -> String {
    let mut salt = [0u8; SALT_LEN];
    rand::thread_rng().fill_bytes(&mut salt);
    format!(
        "{}${}",
        URL_SAFE_NO_PAD.encode(salt),
        URL_SAFE_NO_PAD.encode(digest(&salt, password))
    )
}

pub fn verify_password(password: &str, stored: &str) -> bool {
    let Some((salt, expected)) = stored.split_once('$') else {
        return false;
    };
    let (Ok(salt), Ok(expected)) = (URL_SAFE_NO_PAD.decode(salt), URL_SAFE_NO_PAD.decode(expected))
    else {
        return false;
    };
    digest(&salt, password) == expected
}

fn digest(salt: &[u8], password: &str) -> Vec<u8> {
    let mut hasher = Sha256::new();
    hasher.update(salt);
    hasher.update(password.as_bytes());
    hasher.finalize().to_vec()
}

/// Middleware guarding every non-auth route.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTH_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("No token, authorization denied".to_string()))?;

    let claims = verify_token(token, &state.token_key, Utc::now().timestamp())
        .map_err(|e| ApiError::Unauthorized(e.to_string()))?;

    request.extensions_mut().insert(AuthUser {
        email: claims.sub,
        username: claims.name,
        role: claims.role,
    });

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> TokenKey {
        TokenKey::new("0123456789abcdef0123456789abcdef")
    }

    fn claims(now: i64) -> Claims {
        Claims::issue(
            "a@pharmacy.test".to_string(),
            "Pharmacy A".to_string(),
            Role::Pharmacy,
            now,
        )
    }

    #[test]
    fn token_round_trips() {
        let now = 1_750_000_000;
        let token = sign_token(&claims(now), &key()).unwrap();
        let verified = verify_token(&token, &key(), now + 10).unwrap();
        assert_eq!(verified.sub, "a@pharmacy.test");
        assert_eq!(verified.role, Role::Pharmacy);
    }

    #[test]
    fn tampered_token_is_rejected() {
        let now = 1_750_000_000;
        let token = sign_token(&claims(now), &key()).unwrap();

        let (payload, signature) = token.split_once('.').unwrap();
        let mut forged = serde_json::from_slice::<Claims>(
            &URL_SAFE_NO_PAD.decode(payload).unwrap(),
        )
        .unwrap();
        forged.role = Role::Admin;
        let forged_payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&forged).unwrap());
        let forged_token = format!("{}.{}", forged_payload, signature);

        assert!(matches!(
            verify_token(&forged_token, &key(), now + 10),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn wrong_key_is_rejected() {
        let now = 1_750_000_000;
        let token = sign_token(&claims(now), &key()).unwrap();
        let other = TokenKey::new("ffffffffffffffffffffffffffffffff");
        assert!(matches!(
            verify_token(&token, &other, now + 10),
            Err(TokenError::BadSignature)
        ));
    }

    #[test]
    fn expired_token_is_rejected() {
        let now = 1_750_000_000;
        let token = sign_token(&claims(now), &key()).unwrap();
        assert!(matches!(
            verify_token(&token, &key(), now + TOKEN_TTL_SECS + 1),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn garbage_token_is_malformed() {
        assert!(matches!(
            verify_token("not-a-token", &key(), 0),
            Err(TokenError::Malformed)
        ));
    }

    #[test]
    fn password_round_trips() {
        let stored = hash_password("hunter2");
        assert!(verify_password("hunter2", &stored));
        assert!(!verify_password("hunter3", &stored));
    }

    #[test]
    fn same_password_hashes_differently_per_salt() {
        assert_ne!(hash_password("hunter2"), hash_password("hunter2"));
    }
}
