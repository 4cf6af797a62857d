//! Stateless bearer tokens.
//!
//! A token is `base64url(claims) "." base64url(HMAC-SHA256(secret, base64url(claims)))`.
//! Verification needs only the secret, there is no session store. Tokens expire
//! after the configured TTL and cannot be revoked individually; rotating the
//! secret invalidates every outstanding token.

use std::future::{ready, Ready};
use std::time::Duration;

use actix_web::{dev::Payload, http::header::AUTHORIZATION, web, FromRequest, HttpRequest};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::user::PublicUser;

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Access token required")]
    MissingToken,

    #[error("Invalid token")]
    Malformed,

    #[error("Invalid token")]
    BadSignature,

    #[error("Token expired")]
    Expired,

    #[error("failed to encode token claims: {0}")]
    Encode(#[from] serde_json::Error),
}

/// What a token asserts about its bearer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Claims {
    pub sub: u64,         // User id
    pub username: String,
    pub iat: i64,         // Issued at, unix seconds
    pub exp: i64,         // Expires at, unix seconds
    pub jti: String,      // Token id, only used for log correlation
}

pub struct TokenSigner {
    secret: Vec<u8>,
    ttl_secs: i64,
}

impl TokenSigner {
    pub fn new(secret: impl Into<Vec<u8>>, ttl: Duration) -> Self {
        TokenSigner {
            secret: secret.into(),
            ttl_secs: i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX),
        }
    }

    pub fn issue(&self, user: &PublicUser) -> Result<String, AuthError> {
        self.issue_at(user, Utc::now())
    }

    fn issue_at(&self, user: &PublicUser, now: DateTime<Utc>) -> Result<String, AuthError> {
        let iat = now.timestamp();
        let claims = Claims {
            sub: user.id,
            username: user.username.clone(),
            iat,
            exp: iat.saturating_add(self.ttl_secs),
            jti: Uuid::new_v4().to_string(),
        };

        let payload = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        debug!("Issued token {} for user {}", claims.jti, claims.sub);
        Ok(format!("{payload}.{signature}"))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        self.verify_at(token, Utc::now())
    }

    fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, AuthError> {
        let (payload, signature) = token.split_once('.').ok_or(AuthError::Malformed)?;
        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| AuthError::Malformed)?;

        // Constant-time comparison
        let mut mac = self.mac();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| AuthError::BadSignature)?;

        let raw = URL_SAFE_NO_PAD
            .decode(payload)
            .map_err(|_| AuthError::Malformed)?;
        let claims: Claims = serde_json::from_slice(&raw).map_err(|_| AuthError::Malformed)?;

        if claims.exp <= now.timestamp() {
            return Err(AuthError::Expired);
        }
        Ok(claims)
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(&self.secret).expect("HMAC accepts keys of any length")
    }
}

/// The caller of a protected route, taken from `Authorization: Bearer <token>`.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: u64,
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}

fn authenticate(req: &HttpRequest) -> Result<AuthUser, ApiError> {
    let signer = req
        .app_data::<web::Data<TokenSigner>>()
        .ok_or_else(|| ApiError::Internal("token signer is not configured".to_string()))?;

    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::MissingToken)?;

    let claims = signer.verify(token)?;
    debug!(
        "Token {} accepted for user {} ({})",
        claims.jti, claims.sub, claims.username
    );
    Ok(AuthUser { id: claims.sub })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> PublicUser {
        PublicUser {
            id: 1,
            username: "alice".into(),
            full_name: "Alice".into(),
            email: "alice@example.com".into(),
            registered_at: Utc::now(),
        }
    }

    fn signer() -> TokenSigner {
        TokenSigner::new(b"test-secret".to_vec(), Duration::from_secs(60))
    }

    #[test]
    fn test_issued_token_verifies() {
        let signer = signer();
        let token = signer.issue(&alice()).unwrap();

        let claims = signer.verify(&token).unwrap();
        assert_eq!(claims.sub, 1);
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.exp - claims.iat, 60);
    }

    #[test]
    fn test_tokens_get_distinct_ids() {
        let signer = signer();
        let a = signer.verify(&signer.issue(&alice()).unwrap()).unwrap();
        let b = signer.verify(&signer.issue(&alice()).unwrap()).unwrap();
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let issued = Utc::now() - chrono::Duration::seconds(120);
        let token = signer.issue_at(&alice(), issued).unwrap();

        assert!(matches!(signer.verify(&token), Err(AuthError::Expired)));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signer = signer();
        let token = signer.issue(&alice()).unwrap();
        let (_, signature) = token.split_once('.').unwrap();

        let mut claims = signer.verify(&token).unwrap();
        claims.sub = 2;
        let forged = URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims).unwrap());

        let result = signer.verify(&format!("{forged}.{signature}"));
        assert!(matches!(result, Err(AuthError::BadSignature)));
    }

    #[test]
    fn test_other_secret_rejected() {
        let token = signer().issue(&alice()).unwrap();
        let other = TokenSigner::new(b"another-secret".to_vec(), Duration::from_secs(60));

        assert!(matches!(other.verify(&token), Err(AuthError::BadSignature)));
    }

    #[test]
    fn test_empty_secret_still_signs() {
        let signer = TokenSigner::new(Vec::new(), Duration::from_secs(60));
        let token = signer.issue(&alice()).unwrap();
        assert_eq!(signer.verify(&token).unwrap().sub, 1);
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = signer();
        for token in ["", "no-dot", "a.b", "!!!.???"] {
            assert!(signer.verify(token).is_err(), "token {token:?}");
        }
    }
}
