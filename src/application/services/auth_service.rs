//! Bearer token issuance and verification.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Issuer claim stamped on every token.
pub const TOKEN_ISSUER: &str = "shortener";

/// Errors raised while issuing or verifying a token.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    #[error("token subject is not an owner id")]
    InvalidSubject,
}

/// JWT claims carried by API tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Owner id.
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
}

/// Issues and verifies HS256 tokens bound to an owner id.
///
/// The core never sees credentials; it only receives the owner id recovered
/// from a verified token.
pub struct AuthService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: i64,
}

impl AuthService {
    /// Creates a new authentication service.
    ///
    /// # Arguments
    ///
    /// - `secret` - HMAC key shared by issuer and verifier
    /// - `ttl_seconds` - lifetime of issued tokens
    pub fn new(secret: &str, ttl_seconds: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: i64::try_from(ttl_seconds).unwrap_or(i64::MAX),
        }
    }

    /// Mints a token for `owner_id`.
    pub fn issue(&self, owner_id: Uuid) -> Result<String, AuthError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: owner_id.to_string(),
            iat: now,
            exp: now.saturating_add(self.ttl_seconds),
            iss: TOKEN_ISSUER.to_string(),
        };

        Ok(encode(&Header::default(), &claims, &self.encoding_key)?)
    }

    /// Verifies signature, expiry and issuer, then returns the owner id.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidToken`] for malformed, forged or expired tokens,
    /// [`AuthError::InvalidSubject`] if `sub` is not a UUID.
    pub fn verify(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[TOKEN_ISSUER]);

        let data = decode::<Claims>(token, &self.decoding_key, &validation)?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| AuthError::InvalidSubject)
    }
}
