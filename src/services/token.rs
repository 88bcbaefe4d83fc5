// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Access/refresh token issuing and verification.
//!
//! Both token kinds are HS256 JWTs carrying the user ID and an expiry.
//! Access and refresh tokens are signed with distinct secrets so one
//! kind can never pass verification as the other. Access tokens are
//! verified statelessly; refresh tokens additionally have their current
//! value mirrored on the user document for server-side revocation
//! (that equality check lives in the session handlers, not here).

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::AppError;

/// JWT claims carried by both token kinds.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user document ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Freshly issued access/refresh pair.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Issues and verifies the two session token kinds.
#[derive(Clone)]
pub struct TokenService {
    access_secret: Vec<u8>,
    refresh_secret: Vec<u8>,
    access_ttl_secs: i64,
    refresh_ttl_secs: i64,
}

impl TokenService {
    pub fn from_config(config: &Config) -> Self {
        Self {
            access_secret: config.access_token_secret.clone(),
            refresh_secret: config.refresh_token_secret.clone(),
            access_ttl_secs: config.access_token_ttl_secs,
            refresh_ttl_secs: config.refresh_token_ttl_secs,
        }
    }

    /// Issue a new access/refresh pair for a user.
    ///
    /// Persisting the refresh value onto the user record is the
    /// caller's responsibility (it replaces the prior value, revoking
    /// any outstanding refresh token).
    pub fn issue_pair(&self, user_id: &str) -> Result<TokenPair, AppError> {
        Ok(TokenPair {
            access_token: self.sign(user_id, &self.access_secret, self.access_ttl_secs)?,
            refresh_token: self.sign(user_id, &self.refresh_secret, self.refresh_ttl_secs)?,
        })
    }

    /// Verify an access token, returning the embedded user ID.
    pub fn verify_access(&self, token: &str) -> Result<String, AppError> {
        self.verify(token, &self.access_secret)
    }

    /// Verify a refresh token, returning the embedded user ID.
    pub fn verify_refresh(&self, token: &str) -> Result<String, AppError> {
        self.verify(token, &self.refresh_secret)
    }

    pub fn access_ttl_secs(&self) -> i64 {
        self.access_ttl_secs
    }

    pub fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl_secs
    }

    fn sign(&self, user_id: &str, secret: &[u8], ttl_secs: i64) -> Result<String, AppError> {
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now as usize,
            exp: (now + ttl_secs) as usize,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Token signing failed: {}", e)))
    }

    fn verify(&self, token: &str, secret: &[u8]) -> Result<String, AppError> {
        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(secret),
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|_| AppError::Unauthenticated)?;

        Ok(token_data.claims.sub)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_service() -> TokenService {
        TokenService::from_config(&Config::test_default())
    }

    #[test]
    fn test_pair_roundtrip() {
        let service = test_service();
        let pair = service.issue_pair("user-123").unwrap();

        assert_eq!(service.verify_access(&pair.access_token).unwrap(), "user-123");
        assert_eq!(
            service.verify_refresh(&pair.refresh_token).unwrap(),
            "user-123"
        );
    }

    #[test]
    fn test_tokens_not_interchangeable() {
        // Distinct secrets: an access token must not verify as a
        // refresh token, or vice versa.
        let service = test_service();
        let pair = service.issue_pair("user-123").unwrap();

        assert!(service.verify_refresh(&pair.access_token).is_err());
        assert!(service.verify_access(&pair.refresh_token).is_err());
    }

    #[test]
    fn test_garbage_token_rejected() {
        let service = test_service();
        assert!(service.verify_access("not.a.token").is_err());
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();

        // Hand-craft a token whose expiry is in the past.
        let now = chrono::Utc::now().timestamp();
        let claims = Claims {
            sub: "user-123".to_string(),
            iat: (now - 7200) as usize,
            exp: (now - 3600) as usize,
        };
        let config = Config::test_default();
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&config.access_token_secret),
        )
        .unwrap();

        assert!(service.verify_access(&token).is_err());
    }

    #[test]
    fn test_expiry_ordering() {
        let service = test_service();
        assert!(service.access_ttl_secs() < service.refresh_ttl_secs());
    }
}
