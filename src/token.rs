//! Token issuance and verification
//!
//! Stands in for the hosted identity provider: signs short-lived JWT access
//! tokens and tracks opaque, rotating refresh tokens. Refresh tokens are
//! single-use; presenting one consumes it and issues a fresh credential.

use crate::auth::AuthError;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// An active bearer credential as handed to clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // User ID
    pub email: String, // User email
    pub jti: String,   // Token ID
    pub exp: i64,      // Expiration time
    pub iat: i64,      // Issued at
}

#[derive(Debug, Clone)]
struct RefreshEntry {
    user_id: String,
    email: String,
    expires_at: DateTime<Utc>,
}

pub struct TokenService {
    refresh_tokens: HashMap<String, RefreshEntry>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenService {
    pub fn new(
        secret: &str,
        access_ttl: std::time::Duration,
        refresh_ttl: std::time::Duration,
    ) -> Result<Self, AuthError> {
        let access_ttl = Duration::from_std(access_ttl)
            .map_err(|e| AuthError::Internal(format!("invalid access token ttl: {}", e)))?;
        let refresh_ttl = Duration::from_std(refresh_ttl)
            .map_err(|e| AuthError::Internal(format!("invalid refresh token ttl: {}", e)))?;

        Ok(Self {
            refresh_tokens: HashMap::new(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_ttl,
            refresh_ttl,
        })
    }

    /// Issue a new credential for a user
    ///
    /// Issuance doubles as the cleanup point: expired refresh tokens are
    /// swept here rather than on a timer.
    pub fn issue(&mut self, user_id: &str, email: &str) -> Result<Credential, AuthError> {
        self.cleanup_expired();

        let now = Utc::now();
        let expires_at = now + self.access_ttl;

        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            jti: Uuid::new_v4().to_string(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let access_token = encode(&Header::default(), &claims, &self.encoding_key)?;
        let refresh_token = generate_refresh_token();

        self.refresh_tokens.insert(
            refresh_token.clone(),
            RefreshEntry {
                user_id: user_id.to_string(),
                email: email.to_string(),
                expires_at: now + self.refresh_ttl,
            },
        );

        Ok(Credential {
            access_token,
            refresh_token,
            expires_at,
        })
    }

    /// Verify an access token and return its claims
    ///
    /// Distinguishes an expired token from any other verification failure so
    /// the API can report `TOKEN_EXPIRED` to clients.
    pub fn verify(&self, access_token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::default();
        validation.leeway = 0;

        let token_data =
            decode::<Claims>(access_token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                    _ => AuthError::InvalidToken,
                }
            })?;

        Ok(token_data.claims)
    }

    /// Exchange a refresh token for a new credential
    ///
    /// Returns the owning user's ID alongside the credential. The presented
    /// token is consumed whether or not a new credential is issued; a refresh
    /// token never survives its first use.
    pub fn refresh(&mut self, refresh_token: &str) -> Result<(String, Credential), AuthError> {
        let entry = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(AuthError::SessionExpired)?;

        if Utc::now() > entry.expires_at {
            return Err(AuthError::SessionExpired);
        }

        let credential = self.issue(&entry.user_id, &entry.email)?;

        Ok((entry.user_id, credential))
    }

    /// Revoke a single refresh token
    pub fn revoke(&mut self, refresh_token: &str) {
        self.refresh_tokens.remove(refresh_token);
    }

    /// Revoke every refresh token issued to a user
    pub fn revoke_user(&mut self, user_id: &str) {
        self.refresh_tokens
            .retain(|_, entry| entry.user_id != user_id);
    }

    /// Drop refresh tokens past their expiry
    pub fn cleanup_expired(&mut self) {
        let now = Utc::now();
        self.refresh_tokens.retain(|_, entry| entry.expires_at > now);
    }

    /// Count of live refresh tokens for a user
    pub fn user_token_count(&self, user_id: &str) -> usize {
        let now = Utc::now();
        self.refresh_tokens
            .values()
            .filter(|e| e.user_id == user_id && e.expires_at > now)
            .count()
    }
}

fn generate_refresh_token() -> String {
    use base64::{engine::general_purpose, Engine as _};
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}
