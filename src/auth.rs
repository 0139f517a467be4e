//! Core authentication logic

use crate::database::{self, User};
use crate::token::Credential;
use crate::AppContext;
use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailTaken,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Session expired")]
    SessionExpired,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Hashing error: {0}")]
    Hashing(String),

    #[error("JWT error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub struct AuthService {
    context: AppContext,
    argon2: Argon2<'static>,
}

impl AuthService {
    pub fn new(context: AppContext) -> Self {
        Self {
            context,
            argon2: Argon2::default(),
        }
    }

    /// Register a new user
    ///
    /// Registration creates the account only; it does not establish a
    /// session. Callers sign in afterwards to obtain a credential.
    pub async fn register(&self, email: &str, password: &str) -> Result<User, AuthError> {
        if database::get_user_by_email(&self.context.db, email)
            .await?
            .is_some()
        {
            return Err(AuthError::EmailTaken);
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| AuthError::Hashing(e.to_string()))?;

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.to_string(),
            auth_hash: password_hash.to_string(),
            created_at: Utc::now(),
            last_login: None,
        };

        database::create_user(&self.context.db, &user).await?;

        Ok(user)
    }

    /// Authenticate a user and issue a credential
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(User, Credential), AuthError> {
        let user = database::get_user_by_email(&self.context.db, email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let parsed_hash =
            PasswordHash::new(&user.auth_hash).map_err(|e| AuthError::Hashing(e.to_string()))?;

        self.argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)?;

        let credential = self
            .context
            .tokens
            .write()
            .await
            .issue(&user.id, &user.email)?;

        database::update_last_login(&self.context.db, &user.id).await?;

        Ok((user, credential))
    }

    /// Exchange a refresh token for a new credential
    pub async fn refresh(&self, refresh_token: &str) -> Result<(User, Credential), AuthError> {
        let (user_id, credential) = self.context.tokens.write().await.refresh(refresh_token)?;

        let user = database::get_user_by_id(&self.context.db, &user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        Ok((user, credential))
    }

    /// Revoke a single refresh token
    pub async fn logout(&self, refresh_token: &str) -> Result<(), AuthError> {
        self.context.tokens.write().await.revoke(refresh_token);

        Ok(())
    }

    /// Revoke every refresh token for a user
    pub async fn logout_all(&self, user_id: &str) -> Result<(), AuthError> {
        self.context.tokens.write().await.revoke_user(user_id);

        Ok(())
    }
}
