//! AgroPanel - Inventory Management API
//!
//! A token-authenticated inventory API with per-owner product access, plus a
//! typed client library for building frontends against it.

pub mod auth;
pub mod auth_middleware;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod database;
pub mod error;
pub mod products;
pub mod token;
pub mod web;

pub use auth::{AuthError, AuthService};
pub use auth_middleware::AuthUser;
pub use config::AppConfig;
pub use error::ApiError;
pub use token::{Claims, Credential, TokenService};

use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Main application context shared across the API
#[derive(Clone)]
pub struct AppContext {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub tokens: Arc<RwLock<TokenService>>,
}

impl AppContext {
    pub async fn new(config: AppConfig) -> Result<Self, AuthError> {
        // Initialize database
        let db = database::init_db(&config.database_url).await?;

        // Create token service
        let tokens = Arc::new(RwLock::new(TokenService::new(
            &config.jwt_secret,
            config.access_token_ttl,
            config.refresh_token_ttl,
        )?));

        Ok(Self {
            db,
            config: Arc::new(config),
            tokens,
        })
    }
}
