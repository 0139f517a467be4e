//! Configuration for AgroPanel

use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application name
    pub app_name: String,

    /// Database URL
    pub database_url: String,

    /// API server host
    pub host: String,

    /// API server port
    pub port: u16,

    /// Origin allowed by CORS
    pub cors_origin: String,

    /// JWT signing secret
    pub jwt_secret: String,

    /// Access token lifetime
    pub access_token_ttl: Duration,

    /// Refresh token lifetime
    pub refresh_token_ttl: Duration,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            app_name: "AgroPanel".to_string(),
            database_url: "sqlite://agropanel.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 4000,
            cors_origin: "http://localhost:3000".to_string(),
            jwt_secret: generate_secret(),
            access_token_ttl: Duration::from_secs(60 * 60), // 1 hour
            refresh_token_ttl: Duration::from_secs(30 * 24 * 60 * 60), // 30 days
        }
    }
}

fn generate_secret() -> String {
    use base64::{engine::general_purpose, Engine as _};
    use rand::Rng;
    let mut rng = rand::thread_rng();
    let bytes: Vec<u8> = (0..32).map(|_| rng.gen()).collect();
    general_purpose::STANDARD.encode(bytes)
}

pub struct AppConfigBuilder {
    config: AppConfig,
}

impl AppConfig {
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder {
            config: AppConfig::default(),
        }
    }

    /// Load configuration from environment and files
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let mut config = config::Config::builder();

        // Start with default
        config = config.add_source(config::Config::try_from(&AppConfig::default())?);

        // Layer on .env file
        if dotenvy::dotenv().is_ok() {
            config = config.add_source(config::Environment::with_prefix("AGROPANEL"));
        }

        // Layer on config file if exists
        if std::path::Path::new("agropanel.toml").exists() {
            config = config.add_source(config::File::with_name("agropanel"));
        }

        config.build()?.try_deserialize()
    }
}

impl AppConfigBuilder {
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.config.app_name = name.into();
        self
    }

    pub fn database_url(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = url.into();
        self
    }

    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.config.cors_origin = origin.into();
        self
    }

    pub fn jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.config.jwt_secret = secret.into();
        self
    }

    pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
        self.config.access_token_ttl = ttl;
        self
    }

    pub fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
        self.config.refresh_token_ttl = ttl;
        self
    }

    pub fn build(self) -> AppConfig {
        self.config
    }
}
