//! Client-side session state

use serde::Deserialize;
use tokio::sync::{watch, RwLock};
use tracing::warn;

use crate::database::PublicUser;
use crate::token::Credential;
use crate::web::{LoginRequest, LogoutRequest, RefreshRequest, RegisterRequest, SessionResponse};

use super::ClientError;

/// Auth state as observed by subscribers, pushed on every change.
#[derive(Debug, Clone)]
pub enum AuthState {
    SignedIn(PublicUser),
    SignedOut,
}

#[derive(Debug, Clone)]
struct ActiveSession {
    user: PublicUser,
    credential: Credential,
}

/// Owns the current identity and credential
///
/// At most one credential is live at a time; every operation that replaces it
/// invalidates the previous one. All state changes are pushed to subscribers
/// through a watch channel.
pub struct SessionManager {
    http: reqwest::Client,
    base_url: String,
    state: RwLock<Option<ActiveSession>>,
    notify: watch::Sender<AuthState>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl SessionManager {
    pub fn new(base_url: impl Into<String>) -> Self {
        let (notify, _) = watch::channel(AuthState::SignedOut);

        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            state: RwLock::new(None),
            notify,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Subscribe to auth state changes
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.notify.subscribe()
    }

    /// Create a new account
    ///
    /// Registration does not establish a session; call [`sign_in`] after.
    ///
    /// [`sign_in`]: SessionManager::sign_in
    pub async fn sign_up(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/auth/register", self.base_url))
            .json(&RegisterRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        Ok(response.json::<PublicUser>().await?)
    }

    /// Sign in and store the resulting identity and credential
    ///
    /// On failure no state changes; the previous session (if any) stays live.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let response = self
            .http
            .post(format!("{}/api/auth/login", self.base_url))
            .json(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let session = response.json::<SessionResponse>().await?;
        let user = session.user.clone();
        self.install(session).await;

        Ok(user)
    }

    /// Sign out, invalidating the credential locally and server-side
    pub async fn sign_out(&self) {
        let refresh_token = {
            let state = self.state.read().await;
            state.as_ref().map(|s| s.credential.refresh_token.clone())
        };

        // Best-effort server-side revocation; local state clears regardless.
        if let Some(refresh_token) = refresh_token {
            let result = self
                .http
                .post(format!("{}/api/auth/logout", self.base_url))
                .json(&LogoutRequest { refresh_token })
                .send()
                .await;
            if let Err(e) = result {
                warn!("Sign-out revocation failed: {}", e);
            }
        }

        *self.state.write().await = None;
        self.notify.send_replace(AuthState::SignedOut);
    }

    /// Exchange the refresh token for a new credential
    ///
    /// Fail-safe: any failure degrades to signed-out, never leaves a stale
    /// credential live.
    pub async fn refresh_session(&self) -> Result<(), ClientError> {
        let refresh_token = {
            let state = self.state.read().await;
            state.as_ref().map(|s| s.credential.refresh_token.clone())
        };

        let Some(refresh_token) = refresh_token else {
            return Err(ClientError::SessionExpired);
        };

        let response = self
            .http
            .post(format!("{}/api/auth/refresh", self.base_url))
            .json(&RefreshRequest { refresh_token })
            .send()
            .await;

        match response {
            Ok(response) if response.status().is_success() => {
                let session = response.json::<SessionResponse>().await?;
                self.install(session).await;
                Ok(())
            }
            _ => {
                self.sign_out().await;
                Err(ClientError::SessionExpired)
            }
        }
    }

    /// Current bearer token, or None when unauthenticated. Never fails.
    pub async fn get_access_token(&self) -> Option<String> {
        let state = self.state.read().await;
        state.as_ref().map(|s| s.credential.access_token.clone())
    }

    /// Current identity, or None when signed out
    pub async fn current_user(&self) -> Option<PublicUser> {
        let state = self.state.read().await;
        state.as_ref().map(|s| s.user.clone())
    }

    async fn install(&self, session: SessionResponse) {
        let user = session.user.clone();
        *self.state.write().await = Some(ActiveSession {
            user: session.user,
            credential: Credential {
                access_token: session.access_token,
                refresh_token: session.refresh_token,
                expires_at: session.expires_at,
            },
        });
        self.notify.send_replace(AuthState::SignedIn(user));
    }
}

pub(super) async fn api_error(response: reqwest::Response) -> ClientError {
    let status = response.status();
    let fallback = status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string();
    let message = match response.json::<ErrorBody>().await {
        Ok(body) => body.error,
        Err(_) => fallback,
    };

    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
