//! Authenticated HTTP client

use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::session::{api_error, SessionManager};
use super::ClientError;

/// HTTP client that attaches the current bearer token to every request
///
/// A 401 response triggers exactly one refresh-and-retry; a second 401 or a
/// failed refresh surfaces as an error. Concurrent requests that hit 401
/// together share a single in-flight refresh rather than each racing their
/// own.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionManager>,
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(session: Arc<SessionManager>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: session.base_url().to_string(),
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let body = serde_json::to_value(body)?;
        self.request(Method::PUT, path, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ClientError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<serde_json::Value>,
    ) -> Result<T, ClientError> {
        let token_seen = self.session.get_access_token().await;
        let mut response = self.dispatch(&method, path, body.as_ref()).await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            self.refresh_once(token_seen).await?;
            response = self.dispatch(&method, path, body.as_ref()).await?;
        }

        if response.status().is_success() {
            Ok(response.json::<T>().await?)
        } else {
            Err(api_error(response).await)
        }
    }

    async fn dispatch(
        &self,
        method: &Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response, ClientError> {
        let mut request = self
            .http
            .request(method.clone(), format!("{}{}", self.base_url, path));

        if let Some(token) = self.session.get_access_token().await {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        Ok(request.send().await?)
    }

    /// Refresh the session at most once across concurrent callers
    ///
    /// The first caller through the gate performs the refresh; later callers
    /// find the token already replaced and skip straight to their retry.
    async fn refresh_once(&self, token_seen: Option<String>) -> Result<(), ClientError> {
        let _gate = self.refresh_gate.lock().await;

        if self.session.get_access_token().await == token_seen {
            self.session
                .refresh_session()
                .await
                .map_err(|_| ClientError::SessionExpired)?;
        }

        Ok(())
    }
}
