//! API client library
//!
//! The frontend core: session state, an authenticated HTTP client with a
//! single refresh-and-retry on 401, and a route guard with proactive token
//! refresh. Intended for a desktop or CLI frontend and for integration tests.

mod guard;
mod http;
mod session;

pub use guard::RouteGuard;
pub use http::ApiClient;
pub use session::{AuthState, SessionManager};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("Session expired. Please sign in again.")]
    SessionExpired,
}
