//! Authentication middleware for protected API routes

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization};
use axum_extra::typed_header::TypedHeaderRejection;
use axum_extra::TypedHeader;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::database::{self, PublicUser};
use crate::error::ApiError;
use crate::AppContext;

/// The authenticated actor, attached to request extensions by [`require_auth`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    pub id: String,
    pub email: String,
    pub profile: Option<PublicUser>,
}

/// Require a valid bearer token for API access
///
/// Verifies the token, resolves the identity, and attaches it to request
/// extensions. Expired tokens are reported with a `TOKEN_EXPIRED` code so
/// clients can refresh instead of forcing a new sign-in.
pub async fn require_auth(
    State(context): State<AppContext>,
    auth_header: Result<TypedHeader<Authorization<Bearer>>, TypedHeaderRejection>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // Extract token from Authorization header. A missing header and a
    // malformed one (wrong scheme, bare "Bearer") are both 401, never the
    // extractor's own 400.
    let token = auth_header
        .map(|auth| auth.token().to_string())
        .map_err(|_| ApiError::unauthorized("Authentication token required"))?;

    // Verify token with the token service
    let claims = context.tokens.read().await.verify(&token)?;

    // Enrich with the application profile; a missing or failed lookup is
    // tolerated, the verified claims alone are enough to act on.
    let profile = match database::get_user_by_id(&context.db, &claims.sub).await {
        Ok(user) => user.map(PublicUser::from),
        Err(e) => {
            warn!("Profile lookup failed for user {}: {}", claims.sub, e);
            None
        }
    };

    request.extensions_mut().insert(AuthUser {
        id: claims.sub,
        email: claims.email,
        profile,
    });

    Ok(next.run(request).await)
}
