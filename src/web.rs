//! API routes and router assembly

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::auth::AuthService;
use crate::auth_middleware::{require_auth, AuthUser};
use crate::database::PublicUser;
use crate::error::ApiError;
use crate::token::Credential;
use crate::{dashboard, products, AppContext};

#[derive(Debug, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutRequest {
    pub refresh_token: String,
}

/// Response to a successful login or refresh
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: chrono::DateTime<chrono::Utc>,
}

impl SessionResponse {
    fn new(user: PublicUser, credential: Credential) -> Self {
        Self {
            user,
            access_token: credential.access_token,
            refresh_token: credential.refresh_token,
            expires_at: credential.expires_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: AuthUser,
}

pub fn create_router(context: AppContext) -> Router {
    let cors = cors_layer(&context.config.cors_origin);

    let protected = Router::new()
        .route(
            "/api/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/products/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/dashboard/overview", get(dashboard::get_overview))
        .route("/api/user/profile", get(profile_handler))
        .route("/api/auth/logout-all", post(logout_all_handler))
        .route_layer(middleware::from_fn_with_state(
            context.clone(),
            require_auth,
        ));

    Router::new()
        .route("/", get(root_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .route("/api/auth/refresh", post(refresh_handler))
        .route("/api/auth/logout", post(logout_handler))
        .merge(protected)
        .layer(RequestBodyLimitLayer::new(1024 * 1024)) // 1MB limit
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(context)
}

fn cors_layer(origin: &str) -> CorsLayer {
    let origin = origin
        .parse::<HeaderValue>()
        .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3000"));

    CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}

async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "API running".to_string(),
    })
}

async fn register_handler(
    State(context): State<AppContext>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), ApiError> {
    if request.email.is_empty() || request.password.is_empty() {
        return Err(ApiError::bad_request(
            "Email and password are required",
            "MISSING_FIELDS",
        ));
    }

    let auth = AuthService::new(context);
    let user = auth.register(&request.email, &request.password).await?;

    info!("Registered user {}", user.id);

    Ok((StatusCode::CREATED, Json(user.into())))
}

async fn login_handler(
    State(context): State<AppContext>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let auth = AuthService::new(context);
    let (user, credential) = auth
        .authenticate(&request.email, &request.password)
        .await?;

    info!("User {} signed in", user.id);

    Ok(Json(SessionResponse::new(user.into(), credential)))
}

async fn refresh_handler(
    State(context): State<AppContext>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let auth = AuthService::new(context);
    let (user, credential) = auth.refresh(&request.refresh_token).await?;

    Ok(Json(SessionResponse::new(user.into(), credential)))
}

async fn logout_handler(
    State(context): State<AppContext>,
    Json(request): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth = AuthService::new(context);
    auth.logout(&request.refresh_token).await?;

    Ok(Json(MessageResponse {
        message: "Signed out".to_string(),
    }))
}

/// Revoke every refresh token of the calling user, ending all their sessions
async fn logout_all_handler(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<MessageResponse>, ApiError> {
    let auth = AuthService::new(context);
    auth.logout_all(&user.id).await?;

    info!("User {} signed out everywhere", user.id);

    Ok(Json(MessageResponse {
        message: "Signed out everywhere".to_string(),
    }))
}

async fn profile_handler(
    Extension(user): Extension<AuthUser>,
) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        message: "Profile retrieved successfully".to_string(),
        user,
    })
}
