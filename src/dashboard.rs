//! Dashboard aggregates

use axum::{extract::State, Extension, Json};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::auth_middleware::AuthUser;
use crate::database;
use crate::error::ApiError;
use crate::AppContext;

/// Dashboard overview for the calling user
#[derive(Debug, Serialize, Deserialize)]
pub struct DashboardOverview {
    pub total_products: i64,
    pub expiring_soon: i64,
}

/// GET /api/dashboard/overview
///
/// Counts are scoped to the caller. "Expiring soon" means an expiration date
/// within the next 30 days.
pub async fn get_overview(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<DashboardOverview>, ApiError> {
    let total_products = database::count_products_by_owner(&context.db, &user.id).await?;

    let cutoff = (Utc::now() + Duration::days(30)).date_naive();
    let expiring_soon =
        database::count_products_expiring_by(&context.db, &user.id, cutoff).await?;

    Ok(Json(DashboardOverview {
        total_products,
        expiring_soon,
    }))
}
