//! Product resource handlers
//!
//! State-free CRUD over the products table. Ownership is the only
//! access-control dimension: listing is scoped to the caller, and get,
//! update, and delete all pass through the same ownership check.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth_middleware::AuthUser;
use crate::database::{self, Product};
use crate::error::ApiError;
use crate::AppContext;

/// Payload for creating a product. Owner and timestamps are never accepted
/// from the client; the server stamps both.
#[derive(Debug, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub batch_number: Option<String>,
    pub origin_country: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub description: Option<String>,
}

/// Payload for updating a product. Absent fields are left unchanged; the
/// owner is immutable once set and has no field here.
#[derive(Debug, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub batch_number: Option<String>,
    pub origin_country: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
}

/// Whether an identity may read or mutate a product
fn can_access(user: &AuthUser, product: &Product) -> bool {
    product.owner_id == user.id
}

/// Fetch a product and enforce ownership
///
/// Shared by get, update, and delete so the not-found/forbidden distinction
/// is made in exactly one place.
async fn fetch_owned(
    context: &AppContext,
    user: &AuthUser,
    product_id: &str,
) -> Result<Product, ApiError> {
    let product = database::get_product(&context.db, product_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Product not found"))?;

    if !can_access(user, &product) {
        return Err(ApiError::forbidden(
            "You do not have permission to access this product",
        ));
    }

    Ok(product)
}

/// GET /api/products
pub async fn list_products(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<Vec<Product>>, ApiError> {
    let products = database::list_products_by_owner(&context.db, &user.id).await?;

    Ok(Json(products))
}

/// GET /api/products/{id}
pub async fn get_product(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> Result<Json<Product>, ApiError> {
    let product = fetch_owned(&context, &user, &product_id).await?;

    Ok(Json(product))
}

/// POST /api/products
pub async fn create_product(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Json(payload): Json<NewProduct>,
) -> Result<(StatusCode, Json<Product>), ApiError> {
    let product = Product {
        product_id: Uuid::new_v4().to_string(),
        name: payload.name,
        batch_number: payload.batch_number,
        origin_country: payload.origin_country,
        expiration_date: payload.expiration_date,
        description: payload.description,
        owner_id: user.id.clone(),
        created_at: Utc::now(),
        updated_at: None,
    };

    database::insert_product(&context.db, &product).await?;

    info!("Product {} created by {}", product.product_id, user.id);

    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/products/{id}
pub async fn update_product(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
    Json(patch): Json<ProductPatch>,
) -> Result<Json<Product>, ApiError> {
    let mut product = fetch_owned(&context, &user, &product_id).await?;

    if let Some(name) = patch.name {
        product.name = name;
    }
    if let Some(batch_number) = patch.batch_number {
        product.batch_number = Some(batch_number);
    }
    if let Some(origin_country) = patch.origin_country {
        product.origin_country = Some(origin_country);
    }
    if let Some(expiration_date) = patch.expiration_date {
        product.expiration_date = Some(expiration_date);
    }
    if let Some(description) = patch.description {
        product.description = Some(description);
    }
    product.updated_at = Some(Utc::now());

    database::update_product(&context.db, &product).await?;

    Ok(Json(product))
}

/// DELETE /api/products/{id}
pub async fn delete_product(
    State(context): State<AppContext>,
    Extension(user): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let product = fetch_owned(&context, &user, &product_id).await?;

    database::delete_product(&context.db, &product.product_id).await?;

    info!("Product {} deleted by {}", product.product_id, user.id);

    Ok(Json(DeleteResponse {
        message: "Product deleted successfully".to_string(),
    }))
}
