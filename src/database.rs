//! Database models and operations

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub auth_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

/// User shape exposed over the wire; never carries the password hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicUser {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub product_id: String,
    pub name: String,
    pub batch_number: Option<String>,
    pub origin_country: Option<String>,
    pub expiration_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Initialize the database and run migrations
pub async fn init_db(database_url: &str) -> Result<SqlitePool, sqlx::Error> {
    // Create the database file if it doesn't exist
    if database_url.starts_with("sqlite://") {
        let path = database_url.trim_start_matches("sqlite://");
        if path != ":memory:" {
            if let Some(parent) = std::path::Path::new(path).parent() {
                std::fs::create_dir_all(parent).ok();
            }
        }
    }

    // An in-memory database exists per connection, so the pool must hold a
    // single connection open for the database to survive.
    let in_memory = database_url.contains(":memory:");
    let options = if in_memory {
        SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
    } else {
        SqlitePoolOptions::new().max_connections(5)
    };

    let pool = options.connect(database_url).await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Create a new user
pub async fn create_user(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, email, auth_hash, created_at, last_login)
        VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(&user.id)
    .bind(&user.email)
    .bind(&user.auth_hash)
    .bind(user.created_at)
    .bind(user.last_login)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get user by email
pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, auth_hash, created_at, last_login
        FROM users
        WHERE email = ?1
        "#,
    )
    .bind(email)
    .fetch_optional(pool)
    .await
}

/// Get user by ID
pub async fn get_user_by_id(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT id, email, auth_hash, created_at, last_login
        FROM users
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Update last login time
pub async fn update_last_login(pool: &SqlitePool, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(r#"UPDATE users SET last_login = ?1 WHERE id = ?2"#)
        .bind(Utc::now())
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

/// List every product owned by a user
pub async fn list_products_by_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT product_id, name, batch_number, origin_country, expiration_date,
               description, owner_id, created_at, updated_at
        FROM products
        WHERE owner_id = ?1
        ORDER BY created_at DESC
        "#,
    )
    .bind(owner_id)
    .fetch_all(pool)
    .await
}

/// Get product by ID, regardless of owner
pub async fn get_product(pool: &SqlitePool, id: &str) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as::<_, Product>(
        r#"
        SELECT product_id, name, batch_number, origin_country, expiration_date,
               description, owner_id, created_at, updated_at
        FROM products
        WHERE product_id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// Insert a product
pub async fn insert_product(pool: &SqlitePool, product: &Product) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO products (product_id, name, batch_number, origin_country,
                              expiration_date, description, owner_id, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&product.product_id)
    .bind(&product.name)
    .bind(&product.batch_number)
    .bind(&product.origin_country)
    .bind(product.expiration_date)
    .bind(&product.description)
    .bind(&product.owner_id)
    .bind(product.created_at)
    .bind(product.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist an updated product, keyed by its ID
pub async fn update_product(pool: &SqlitePool, product: &Product) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE products
        SET name = ?1, batch_number = ?2, origin_country = ?3,
            expiration_date = ?4, description = ?5, updated_at = ?6
        WHERE product_id = ?7
        "#,
    )
    .bind(&product.name)
    .bind(&product.batch_number)
    .bind(&product.origin_country)
    .bind(product.expiration_date)
    .bind(&product.description)
    .bind(product.updated_at)
    .bind(&product.product_id)
    .execute(pool)
    .await?;

    Ok(())
}

/// Delete a product by ID
pub async fn delete_product(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query(r#"DELETE FROM products WHERE product_id = ?1"#)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

/// Count of products owned by a user
pub async fn count_products_by_owner(
    pool: &SqlitePool,
    owner_id: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(r#"SELECT COUNT(*) FROM products WHERE owner_id = ?1"#)
        .bind(owner_id)
        .fetch_one(pool)
        .await
}

/// Count of a user's products expiring on or before a date
pub async fn count_products_expiring_by(
    pool: &SqlitePool,
    owner_id: &str,
    cutoff: NaiveDate,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM products
        WHERE owner_id = ?1
          AND expiration_date IS NOT NULL
          AND expiration_date <= ?2
        "#,
    )
    .bind(owner_id)
    .bind(cutoff)
    .fetch_one(pool)
    .await
}
