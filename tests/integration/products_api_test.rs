//! Integration tests for the products API: authentication and ownership

use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;

#[path = "../common/mod.rs"]
mod common;

#[tokio::test]
async fn test_protected_routes_require_auth() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();

    let routes = [
        ("GET", format!("{}/api/products", base)),
        ("POST", format!("{}/api/products", base)),
        ("GET", format!("{}/api/products/some-id", base)),
        ("PUT", format!("{}/api/products/some-id", base)),
        ("DELETE", format!("{}/api/products/some-id", base)),
        ("GET", format!("{}/api/dashboard/overview", base)),
        ("GET", format!("{}/api/user/profile", base)),
    ];

    for (method, url) in routes {
        let request = match method {
            "GET" => client.get(&url),
            "POST" => client.post(&url).json(&json!({"name": "x"})),
            "PUT" => client.put(&url).json(&json!({"name": "x"})),
            "DELETE" => client.delete(&url),
            _ => unreachable!(),
        };
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 401, "{} {} without token", method, url);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_malformed_auth_header_rejected() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();

    // Wrong scheme, bare scheme with no token, and an empty value must all
    // be 401 with a structured error body, never a 400 from header parsing
    let headers = ["Basic dXNlcjpwYXNz", "Bearer", ""];

    for value in headers {
        let response = client
            .get(format!("{}/api/products", base))
            .header("Authorization", value)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401, "Authorization: {:?}", value);

        let body: serde_json::Value = response.json().await.unwrap();
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_garbled_token_rejected() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/products", base))
        .bearer_auth("garbage.token.value")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_create_product_injects_owner() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token, user_id) = common::register_and_login(&base, "u@example.com").await;

    // Client-supplied owner_id must be ignored
    let response = client
        .post(format!("{}/api/products", base))
        .bearer_auth(&token)
        .json(&json!({
            "name": "Seed A",
            "batch_number": "L1",
            "origin_country": "AR",
            "expiration_date": "2025-12-31",
            "owner_id": "someone-else"
        }))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 201);
    let body: serde_json::Value = response.json().await.unwrap();

    assert!(body["product_id"].as_str().is_some());
    assert_eq!(body["owner_id"], json!(user_id));
    assert_eq!(body["name"], json!("Seed A"));
    assert!(body["created_at"].is_string());
}

#[tokio::test]
async fn test_list_is_scoped_to_owner() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token_u, _) = common::register_and_login(&base, "u@example.com").await;
    let (token_v, _) = common::register_and_login(&base, "v@example.com").await;

    common::create_test_product(&base, &token_u, "Seed A").await;
    common::create_test_product(&base, &token_u, "Seed B").await;

    let list_u: serde_json::Value = client
        .get(format!("{}/api/products", base))
        .bearer_auth(&token_u)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_u.as_array().unwrap().len(), 2);

    // Empty set, not an error, for the other user
    let list_v: serde_json::Value = client
        .get(format!("{}/api/products", base))
        .bearer_auth(&token_v)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list_v.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_cross_owner_access_forbidden() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token_u, _) = common::register_and_login(&base, "u@example.com").await;
    let (token_v, _) = common::register_and_login(&base, "v@example.com").await;

    let product_id = common::create_test_product(&base, &token_u, "Seed A").await;

    // Owner reads fine
    let response = client
        .get(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token_u)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Non-owner gets 403 on get, update, and delete
    let response = client
        .get(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token_v)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client
        .put(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token_v)
        .json(&json!({"name": "Stolen"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    let response = client
        .delete(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token_v)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 403);

    // The product survives the attempted delete, unchanged
    let body: serde_json::Value = client
        .get(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token_u)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["name"], json!("Seed A"));
}

#[tokio::test]
async fn test_nonexistent_product_is_404() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token, _) = common::register_and_login(&base, "u@example.com").await;

    let response = client
        .get(format!("{}/api/products/no-such-id", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    let response = client
        .delete(format!("{}/api/products/no-such-id", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_update_cannot_reassign_owner() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token, user_id) = common::register_and_login(&base, "u@example.com").await;

    let product_id = common::create_test_product(&base, &token, "Seed A").await;

    let response = client
        .put(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token)
        .json(&json!({"name": "Seed A2", "owner_id": "someone-else"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["name"], json!("Seed A2"));
    assert_eq!(body["owner_id"], json!(user_id));
    assert!(body["updated_at"].is_string());
}

#[tokio::test]
async fn test_update_leaves_absent_fields_unchanged() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token, _) = common::register_and_login(&base, "u@example.com").await;

    let product_id = common::create_test_product(&base, &token, "Seed A").await;

    let body: serde_json::Value = client
        .put(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token)
        .json(&json!({"description": "spring batch"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["name"], json!("Seed A"));
    assert_eq!(body["batch_number"], json!("L1"));
    assert_eq!(body["description"], json!("spring batch"));
}

#[tokio::test]
async fn test_delete_product() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token, _) = common::register_and_login(&base, "u@example.com").await;

    let product_id = common::create_test_product(&base, &token, "Seed A").await;

    let response = client
        .delete(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.unwrap();
    assert!(body["message"].is_string());

    let response = client
        .get(format!("{}/api/products/{}", base, product_id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_expired_token_reports_code() {
    let ctx = common::test_context_with_ttl(Duration::from_secs(1)).await;
    let base = common::spawn_app(ctx).await;
    let client = reqwest::Client::new();
    let (token, _) = common::register_and_login(&base, "u@example.com").await;

    tokio::time::sleep(Duration::from_secs(2)).await;

    let response = client
        .get(format!("{}/api/products", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["code"], json!("TOKEN_EXPIRED"));
}

#[tokio::test]
async fn test_refresh_endpoint_rotates_credential() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({"email": "u@example.com", "password": common::TEST_PASSWORD}))
        .send()
        .await
        .unwrap();
    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", base))
        .json(&json!({"email": "u@example.com", "password": common::TEST_PASSWORD}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let refresh_token = login["refresh_token"].as_str().unwrap();

    let response = client
        .post(format!("{}/api/auth/refresh", base))
        .json(&json!({"refresh_token": refresh_token}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    let renewed: serde_json::Value = response.json().await.unwrap();
    assert_ne!(renewed["refresh_token"], login["refresh_token"]);
    assert_eq!(renewed["user"]["email"], json!("u@example.com"));

    // The consumed refresh token is rejected on second use
    let response = client
        .post(format!("{}/api/auth/refresh", base))
        .json(&json!({"refresh_token": refresh_token}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_logout_all_revokes_every_session() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/api/auth/register", base))
        .json(&json!({"email": "u@example.com", "password": common::TEST_PASSWORD}))
        .send()
        .await
        .unwrap();

    // Two independent sign-ins, as from two devices
    let mut sessions = Vec::new();
    for _ in 0..2 {
        let login: serde_json::Value = client
            .post(format!("{}/api/auth/login", base))
            .json(&json!({"email": "u@example.com", "password": common::TEST_PASSWORD}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        sessions.push(login);
    }

    let token = sessions[0]["access_token"].as_str().unwrap();
    let response = client
        .post(format!("{}/api/auth/logout-all", base))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);

    // Neither session's refresh token survives
    for login in &sessions {
        let response = client
            .post(format!("{}/api/auth/refresh", base))
            .json(&json!({"refresh_token": login["refresh_token"]}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401);
    }
}

#[tokio::test]
async fn test_dashboard_overview_counts() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token_u, _) = common::register_and_login(&base, "u@example.com").await;
    let (token_v, _) = common::register_and_login(&base, "v@example.com").await;

    common::create_test_product(&base, &token_u, "Seed A").await;
    client
        .post(format!("{}/api/products", base))
        .bearer_auth(&token_u)
        .json(&json!({"name": "Seed B"}))
        .send()
        .await
        .unwrap();

    let overview: serde_json::Value = client
        .get(format!("{}/api/dashboard/overview", base))
        .bearer_auth(&token_u)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(overview["total_products"], json!(2));

    let overview: serde_json::Value = client
        .get(format!("{}/api/dashboard/overview", base))
        .bearer_auth(&token_v)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(overview["total_products"], json!(0));
}

#[tokio::test]
async fn test_profile_route() {
    let base = common::spawn_app(common::test_context().await).await;
    let client = reqwest::Client::new();
    let (token, user_id) = common::register_and_login(&base, "u@example.com").await;

    let body: serde_json::Value = client
        .get(format!("{}/api/user/profile", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["user"]["id"], json!(user_id));
    assert_eq!(body["user"]["email"], json!("u@example.com"));
    assert_eq!(body["user"]["profile"]["id"], json!(user_id));
}
