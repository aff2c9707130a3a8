//! Integration tests for registration, login, and user search.

use serde_json::json;
use std::net::SocketAddr;
use tokio::net::TcpListener;

/// Helper: start the server on a random port and return its base URL.
async fn start_test_server() -> (String, SocketAddr) {
    let tmp_dir = tempfile::tempdir().expect("Failed to create temp dir");
    let data_dir = tmp_dir.path().to_str().unwrap().to_string();

    let db = gather_server::db::init_db(&data_dir).expect("Failed to init DB");
    let jwt_secret = gather_server::auth::jwt::load_or_generate_jwt_secret(&data_dir)
        .expect("Failed to generate JWT secret");

    let registry = gather_server::ws::PresenceRegistry::new();
    let relay = gather_server::ws::Relay::new(registry.clone());

    let state = gather_server::state::AppState {
        db,
        jwt_secret,
        registry,
        relay,
    };

    let app = gather_server::routes::build_router(state);
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .unwrap();
        let _keep = tmp_dir;
    });

    let base_url = format!("http://{}", addr);
    (base_url, addr)
}

#[tokio::test]
async fn test_register_login_flow() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    // Register
    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "email": "alice@example.com", "password": "correct-horse", "name": "Alice" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["token"].as_str().unwrap().len() > 20);
    assert_eq!(body["user"]["email"], "alice@example.com");
    assert_eq!(body["user"]["name"], "Alice");
    assert!(body["user"]["id"].as_i64().unwrap() > 0);

    // Same email again is a conflict
    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "email": "alice@example.com", "password": "other", "name": "Imposter" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    // Login with the right password
    let resp = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": "alice@example.com", "password": "correct-horse" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["token"].as_str().unwrap().len() > 20);
    assert_eq!(body["user"]["name"], "Alice");

    // Wrong password is a 401, not a 404-style hint
    let resp = client
        .post(format!("{}/auth/login", base_url))
        .json(&json!({ "email": "alice@example.com", "password": "wrong" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn test_register_requires_credentials() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "email": "bob@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "password": "something" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_find_users() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    for (email, name) in [
        ("carol@example.com", "Carol"),
        ("dave@example.com", "Dave"),
    ] {
        let resp = client
            .post(format!("{}/auth/register", base_url))
            .json(&json!({ "email": email, "password": "pw-long-enough", "name": name }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 201);
    }

    // Match by name substring
    let resp = client
        .get(format!("{}/auth/find?name=aro", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let users = body["users"].as_array().unwrap();
    assert_eq!(users.len(), 1);
    assert_eq!(users[0]["name"], "Carol");

    // Match by email substring
    let resp = client
        .get(format!("{}/auth/find?name=dave@", base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["users"].as_array().unwrap().len(), 1);

    // Missing query is a validation error
    let resp = client
        .get(format!("{}/auth/find", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_protected_routes_reject_bad_tokens() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();

    // No Authorization header
    let resp = client
        .get(format!("{}/chat/conversations", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Garbage token
    let resp = client
        .get(format!("{}/chat/conversations", base_url))
        .header("Authorization", "Bearer not-a-jwt")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}
