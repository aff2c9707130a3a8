//! Integration tests for event CRUD, nearby search, and participation.

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

/// Helper: register a user and return (token, user_id).
async fn register_user(base_url: &str, email: &str, name: &str) -> (String, i64) {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/auth/register", base_url))
        .json(&json!({ "email": email, "password": "pw-long-enough", "name": name }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "Registration failed for {}", email);
    let body: serde_json::Value = resp.json().await.unwrap();
    let token = body["token"].as_str().unwrap().to_string();
    let user_id = body["user"]["id"].as_i64().unwrap();
    (token, user_id)
}

/// Helper: create an event and return its id.
async fn create_event(base_url: &str, token: &str, title: &str, lat: f64, lng: f64) -> i64 {
    let client = reqwest::Client::new();
    let resp = client
        .post(format!("{}/events", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({
            "title": title,
            "description": "bring snacks",
            "start_time": "2026-09-01T18:00:00Z",
            "lat": lat,
            "lng": lng,
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201, "Event creation failed for {}", title);
    let body: serde_json::Value = resp.json().await.unwrap();
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_create_and_fetch_event() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();
    let (token, user_id) = register_user(&base_url, "organizer@example.com", "Orga").await;

    let event_id = create_event(&base_url, &token, "Picnic", 48.137, 11.575).await;

    // Fetch by id, organizer details are joined in
    let resp = client
        .get(format!("{}/events/{}", base_url, event_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["event"]["title"], "Picnic");
    assert_eq!(body["event"]["organizer_id"].as_i64().unwrap(), user_id);
    assert_eq!(body["event"]["organizer_name"], "Orga");
    assert_eq!(body["event"]["organizer_email"], "organizer@example.com");

    // Creating requires a token
    let resp = client
        .post(format!("{}/events", base_url))
        .json(&json!({ "title": "Nope", "start_time": "2026-09-01T18:00:00Z", "lat": 0, "lng": 0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    // Own events listing
    let resp = client
        .get(format!("{}/events/mine", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let mine = body["events"].as_array().unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0]["id"].as_i64().unwrap(), event_id);

    // Unknown id is a 404
    let resp = client
        .get(format!("{}/events/999999", base_url))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_nearby_uses_bounding_box() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();
    let (token, _user_id) = register_user(&base_url, "mapper@example.com", "Mapper").await;

    let near_id = create_event(&base_url, &token, "Near", 48.137, 11.575).await;
    let _far_id = create_event(&base_url, &token, "Far", 40.712, -74.006).await;

    // Query centered on the first event only returns it
    let resp = client
        .get(format!(
            "{}/events?lat=48.137&lng=11.575&radius=10",
            base_url
        ))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    let events = body["events"].as_array().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0]["id"].as_i64().unwrap(), near_id);
    assert_eq!(events[0]["organizer_name"], "Mapper");

    // A wide radius catches both
    let resp = client
        .get(format!(
            "{}/events?lat=48.137&lng=11.575&radius=20000",
            base_url
        ))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["events"].as_array().unwrap().len(), 2);

    // Defaults (origin, 10 km) match neither
    let resp = client
        .get(format!("{}/events", base_url))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["events"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_create_event_validation() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();
    let (token, _user_id) = register_user(&base_url, "strict@example.com", "Strict").await;

    // No coordinates
    let resp = client
        .post(format!("{}/events", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "Nowhere", "start_time": "2026-09-01T18:00:00Z" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // Blank title
    let resp = client
        .post(format!("{}/events", base_url))
        .header("Authorization", format!("Bearer {}", token))
        .json(&json!({ "title": "   ", "start_time": "2026-09-01T18:00:00Z", "lat": 1.0, "lng": 2.0 }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn test_participation_flow() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();
    let (org_token, org_id) = register_user(&base_url, "host@example.com", "Host").await;
    let (guest_token, guest_id) = register_user(&base_url, "guest@example.com", "Guest").await;

    let event_id = create_event(&base_url, &org_token, "Dinner", 52.52, 13.405).await;

    // Join once
    let resp = client
        .post(format!("{}/events/{}/participate", base_url, event_id))
        .header("Authorization", format!("Bearer {}", guest_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 201);

    // Joining again is a conflict, and must not add a second row
    let resp = client
        .post(format!("{}/events/{}/participate", base_url, event_id))
        .header("Authorization", format!("Bearer {}", guest_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 409);

    let resp = client
        .get(format!("{}/events/{}/participants", base_url, event_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["organizer"]["id"].as_i64().unwrap(), org_id);
    let participants = body["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 1);
    assert_eq!(participants[0]["id"].as_i64().unwrap(), guest_id);
    assert_eq!(participants[0]["name"], "Guest");

    // Unknown event is a 404
    let resp = client
        .post(format!("{}/events/999999/participate", base_url))
        .header("Authorization", format!("Bearer {}", guest_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn test_delete_event_authorization() {
    let (base_url, _addr) = start_test_server().await;
    let client = reqwest::Client::new();
    let (org_token, _org_id) = register_user(&base_url, "owner@example.com", "Owner").await;
    let (other_token, _other_id) = register_user(&base_url, "rando@example.com", "Rando").await;

    let event_id = create_event(&base_url, &org_token, "Doomed", 52.52, 13.405).await;

    // Someone else cannot delete it
    let resp = client
        .delete(format!("{}/events/{}", base_url, event_id))
        .header("Authorization", format!("Bearer {}", other_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 403);

    // The organizer can
    let resp = client
        .delete(format!("{}/events/{}", base_url, event_id))
        .header("Authorization", format!("Bearer {}", org_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body["ok"], true);

    // It is gone afterwards
    let resp = client
        .get(format!("{}/events/{}", base_url, event_id))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);

    // Deleting it again is also a 404
    let resp = client
        .delete(format!("{}/events/{}", base_url, event_id))
        .header("Authorization", format!("Bearer {}", org_token))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 404);
}
