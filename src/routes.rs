use axum::{middleware, Json, Router};
use std::sync::Arc;
use tower_governor::key_extractor::PeerIpKeyExtractor;
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};
use tower_http::cors::CorsLayer;

use crate::auth::accounts;
use crate::auth::middleware::JwtSecret;
use crate::chat::{conversations, messages};
use crate::events::{crud as event_crud, participation};
use crate::state::AppState;
use crate::ws::handler as ws_handler;

/// Inject the JWT secret into request extensions so the Claims extractor can find it.
async fn inject_jwt_secret(
    axum::extract::State(state): axum::extract::State<AppState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: middleware::Next,
) -> axum::response::Response {
    req.extensions_mut()
        .insert(JwtSecret(state.jwt_secret.clone()));
    next.run(req).await
}

/// Build the full axum Router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    // Rate limiting: 5 requests per minute per IP on credential endpoints.
    // Uses PeerIpKeyExtractor which reads from ConnectInfo<SocketAddr>
    let governor_config = Arc::new(
        GovernorConfigBuilder::default()
            .key_extractor(PeerIpKeyExtractor)
            .per_second(12) // 1 token every 12 seconds = 5 per minute
            .burst_size(5)  // Allow burst of 5
            .finish()
            .expect("Failed to build governor config"),
    );
    let governor_limiter = governor_config.limiter().clone();

    // Spawn background task to clean up rate limiter state
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(std::time::Duration::from_secs(60)).await;
            governor_limiter.retain_recent();
        }
    });

    // Credential endpoints with rate limiting
    let auth_routes = Router::new()
        .route("/auth/register", axum::routing::post(accounts::register))
        .route("/auth/login", axum::routing::post(accounts::login))
        .layer(GovernorLayer {
            config: governor_config,
        });

    // User search (no rate limiting, it backs an incremental search box)
    let user_routes = Router::new().route("/auth/find", axum::routing::get(accounts::find_users));

    // Event discovery and lifecycle.
    // /events/mine is a static segment, so it wins over /events/{id}.
    let event_routes = Router::new()
        .route("/events", axum::routing::get(event_crud::list_nearby))
        .route("/events", axum::routing::post(event_crud::create_event))
        .route("/events/mine", axum::routing::get(event_crud::list_mine))
        .route("/events/{id}", axum::routing::get(event_crud::get_event))
        .route("/events/{id}", axum::routing::delete(event_crud::delete_event))
        .route(
            "/events/{id}/participants",
            axum::routing::get(participation::list_participants),
        )
        .route(
            "/events/{id}/participate",
            axum::routing::post(participation::participate),
        );

    // Chat history and REST submission
    let chat_routes = Router::new()
        .route(
            "/chat/event/{event_id}/messages",
            axum::routing::get(messages::event_history),
        )
        .route(
            "/chat/event/{event_id}/messages",
            axum::routing::post(messages::create_event_message),
        )
        .route(
            "/chat/private/{user_a}/{user_b}",
            axum::routing::get(conversations::private_history),
        )
        .route(
            "/chat/conversations",
            axum::routing::get(conversations::list_conversations),
        );

    // WebSocket endpoint (identity asserted in-band, not via JWT header)
    let ws_routes = Router::new().route("/ws", axum::routing::get(ws_handler::ws_upgrade));

    // Health check
    let health = Router::new().route("/health", axum::routing::get(health_check));

    Router::new()
        .merge(auth_routes)
        .merge(user_routes)
        .merge(event_routes)
        .merge(chat_routes)
        .merge(ws_routes)
        .merge(health)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            inject_jwt_secret,
        ))
        // Browser clients call from another origin
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Basic health check endpoint
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ok": true }))
}
