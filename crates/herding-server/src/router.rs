//! Axum router construction for the presentation API.
//!
//! Assembles all routes (REST + `WebSocket`) into a single [`Router`]
//! with CORS enabled so the renderer can be served from another origin.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;
use crate::ws;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- minimal HTML status page
/// - `GET /ws/frames` -- `WebSocket` snapshot stream and intent input
/// - `GET /api/round` -- full round snapshot
/// - `GET /api/agents` -- list agents
/// - `GET /api/agents/{id}` -- single agent
/// - `GET /api/waypoints` -- waypoints
/// - `POST /api/intents` -- queue a player intent
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(handlers::index))
        .route("/ws/frames", get(ws::ws_frames))
        .route("/api/round", get(handlers::get_round))
        .route("/api/agents", get(handlers::list_agents))
        .route("/api/agents/{id}", get(handlers::get_agent))
        .route("/api/waypoints", get(handlers::list_waypoints))
        .route("/api/intents", post(handlers::post_intent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
