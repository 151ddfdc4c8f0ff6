//! Integration tests for the presentation API endpoints.
//!
//! Tests drive the Axum `Router` directly via `tower::ServiceExt` without
//! starting a TCP server. Snapshots come from a real round so the JSON
//! shapes match what the frame loop publishes.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use herding_server::router::build_router;
use herding_server::state::AppState;
use herding_sim::{JudgeLink, Round, SimulationConfig};
use herding_types::{PlayerIntent, RoundSnapshot};
use serde_json::Value;
use tokio::sync::mpsc;
use tower::ServiceExt;

fn make_snapshot() -> RoundSnapshot {
    let (link, _endpoint) = JudgeLink::pair();
    let round = Round::new(SimulationConfig::default(), link).unwrap();
    round.snapshot()
}

async fn make_test_state() -> (Arc<AppState>, mpsc::Receiver<PlayerIntent>) {
    let (tx, rx) = mpsc::channel(16);
    let state = Arc::new(AppState::new(tx));
    state.publish(make_snapshot()).await;
    (state, rx)
}

async fn body_to_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn post_json(path: &str, body: &Value) -> Request<Body> {
    Request::post(path)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_index_returns_html() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let content_type = response
        .headers()
        .get("content-type")
        .unwrap()
        .to_str()
        .unwrap();
    assert!(content_type.contains("text/html"));
}

#[tokio::test]
async fn test_get_round() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/round").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["round"], 1);
    assert!(json["won"].is_null());
    assert_eq!(
        json["agents"].as_array().unwrap().len(),
        SimulationConfig::default().agents.roster.len()
    );
}

#[tokio::test]
async fn test_round_unavailable_before_first_publish() {
    let (tx, _rx) = mpsc::channel(1);
    let router = build_router(Arc::new(AppState::new(tx)));

    let response = router
        .oneshot(Request::get("/api/round").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["status"], 503);
}

#[tokio::test]
async fn test_list_agents() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/agents").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let roster = SimulationConfig::default().agents.roster;
    assert_eq!(json["count"], roster.len());
    assert_eq!(json["agents"][0]["name"], roster.first().unwrap().name.as_str());
}

#[tokio::test]
async fn test_list_agents_filter_convinced_returns_empty() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/agents?status=convinced")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["count"], 0);
}

#[tokio::test]
async fn test_get_agent_by_id() {
    let (state, _rx) = make_test_state().await;
    let (agent_id, name) = {
        let snapshot = state.current().await.unwrap();
        let agent = snapshot.agents.first().unwrap();
        (agent.id, agent.name.clone())
    };

    let router = build_router(state);
    let path = format!("/api/agents/{agent_id}");
    let response = router
        .oneshot(Request::get(&path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    assert_eq!(json["name"], name.as_str());
    assert!(json["conversation_history"].as_array().unwrap().is_empty());
    assert_eq!(json["pending_response"]["state"], "empty");
}

#[tokio::test]
async fn test_get_agent_not_found() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let path = format!("/api/agents/{}", uuid_string());
    let response = router
        .oneshot(Request::get(&path).body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_get_agent_invalid_uuid() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(
            Request::get("/api/agents/not-a-uuid")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_waypoints_names_target() {
    let (state, _rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(Request::get("/api/waypoints").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_to_json(response.into_body()).await;
    let waypoints = json["waypoints"].as_array().unwrap();
    assert_eq!(json["count"], waypoints.len());
    let targets: Vec<&Value> = waypoints
        .iter()
        .filter(|w| w["is_target"] == true)
        .collect();
    assert_eq!(targets.len(), 1);
    assert_eq!(targets.first().unwrap()["id"], json["target_id"]);
}

#[tokio::test]
async fn test_post_intent_is_queued() {
    let (state, mut rx) = make_test_state().await;
    let agent_id = state.current().await.unwrap().agents.first().unwrap().id;
    let router = build_router(state);

    let body = serde_json::json!({
        "kind": "submit_message",
        "agent_id": agent_id,
        "text": "There's free pie at the well.",
    });
    let response = router
        .oneshot(post_json("/api/intents", &body))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(
        rx.try_recv().unwrap(),
        PlayerIntent::SubmitMessage {
            agent_id,
            text: "There's free pie at the well.".to_owned(),
        }
    );
}

#[tokio::test]
async fn test_post_restart_intent() {
    let (state, mut rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(post_json("/api/intents", &serde_json::json!({"kind": "restart"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::ACCEPTED);
    assert_eq!(rx.try_recv().unwrap(), PlayerIntent::Restart);
}

#[tokio::test]
async fn test_post_unknown_intent_is_rejected() {
    let (state, mut rx) = make_test_state().await;
    let router = build_router(state);

    let response = router
        .oneshot(post_json("/api/intents", &serde_json::json!({"kind": "teleport"})))
        .await
        .unwrap();

    assert!(response.status().is_client_error());
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn test_post_intent_without_frame_loop() {
    let (state, rx) = make_test_state().await;
    drop(rx);
    let router = build_router(state);

    let response = router
        .oneshot(post_json("/api/intents", &serde_json::json!({"kind": "restart"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_publish_reaches_subscribers() {
    let (state, _rx) = make_test_state().await;
    let mut sub = state.subscribe();

    let mut snapshot = make_snapshot();
    snapshot.frame = 42;
    assert_eq!(state.publish(snapshot).await, 1);

    let received = sub.recv().await.unwrap();
    assert_eq!(received.frame, 42);
    assert_eq!(state.current().await.unwrap().frame, 42);
}

fn uuid_string() -> String {
    herding_types::AgentId::new().to_string()
}
