//! REST endpoint handlers for the presentation API.
//!
//! Reads are served from the latest published [`RoundSnapshot`]; the only
//! write is queuing a [`PlayerIntent`].
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Minimal HTML status page |
//! | `GET` | `/api/round` | Full round snapshot |
//! | `GET` | `/api/agents` | List agents (`?status=` filter) |
//! | `GET` | `/api/agents/{id}` | Single agent with conversation |
//! | `GET` | `/api/waypoints` | Waypoints and the target id |
//! | `POST` | `/api/intents` | Queue a player intent |
//!
//! [`RoundSnapshot`]: herding_types::RoundSnapshot

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse};
use herding_types::{AgentId, AgentView, PlayerIntent, RoundSnapshot};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Query parameter structs
// ---------------------------------------------------------------------------

/// Query parameters for the `GET /api/agents` endpoint.
#[derive(Debug, serde::Deserialize)]
pub struct AgentsQuery {
    /// Accepted values: `convinced`, `talking`, `wandering`, `all`.
    pub status: Option<String>,
}

// ---------------------------------------------------------------------------
// GET / -- minimal HTML status page
// ---------------------------------------------------------------------------

/// Serve a minimal HTML page showing round progress and API links.
pub async fn index(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let snapshot = state.snapshot.read().await.clone();

    let (round, frame, elapsed, convinced, agents, status) = snapshot.map_or_else(
        || (0, 0, 0.0, 0, 0, "STARTING"),
        |s| {
            (
                s.round,
                s.frame,
                s.elapsed_seconds,
                s.convinced_count(),
                s.agents.len(),
                if s.won.is_some() { "WON" } else { "RUNNING" },
            )
        },
    );

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <title>Herding</title>
    <style>
        body {{
            background: #1b2418;
            color: #e4e8d8;
            font-family: 'Cascadia Code', 'Fira Code', 'Consolas', monospace;
            padding: 2rem;
            max-width: 800px;
            margin: 0 auto;
        }}
        h1 {{ color: #a3d977; margin-bottom: 0.25rem; }}
        .metric {{
            display: inline-block;
            background: #243020;
            border: 1px solid #3b4a33;
            border-radius: 6px;
            padding: 1rem 1.5rem;
            margin: 0.5rem 0.5rem 0.5rem 0;
            min-width: 120px;
        }}
        .metric .label {{ color: #9aa58c; font-size: 0.85rem; }}
        .metric .value {{ color: #a3d977; font-size: 1.5rem; font-weight: bold; }}
        a {{ color: #a3d977; text-decoration: none; }}
        ul {{ list-style: none; padding: 0; }}
        li {{ padding: 0.3rem 0; }}
        .status {{ color: #f2c14e; font-weight: bold; }}
    </style>
</head>
<body>
    <h1>Herding</h1>
    <p>Status: <span class="status">{status}</span></p>

    <div>
        <div class="metric"><div class="label">Round</div><div class="value">{round}</div></div>
        <div class="metric"><div class="label">Frame</div><div class="value">{frame}</div></div>
        <div class="metric"><div class="label">Elapsed</div><div class="value">{elapsed:.1}s</div></div>
        <div class="metric"><div class="label">Convinced</div><div class="value">{convinced}/{agents}</div></div>
    </div>

    <h2>API Endpoints</h2>
    <ul>
        <li>GET <a href="/api/round">/api/round</a> -- Full round snapshot</li>
        <li>GET <a href="/api/agents">/api/agents</a> -- Agents (?status=convinced|talking|wandering)</li>
        <li>GET /api/agents/{{id}} -- Single agent with conversation</li>
        <li>GET <a href="/api/waypoints">/api/waypoints</a> -- Waypoints</li>
        <li>POST /api/intents -- Queue a player intent</li>
        <li>WS <code>/ws/frames</code> -- Live snapshot stream</li>
    </ul>
</body>
</html>"#
    ))
}

// ---------------------------------------------------------------------------
// GET /api/round
// ---------------------------------------------------------------------------

/// Return the full latest snapshot.
pub async fn get_round(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.current().await?;
    Ok(Json(RoundSnapshot::clone(&snapshot)))
}

// ---------------------------------------------------------------------------
// GET /api/agents
// ---------------------------------------------------------------------------

/// List agents, optionally filtered by what they are doing.
///
/// # Query Parameters
///
/// - `status`: `convinced` | `talking` | `wandering` | `all` (default: `all`)
pub async fn list_agents(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AgentsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.current().await?;
    let filter = params.status.as_deref().unwrap_or("all");

    let agents: Vec<serde_json::Value> = snapshot
        .agents
        .iter()
        .filter(|agent| match filter {
            "convinced" => agent.is_convinced,
            "talking" => agent.is_interacting,
            "wandering" => !agent.is_convinced && !agent.is_interacting,
            _ => true,
        })
        .map(summarize_agent)
        .collect();

    Ok(Json(serde_json::json!({
        "count": agents.len(),
        "agents": agents,
    })))
}

fn summarize_agent(agent: &AgentView) -> serde_json::Value {
    serde_json::json!({
        "id": agent.id,
        "name": agent.name,
        "position": agent.position,
        "target_waypoint": agent.target_waypoint,
        "current_waypoint": agent.current_waypoint,
        "is_interacting": agent.is_interacting,
        "is_typing": agent.is_typing,
        "convinced_through_dialogue": agent.convinced_through_dialogue,
        "is_convinced": agent.is_convinced,
        "convinced_timer": agent.convinced_timer,
    })
}

// ---------------------------------------------------------------------------
// GET /api/agents/{id}
// ---------------------------------------------------------------------------

/// Return one agent's full view, including conversation history and the
/// latest streamed reply.
pub async fn get_agent(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let agent_id = AgentId::from(parse_uuid(&id_str)?);
    let snapshot = state.current().await?;

    let agent = snapshot
        .agents
        .iter()
        .find(|a| a.id == agent_id)
        .cloned()
        .ok_or_else(|| ApiError::NotFound(format!("agent {agent_id}")))?;

    Ok(Json(agent))
}

// ---------------------------------------------------------------------------
// GET /api/waypoints
// ---------------------------------------------------------------------------

/// Return this round's waypoints and which one is the target.
pub async fn list_waypoints(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let snapshot = state.current().await?;
    let target_id = snapshot
        .waypoints
        .iter()
        .find(|w| w.is_target)
        .map(|w| w.id);

    Ok(Json(serde_json::json!({
        "count": snapshot.waypoints.len(),
        "target_id": target_id,
        "waypoints": snapshot.waypoints,
    })))
}

// ---------------------------------------------------------------------------
// POST /api/intents
// ---------------------------------------------------------------------------

/// Queue a player intent for the next frame.
///
/// Returns `202 Accepted`: the intent is applied asynchronously, and its
/// effect shows up in a later snapshot.
pub async fn post_intent(
    State(state): State<Arc<AppState>>,
    Json(intent): Json<PlayerIntent>,
) -> Result<impl IntoResponse, ApiError> {
    state.submit(intent)?;
    Ok((
        StatusCode::ACCEPTED,
        Json(serde_json::json!({ "accepted": true })),
    ))
}

/// Parse a UUID string, mapping errors to [`ApiError::InvalidUuid`].
fn parse_uuid(s: &str) -> Result<Uuid, ApiError> {
    s.parse::<Uuid>()
        .map_err(|e| ApiError::InvalidUuid(format!("{s}: {e}")))
}
