//! `WebSocket` handler for the live snapshot stream.
//!
//! Clients connect to `GET /ws/frames`. They get the latest snapshot right
//! away and then every snapshot the frame loop publishes. Text frames sent
//! by the client are parsed as [`PlayerIntent`] JSON and queued exactly as
//! `POST /api/intents` would.
//!
//! A client that falls behind skips the snapshots it missed and resumes
//! from the newest one.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{State, WebSocketUpgrade};
use axum::response::IntoResponse;
use herding_types::{PlayerIntent, RoundSnapshot};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::state::AppState;

/// Upgrade an HTTP request to a `WebSocket` connection.
///
/// # Route
///
/// `GET /ws/frames`
pub async fn ws_frames(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_ws(socket, state))
}

/// Forward snapshots to the client and intents from it until either side
/// goes away.
async fn handle_ws(mut socket: WebSocket, state: Arc<AppState>) {
    debug!("WebSocket client connected");

    let mut rx = state.subscribe();

    let latest = state.snapshot.read().await.clone();
    if let Some(snapshot) = latest
        && !send_snapshot(&mut socket, &snapshot).await
    {
        return;
    }

    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if !send_snapshot(&mut socket, &snapshot).await {
                            return;
                        }
                    }
                    Err(RecvError::Lagged(n)) => {
                        debug!(skipped = n, "WebSocket client lagged, skipping ahead");
                    }
                    Err(RecvError::Closed) => {
                        debug!("Snapshot channel closed, shutting down WebSocket");
                        return;
                    }
                }
            }
            msg = socket.recv() => {
                match msg {
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("WebSocket client disconnected");
                        return;
                    }
                    Some(Ok(Message::Text(text))) => {
                        forward_intent(&state, text.as_str());
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if socket.send(Message::Pong(data)).await.is_err() {
                            debug!("WebSocket client disconnected (pong failed)");
                            return;
                        }
                    }
                    Some(Err(e)) => {
                        debug!("WebSocket error: {e}");
                        return;
                    }
                    _ => {}
                }
            }
        }
    }
}

/// Serialize and send one snapshot. Returns `false` once the client is gone.
async fn send_snapshot(socket: &mut WebSocket, snapshot: &RoundSnapshot) -> bool {
    let json = match serde_json::to_string(snapshot) {
        Ok(j) => j,
        Err(e) => {
            warn!("Failed to serialize round snapshot: {e}");
            return true;
        }
    };
    if socket.send(Message::Text(json.into())).await.is_err() {
        debug!("WebSocket client disconnected (send failed)");
        return false;
    }
    true
}

fn forward_intent(state: &AppState, text: &str) {
    match serde_json::from_str::<PlayerIntent>(text) {
        Ok(intent) => {
            if let Err(e) = state.submit(intent) {
                debug!(error = %e, "WebSocket intent rejected");
            }
        }
        Err(e) => debug!(error = %e, "Ignoring malformed WebSocket intent"),
    }
}
