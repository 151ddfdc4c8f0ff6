//! Shared application state for the presentation API server.
//!
//! [`AppState`] holds the latest published snapshot, the broadcast channel
//! that streams snapshots to `WebSocket` clients, and the sending half of
//! the intent queue the frame loop drains.

use std::sync::Arc;

use herding_types::{PlayerIntent, RoundSnapshot};
use tokio::sync::{RwLock, broadcast, mpsc};

use crate::error::ApiError;

/// Capacity of the broadcast channel for snapshots.
///
/// A subscriber that falls behind by more than this many snapshots receives
/// [`broadcast::error::RecvError::Lagged`] and skips to the newest one.
const BROADCAST_CAPACITY: usize = 64;

/// Capacity of the intent queue between the API and the frame loop.
pub const INTENT_QUEUE_CAPACITY: usize = 256;

/// Longest chat message accepted from a client, in characters.
pub const MAX_MESSAGE_CHARS: usize = 500;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// Broadcast sender for published snapshots.
    pub tx: broadcast::Sender<Arc<RoundSnapshot>>,
    /// The most recently published snapshot, `None` until the first frame.
    pub snapshot: Arc<RwLock<Option<Arc<RoundSnapshot>>>>,
    /// Queue of player intents consumed by the frame loop.
    pub intents: mpsc::Sender<PlayerIntent>,
}

impl AppState {
    /// Create application state around the sending half of the intent queue.
    pub fn new(intents: mpsc::Sender<PlayerIntent>) -> Self {
        let (tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            tx,
            snapshot: Arc::new(RwLock::new(None)),
            intents,
        }
    }

    /// Subscribe to the snapshot stream.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<RoundSnapshot>> {
        self.tx.subscribe()
    }

    /// Store a snapshot for REST reads and push it to every `WebSocket`
    /// client.
    ///
    /// Returns the number of clients that received it. Zero is normal when
    /// nobody is connected.
    pub async fn publish(&self, snapshot: RoundSnapshot) -> usize {
        let snapshot = Arc::new(snapshot);
        *self.snapshot.write().await = Some(Arc::clone(&snapshot));
        self.tx.send(snapshot).unwrap_or(0)
    }

    /// The latest snapshot, or [`ApiError::Unavailable`] before the first
    /// frame.
    pub async fn current(&self) -> Result<Arc<RoundSnapshot>, ApiError> {
        self.snapshot
            .read()
            .await
            .clone()
            .ok_or_else(|| ApiError::Unavailable("no round published yet".to_owned()))
    }

    /// Validate an intent and queue it for the frame loop.
    ///
    /// Never waits: a full queue is reported as unavailable so a flood of
    /// clicks cannot stall request handling.
    pub fn submit(&self, intent: PlayerIntent) -> Result<(), ApiError> {
        validate_intent(&intent)?;
        self.intents.try_send(intent).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => {
                ApiError::Unavailable("intent queue is full".to_owned())
            }
            mpsc::error::TrySendError::Closed(_) => {
                ApiError::Unavailable("simulation is not running".to_owned())
            }
        })
    }
}

/// Reject intents the simulation would never want to see.
///
/// Blank messages are left to the simulation, which rejects them with its
/// own error and log line.
fn validate_intent(intent: &PlayerIntent) -> Result<(), ApiError> {
    match intent {
        PlayerIntent::SubmitMessage { text, .. } if text.chars().count() > MAX_MESSAGE_CHARS => {
            Err(ApiError::InvalidIntent(format!(
                "message longer than {MAX_MESSAGE_CHARS} characters"
            )))
        }
        PlayerIntent::MoveTo { destination }
        | PlayerIntent::ClickGround {
            destination: Some(destination),
        } if !(destination.x.is_finite() && destination.z.is_finite()) => Err(
            ApiError::InvalidIntent("destination must be finite".to_owned()),
        ),
        _ => Ok(()),
    }
}
