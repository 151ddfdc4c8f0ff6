//! Read-only round snapshots consumed by the presentation layer.
//!
//! A [`RoundSnapshot`] is a projection of the simulation context taken after
//! a tick. It carries everything the renderer needs to draw a frame and the
//! chat panel needs to show conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{AgentId, WaypointId};
use crate::judge::PendingResponse;
use crate::structs::{ChatTurn, MovementFlags, Position, Waypoint};

/// When and how fast a round was won.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WinRecord {
    /// Simulated seconds from round start to the winning frame.
    pub elapsed_seconds: f32,
    /// Wall-clock time of the winning frame.
    pub completed_at: DateTime<Utc>,
}

/// Per-agent view for rendering and the chat panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct AgentView {
    /// Agent id, used in click and submit intents.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Current location.
    pub position: Position,
    /// Facing angle in radians around the vertical axis.
    pub heading: f32,
    /// Walk-cycle phase in radians; advances only while moving.
    pub walk_phase: f32,
    /// Waypoint currently dwelling at.
    pub current_waypoint: Option<WaypointId>,
    /// Waypoint currently moving toward.
    pub target_waypoint: Option<WaypointId>,
    /// A dialogue with the player is open.
    pub is_interacting: bool,
    /// A reply is being generated.
    pub is_typing: bool,
    /// The latest reply finished streaming.
    pub response_complete: bool,
    /// Seconds left before the dialogue auto-closes.
    pub read_time_remaining: f32,
    /// The judge has sent this agent to the target.
    pub convinced_through_dialogue: bool,
    /// The agent is staying at the target.
    pub is_convinced: bool,
    /// Seconds left in the stay.
    pub convinced_timer: f32,
    /// Flavor line shown when the stay is nearly over.
    pub snarky_comment: Option<String>,
    /// Full conversation.
    pub conversation_history: Vec<ChatTurn>,
    /// Latest streamed reply.
    pub pending_response: PendingResponse,
}

/// Herding dog view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct DogView {
    /// Current location.
    pub position: Position,
    /// Facing angle in radians.
    pub heading: f32,
    /// Agent being approached, if any.
    pub target_agent_id: Option<AgentId>,
    /// Speech bubble is up.
    pub is_interacting: bool,
    /// Speech bubble text.
    pub current_message: Option<String>,
}

/// Player avatar view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct PlayerView {
    /// Current location.
    pub position: Position,
    /// Facing angle in radians.
    pub heading: f32,
    /// Held movement keys.
    pub movement: MovementFlags,
    /// Click-to-move destination, if walking to one.
    pub destination: Option<Position>,
    /// Radius within which agents can be talked to.
    pub influence_radius: f32,
}

/// Transient "too far away" hint shown after an out-of-range click.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TooFarIndicator {
    /// The agent that was clicked.
    pub agent_id: AgentId,
    /// Seconds until the hint disappears.
    pub remaining: f32,
}

/// Everything the presentation layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RoundSnapshot {
    /// Round counter, incremented on restart.
    pub round: u32,
    /// Frames simulated this round.
    pub frame: u64,
    /// Simulated seconds since round start (frozen once won).
    pub elapsed_seconds: f32,
    /// Half the side length of the square arena.
    pub arena_half_extent: f32,
    /// Set once every agent is convinced at the target.
    pub won: Option<WinRecord>,
    /// Waypoints for this round.
    pub waypoints: Vec<Waypoint>,
    /// The player avatar.
    pub player: PlayerView,
    /// All agents in roster order.
    pub agents: Vec<AgentView>,
    /// The herding dog, when enabled.
    pub dog: Option<DogView>,
    /// Out-of-range click hint.
    pub too_far: Option<TooFarIndicator>,
}

impl RoundSnapshot {
    /// Number of agents currently staying at the target.
    pub fn convinced_count(&self) -> usize {
        self.agents.iter().filter(|a| a.is_convinced).count()
    }
}
