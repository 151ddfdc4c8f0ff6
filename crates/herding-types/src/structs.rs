//! Core entity structs shared between the simulation and its clients.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::WaypointId;

// ---------------------------------------------------------------------------
// Position
// ---------------------------------------------------------------------------

/// A point on the ground plane.
///
/// The simulation has no vertical axis; the rendering layer supplies height.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Position {
    /// East-west coordinate.
    pub x: f32,
    /// North-south coordinate.
    pub z: f32,
}

impl Position {
    /// The arena center.
    pub const ORIGIN: Self = Self { x: 0.0, z: 0.0 };

    /// Create a position from its two ground-plane coordinates.
    pub const fn new(x: f32, z: f32) -> Self {
        Self { x, z }
    }
}

// ---------------------------------------------------------------------------
// Waypoint
// ---------------------------------------------------------------------------

/// A named location agents can move to and dwell at.
///
/// Immutable for the duration of a round. Exactly one waypoint per round
/// has `is_target` set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Waypoint {
    /// Unique id within the round.
    pub id: WaypointId,
    /// Display name, also shown to the persuasion judge.
    pub name: String,
    /// Center of the waypoint.
    pub position: Position,
    /// Whether this is the waypoint agents must be persuaded to visit.
    pub is_target: bool,
    /// Distance from `position` that counts as having arrived.
    pub capture_radius: f32,
}

// ---------------------------------------------------------------------------
// Conversation
// ---------------------------------------------------------------------------

/// Who said a line in an agent's conversation history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum Speaker {
    /// The human player.
    Player,
    /// The agent itself (judge replies, farewells, fallbacks).
    Agent,
    /// The herding dog delivering a scripted nudge.
    Dog,
}

/// One line of conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ChatTurn {
    /// Who said it.
    pub speaker: Speaker,
    /// What was said.
    pub text: String,
}

impl ChatTurn {
    /// Build a turn spoken by the player.
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Player,
            text: text.into(),
        }
    }

    /// Build a turn spoken by the agent.
    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Agent,
            text: text.into(),
        }
    }

    /// Build a turn spoken by the herding dog.
    pub fn dog(text: impl Into<String>) -> Self {
        Self {
            speaker: Speaker::Dog,
            text: text.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Player movement input
// ---------------------------------------------------------------------------

/// Held movement keys, in camera-independent arena axes.
///
/// Forward is negative `z`, right is positive `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct MovementFlags {
    /// Move toward negative `z`.
    pub forward: bool,
    /// Move toward positive `z`.
    pub back: bool,
    /// Move toward negative `x`.
    pub left: bool,
    /// Move toward positive `x`.
    pub right: bool,
}

impl MovementFlags {
    /// True if any direction key is held.
    pub const fn any(self) -> bool {
        self.forward || self.back || self.left || self.right
    }
}
