//! Player intents emitted by the presentation layer.
//!
//! The rendering client captures raw keyboard and mouse input and turns it
//! into these discrete intents. The frame loop applies them before each tick.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::AgentId;
use crate::structs::{MovementFlags, Position};

/// A single discrete request from the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(tag = "kind", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PlayerIntent {
    /// Replace the set of held movement keys.
    SetMovement {
        /// The keys now held.
        flags: MovementFlags,
    },
    /// Walk toward a point (click-to-move).
    MoveTo {
        /// Where to walk.
        destination: Position,
    },
    /// Clicked on an agent to open a dialogue.
    ClickAgent {
        /// The agent clicked.
        agent_id: AgentId,
    },
    /// Submitted chat text to an agent.
    SubmitMessage {
        /// The agent addressed.
        agent_id: AgentId,
        /// The text typed.
        text: String,
    },
    /// Asked to close an agent's dialogue.
    CloseDialogue {
        /// The agent whose dialogue should close.
        agent_id: AgentId,
    },
    /// Clicked on empty ground.
    ClickGround {
        /// Optional walk destination.
        destination: Option<Position>,
    },
    /// Start a fresh round.
    Restart,
}
