//! Request and response types for the persuasion judge.
//!
//! The simulation never talks to the language model directly. It emits a
//! [`JudgeRequest`] and later receives [`JudgeEvent`]s carrying either a
//! streamed partial result, a final [`JudgeDecision`], or a failure.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::ids::{AgentId, WaypointId};
use crate::structs::{ChatTurn, Position};

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// The subset of a waypoint the judge needs to reason about destinations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct WaypointBrief {
    /// Waypoint id the judge may return as `newTarget`.
    pub id: WaypointId,
    /// Display name.
    pub name: String,
    /// Whether this is the round's target waypoint.
    pub is_target: bool,
}

/// Everything the judge is given for one conversation turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct JudgeRequest {
    /// The agent being talked to.
    pub agent_id: AgentId,
    /// The agent's display name.
    pub agent_name: String,
    /// Free-text personality description.
    pub personality: String,
    /// Where the agent currently stands.
    pub position: Position,
    /// The waypoint the agent is currently heading to, if any.
    pub current_target: Option<WaypointId>,
    /// Full conversation so far, including the turn that triggered this call.
    pub history: Vec<ChatTurn>,
    /// Every waypoint in the round.
    pub waypoints: Vec<WaypointBrief>,
    /// The round's target waypoint.
    pub target_waypoint_id: WaypointId,
}

// ---------------------------------------------------------------------------
// Response
// ---------------------------------------------------------------------------

/// The judge's final structured decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct JudgeDecision {
    /// What the agent says back.
    pub message: String,
    /// Where the agent decides to go next, if anywhere new.
    #[serde(rename = "newTarget")]
    pub new_target: Option<WaypointId>,
    /// Debug-only reasoning trace.
    #[serde(default)]
    pub thinking: Vec<String>,
}

/// The latest view of an agent's reply while it is being generated.
///
/// Streaming delivers a sequence of these, each superseding the last.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[serde(tag = "state", rename_all = "snake_case")]
#[ts(export, export_to = "bindings/")]
pub enum PendingResponse {
    /// Nothing received yet.
    #[default]
    Empty,
    /// Reasoning trace is streaming; no reply text yet.
    Thinking {
        /// Reasoning lines received so far.
        trace: Vec<String>,
    },
    /// Reply text is present (possibly still growing until completion).
    Complete {
        /// Reply text so far.
        message: String,
        /// Destination named so far, if any.
        new_target: Option<WaypointId>,
        /// Reasoning lines received so far.
        trace: Vec<String>,
    },
}

impl PendingResponse {
    /// Reply text, if any has arrived.
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Complete { message, .. } if !message.trim().is_empty() => Some(message),
            _ => None,
        }
    }
}

impl From<&JudgeDecision> for PendingResponse {
    fn from(decision: &JudgeDecision) -> Self {
        Self::Complete {
            message: decision.message.clone(),
            new_target: decision.new_target,
            trace: decision.thinking.clone(),
        }
    }
}

/// What happened to an in-flight judge call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum JudgeUpdate {
    /// A newer partial result superseding the previous one.
    Partial {
        /// The partial result.
        response: PendingResponse,
    },
    /// The stream finished with a usable decision.
    Completed {
        /// The final decision.
        decision: JudgeDecision,
    },
    /// The call failed or timed out.
    Failed {
        /// Human-readable reason, for logs only.
        reason: String,
    },
}

/// A judge update addressed to one agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgeEvent {
    /// The agent the originating request was about.
    pub agent_id: AgentId,
    /// What happened.
    pub update: JudgeUpdate,
}
