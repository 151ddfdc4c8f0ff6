//! The agent (NPC) record.
//!
//! An [`Agent`] bundles movement intent, conversation state, and persuasion
//! state. The frame loop is its only writer; judge events reach it through
//! [`crate::conversation`], which touches conversation and persuasion fields
//! plus the waypoint intent, never position.

use herding_types::{AgentId, AgentView, ChatTurn, PendingResponse, Position, WaypointId};

use crate::config::AgentProfile;

/// Mutable state for one wandering agent.
#[derive(Debug, Clone)]
pub struct Agent {
    /// Unique id for this round.
    pub id: AgentId,
    /// Display name.
    pub name: String,
    /// Free-text personality sent to the judge.
    pub personality: String,
    /// Current location.
    pub position: Position,
    /// Per-frame movement speed.
    pub speed: f32,
    /// Facing angle in radians.
    pub heading: f32,
    /// Walk-cycle phase in radians, advanced while moving.
    pub walk_phase: f32,
    /// Set on the first update, when the first destination is chosen.
    pub initialized: bool,

    /// Waypoint the agent is dwelling at.
    pub current_waypoint: Option<WaypointId>,
    /// Waypoint the agent is moving toward.
    pub target_waypoint: Option<WaypointId>,
    /// Previous ordinary waypoint, excluded from the next selection.
    pub last_waypoint: Option<WaypointId>,
    /// Seconds left before leaving `current_waypoint`.
    pub dwell_timer: f32,

    /// A dialogue with the player is open.
    pub is_interacting: bool,
    /// A reply is being generated and no message text has arrived yet.
    pub is_typing: bool,
    /// The latest reply has resolved.
    pub response_complete: bool,
    /// Seconds left in the read window.
    pub read_time_remaining: f32,
    /// A judge call for this agent has not yet completed or failed.
    pub awaiting_judge: bool,
    /// Append-only conversation for the round.
    pub conversation_history: Vec<ChatTurn>,
    /// Latest streamed reply.
    pub pending_response: PendingResponse,

    /// The judge named the target as this agent's destination.
    pub convinced_through_dialogue: bool,
    /// Staying at the target.
    pub is_convinced: bool,
    /// Seconds left in the stay.
    pub convinced_timer: f32,
    /// Flavor line shown near the end of the stay.
    pub snarky_comment: Option<String>,
}

impl Agent {
    /// Create an uninitialized agent at `position` with no destination.
    pub fn spawn(profile: &AgentProfile, position: Position, speed: f32) -> Self {
        Self {
            id: AgentId::new(),
            name: profile.name.clone(),
            personality: profile.personality.clone(),
            position,
            speed,
            heading: 0.0,
            walk_phase: 0.0,
            initialized: false,
            current_waypoint: None,
            target_waypoint: None,
            last_waypoint: None,
            dwell_timer: 0.0,
            is_interacting: false,
            is_typing: false,
            response_complete: false,
            read_time_remaining: 0.0,
            awaiting_judge: false,
            conversation_history: Vec::new(),
            pending_response: PendingResponse::Empty,
            convinced_through_dialogue: false,
            is_convinced: false,
            convinced_timer: 0.0,
            snarky_comment: None,
        }
    }

    /// True while the agent is walking toward a waypoint.
    pub const fn is_moving(&self) -> bool {
        self.target_waypoint.is_some()
    }

    /// True while the agent is pausing at a waypoint.
    pub const fn is_dwelling(&self) -> bool {
        self.current_waypoint.is_some() && self.target_waypoint.is_none()
    }

    /// True while a close request must be ignored.
    pub fn close_blocked(&self) -> bool {
        self.is_typing || (self.response_complete && self.read_time_remaining > 0.0)
    }

    /// True if the herding dog may pick this agent.
    pub const fn dog_eligible(&self) -> bool {
        !self.is_convinced
            && !self.is_interacting
            && !self.convinced_through_dialogue
            && !self.awaiting_judge
    }

    /// Drop every piece of persuasion state.
    pub fn clear_convinced(&mut self) {
        self.is_convinced = false;
        self.convinced_through_dialogue = false;
        self.convinced_timer = 0.0;
        self.snarky_comment = None;
    }

    /// Head for `waypoint`, leaving any waypoint currently dwelt at.
    pub fn set_destination(&mut self, waypoint: WaypointId) {
        self.target_waypoint = Some(waypoint);
        self.current_waypoint = None;
        self.dwell_timer = 0.0;
    }

    /// Read-only projection for the presentation layer.
    pub fn view(&self) -> AgentView {
        AgentView {
            id: self.id,
            name: self.name.clone(),
            position: self.position,
            heading: self.heading,
            walk_phase: self.walk_phase,
            current_waypoint: self.current_waypoint,
            target_waypoint: self.target_waypoint,
            is_interacting: self.is_interacting,
            is_typing: self.is_typing,
            response_complete: self.response_complete,
            read_time_remaining: self.read_time_remaining,
            convinced_through_dialogue: self.convinced_through_dialogue,
            is_convinced: self.is_convinced,
            convinced_timer: self.convinced_timer,
            snarky_comment: self.snarky_comment.clone(),
            conversation_history: self.conversation_history.clone(),
            pending_response: self.pending_response.clone(),
        }
    }
}
