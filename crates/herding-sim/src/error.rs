//! Error types for the herding-sim crate.
//!
//! Per-frame updates never fail: a missing waypoint or agent reference skips
//! that entity for the tick. Errors exist only for round setup and for
//! player-initiated conversation operations that are rejected.

use herding_types::AgentId;

/// Errors that can occur while setting up a round.
#[derive(Debug, thiserror::Error)]
pub enum SimError {
    /// Not enough waypoint names to wander between.
    #[error("need at least {required} waypoints, configured {configured}")]
    TooFewWaypoints {
        /// Minimum required.
        required: usize,
        /// Number configured.
        configured: usize,
    },

    /// A waypoint list without exactly one target.
    #[error("expected exactly one target waypoint, found {found}")]
    TargetCount {
        /// Number of waypoints flagged as target.
        found: usize,
    },

    /// Two waypoints share an id.
    #[error("duplicate waypoint id {id}")]
    DuplicateWaypoint {
        /// The repeated id.
        id: u32,
    },

    /// The agent roster is empty.
    #[error("agent roster is empty")]
    EmptyRoster,

    /// An arena or timing parameter is out of range.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What is wrong.
        reason: String,
    },
}

/// Errors returned by player-initiated conversation operations.
///
/// These are rejections, not failures: the caller logs them and the game
/// carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConversationError {
    /// No agent with this id exists in the current round.
    #[error("agent not found: {0}")]
    AgentNotFound(AgentId),

    /// The agent is outside the player's influence radius.
    #[error("agent {0} is too far away")]
    TooFar(AgentId),

    /// A message was sent without an open dialogue.
    #[error("no open dialogue with agent {0}")]
    NotInteracting(AgentId),

    /// The previous message to this agent has not been answered yet.
    #[error("agent {0} is still answering")]
    AwaitingResponse(AgentId),

    /// The latest reply is still inside its read window.
    #[error("reply from agent {0} is still being read")]
    Reading(AgentId),

    /// The message had no visible text.
    #[error("message is empty")]
    EmptyMessage,
}

/// Errors returned when applying a player intent to a round.
#[derive(Debug, thiserror::Error)]
pub enum IntentError {
    /// A conversation request was rejected.
    #[error("conversation rejected: {source}")]
    Conversation {
        /// The underlying rejection.
        #[from]
        source: ConversationError,
    },

    /// The next round could not be set up.
    #[error("restart failed: {source}")]
    Restart {
        /// The underlying setup error.
        #[from]
        source: SimError,
    },
}
