//! Conversation lifecycle and judge event merging.
//!
//! Per agent the dialogue moves through
//! `Idle -> Interacting -> AwaitingResponse -> Reading -> Idle`:
//!
//! - [`open_interaction`] opens a dialogue if the player is close enough,
//!   closing any other open dialogue.
//! - [`send_message`] appends the player's turn and emits a
//!   [`JudgeRequest`]; the agent is typing until reply text streams in.
//! - [`apply_judge_event`] merges partial replies, the final decision, or a
//!   failure. Only conversation and persuasion fields are written, plus the
//!   waypoint intent when the judge names a new destination. Position is
//!   never touched.
//! - [`update_read_time`] counts the read window down and closes the
//!   dialogue when it runs out.
//! - [`close_interaction`] is ignored while a reply is pending or being read.

use herding_types::{
    AgentId, ChatTurn, JudgeDecision, JudgeEvent, JudgeRequest, JudgeUpdate, PendingResponse,
    TooFarIndicator,
};
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::TimingConfig;
use crate::error::ConversationError;
use crate::lines;
use crate::round::Round;
use crate::waypoint::WaypointRegistry;

/// Open a dialogue with `agent_id`.
///
/// Any other open dialogue is closed first, even one that is mid-reply.
/// Out of range, the round shows the too-far hint and nothing else changes.
///
/// # Errors
///
/// Returns [`ConversationError::AgentNotFound`] for an unknown id and
/// [`ConversationError::TooFar`] outside the influence radius.
pub fn open_interaction(round: &mut Round, agent_id: AgentId) -> Result<(), ConversationError> {
    let Some(position) = round.agent(agent_id).map(|a| a.position) else {
        return Err(ConversationError::AgentNotFound(agent_id));
    };

    if !round.player.can_reach(position) {
        round.too_far = Some(TooFarIndicator {
            agent_id,
            remaining: round.config.timing.too_far_seconds,
        });
        return Err(ConversationError::TooFar(agent_id));
    }

    for agent in &mut round.agents {
        agent.is_interacting = agent.id == agent_id;
    }
    debug!(agent = %agent_id, "Dialogue opened");
    Ok(())
}

/// Close the dialogue with `agent_id`.
///
/// Returns `Ok(false)` without changing anything while the agent is typing
/// or its reply is still inside the read window. Otherwise the dialogue is
/// closed and `Ok(true)` is returned; closing a closed dialogue is a no-op
/// that also returns `Ok(true)`.
///
/// # Errors
///
/// Returns [`ConversationError::AgentNotFound`] for an unknown id.
pub fn close_interaction(round: &mut Round, agent_id: AgentId) -> Result<bool, ConversationError> {
    let agent = round
        .agent_mut(agent_id)
        .ok_or(ConversationError::AgentNotFound(agent_id))?;
    if agent.close_blocked() {
        return Ok(false);
    }
    agent.is_interacting = false;
    Ok(true)
}

/// Close every dialogue that is not protected (ground click).
pub fn close_all(round: &mut Round) {
    for agent in &mut round.agents {
        if agent.is_interacting && !agent.close_blocked() {
            agent.is_interacting = false;
        }
    }
}

/// Send the player's `text` to `agent_id`.
///
/// # Errors
///
/// Returns [`ConversationError::EmptyMessage`] for blank text,
/// [`ConversationError::AgentNotFound`] for an unknown id,
/// [`ConversationError::NotInteracting`] without an open dialogue,
/// [`ConversationError::AwaitingResponse`] while a judge call is in flight,
/// and [`ConversationError::Reading`] during the read window.
pub fn send_message(
    round: &mut Round,
    agent_id: AgentId,
    text: &str,
) -> Result<(), ConversationError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(ConversationError::EmptyMessage);
    }
    let agent = round
        .agent(agent_id)
        .ok_or(ConversationError::AgentNotFound(agent_id))?;
    if !agent.is_interacting {
        return Err(ConversationError::NotInteracting(agent_id));
    }
    if agent.awaiting_judge || agent.is_typing {
        return Err(ConversationError::AwaitingResponse(agent_id));
    }
    if agent.response_complete && agent.read_time_remaining > 0.0 {
        return Err(ConversationError::Reading(agent_id));
    }

    begin_judge_call(round, agent_id, ChatTurn::player(text));
    Ok(())
}

/// Deliver the dog's scripted `message` to `agent_id`.
///
/// Skipped (returns `false`) if the agent vanished or already has a call in
/// flight.
pub fn deliver_dog_message(round: &mut Round, agent_id: AgentId, message: &str) -> bool {
    match round.agent(agent_id) {
        Some(agent) if !agent.awaiting_judge => {
            begin_judge_call(round, agent_id, ChatTurn::dog(message));
            true
        }
        Some(_) => false,
        None => {
            warn!(agent = %agent_id, "Dog message for unknown agent, skipping");
            false
        }
    }
}

/// Append `turn`, mark the agent typing, and emit a judge request.
fn begin_judge_call(round: &mut Round, agent_id: AgentId, turn: ChatTurn) {
    let target_waypoint_id = round.waypoints.target_id();
    let waypoints = round.waypoints.briefs();
    let Some(agent) = round.agents.iter_mut().find(|a| a.id == agent_id) else {
        return;
    };

    agent.conversation_history.push(turn);
    agent.is_typing = true;
    agent.awaiting_judge = true;
    agent.response_complete = false;
    agent.read_time_remaining = 0.0;
    agent.pending_response = PendingResponse::Empty;

    let request = JudgeRequest {
        agent_id,
        agent_name: agent.name.clone(),
        personality: agent.personality.clone(),
        position: agent.position,
        current_target: agent.target_waypoint,
        history: agent.conversation_history.clone(),
        waypoints,
        target_waypoint_id,
    };

    if round.judge.outbox.send(request).is_err() {
        warn!(agent = %agent_id, "Judge dispatcher is gone, failing the call locally");
        fail(agent, &round.config.timing, "judge dispatcher unavailable");
    }
}

/// Drain every judge event waiting in the inbox.
///
/// Returns the number of events applied to a live agent.
pub fn drain_judge_events(round: &mut Round) -> usize {
    let mut applied = 0_usize;
    while let Ok(event) = round.judge.inbox.try_recv() {
        if apply_judge_event(round, event) {
            applied = applied.saturating_add(1);
        }
    }
    applied
}

/// Merge one judge event into its agent.
///
/// Returns `false` if the event was dropped (unknown agent, or no call in
/// flight for it).
pub fn apply_judge_event(round: &mut Round, event: JudgeEvent) -> bool {
    let Round {
        agents,
        waypoints,
        config,
        ..
    } = round;
    let Some(agent) = agents.iter_mut().find(|a| a.id == event.agent_id) else {
        debug!(agent = %event.agent_id, "Judge event for unknown agent, dropping");
        return false;
    };
    if !agent.awaiting_judge {
        debug!(agent = %agent.name, "Judge event with no call in flight, dropping");
        return false;
    }

    match event.update {
        JudgeUpdate::Partial { response } => {
            if response.message().is_some() {
                agent.is_typing = false;
            }
            agent.pending_response = response;
        }
        JudgeUpdate::Completed { decision } => {
            if decision.message.trim().is_empty() {
                fail(agent, &config.timing, "judge returned an empty message");
            } else {
                complete(agent, &decision, waypoints, &config.timing);
            }
        }
        JudgeUpdate::Failed { reason } => fail(agent, &config.timing, &reason),
    }
    true
}

/// Apply a finished decision.
fn complete(
    agent: &mut Agent,
    decision: &JudgeDecision,
    registry: &WaypointRegistry,
    timing: &TimingConfig,
) {
    agent.pending_response = PendingResponse::from(decision);
    agent.is_typing = false;
    agent.awaiting_judge = false;
    agent.response_complete = true;
    agent.read_time_remaining = read_time(&decision.message, timing);
    agent
        .conversation_history
        .push(ChatTurn::agent(decision.message.clone()));

    let target_id = registry.target_id();
    agent.convinced_through_dialogue = decision.new_target == Some(target_id);
    match decision.new_target {
        Some(id) if registry.get(id).is_none() => {
            warn!(agent = %agent.name, waypoint = %id, "Judge named an unknown waypoint, ignoring");
        }
        Some(id) if id == target_id => {
            if !agent.is_convinced {
                agent.set_destination(id);
            }
            info!(agent = %agent.name, "Agent persuaded toward the target");
        }
        Some(id) => {
            if agent.is_convinced {
                info!(agent = %agent.name, waypoint = %id, "Agent talked out of the target");
            }
            agent.clear_convinced();
            agent.set_destination(id);
        }
        // The stay itself runs on; only the persuasion flag follows the reply.
        None => {}
    }
}

/// Apply the failure path: a confused reply and no persuasion change.
fn fail(agent: &mut Agent, timing: &TimingConfig, reason: &str) {
    warn!(agent = %agent.name, reason, "Judge call failed");
    agent.pending_response = PendingResponse::Complete {
        message: lines::FALLBACK_REPLY.to_owned(),
        new_target: None,
        trace: Vec::new(),
    };
    agent.is_typing = false;
    agent.awaiting_judge = false;
    agent.response_complete = true;
    agent.read_time_remaining = timing.failure_read_time_seconds;
    agent
        .conversation_history
        .push(ChatTurn::agent(lines::FALLBACK_REPLY));
}

/// Read window for a reply: a floor plus a per-word increment.
pub fn read_time(message: &str, timing: &TimingConfig) -> f32 {
    let words = message.split_whitespace().count();
    let words = u16::try_from(words).unwrap_or(u16::MAX);
    timing.read_time_base_seconds + timing.read_time_per_word_seconds * f32::from(words)
}

/// Count the read window down; close the dialogue when it runs out.
///
/// Returns `true` if this call closed the dialogue.
pub fn update_read_time(agent: &mut Agent, delta: f32) -> bool {
    if agent.read_time_remaining <= 0.0 {
        return false;
    }
    agent.read_time_remaining -= delta;
    if agent.read_time_remaining > 0.0 {
        return false;
    }
    agent.read_time_remaining = 0.0;
    if agent.is_typing || !agent.is_interacting {
        return false;
    }
    agent.is_interacting = false;
    debug!(agent = %agent.name, "Read time over, dialogue closed");
    true
}
