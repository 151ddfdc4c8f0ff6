//! The herding dog.
//!
//! The dog runs its own small state machine:
//!
//! 1. **Seeking** -- no target and cooldown elapsed; pick an eligible agent.
//! 2. **Approaching** -- walk toward the target, re-checking eligibility
//!    every frame and abandoning it the moment it lapses.
//! 3. **Interacting** -- close enough; deliver a scripted nudge through the
//!    judge and show a speech bubble for a few seconds.
//! 4. **Cooldown** -- rest before seeking again.
//!
//! [`update`] only reads agents. Delivery is reported back as
//! [`DogAction::Delivered`] and the caller routes it into the conversation
//! pipeline.

use herding_types::{AgentId, DogView, Position};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::debug;

use crate::agent::Agent;
use crate::config::DogConfig;
use crate::geometry;
use crate::lines;
use crate::movement::{self, Arena};

/// Mutable state for the herding dog.
#[derive(Debug, Clone)]
pub struct HerdingDog {
    /// Current location.
    pub position: Position,
    /// Facing angle in radians.
    pub heading: f32,
    /// Agent being approached.
    pub target_agent_id: Option<AgentId>,
    /// Speech bubble is up.
    pub is_interacting: bool,
    /// Per-frame speed.
    pub speed: f32,
    /// Speech bubble text.
    pub current_message: Option<String>,
    /// Seconds left on the speech bubble.
    pub message_timer: f32,
    /// Seconds before the dog seeks again.
    pub cooldown_timer: f32,
}

/// What the dog did this frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DogAction {
    /// Nothing notable.
    Idle,
    /// Picked a new agent to approach.
    Acquired(AgentId),
    /// Gave up on an agent that became ineligible.
    Abandoned(AgentId),
    /// Reached an agent and barked a message at it.
    Delivered {
        /// The agent nudged.
        agent_id: AgentId,
        /// What the dog said.
        message: String,
    },
}

impl HerdingDog {
    /// A dog with no target, ready to seek.
    pub const fn spawn(position: Position, speed: f32) -> Self {
        Self {
            position,
            heading: 0.0,
            target_agent_id: None,
            is_interacting: false,
            speed,
            current_message: None,
            message_timer: 0.0,
            cooldown_timer: 0.0,
        }
    }

    /// Read-only projection for the presentation layer.
    pub fn view(&self) -> DogView {
        DogView {
            position: self.position,
            heading: self.heading,
            target_agent_id: self.target_agent_id,
            is_interacting: self.is_interacting,
            current_message: self.current_message.clone(),
        }
    }
}

/// Advance the dog by `delta` seconds.
pub fn update(
    dog: &mut HerdingDog,
    agents: &[Agent],
    config: &DogConfig,
    arena: Arena,
    delta: f32,
    rng: &mut impl Rng,
) -> DogAction {
    if dog.message_timer > 0.0 {
        dog.message_timer -= delta;
        if dog.message_timer <= 0.0 {
            dog.message_timer = 0.0;
            dog.is_interacting = false;
            dog.current_message = None;
        }
    }
    if dog.cooldown_timer > 0.0 {
        dog.cooldown_timer = (dog.cooldown_timer - delta).max(0.0);
    }

    let Some(target_id) = dog.target_agent_id else {
        return seek(dog, agents, rng);
    };

    let Some(target) = agents.iter().find(|a| a.id == target_id && a.dog_eligible()) else {
        dog.target_agent_id = None;
        dog.cooldown_timer = config.abandon_cooldown_seconds;
        debug!(agent = %target_id, "Dog abandoned target");
        return DogAction::Abandoned(target_id);
    };

    if !geometry::within(dog.position, target.position, config.interaction_distance) {
        let step = movement::step_toward(dog.position, target.position, dog.speed, delta, arena);
        dog.position = step.position;
        if let Some(heading) = step.heading {
            dog.heading = heading;
        }
        if !geometry::within(dog.position, target.position, config.interaction_distance) {
            return DogAction::Idle;
        }
    }

    let message = lines::pick(lines::DOG_MESSAGES, rng);
    dog.is_interacting = true;
    dog.current_message = Some(message.clone());
    dog.message_timer = config.message_seconds;
    dog.cooldown_timer = config.cooldown_seconds;
    dog.target_agent_id = None;
    debug!(agent = %target.name, "Dog delivered a nudge");
    DogAction::Delivered {
        agent_id: target_id,
        message,
    }
}

/// Pick an eligible agent once the cooldown has run out.
fn seek(dog: &mut HerdingDog, agents: &[Agent], rng: &mut impl Rng) -> DogAction {
    if dog.cooldown_timer > 0.0 {
        return DogAction::Idle;
    }
    let eligible: Vec<AgentId> = agents
        .iter()
        .filter(|a| a.dog_eligible())
        .map(|a| a.id)
        .collect();
    let Some(choice) = eligible.choose(rng).copied() else {
        return DogAction::Idle;
    };
    dog.target_agent_id = Some(choice);
    debug!(agent = %choice, candidates = eligible.len(), "Dog picked a target");
    DogAction::Acquired(choice)
}
