//! The per-frame tick.
//!
//! Each call to [`tick`] runs these phases in order, to completion, without
//! awaiting:
//!
//! 1. **Merge** -- drain judge events from the inbox and apply them to
//!    their agents.
//! 2. **Player** -- move the avatar from held keys or a click destination.
//! 3. **Agents** -- per agent, independently: first-update initialization,
//!    read-time countdown, then either the stay at the target or
//!    movement/arrival/dwell. Interacting agents do not move.
//! 4. **Dog** -- seek, approach, or deliver; a delivery is routed into the
//!    conversation pipeline.
//! 5. **Timers** -- the too-far hint and the round clock.
//! 6. **Win** -- evaluated last, against the final state of the frame.
//!
//! Given the same seed, intents, judge events, and deltas, a round evolves
//! identically.

use chrono::Utc;
use herding_types::WinRecord;
use tracing::{debug, info};

use crate::conversation;
use crate::convinced::{self, StayOutcome};
use crate::dog::{self, DogAction};
use crate::dwell::{self, Transition};
use crate::round::Round;
use crate::win;

/// Summary of a single frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Frame number within the round after this tick.
    pub frame: u64,
    /// Judge events merged into live agents.
    pub judge_events: usize,
    /// Agents that reached an ordinary waypoint.
    pub arrivals: usize,
    /// Agents whose stay at the target began.
    pub newly_convinced: usize,
    /// Agents whose stay ended early or ran out.
    pub stays_ended: usize,
    /// Dialogues closed by the read window running out.
    pub auto_closed: usize,
    /// The dog delivered a message this frame.
    pub dog_delivered: bool,
    /// This frame won the round.
    pub won: bool,
}

/// Advance the round by `delta` seconds.
///
/// Negative or non-finite deltas are treated as zero.
pub fn tick(round: &mut Round, delta: f32) -> TickSummary {
    let delta = if delta.is_finite() { delta.max(0.0) } else { 0.0 };
    let mut summary = TickSummary {
        judge_events: conversation::drain_judge_events(round),
        ..TickSummary::default()
    };

    let arena = round.arena();
    crate::player::update(&mut round.player, arena, delta);

    phase_agents(round, delta, &mut summary);
    phase_dog(round, delta, &mut summary);

    if let Some(hint) = round.too_far.as_mut() {
        hint.remaining -= delta;
        if hint.remaining <= 0.0 {
            round.too_far = None;
        }
    }

    round.frame = round.frame.saturating_add(1);
    summary.frame = round.frame;

    if round.won.is_none() {
        round.elapsed_seconds += delta;
        if win::evaluate(
            &round.agents,
            &round.waypoints,
            round.config.waypoints.capture_slack,
        ) {
            round.won = Some(WinRecord {
                elapsed_seconds: round.elapsed_seconds,
                completed_at: Utc::now(),
            });
            summary.won = true;
            info!(
                round = round.number,
                elapsed = round.elapsed_seconds,
                agents = round.agents.len(),
                "Round won"
            );
        }
    }

    summary
}

/// Update every agent independently.
fn phase_agents(round: &mut Round, delta: f32, summary: &mut TickSummary) {
    let arena = round.arena();
    let Round {
        agents,
        waypoints,
        config,
        rng,
        ..
    } = round;

    for agent in agents.iter_mut() {
        dwell::initialize(agent, waypoints, rng);

        if conversation::update_read_time(agent, delta) {
            summary.auto_closed = summary.auto_closed.saturating_add(1);
        }

        if agent.is_convinced {
            match convinced::update(agent, waypoints, config, delta, rng) {
                StayOutcome::Staying => {}
                StayOutcome::Drifted | StayOutcome::Expired => {
                    summary.stays_ended = summary.stays_ended.saturating_add(1);
                }
            }
            continue;
        }

        if agent.is_interacting {
            continue;
        }

        match dwell::update(agent, waypoints, config, arena, delta, rng) {
            Transition::Arrived(_) => summary.arrivals = summary.arrivals.saturating_add(1),
            Transition::Convinced => {
                summary.newly_convinced = summary.newly_convinced.saturating_add(1);
            }
            Transition::Departed(_) | Transition::None => {}
        }
    }
}

/// Update the dog and route any delivery into the judge pipeline.
fn phase_dog(round: &mut Round, delta: f32, summary: &mut TickSummary) {
    let arena = round.arena();
    let action = {
        let Round {
            dog,
            agents,
            config,
            rng,
            ..
        } = round;
        let Some(dog) = dog.as_mut() else {
            return;
        };
        dog::update(dog, agents, &config.dog, arena, delta, rng)
    };

    if let DogAction::Delivered { agent_id, message } = action {
        summary.dog_delivered = conversation::deliver_dog_message(round, agent_id, &message);
        debug!(agent = %agent_id, delivered = summary.dog_delivered, "Dog nudge routed to judge");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use herding_types::{JudgeDecision, JudgeEvent, JudgeUpdate, Position};

    use super::*;
    use crate::config::SimulationConfig;
    use crate::round::JudgeLink;

    const FRAME: f32 = 1.0 / 60.0;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.dog.enabled = false;
        config
    }

    #[test]
    fn first_tick_initializes_every_agent() {
        let (link, _endpoint) = JudgeLink::pair();
        let mut round = Round::new(quiet_config(), link).unwrap();
        let summary = tick(&mut round, FRAME);

        assert_eq!(summary.frame, 1);
        let target = round.waypoints.target_id();
        for agent in &round.agents {
            assert!(agent.initialized);
            assert!(agent.target_waypoint.is_some_and(|id| id != target));
        }
    }

    #[test]
    fn judge_events_are_drained_at_tick_start() {
        let (link, endpoint) = JudgeLink::pair();
        let mut round = Round::new(quiet_config(), link).unwrap();
        let agent = round.agents.first_mut().unwrap();
        agent.position = Position::new(1.0, 0.0);
        let id = agent.id;

        crate::conversation::open_interaction(&mut round, id).unwrap();
        crate::conversation::send_message(&mut round, id, "go").unwrap();

        let target = round.waypoints.target_id();
        endpoint
            .events
            .send(JudgeEvent {
                agent_id: id,
                update: JudgeUpdate::Completed {
                    decision: JudgeDecision {
                        message: String::from("Alright, I'll go."),
                        new_target: Some(target),
                        thinking: Vec::new(),
                    },
                },
            })
            .unwrap();

        let summary = tick(&mut round, FRAME);
        assert_eq!(summary.judge_events, 1);
        let agent = round.agent(id).unwrap();
        assert!(agent.convinced_through_dialogue);
        assert_eq!(agent.target_waypoint, Some(target));
    }

    #[test]
    fn interacting_agent_does_not_move() {
        let (link, _endpoint) = JudgeLink::pair();
        let mut round = Round::new(quiet_config(), link).unwrap();
        tick(&mut round, FRAME);

        let agent = round.agents.first_mut().unwrap();
        agent.position = Position::new(1.0, 0.0);
        let id = agent.id;
        crate::conversation::open_interaction(&mut round, id).unwrap();

        for _ in 0..60 {
            tick(&mut round, FRAME);
        }
        assert_eq!(round.agent(id).unwrap().position, Position::new(1.0, 0.0));
    }

    #[test]
    fn bad_delta_is_ignored() {
        let (link, _endpoint) = JudgeLink::pair();
        let mut round = Round::new(quiet_config(), link).unwrap();
        tick(&mut round, f32::NAN);
        tick(&mut round, -1.0);
        assert!(round.elapsed_seconds.abs() < f32::EPSILON);
        assert_eq!(round.frame, 2);
    }

    #[test]
    fn too_far_hint_expires() {
        let (link, _endpoint) = JudgeLink::pair();
        let mut round = Round::new(quiet_config(), link).unwrap();
        let agent = round.agents.first_mut().unwrap();
        agent.position = Position::new(15.0, 15.0);
        agent.initialized = true;
        let id = agent.id;

        assert!(crate::conversation::open_interaction(&mut round, id).is_err());
        assert!(round.too_far.is_some());
        for _ in 0..100 {
            tick(&mut round, FRAME);
        }
        assert!(round.too_far.is_none());
    }
}
