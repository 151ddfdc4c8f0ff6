//! End-to-end behavior tests for the simulation core.
//!
//! Each test builds a [`Round`] with a hand-placed waypoint layout, drives it
//! with [`tick`], and plays the judge by pushing events into the channel the
//! round drains at the start of every frame.

#![allow(clippy::unwrap_used)]

use std::collections::BTreeSet;

use herding_sim::config::AgentProfile;
use herding_sim::conversation;
use herding_sim::{JudgeEndpoint, JudgeLink, Round, SimulationConfig, WaypointRegistry, tick};
use herding_types::{
    AgentId, JudgeDecision, JudgeEvent, JudgeUpdate, PlayerIntent, Position, Speaker, Waypoint,
    WaypointId,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::mpsc::UnboundedSender;

const FRAME: f32 = 1.0 / 60.0;
const TARGET: WaypointId = WaypointId(7);

fn waypoint(id: u32, x: f32, z: f32, capture_radius: f32) -> Waypoint {
    Waypoint {
        id: WaypointId(id),
        name: format!("Spot {id}"),
        position: Position::new(x, z),
        is_target: WaypointId(id) == TARGET,
        capture_radius,
    }
}

/// Layout: ordinary waypoints 1..=3, target 7 at (0, -10).
fn layout(radius: f32) -> WaypointRegistry {
    WaypointRegistry::new(vec![
        waypoint(1, 1.0, 0.0, radius),
        waypoint(2, -10.0, 5.0, radius),
        waypoint(3, 10.0, 5.0, radius),
        waypoint(7, 0.0, -10.0, radius),
    ])
    .unwrap()
}

fn config(agents: usize) -> SimulationConfig {
    let mut config = SimulationConfig::default();
    config.dog.enabled = false;
    config.agents.roster = (0..agents)
        .map(|i| AgentProfile {
            name: format!("Agent {i}"),
            personality: String::from("Ordinary."),
        })
        .collect();
    config
}

fn round_with(agents: usize, radius: f32) -> (Round, JudgeEndpoint) {
    let (link, endpoint) = JudgeLink::pair();
    let mut round = Round::new(config(agents), link).unwrap();
    round.waypoints = layout(radius);
    for agent in &mut round.agents {
        agent.initialized = true;
    }
    (round, endpoint)
}

fn first_id(round: &Round) -> AgentId {
    round.agents.first().unwrap().id
}

fn decide(
    events: &UnboundedSender<JudgeEvent>,
    agent_id: AgentId,
    message: &str,
    new_target: Option<u32>,
) {
    events
        .send(JudgeEvent {
            agent_id,
            update: JudgeUpdate::Completed {
                decision: JudgeDecision {
                    message: message.to_owned(),
                    new_target: new_target.map(WaypointId),
                    thinking: Vec::new(),
                },
            },
        })
        .unwrap();
}

/// Open a dialogue next to the player and send one message.
fn talk(round: &mut Round, agent_id: AgentId, text: &str) {
    round.agent_mut(agent_id).unwrap().position = Position::new(1.0, 1.0);
    round
        .apply_intent(PlayerIntent::ClickAgent { agent_id })
        .unwrap();
    round
        .apply_intent(PlayerIntent::SubmitMessage {
            agent_id,
            text: text.to_owned(),
        })
        .unwrap();
}

/// Park an agent at the target in the staying state.
fn make_convinced(round: &mut Round, agent_id: AgentId) {
    let agent = round.agent_mut(agent_id).unwrap();
    agent.position = Position::new(0.0, -10.0);
    agent.convinced_through_dialogue = true;
    agent.is_convinced = true;
    agent.convinced_timer = 30.0;
    agent.current_waypoint = Some(TARGET);
    agent.target_waypoint = None;
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

#[test]
fn scenario_a_walks_to_waypoint_and_dwells() {
    let (mut round, _endpoint) = round_with(1, 0.1);
    let id = first_id(&round);
    {
        let agent = round.agent_mut(id).unwrap();
        agent.position = Position::ORIGIN;
        agent.speed = 0.05;
        agent.set_destination(WaypointId(1));
    }

    for _ in 0..120 {
        tick(&mut round, FRAME);
        if round.agent(id).unwrap().is_dwelling() {
            break;
        }
    }

    let agent = round.agent(id).unwrap();
    assert!(agent.is_dwelling());
    assert_eq!(agent.current_waypoint, Some(WaypointId(1)));
    assert!(
        (0.9 - 1e-4..=1.1 + 1e-4).contains(&agent.position.x),
        "x = {}",
        agent.position.x
    );
}

#[test]
fn scenario_b_only_the_target_persuades() {
    let (mut round, endpoint) = round_with(2, 1.5);
    let first = first_id(&round);
    let second = round.agents.get(1).unwrap().id;

    talk(&mut round, first, "The target has free pie.");
    decide(&endpoint.events, first, "Pie? I'm on my way.", Some(7));
    tick(&mut round, FRAME);

    let agent = round.agent(first).unwrap();
    assert!(agent.convinced_through_dialogue);
    assert_eq!(agent.target_waypoint, Some(TARGET));

    talk(&mut round, second, "Go to spot three.");
    decide(&endpoint.events, second, "Spot three it is.", Some(3));
    tick(&mut round, FRAME);

    let agent = round.agent(second).unwrap();
    assert!(!agent.convinced_through_dialogue);
    assert_eq!(agent.target_waypoint, Some(WaypointId(3)));
}

#[test]
fn scenario_c_stay_runs_out_with_snark_and_farewell() {
    let (mut round, _endpoint) = round_with(1, 1.5);
    let id = first_id(&round);
    make_convinced(&mut round, id);

    for _ in 0..100 {
        tick(&mut round, 0.25);
    }
    let agent = round.agent(id).unwrap();
    assert!(agent.is_convinced);
    assert!((agent.convinced_timer - 5.0).abs() < 1e-3);
    assert!(agent.snarky_comment.is_some());

    for _ in 0..20 {
        tick(&mut round, 0.25);
    }
    let agent = round.agent(id).unwrap();
    assert!(!agent.is_convinced);
    assert!(!agent.convinced_through_dialogue);
    assert_eq!(
        agent.conversation_history.last().map(|t| t.speaker),
        Some(Speaker::Agent)
    );
    assert!(agent.target_waypoint.is_some_and(|w| w != TARGET));
}

#[test]
fn scenario_d_drifting_off_breaks_persuasion() {
    let (mut round, _endpoint) = round_with(1, 1.5);
    let id = first_id(&round);
    make_convinced(&mut round, id);
    tick(&mut round, FRAME);
    assert!(round.agent(id).unwrap().is_convinced);

    // Outside capture_radius (1.5) + capture_slack (1.0).
    round.agent_mut(id).unwrap().position = Position::new(0.0, -13.0);
    tick(&mut round, FRAME);

    let agent = round.agent(id).unwrap();
    assert!(!agent.is_convinced);
    assert!(!agent.convinced_through_dialogue);
    assert!(agent.convinced_timer.abs() < f32::EPSILON);
}

#[test]
fn scenario_e_win_is_terminal() {
    let (mut round, _endpoint) = round_with(3, 1.5);
    let ids: Vec<AgentId> = round.agents.iter().map(|a| a.id).collect();
    for id in &ids {
        make_convinced(&mut round, *id);
    }

    let summary = tick(&mut round, FRAME);
    assert!(summary.won);
    let record = round.won.clone().unwrap();

    round.agent_mut(*ids.first().unwrap()).unwrap().clear_convinced();
    for _ in 0..30 {
        let summary = tick(&mut round, FRAME);
        assert!(!summary.won);
    }
    assert_eq!(round.won.as_ref(), Some(&record));
    assert!((round.elapsed_seconds - record.elapsed_seconds).abs() < f32::EPSILON);
    assert!(round.snapshot().won.is_some());
}

// ---------------------------------------------------------------------------
// Full loop
// ---------------------------------------------------------------------------

#[test]
fn persuaded_agent_walks_to_target_and_wins_alone() {
    let (mut round, endpoint) = round_with(1, 1.5);
    let id = first_id(&round);
    round.agent_mut(id).unwrap().speed = 0.1;

    talk(&mut round, id, "Please go to the target.");
    decide(&endpoint.events, id, "Okay.", Some(7));

    let mut won = false;
    for _ in 0..3000 {
        if tick(&mut round, FRAME).won {
            won = true;
            break;
        }
    }
    assert!(won, "agent never reached the target");
    let agent = round.agent(id).unwrap();
    assert!(agent.is_convinced);
    assert!(!agent.is_interacting, "read window should have closed the dialogue");
}

// ---------------------------------------------------------------------------
// Invariants
// ---------------------------------------------------------------------------

#[test]
fn invariants_hold_under_random_play() {
    let (mut round, endpoint) = round_with(4, 1.5);
    round.config.dog.enabled = true;
    round.restart().unwrap();
    round.waypoints = layout(1.5);
    let target = round.waypoints.target().unwrap().clone();
    let zone = target.capture_radius + round.config.waypoints.capture_slack;

    let mut rng = StdRng::seed_from_u64(7);
    let mut ever_persuaded: BTreeSet<AgentId> = BTreeSet::new();
    let JudgeEndpoint {
        mut requests,
        events,
    } = endpoint;

    for frame in 0..6000_u32 {
        // Answer every pending judge request with a random destination.
        while let Ok(request) = requests.try_recv() {
            let pick = match rng.random_range(0..4) {
                0 => None,
                1 => Some(7),
                n => Some(n),
            };
            decide(&events, request.agent_id, "Hmm, fine.", pick);
        }

        // Occasionally chat with a random agent.
        if frame % 90 == 0 {
            let idx = rng.random_range(0..round.agents.len());
            let id = round.agents.get(idx).unwrap().id;
            let _ = conversation::open_interaction(&mut round, id);
            let _ = conversation::send_message(&mut round, id, "Have you seen the target?");
        }

        tick(&mut round, FRAME);

        for agent in &round.agents {
            assert!(
                !(agent.current_waypoint.is_some() && agent.target_waypoint.is_some()),
                "{} has both a current and a target waypoint",
                agent.name
            );
            if agent.convinced_through_dialogue {
                ever_persuaded.insert(agent.id);
            }
            if agent.is_convinced {
                assert!(ever_persuaded.contains(&agent.id));
                let d = (agent.position.x - target.position.x)
                    .hypot(agent.position.z - target.position.z);
                assert!(d <= zone + 1e-4);
            }
        }
    }
}

#[test]
fn wandering_never_heads_for_the_target_unprompted() {
    let (mut round, _endpoint) = round_with(4, 1.5);
    for _ in 0..5000 {
        tick(&mut round, FRAME);
        for agent in &round.agents {
            assert_ne!(agent.target_waypoint, Some(TARGET));
        }
    }
}

#[test]
fn close_twice_equals_close_once() {
    let (mut round, _endpoint) = round_with(1, 1.5);
    let id = first_id(&round);
    round.agent_mut(id).unwrap().position = Position::new(1.0, 1.0);
    conversation::open_interaction(&mut round, id).unwrap();

    conversation::close_interaction(&mut round, id).unwrap();
    let once = round.snapshot().agents;
    conversation::close_interaction(&mut round, id).unwrap();
    let twice = round.snapshot().agents;
    assert_eq!(once, twice);
}

#[test]
fn restart_resets_every_agent() {
    let (mut round, endpoint) = round_with(3, 1.5);
    let old_ids: Vec<AgentId> = round.agents.iter().map(|a| a.id).collect();
    let id = first_id(&round);
    talk(&mut round, id, "Hello there.");
    make_convinced(&mut round, id);
    for _ in 0..10 {
        tick(&mut round, FRAME);
    }

    round.apply_intent(PlayerIntent::Restart).unwrap();
    assert_eq!(round.number, 2);
    assert!(round.won.is_none());
    assert_eq!(round.frame, 0);

    for agent in &round.agents {
        assert!(!old_ids.contains(&agent.id));
        assert!(!agent.is_interacting);
        assert!(!agent.is_convinced && !agent.convinced_through_dialogue);
        assert!(agent.conversation_history.is_empty());
        assert!(agent.target_waypoint.is_none());
    }

    // A reply for the old round is dropped.
    decide(&endpoint.events, id, "Too late.", Some(7));
    assert_eq!(tick(&mut round, FRAME).judge_events, 0);
    for agent in &round.agents {
        assert!(agent.target_waypoint.is_some());
    }
}

#[test]
fn same_seed_same_game() {
    let run = || {
        let (link, _endpoint) = JudgeLink::pair();
        let mut round = Round::new(SimulationConfig::default(), link).unwrap();
        for _ in 0..600 {
            tick(&mut round, FRAME);
        }
        round
            .agents
            .iter()
            .map(|a| (a.position, a.target_waypoint, a.current_waypoint))
            .collect::<Vec<_>>()
    };
    assert_eq!(run(), run());
}
