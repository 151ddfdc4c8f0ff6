//! The stay at the target, and eviction from it.
//!
//! A convinced agent stands at the target while `convinced_timer` runs
//! down. Leaving the capture zone early breaks persuasion on the spot;
//! running out the timer ends it with a farewell. Either way the agent goes
//! back to wandering between ordinary waypoints.

use herding_types::ChatTurn;
use rand::Rng;
use tracing::{info, warn};

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::geometry;
use crate::lines;
use crate::waypoint::{self, WaypointRegistry};

/// What a stay update did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StayOutcome {
    /// Still staying.
    Staying,
    /// Left the capture zone before the timer ran out.
    Drifted,
    /// The timer ran out.
    Expired,
}

/// Advance a convinced agent's stay by `delta` seconds.
///
/// The timer is frozen while a dialogue is open; the drift check is not.
pub fn update(
    agent: &mut Agent,
    registry: &WaypointRegistry,
    config: &SimulationConfig,
    delta: f32,
    rng: &mut impl Rng,
) -> StayOutcome {
    let Some(target) = registry.target() else {
        warn!(agent = %agent.name, "Round has no target waypoint, skipping stay");
        return StayOutcome::Staying;
    };

    let zone = target.capture_radius + config.waypoints.capture_slack;
    if !geometry::within(agent.position, target.position, zone) {
        agent.clear_convinced();
        agent.current_waypoint = None;
        wander_off(agent, registry, rng);
        info!(agent = %agent.name, "Agent drifted off the target, persuasion broken");
        return StayOutcome::Drifted;
    }

    if !agent.is_interacting {
        agent.convinced_timer -= delta;
    }

    if agent.convinced_timer <= config.timing.snark_threshold_seconds
        && agent.snarky_comment.is_none()
    {
        agent.snarky_comment = Some(lines::pick(lines::SNARKY_COMMENTS, rng));
    }

    if agent.convinced_timer > 0.0 {
        return StayOutcome::Staying;
    }

    agent.clear_convinced();
    agent
        .conversation_history
        .push(ChatTurn::agent(lines::pick(lines::FAREWELLS, rng)));
    wander_off(agent, registry, rng);
    info!(agent = %agent.name, "Agent's stay ended");
    StayOutcome::Expired
}

/// Send the agent toward a fresh ordinary waypoint.
fn wander_off(agent: &mut Agent, registry: &WaypointRegistry, rng: &mut impl Rng) {
    let current = agent.current_waypoint.or(Some(registry.target_id()));
    match waypoint::select_next_waypoint(registry, current, agent.last_waypoint, rng) {
        Some(next) => agent.set_destination(next),
        None => {
            agent.current_waypoint = None;
            agent.target_waypoint = None;
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use herding_types::{Position, Speaker, Waypoint, WaypointId};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::config::AgentProfile;

    fn registry() -> WaypointRegistry {
        let wp = |id: u32, x: f32, is_target: bool| Waypoint {
            id: WaypointId(id),
            name: format!("wp{id}"),
            position: Position::new(x, 0.0),
            is_target,
            capture_radius: 1.5,
        };
        WaypointRegistry::new(vec![
            wp(1, -8.0, false),
            wp(2, 8.0, false),
            wp(3, 0.0, true),
        ])
        .unwrap()
    }

    fn staying_agent() -> Agent {
        let profile = AgentProfile {
            name: String::from("Priya"),
            personality: String::from("Curious."),
        };
        let mut agent = Agent::spawn(&profile, Position::ORIGIN, 0.05);
        agent.initialized = true;
        agent.convinced_through_dialogue = true;
        agent.is_convinced = true;
        agent.convinced_timer = 30.0;
        agent.current_waypoint = Some(WaypointId(3));
        agent
    }

    #[test]
    fn snark_appears_near_the_end() {
        let reg = registry();
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut a = staying_agent();

        for _ in 0..100 {
            assert_eq!(update(&mut a, &reg, &config, 0.25, &mut rng), StayOutcome::Staying);
        }
        assert!((a.convinced_timer - 5.0).abs() < 1e-3);
        assert!(a.snarky_comment.is_some());
    }

    #[test]
    fn expiry_says_goodbye_and_wanders() {
        let reg = registry();
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(2);
        let mut a = staying_agent();
        a.convinced_timer = 0.1;

        assert_eq!(update(&mut a, &reg, &config, 0.25, &mut rng), StayOutcome::Expired);
        assert!(!a.is_convinced && !a.convinced_through_dialogue);
        assert!(a.snarky_comment.is_none());
        assert_eq!(
            a.conversation_history.last().map(|t| t.speaker),
            Some(Speaker::Agent)
        );
        assert!(a.target_waypoint.is_some_and(|id| id != WaypointId(3)));
        assert_eq!(a.current_waypoint, None);
    }

    #[test]
    fn drift_breaks_persuasion_immediately() {
        let reg = registry();
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(3);
        let mut a = staying_agent();
        a.position = Position::new(0.0, 2.6);

        assert_eq!(update(&mut a, &reg, &config, 0.0, &mut rng), StayOutcome::Drifted);
        assert!(!a.is_convinced && !a.convinced_through_dialogue);
        assert!(a.convinced_timer.abs() < f32::EPSILON);
        assert!(a.conversation_history.is_empty());
    }

    #[test]
    fn timer_frozen_during_dialogue() {
        let reg = registry();
        let config = SimulationConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        let mut a = staying_agent();
        a.is_interacting = true;

        update(&mut a, &reg, &config, 1.0, &mut rng);
        assert!((a.convinced_timer - 30.0).abs() < f32::EPSILON);
    }
}
