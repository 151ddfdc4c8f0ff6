//! Win-condition evaluation.

use crate::agent::Agent;
use crate::geometry;
use crate::waypoint::WaypointRegistry;

/// True if every agent is staying at the target and inside its capture zone.
///
/// An empty roster never wins.
pub fn evaluate(agents: &[Agent], registry: &WaypointRegistry, capture_slack: f32) -> bool {
    let Some(target) = registry.target() else {
        return false;
    };
    let zone = target.capture_radius + capture_slack;
    !agents.is_empty()
        && agents
            .iter()
            .all(|a| a.is_convinced && geometry::within(a.position, target.position, zone))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use herding_types::{Position, Waypoint, WaypointId};

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
        WaypointRegistry::new(vec![wp(1, -8.0, false), wp(2, 8.0, false), wp(3, 0.0, true)])
            .unwrap()
    }

    fn convinced(x: f32) -> Agent {
        let profile = AgentProfile {
            name: String::from("Bram"),
            personality: String::from("Suspicious."),
        };
        let mut a = Agent::spawn(&profile, Position::new(x, 0.0), 0.05);
        a.convinced_through_dialogue = true;
        a.is_convinced = true;
        a
    }

    #[test]
    fn all_convinced_inside_zone_wins() {
        let agents = vec![convinced(0.0), convinced(1.0), convinced(-2.4)];
        assert!(evaluate(&agents, &registry(), 1.0));
    }

    #[test]
    fn one_holdout_blocks_win() {
        let mut agents = vec![convinced(0.0), convinced(1.0)];
        if let Some(a) = agents.get_mut(1) {
            a.is_convinced = false;
        }
        assert!(!evaluate(&agents, &registry(), 1.0));
    }

    #[test]
    fn convinced_but_outside_zone_blocks_win() {
        let agents = vec![convinced(0.0), convinced(3.0)];
        assert!(!evaluate(&agents, &registry(), 1.0));
    }

    #[test]
    fn empty_roster_never_wins() {
        assert!(!evaluate(&[], &registry(), 1.0));
    }
}
