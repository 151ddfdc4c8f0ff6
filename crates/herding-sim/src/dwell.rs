//! Waypoint arrival and dwelling.
//!
//! An agent that is not staying at the target cycles through three states:
//!
//! - **Moving** -- `target_waypoint` is set; step toward it each frame and
//!   test for arrival.
//! - **Dwelling** -- `current_waypoint` is set; count `dwell_timer` down and
//!   pick a new destination at zero.
//! - **Idle** -- neither is set (before the first update, or after a lookup
//!   failed); pick a destination straight away.
//!
//! Arriving at the target with `convinced_through_dialogue` set starts the
//! stay instead of dwelling; see [`crate::convinced`].

use herding_types::WaypointId;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::agent::Agent;
use crate::config::SimulationConfig;
use crate::geometry;
use crate::movement::{self, Arena};
use crate::waypoint::{self, WaypointRegistry};

/// What a dwell update did to an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Nothing changed state.
    None,
    /// Reached an ordinary waypoint and started dwelling.
    Arrived(WaypointId),
    /// Finished dwelling (or was idle) and set off toward a waypoint.
    Departed(WaypointId),
    /// Reached the target after being persuaded; the stay has begun.
    Convinced,
}

/// Pick the agent's first destination on its first update.
///
/// Returns `true` if this call initialized the agent.
pub fn initialize(agent: &mut Agent, registry: &WaypointRegistry, rng: &mut impl Rng) -> bool {
    if agent.initialized {
        return false;
    }
    agent.initialized = true;
    if agent.target_waypoint.is_none() && agent.current_waypoint.is_none() {
        if let Some(first) = waypoint::select_next_waypoint(registry, None, None, rng) {
            agent.set_destination(first);
            debug!(agent = %agent.name, waypoint = %first, "Agent initialized");
        }
    }
    true
}

/// Advance one agent's movement and dwell state by `delta` seconds.
///
/// Callers skip this for agents that are interacting or staying at the
/// target.
pub fn update(
    agent: &mut Agent,
    registry: &WaypointRegistry,
    config: &SimulationConfig,
    arena: Arena,
    delta: f32,
    rng: &mut impl Rng,
) -> Transition {
    if let Some(target_id) = agent.target_waypoint {
        return advance_toward(agent, target_id, registry, config, arena, delta, rng);
    }

    if let Some(current_id) = agent.current_waypoint {
        agent.dwell_timer -= delta;
        if agent.dwell_timer > 0.0 {
            return Transition::None;
        }
        return depart(agent, current_id, registry, config, rng);
    }

    match waypoint::select_next_waypoint(registry, None, agent.last_waypoint, rng) {
        Some(next) => {
            agent.set_destination(next);
            Transition::Departed(next)
        }
        None => Transition::None,
    }
}

/// Step toward `target_id` and handle arrival.
fn advance_toward(
    agent: &mut Agent,
    target_id: WaypointId,
    registry: &WaypointRegistry,
    config: &SimulationConfig,
    arena: Arena,
    delta: f32,
    rng: &mut impl Rng,
) -> Transition {
    let Some(wp) = registry.get(target_id) else {
        warn!(agent = %agent.name, waypoint = %target_id, "Destination not in registry, skipping");
        return Transition::None;
    };

    let step = movement::step_toward(agent.position, wp.position, agent.speed, delta, arena);
    agent.position = step.position;
    if let Some(heading) = step.heading {
        agent.heading = heading;
        agent.walk_phase = movement::advance_walk_phase(agent.walk_phase, delta);
    }

    let is_target = registry.is_target(target_id);
    let slack = if is_target {
        config.waypoints.capture_slack
    } else {
        config.waypoints.arrival_slack
    };
    if !geometry::within(agent.position, wp.position, wp.capture_radius + slack) {
        return Transition::None;
    }

    agent.current_waypoint = Some(target_id);
    agent.target_waypoint = None;

    if is_target && agent.convinced_through_dialogue {
        agent.is_convinced = true;
        agent.convinced_timer = config.timing.convinced_duration_seconds;
        agent.snarky_comment = None;
        agent.dwell_timer = 0.0;
        info!(agent = %agent.name, waypoint = %wp.name, "Agent convinced at target");
        return Transition::Convinced;
    }

    agent.position = geometry::snap_to_radius(agent.position, wp.position, wp.capture_radius);
    agent.dwell_timer = uniform(
        config.timing.dwell_min_seconds,
        config.timing.dwell_max_seconds,
        rng,
    );
    debug!(
        agent = %agent.name,
        waypoint = %wp.name,
        dwell = agent.dwell_timer,
        "Agent arrived"
    );
    Transition::Arrived(target_id)
}

/// Leave `current_id` for a freshly selected waypoint.
fn depart(
    agent: &mut Agent,
    current_id: WaypointId,
    registry: &WaypointRegistry,
    config: &SimulationConfig,
    rng: &mut impl Rng,
) -> Transition {
    let Some(next) =
        waypoint::select_next_waypoint(registry, Some(current_id), agent.last_waypoint, rng)
    else {
        // Nowhere else to go; dwell another round.
        agent.dwell_timer = config.timing.dwell_min_seconds;
        return Transition::None;
    };

    if !registry.is_target(current_id) {
        agent.last_waypoint = Some(current_id);
    }
    agent.set_destination(next);
    debug!(agent = %agent.name, from = %current_id, to = %next, "Agent departing");
    Transition::Departed(next)
}

/// Uniform draw in `[a, b]`, tolerant of reversed bounds.
pub(crate) fn uniform(a: f32, b: f32, rng: &mut impl Rng) -> f32 {
    let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
    rng.random_range(lo..=hi)
}
