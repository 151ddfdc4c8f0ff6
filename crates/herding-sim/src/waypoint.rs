//! Waypoint registry, per-round generation, and the wandering policy.
//!
//! A [`WaypointRegistry`] is built once per round and never mutated. It
//! guarantees exactly one target waypoint and enough ordinary waypoints for
//! agents to wander between without getting stuck.
//!
//! [`select_next_waypoint`] is the only way an agent picks a destination on
//! its own, and it never returns the target.

use std::collections::BTreeSet;

use herding_types::{Position, Waypoint, WaypointBrief, WaypointId};
use rand::Rng;
use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::config::WaypointConfig;
use crate::error::SimError;
use crate::geometry;

/// Fewest waypoints a round can have: the target plus two to alternate between.
pub const MIN_WAYPOINTS: usize = 3;

/// Placement attempts per waypoint before accepting a crowded spot.
const PLACEMENT_ATTEMPTS: u32 = 64;

/// Immutable set of waypoints for one round.
#[derive(Debug, Clone)]
pub struct WaypointRegistry {
    waypoints: Vec<Waypoint>,
    target: WaypointId,
}

impl WaypointRegistry {
    /// Build a registry from an explicit list.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TooFewWaypoints`] below [`MIN_WAYPOINTS`],
    /// [`SimError::TargetCount`] unless exactly one waypoint is the target,
    /// or [`SimError::DuplicateWaypoint`] if ids repeat.
    pub fn new(waypoints: Vec<Waypoint>) -> Result<Self, SimError> {
        if waypoints.len() < MIN_WAYPOINTS {
            return Err(SimError::TooFewWaypoints {
                required: MIN_WAYPOINTS,
                configured: waypoints.len(),
            });
        }

        let mut seen = BTreeSet::new();
        for wp in &waypoints {
            if !seen.insert(wp.id) {
                return Err(SimError::DuplicateWaypoint { id: wp.id.get() });
            }
        }

        let targets: Vec<WaypointId> = waypoints
            .iter()
            .filter(|wp| wp.is_target)
            .map(|wp| wp.id)
            .collect();
        let [target] = targets.as_slice() else {
            return Err(SimError::TargetCount {
                found: targets.len(),
            });
        };

        Ok(Self {
            target: *target,
            waypoints,
        })
    }

    /// Generate a fresh registry for a new round.
    ///
    /// Waypoints get ids `1..=n` in name order, random positions inside the
    /// arena kept apart by `min_separation` where possible, and one of them
    /// is chosen uniformly as the target.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TooFewWaypoints`] if fewer than
    /// [`MIN_WAYPOINTS`] names are configured.
    pub fn generate(
        config: &WaypointConfig,
        half_extent: f32,
        rng: &mut impl Rng,
    ) -> Result<Self, SimError> {
        let count = config.names.len();
        if count < MIN_WAYPOINTS {
            return Err(SimError::TooFewWaypoints {
                required: MIN_WAYPOINTS,
                configured: count,
            });
        }

        let target_index = rng.random_range(0..count);
        let margin = (half_extent - config.capture_radius - 1.0).max(0.0);

        let mut waypoints: Vec<Waypoint> = Vec::with_capacity(count);
        for (index, (name, id)) in config.names.iter().zip(1_u32..).enumerate() {
            let position = place_waypoint(&waypoints, margin, config.min_separation, rng);
            waypoints.push(Waypoint {
                id: WaypointId(id),
                name: name.clone(),
                position,
                is_target: index == target_index,
                capture_radius: config.capture_radius,
            });
        }

        Self::new(waypoints)
    }

    /// All waypoints in id order.
    pub fn all(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Look up a waypoint by id.
    pub fn get(&self, id: WaypointId) -> Option<&Waypoint> {
        self.waypoints.iter().find(|wp| wp.id == id)
    }

    /// The target waypoint's id.
    pub const fn target_id(&self) -> WaypointId {
        self.target
    }

    /// The target waypoint.
    pub fn target(&self) -> Option<&Waypoint> {
        self.get(self.target)
    }

    /// True if `id` names the target.
    pub fn is_target(&self, id: WaypointId) -> bool {
        id == self.target
    }

    /// The judge-facing summary of every waypoint.
    pub fn briefs(&self) -> Vec<WaypointBrief> {
        self.waypoints
            .iter()
            .map(|wp| WaypointBrief {
                id: wp.id,
                name: wp.name.clone(),
                is_target: wp.is_target,
            })
            .collect()
    }
}

/// Pick a random spot at least `min_separation` from every placed waypoint.
fn place_waypoint(
    placed: &[Waypoint],
    margin: f32,
    min_separation: f32,
    rng: &mut impl Rng,
) -> Position {
    let mut candidate = Position::ORIGIN;
    for _ in 0..PLACEMENT_ATTEMPTS {
        candidate = Position::new(
            rng.random_range(-margin..=margin),
            rng.random_range(-margin..=margin),
        );
        let clear = placed
            .iter()
            .all(|wp| geometry::distance(wp.position, candidate) >= min_separation);
        if clear {
            return candidate;
        }
    }
    warn!(
        placed = placed.len(),
        min_separation, "Could not keep waypoint separation, accepting crowded spot"
    );
    candidate
}

/// Choose the next ordinary destination for a wandering agent.
///
/// Picks uniformly among waypoints that are not the target, not `current`,
/// and not `last`. If that leaves nothing, `last` is allowed back in.
/// Returns `None` only if the registry has no ordinary waypoint other than
/// `current`, which [`WaypointRegistry::new`] rules out.
pub fn select_next_waypoint(
    registry: &WaypointRegistry,
    current: Option<WaypointId>,
    last: Option<WaypointId>,
    rng: &mut impl Rng,
) -> Option<WaypointId> {
    let ordinary = |wp: &&Waypoint| !wp.is_target && Some(wp.id) != current;

    let preferred: Vec<WaypointId> = registry
        .all()
        .iter()
        .filter(ordinary)
        .filter(|wp| Some(wp.id) != last)
        .map(|wp| wp.id)
        .collect();

    if let Some(id) = preferred.choose(rng) {
        return Some(*id);
    }

    let fallback: Vec<WaypointId> = registry
        .all()
        .iter()
        .filter(ordinary)
        .map(|wp| wp.id)
        .collect();
    let choice = fallback.choose(rng).copied();
    debug!(?current, ?last, ?choice, "Waypoint selection fell back");
    choice
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn wp(id: u32, x: f32, is_target: bool) -> Waypoint {
        Waypoint {
            id: WaypointId(id),
            name: format!("wp{id}"),
            position: Position::new(x, 0.0),
            is_target,
            capture_radius: 1.0,
        }
    }

    fn registry(n: u32, target: u32) -> WaypointRegistry {
        let mut x = 0.0;
        let mut list = Vec::new();
        for i in 1..=n {
            x += 5.0;
            list.push(wp(i, x, i == target));
        }
        WaypointRegistry::new(list).unwrap()
    }

    #[test]
    fn rejects_missing_or_multiple_targets() {
        let none = vec![wp(1, 0.0, false), wp(2, 5.0, false), wp(3, 10.0, false)];
        assert!(matches!(
            WaypointRegistry::new(none),
            Err(SimError::TargetCount { found: 0 })
        ));

        let two = vec![wp(1, 0.0, true), wp(2, 5.0, true), wp(3, 10.0, false)];
        assert!(matches!(
            WaypointRegistry::new(two),
            Err(SimError::TargetCount { found: 2 })
        ));
    }

    #[test]
    fn rejects_too_few_and_duplicates() {
        let few = vec![wp(1, 0.0, true), wp(2, 5.0, false)];
        assert!(matches!(
            WaypointRegistry::new(few),
            Err(SimError::TooFewWaypoints { .. })
        ));

        let dup = vec![wp(1, 0.0, true), wp(2, 5.0, false), wp(2, 10.0, false)];
        assert!(matches!(
            WaypointRegistry::new(dup),
            Err(SimError::DuplicateWaypoint { id: 2 })
        ));
    }

    #[test]
    fn selection_never_returns_target() {
        let reg = registry(6, 4);
        let mut rng = StdRng::seed_from_u64(1);
        let mut current = None;
        let mut last = None;
        for _ in 0..500 {
            let next = select_next_waypoint(&reg, current, last, &mut rng);
            assert!(next.is_some());
            assert_ne!(next, Some(reg.target_id()));
            assert_ne!(next, current);
            last = current;
            current = next;
        }
    }

    #[test]
    fn selection_excludes_last_when_possible() {
        let reg = registry(4, 1);
        let mut rng = StdRng::seed_from_u64(9);
        for _ in 0..100 {
            let next = select_next_waypoint(&reg, Some(WaypointId(2)), Some(WaypointId(3)), &mut rng);
            assert_eq!(next, Some(WaypointId(4)));
        }
    }

    #[test]
    fn selection_falls_back_to_last() {
        // Target 1, ordinary 2 and 3: from 2 with last 3 only 3 remains.
        let reg = registry(3, 1);
        let mut rng = StdRng::seed_from_u64(3);
        let next = select_next_waypoint(&reg, Some(WaypointId(2)), Some(WaypointId(3)), &mut rng);
        assert_eq!(next, Some(WaypointId(3)));
    }

    #[test]
    fn generated_registry_has_one_target_inside_arena() {
        let config = WaypointConfig::default();
        let mut rng = StdRng::seed_from_u64(42);
        let reg = WaypointRegistry::generate(&config, 20.0, &mut rng).unwrap();

        assert_eq!(reg.all().len(), config.names.len());
        assert_eq!(reg.all().iter().filter(|w| w.is_target).count(), 1);
        assert!(reg.target().is_some());
        for w in reg.all() {
            assert!(w.position.x.abs() <= 20.0 && w.position.z.abs() <= 20.0);
        }
    }

    #[test]
    fn generate_rejects_short_name_list() {
        let config = WaypointConfig {
            names: vec![String::from("A"), String::from("B")],
            ..WaypointConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(0);
        assert!(WaypointRegistry::generate(&config, 20.0, &mut rng).is_err());
    }
}
