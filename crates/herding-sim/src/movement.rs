//! Per-frame straight-line movement.

use herding_types::Position;

use crate::geometry;

/// Radians of walk cycle per second of movement.
pub const WALK_CYCLE_RATE: f32 = 8.0;

/// Arena bounds and the frame rate speeds are expressed against.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Arena {
    /// Half the side length of the square arena.
    pub half_extent: f32,
    /// Frames per second at which `speed` is distance per frame.
    pub reference_frame_rate: f32,
}

impl Arena {
    /// Nominal frames covered by `delta` seconds.
    pub const fn frames(self, delta: f32) -> f32 {
        delta * self.reference_frame_rate
    }
}

/// Outcome of one movement step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Step {
    /// Where the mover ends up, already clamped to the arena.
    pub position: Position,
    /// Facing for the direction travelled, or `None` if nothing moved.
    pub heading: Option<f32>,
}

/// Move from `position` toward `destination`.
///
/// Covers at most `speed * delta * reference_frame_rate`, so `speed` means
/// distance per nominal frame. The step may land exactly on
/// or past `destination`; callers do their own arrival checks. A zero-length
/// displacement produces no movement. The result is clamped to the arena.
pub fn step_toward(
    position: Position,
    destination: Position,
    speed: f32,
    delta: f32,
    arena: Arena,
) -> Step {
    let Some(dir) = geometry::direction(position, destination) else {
        return Step {
            position: geometry::clamp_to_arena(position, arena.half_extent),
            heading: None,
        };
    };
    let step = (speed * arena.frames(delta)).max(0.0);
    let moved = Position::new(position.x + dir.x * step, position.z + dir.z * step);
    Step {
        position: geometry::clamp_to_arena(moved, arena.half_extent),
        heading: Some(geometry::heading(dir)),
    }
}

/// Move along a unit-free direction (player key input).
///
/// `dir` need not be normalized; a zero vector produces no movement.
pub fn step_along(
    position: Position,
    dir: Position,
    speed: f32,
    delta: f32,
    arena: Arena,
) -> Step {
    let target = Position::new(position.x + dir.x, position.z + dir.z);
    step_toward(position, target, speed, delta, arena)
}

/// Advance a walk-cycle phase, wrapped to `[0, 2π)`.
pub fn advance_walk_phase(phase: f32, delta: f32) -> f32 {
    (phase + delta * WALK_CYCLE_RATE).rem_euclid(std::f32::consts::TAU)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: Arena = Arena {
        half_extent: 20.0,
        reference_frame_rate: 60.0,
    };
    const FRAME: f32 = 1.0 / 60.0;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-4
    }

    #[test]
    fn moves_speed_per_nominal_frame() {
        let step = step_toward(Position::ORIGIN, Position::new(10.0, 0.0), 0.05, FRAME, ARENA);
        assert!(approx(step.position.x, 0.05));
        assert!(approx(step.position.z, 0.0));
        assert!(step.heading.is_some_and(|h| approx(h, std::f32::consts::FRAC_PI_2)));
    }

    #[test]
    fn zero_displacement_does_not_move() {
        let p = Position::new(3.0, 3.0);
        let step = step_toward(p, p, 1.0, FRAME, ARENA);
        assert_eq!(step.position, p);
        assert!(step.heading.is_none());
        assert!(!step.position.x.is_nan());
    }

    #[test]
    fn may_overshoot_destination() {
        let step = step_toward(Position::ORIGIN, Position::new(0.01, 0.0), 0.05, FRAME, ARENA);
        assert!(step.position.x > 0.01);
    }

    #[test]
    fn result_is_clamped_to_arena() {
        let step = step_toward(
            Position::new(19.99, 0.0),
            Position::new(40.0, 0.0),
            1.0,
            FRAME,
            ARENA,
        );
        assert!(approx(step.position.x, 20.0));
    }

    #[test]
    fn walk_phase_wraps() {
        let phase = advance_walk_phase(6.0, 1.0);
        assert!((0.0..std::f32::consts::TAU).contains(&phase));
    }
}
