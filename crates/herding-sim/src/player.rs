//! The player avatar.
//!
//! Held keys take priority over a click-to-move destination; pressing any
//! key cancels the destination.

use herding_types::{MovementFlags, PlayerView, Position};

use crate::config::PlayerConfig;
use crate::geometry;
use crate::movement::{self, Arena};

/// Player position and movement input.
#[derive(Debug, Clone)]
pub struct Player {
    /// Current location.
    pub position: Position,
    /// Facing angle in radians.
    pub heading: f32,
    /// Per-frame speed.
    pub speed: f32,
    /// Agents within this distance can be talked to.
    pub influence_radius: f32,
    /// Held movement keys.
    pub movement: MovementFlags,
    /// Click-to-move destination.
    pub destination: Option<Position>,
}

impl Player {
    /// A player standing at the arena center.
    pub const fn spawn(config: &PlayerConfig) -> Self {
        Self {
            position: Position::ORIGIN,
            heading: 0.0,
            speed: config.speed,
            influence_radius: config.influence_radius,
            movement: MovementFlags {
                forward: false,
                back: false,
                left: false,
                right: false,
            },
            destination: None,
        }
    }

    /// True if `point` is inside the influence radius.
    pub fn can_reach(&self, point: Position) -> bool {
        geometry::within(self.position, point, self.influence_radius)
    }

    /// Replace held keys; any held key cancels click-to-move.
    pub const fn set_movement(&mut self, flags: MovementFlags) {
        self.movement = flags;
        if flags.any() {
            self.destination = None;
        }
    }

    /// Read-only projection for the presentation layer.
    pub const fn view(&self) -> PlayerView {
        PlayerView {
            position: self.position,
            heading: self.heading,
            movement: self.movement,
            destination: self.destination,
            influence_radius: self.influence_radius,
        }
    }
}

/// Move the player for one frame.
pub fn update(player: &mut Player, arena: Arena, delta: f32) {
    if player.movement.any() {
        let flags = player.movement;
        let axis = |neg: bool, pos: bool| f32::from(u8::from(pos)) - f32::from(u8::from(neg));
        let dir = Position::new(
            axis(flags.left, flags.right),
            axis(flags.forward, flags.back),
        );
        let step = movement::step_along(player.position, dir, player.speed, delta, arena);
        player.position = step.position;
        if let Some(heading) = step.heading {
            player.heading = heading;
        }
        return;
    }

    let Some(dest) = player.destination else {
        return;
    };
    let reach = player.speed * arena.frames(delta);
    if geometry::distance(player.position, dest) <= reach {
        player.position = geometry::clamp_to_arena(dest, arena.half_extent);
        player.destination = None;
        return;
    }
    let step = movement::step_toward(player.position, dest, player.speed, delta, arena);
    player.position = step.position;
    if let Some(heading) = step.heading {
        player.heading = heading;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ARENA: Arena = Arena {
        half_extent: 20.0,
        reference_frame_rate: 60.0,
    };
    const FRAME: f32 = 1.0 / 60.0;

    #[test]
    fn forward_moves_negative_z() {
        let mut player = Player::spawn(&PlayerConfig::default());
        player.set_movement(MovementFlags {
            forward: true,
            ..MovementFlags::default()
        });
        update(&mut player, ARENA, FRAME);
        assert!(player.position.z < 0.0);
        assert!(player.position.x.abs() < 1e-6);
    }

    #[test]
    fn opposing_keys_cancel() {
        let mut player = Player::spawn(&PlayerConfig::default());
        player.set_movement(MovementFlags {
            left: true,
            right: true,
            ..MovementFlags::default()
        });
        update(&mut player, ARENA, FRAME);
        assert_eq!(player.position, Position::ORIGIN);
    }

    #[test]
    fn click_to_move_reaches_destination() {
        let mut player = Player::spawn(&PlayerConfig::default());
        player.destination = Some(Position::new(2.0, 0.0));
        for _ in 0..100 {
            update(&mut player, ARENA, FRAME);
        }
        assert!(player.destination.is_none());
        assert!((player.position.x - 2.0).abs() < 1e-4);
    }

    #[test]
    fn keys_cancel_destination() {
        let mut player = Player::spawn(&PlayerConfig::default());
        player.destination = Some(Position::new(5.0, 5.0));
        player.set_movement(MovementFlags {
            right: true,
            ..MovementFlags::default()
        });
        assert!(player.destination.is_none());
    }

    #[test]
    fn influence_radius_gates_reach() {
        let player = Player::spawn(&PlayerConfig::default());
        assert!(player.can_reach(Position::new(4.9, 0.0)));
        assert!(!player.can_reach(Position::new(5.1, 0.0)));
    }
}
