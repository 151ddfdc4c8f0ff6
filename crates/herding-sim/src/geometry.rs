//! Ground-plane vector math.
//!
//! Positions are plain `{x, z}` pairs. Every function here is total: a
//! zero-length direction yields `None` rather than a NaN.

use herding_types::Position;

/// Lengths below this are treated as zero when normalizing.
const EPSILON: f32 = 1e-6;

/// Straight-line distance between two points.
pub fn distance(a: Position, b: Position) -> f32 {
    let dx = b.x - a.x;
    let dz = b.z - a.z;
    dx.hypot(dz)
}

/// Vector from `from` to `to`, as a position-shaped pair.
pub fn displacement(from: Position, to: Position) -> Position {
    Position::new(to.x - from.x, to.z - from.z)
}

/// Unit vector in the direction of `v`, or `None` for a zero vector.
pub fn normalize(v: Position) -> Option<Position> {
    let len = v.x.hypot(v.z);
    if len < EPSILON || !len.is_finite() {
        return None;
    }
    Some(Position::new(v.x / len, v.z / len))
}

/// Unit vector pointing from `from` toward `to`.
pub fn direction(from: Position, to: Position) -> Option<Position> {
    normalize(displacement(from, to))
}

/// Facing angle (radians) for a movement direction.
///
/// Zero faces positive `z`; positive angles turn toward positive `x`.
pub fn heading(dir: Position) -> f32 {
    dir.x.atan2(dir.z)
}

/// Clamp a point into the square arena, independently per axis.
pub fn clamp_to_arena(p: Position, half_extent: f32) -> Position {
    let h = half_extent.abs();
    Position::new(p.x.clamp(-h, h), p.z.clamp(-h, h))
}

/// Project `p` onto the circle of `radius` around `center`.
///
/// If `p` sits exactly on `center` it is returned unchanged.
pub fn snap_to_radius(p: Position, center: Position, radius: f32) -> Position {
    direction(center, p).map_or(p, |dir| {
        Position::new(center.x + dir.x * radius, center.z + dir.z * radius)
    })
}

/// True if `p` is within `radius` of `center`, inclusive.
pub fn within(p: Position, center: Position, radius: f32) -> bool {
    distance(p, center) <= radius
}
