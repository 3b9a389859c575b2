//! Collision detection and response for the peg board
//!
//! Everything on the board is a circle: Numby, the pegs. The walls are three
//! axis-aligned planes (left, right, top); the bottom is open and is how a
//! flight ends.

use glam::Vec2;

use crate::consts::NORMAL_EPSILON;

/// Unit normal from `from` toward `to`
///
/// Coincident centers have no direction; those fall back to straight up
/// (negative y in screen coordinates).
#[inline]
pub fn contact_normal(from: Vec2, to: Vec2) -> (Vec2, f32) {
    let delta = to - from;
    let dist = delta.length();
    if dist < NORMAL_EPSILON {
        (Vec2::NEG_Y, dist)
    } else {
        (delta / dist, dist)
    }
}

/// Strict circle overlap test used by the board query
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    a.distance_squared(b) < (ra + rb) * (ra + rb)
}

/// Reflect velocity off a surface
///
/// Standard reflection: v' = v - 2(v·n)n
#[inline]
pub fn reflect_velocity(velocity: Vec2, normal: Vec2) -> Vec2 {
    velocity - 2.0 * velocity.dot(normal) * normal
}

/// Which walls were touched in one resolution pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WallContacts {
    pub left: bool,
    pub right: bool,
    pub top: bool,
}

impl WallContacts {
    pub fn any(&self) -> bool {
        self.left || self.right || self.top
    }
}

/// Keep a circle inside the left, right and top walls
///
/// Touching a wall clamps the position back inside and flips the matching
/// velocity component, scaled by `elasticity`.
pub fn resolve_walls(
    pos: &mut Vec2,
    vel: &mut Vec2,
    radius: f32,
    bounds: Vec2,
    elasticity: f32,
) -> WallContacts {
    let mut contacts = WallContacts::default();

    if pos.x - radius < 0.0 {
        pos.x = radius;
        vel.x = -vel.x * elasticity;
        contacts.left = true;
    }

    if pos.x + radius > bounds.x {
        pos.x = bounds.x - radius;
        vel.x = -vel.x * elasticity;
        contacts.right = true;
    }

    if pos.y - radius < 0.0 {
        pos.y = radius;
        vel.y = -vel.y * elasticity;
        contacts.top = true;
    }

    contacts
}
