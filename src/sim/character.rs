//! Numby: the launched character and its kinematics
//!
//! Screen coordinates: x grows right, y grows down. Gravity is positive y.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::collision::{contact_normal, reflect_velocity, resolve_walls, WallContacts};
use crate::tuning::PhysicsTuning;

/// Elasticity never reaches a perfect (or gaining) bounce
pub const MAX_ELASTICITY: f32 = 0.99;
/// Friction never reaches "no drag at all"
pub const MAX_FRICTION: f32 = 0.999;

/// Which edge of the board Numby left through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoardExit {
    /// Fell out of the open bottom (counts against the day)
    Bottom,
    /// Escaped past the left or right wall (free retry)
    Side,
    /// Escaped over the top wall (free retry)
    Top,
}

/// Adjustment to Numby's physical constants from items and challenges
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CharacterTweak {
    /// Multiply elasticity and the extra peg-bounce boost
    Bouncier { factor: f32, bounce_boost: f32 },
    /// Multiply gravity
    Gravity(f32),
    /// Remove this fraction of the drag (1 - friction)
    LessDrag(f32),
    /// Multiply the collision radius
    Reach(f32),
}

/// The launched character
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Character {
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    pub gravity: f32,
    pub friction: f32,
    pub elasticity: f32,
    pub max_velocity: f32,
    /// Extra multiplier on peg bounces (items)
    pub bounce_boost: f32,
    launch_boost: f32,
    peg_bounce_boost: f32,
    upward_boost: f32,
    min_upward_speed: f32,
    /// Board width/height
    bounds: Vec2,
    active: bool,
}

impl Character {
    /// Fresh character resting at the launch point
    pub fn new(physics: &PhysicsTuning, bounds: Vec2) -> Self {
        let mut character = Self {
            pos: Vec2::ZERO,
            vel: Vec2::ZERO,
            radius: physics.radius,
            gravity: physics.gravity,
            friction: physics.friction,
            elasticity: physics.elasticity,
            max_velocity: physics.max_velocity,
            bounce_boost: 1.0,
            launch_boost: physics.launch_boost,
            peg_bounce_boost: physics.bounce_boost,
            upward_boost: physics.upward_boost,
            min_upward_speed: physics.min_upward_speed,
            bounds,
            active: false,
        };
        character.pos = character.start_position();
        character
    }

    /// Launch point: centered, just below the top wall
    pub fn start_position(&self) -> Vec2 {
        Vec2::new(self.bounds.x / 2.0, self.radius + crate::consts::START_OFFSET_Y)
    }

    pub fn set_position(&mut self, pos: Vec2) {
        self.pos = pos;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    pub fn bounds(&self) -> Vec2 {
        self.bounds
    }

    /// Start a flight with the given velocity
    pub fn launch(&mut self, vel: Vec2) {
        self.vel = vel * self.launch_boost;
        self.cap_velocity();
        self.active = true;
    }

    /// Advance one tick: gravity, drag, integrate, walls
    pub fn update(&mut self) -> WallContacts {
        if !self.active {
            return WallContacts::default();
        }

        self.vel.y += self.gravity;
        self.cap_velocity();

        self.vel *= self.friction;
        self.cap_velocity();

        self.pos += self.vel;

        let contacts = resolve_walls(
            &mut self.pos,
            &mut self.vel,
            self.radius,
            self.bounds,
            self.elasticity,
        );
        self.cap_velocity();
        contacts
    }

    /// Bounce off a peg centered at `peg_pos`
    pub fn bounce_off(&mut self, peg_pos: Vec2, peg_radius: f32) {
        let (normal, dist) = contact_normal(peg_pos, self.pos);

        let boost = self.elasticity * self.peg_bounce_boost * self.bounce_boost;
        self.vel = reflect_velocity(self.vel, normal) * boost;

        // A bounce that still heads down feels dead; turn it upward
        if self.vel.y > 0.0 {
            let upward = (self.vel.length() * self.upward_boost).max(self.min_upward_speed);
            self.vel.y = -upward;
        }

        self.cap_velocity();

        let min_dist = self.radius + peg_radius;
        if dist < min_dist {
            self.pos = peg_pos + normal * min_dist;
        }
    }

    /// Clamp each velocity component to ±max_velocity
    pub fn cap_velocity(&mut self) {
        let max = self.max_velocity;
        self.vel = self.vel.clamp(Vec2::splat(-max), Vec2::splat(max));
    }

    /// Accelerate toward a point (attractor items)
    pub fn nudge_toward(&mut self, target: Vec2, strength: f32) {
        let (dir, dist) = contact_normal(self.pos, target);
        if dist > crate::consts::NORMAL_EPSILON {
            self.vel += dir * strength;
            self.cap_velocity();
        }
    }

    pub fn apply_tweak(&mut self, tweak: CharacterTweak) {
        match tweak {
            CharacterTweak::Bouncier {
                factor,
                bounce_boost,
            } => {
                self.elasticity = (self.elasticity * factor).min(MAX_ELASTICITY);
                self.bounce_boost *= bounce_boost;
            }
            CharacterTweak::Gravity(factor) => self.gravity *= factor,
            CharacterTweak::LessDrag(fraction) => {
                let drag = (1.0 - self.friction) * (1.0 - fraction.clamp(0.0, 1.0));
                self.friction = (1.0 - drag).min(MAX_FRICTION);
            }
            CharacterTweak::Reach(factor) => self.radius *= factor,
        }
    }

    /// Completely outside the board in any direction
    pub fn has_exited_board(&self) -> bool {
        self.pos.x - self.radius > self.bounds.x
            || self.pos.x + self.radius < 0.0
            || self.pos.y - self.radius > self.bounds.y
            || self.pos.y + self.radius < 0.0
    }

    /// Fell through the open bottom
    pub fn has_exited_bottom(&self) -> bool {
        self.pos.y - self.radius > self.bounds.y
    }

    /// Classify an exit; bottom wins when several apply
    pub fn exit(&self) -> Option<BoardExit> {
        if !self.has_exited_board() {
            None
        } else if self.has_exited_bottom() {
            Some(BoardExit::Bottom)
        } else if self.pos.y + self.radius < 0.0 {
            Some(BoardExit::Top)
        } else {
            Some(BoardExit::Side)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn character() -> Character {
        Character::new(&PhysicsTuning::default(), Vec2::new(612.0, 720.0))
    }

    #[test]
    fn test_starts_inactive_at_launch_point() {
        let c = character();
        assert!(!c.is_active());
        assert_eq!(c.pos, Vec2::new(306.0, 45.0));
    }

    #[test]
    fn test_update_is_noop_while_inactive() {
        let mut c = character();
        let before = c.pos;
        c.update();
        assert_eq!(c.pos, before);
    }

    #[test]
    fn test_launch_boosts_and_caps() {
        let mut c = character();
        c.launch(Vec2::new(5.0, 40.0));
        assert!(c.is_active());
        assert!((c.vel.x - 6.0).abs() < 1e-5);
        assert_eq!(c.vel.y, 15.0);
    }

    #[test]
    fn test_gravity_pulls_down() {
        let mut c = character();
        c.launch(Vec2::ZERO);
        c.update();
        assert!(c.vel.y > 0.0);
        assert!(c.pos.y > 45.0);
    }

    #[test]
    fn test_straight_down_onto_peg_bounces_up() {
        let mut c = character();
        c.set_position(Vec2::new(300.0, 300.0));
        c.launch(Vec2::new(0.0, 8.0));
        c.bounce_off(Vec2::new(300.0, 340.0), 30.0);
        assert!(c.vel.y < 0.0);
        // Pushed outside the combined radii
        assert!(c.pos.distance(Vec2::new(300.0, 340.0)) >= 45.0 - 1e-3);
    }

    #[test]
    fn test_glancing_downward_bounce_gets_upward_correction() {
        let mut c = character();
        c.set_position(Vec2::new(340.0, 300.0));
        // Peg above and to the left: reflection keeps heading down
        c.launch(Vec2::new(0.0, 5.0));
        c.bounce_off(Vec2::new(300.0, 290.0), 30.0);
        assert!(c.vel.y < 0.0);
    }

    #[test]
    fn test_bounce_with_coincident_centers_does_not_nan() {
        let mut c = character();
        c.set_position(Vec2::new(300.0, 300.0));
        c.launch(Vec2::new(1.0, 1.0));
        c.bounce_off(Vec2::new(300.0, 300.0), 30.0);
        assert!(c.vel.is_finite());
        assert!(c.pos.is_finite());
        assert!(c.pos.y < 300.0);
    }

    #[test]
    fn test_exit_classification() {
        let mut c = character();
        c.set_position(Vec2::new(300.0, 740.0));
        assert_eq!(c.exit(), Some(BoardExit::Bottom));
        assert!(c.has_exited_bottom());

        c.set_position(Vec2::new(-20.0, 300.0));
        assert_eq!(c.exit(), Some(BoardExit::Side));
        assert!(!c.has_exited_bottom());

        c.set_position(Vec2::new(300.0, -20.0));
        assert_eq!(c.exit(), Some(BoardExit::Top));

        c.set_position(Vec2::new(300.0, 300.0));
        assert_eq!(c.exit(), None);
    }

    #[test]
    fn test_tweaks_respect_caps() {
        let mut c = character();
        c.apply_tweak(CharacterTweak::Bouncier {
            factor: 1.5,
            bounce_boost: 1.2,
        });
        assert_eq!(c.elasticity, MAX_ELASTICITY);
        assert!((c.bounce_boost - 1.2).abs() < 1e-6);

        c.apply_tweak(CharacterTweak::LessDrag(1.0));
        assert_eq!(c.friction, MAX_FRICTION);

        c.apply_tweak(CharacterTweak::Gravity(0.5));
        assert!((c.gravity - 0.1).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_velocity_never_exceeds_cap(
            vx in -1000.0f32..1000.0,
            vy in -1000.0f32..1000.0,
            px in 0.0f32..612.0,
            py in 0.0f32..720.0,
        ) {
            let mut c = character();
            c.set_position(Vec2::new(px, py));
            c.launch(Vec2::new(vx, vy));
            prop_assert!(c.vel.x.abs() <= c.max_velocity);
            prop_assert!(c.vel.y.abs() <= c.max_velocity);

            c.bounce_off(Vec2::new(306.0, 400.0), 30.0);
            prop_assert!(c.vel.x.abs() <= c.max_velocity);
            prop_assert!(c.vel.y.abs() <= c.max_velocity);

            for _ in 0..10 {
                c.update();
                prop_assert!(c.vel.x.abs() <= c.max_velocity);
                prop_assert!(c.vel.y.abs() <= c.max_velocity);
            }
        }
    }
}
