//! Moving bodies and their per-tick kinematics
//!
//! Positions are body centers. Directly controlled axes get their velocity
//! set outright from the intent (no acceleration); the platformer's vertical
//! axis integrates gravity instead.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::rect::Rect;
use crate::consts::JUMP_CHARGES;
use crate::tuning::PlatformerTuning;

/// Collision shape of a body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Shape {
    Circle,
    Box,
}

/// A moving agent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Center position
    pub pos: Vec2,
    pub vel: Vec2,
    /// Half width / half height (radius for circles)
    pub half: Vec2,
    pub shape: Shape,
}

impl Body {
    pub fn circle(center: Vec2, radius: f32) -> Self {
        Self {
            pos: center,
            vel: Vec2::ZERO,
            half: Vec2::splat(radius),
            shape: Shape::Circle,
        }
    }

    pub fn boxed(center: Vec2, half: Vec2) -> Self {
        Self {
            pos: center,
            vel: Vec2::ZERO,
            half,
            shape: Shape::Box,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.half.x
    }

    /// Bounding rectangle
    pub fn rect(&self) -> Rect {
        Rect::from_center_half(self.pos, self.half)
    }

    /// Move so the bounding rectangle's top-left corner lands on `min`
    pub fn set_min(&mut self, min: Vec2) {
        self.pos = min + self.half;
    }

    /// Instant velocity set from a movement axis in [-1, 1]
    pub fn apply_intent(&mut self, axis: Vec2, max_speed: f32) {
        self.vel = axis * max_speed;
    }

    /// Only the horizontal axis is player-controlled (platformer)
    pub fn apply_horizontal_intent(&mut self, axis_x: f32, max_speed: f32) {
        self.vel.x = axis_x * max_speed;
    }

    /// Bounding rectangle fits inside every limit
    pub fn fits(&self, limits: &[Rect]) -> bool {
        let rect = self.rect();
        limits.iter().all(|limit| limit.contains_rect(&rect))
    }

    /// The limits the body is currently inside. A limit it already sticks
    /// out of cannot be left, so it is not enforced.
    pub fn enclosing(&self, limits: &[Rect]) -> Vec<Rect> {
        let rect = self.rect();
        limits
            .iter()
            .copied()
            .filter(|limit| limit.contains_rect(&rect))
            .collect()
    }

    /// Move by one tick of velocity, one axis at a time. An axis whose step
    /// would leave an enclosing limit is reverted; velocity is left untouched
    /// so the body resumes as soon as the limit moves.
    pub fn advance_bounded(&mut self, limits: &[Rect]) {
        let limits = self.enclosing(limits);
        self.pos.x += self.vel.x;
        if !self.fits(&limits) {
            self.pos.x -= self.vel.x;
        }
        self.pos.y += self.vel.y;
        if !self.fits(&limits) {
            self.pos.y -= self.vel.y;
        }
    }

    /// Reflect off the inside of `field`, clamping back inside
    pub fn bounce_within(&mut self, field: &Rect) {
        let lo = field.min + self.half;
        let hi = field.max() - self.half;
        if self.pos.x < lo.x {
            self.pos.x = lo.x;
            self.vel.x = -self.vel.x;
        }
        if self.pos.x > hi.x {
            self.pos.x = hi.x;
            self.vel.x = -self.vel.x;
        }
        if self.pos.y < lo.y {
            self.pos.y = lo.y;
            self.vel.y = -self.vel.y;
        }
        if self.pos.y > hi.y {
            self.pos.y = hi.y;
            self.vel.y = -self.vel.y;
        }
    }
}

/// Consumable mid-air jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JumpCharges(pub u8);

impl Default for JumpCharges {
    fn default() -> Self {
        Self(JUMP_CHARGES)
    }
}

impl JumpCharges {
    /// Spend a charge and launch upward; false when none are left
    pub fn try_jump(&mut self, body: &mut Body, tuning: &PlatformerTuning) -> bool {
        if self.0 == 0 {
            return false;
        }
        body.vel.y = tuning.jump_velocity();
        self.0 -= 1;
        true
    }

    pub fn refill(&mut self) {
        self.0 = JUMP_CHARGES;
    }
}

/// One platformer tick.
///
/// Horizontal: one tick of velocity, reverted on leaving a limit.
/// Vertical: position moves with the velocity from *before* this tick's
/// gravity; a blocked vertical step also zeroes vertical velocity. Gravity
/// (multiplied while fast-falling) is applied last.
pub fn step_platformer(
    body: &mut Body,
    tuning: &PlatformerTuning,
    dt: f32,
    fast_fall: bool,
    limits: &[Rect],
) {
    let limits = body.enclosing(limits);
    body.pos.x += body.vel.x;
    if !body.fits(&limits) {
        body.pos.x -= body.vel.x;
    }

    let gravity = tuning.gravity();
    let dy = body.vel.y * dt * tuning.velocity_scale + 0.5 * gravity * dt * dt;
    body.pos.y += dy;
    if !body.fits(&limits) {
        body.pos.y -= dy;
        body.vel.y = 0.0;
    }

    let falling = body.vel.y > tuning.fall_threshold;
    if fast_fall && falling {
        body.vel.y += tuning.fast_fall_multiplier * gravity * dt;
    } else {
        body.vel.y += gravity * dt;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_world() -> Vec<Rect> {
        vec![Rect::new(-10_000.0, -10_000.0, 20_000.0, 20_000.0)]
    }

    #[test]
    fn test_intent_sets_velocity_instantly() {
        let mut body = Body::boxed(Vec2::new(50.0, 50.0), Vec2::splat(5.0));
        body.apply_intent(Vec2::new(1.0, -1.0), 0.6);
        assert_eq!(body.vel, Vec2::new(0.6, -0.6));
        body.apply_intent(Vec2::ZERO, 0.6);
        assert_eq!(body.vel, Vec2::ZERO);
    }

    #[test]
    fn test_boundary_reverts_axis_keeps_velocity() {
        let limit = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut body = Body::boxed(Vec2::new(94.5, 50.0), Vec2::splat(5.0));
        body.vel = Vec2::new(1.0, 1.0);
        body.advance_bounded(&[limit]);
        // x blocked at the right edge, y still moves
        assert_eq!(body.pos, Vec2::new(94.5, 51.0));
        assert_eq!(body.vel, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_limit_already_left_is_not_enforced() {
        let view = Rect::new(0.0, 0.0, 100.0, 100.0);
        // straddles the bottom edge of the view
        let mut body = Body::boxed(Vec2::new(50.0, 98.0), Vec2::splat(5.0));
        body.vel = Vec2::new(1.0, -1.0);
        body.advance_bounded(&[view]);
        assert_eq!(body.pos, Vec2::new(51.0, 97.0));
    }

    #[test]
    fn test_bounce_within_field() {
        let field = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut body = Body::circle(Vec2::new(5.0, 50.0), 10.0);
        body.vel = Vec2::new(-1.0, 0.5);
        body.bounce_within(&field);
        assert_eq!(body.pos.x, 10.0);
        assert_eq!(body.vel, Vec2::new(1.0, 0.5));
    }

    #[test]
    fn test_jump_consumes_charges() {
        let tuning = PlatformerTuning::default();
        let mut body = Body::circle(Vec2::ZERO, 4.0);
        let mut charges = JumpCharges::default();
        assert!(charges.try_jump(&mut body, &tuning));
        assert!(charges.try_jump(&mut body, &tuning));
        assert!(!charges.try_jump(&mut body, &tuning));
        assert!((body.vel.y - (-10.0 / 3.0)).abs() < 1e-5);
        charges.refill();
        assert_eq!(charges, JumpCharges(2));
    }

    #[test]
    fn test_jump_arc_apex_and_landing() {
        // jump_height=5, jump_length=6, speed=2: v0 = -10/3, g = 10/9
        let tuning = PlatformerTuning::default();
        let limits = open_world();
        let start = Vec2::new(0.0, 500.0);
        let mut body = Body::circle(start, 4.0);
        let mut charges = JumpCharges::default();
        body.apply_horizontal_intent(1.0, tuning.speed);
        assert!(charges.try_jump(&mut body, &tuning));

        let apex_ticks = tuning.ticks_to_apex() as usize;
        for _ in 0..apex_ticks {
            step_platformer(&mut body, &tuning, 1.0, false, &limits);
        }
        // rose by exactly the jump height after jump_length of travel
        assert!((body.pos.y - (start.y - tuning.jump_height)).abs() < 1e-3);
        assert!((body.pos.x - tuning.jump_length).abs() < 1e-4);

        for _ in 0..apex_ticks {
            step_platformer(&mut body, &tuning, 1.0, false, &limits);
        }
        // symmetric descent back to take-off height
        assert!((body.pos.y - start.y).abs() < 1e-3);
        assert!((body.pos.x - 2.0 * tuning.jump_length).abs() < 1e-4);
    }

    #[test]
    fn test_fast_fall_only_when_falling() {
        let tuning = PlatformerTuning::default();
        let limits = open_world();
        let g = tuning.gravity();

        let mut rising = Body::circle(Vec2::ZERO, 1.0);
        rising.vel.y = -1.0;
        step_platformer(&mut rising, &tuning, 1.0, true, &limits);
        assert!((rising.vel.y - (-1.0 + g)).abs() < 1e-5);

        let mut falling = Body::circle(Vec2::ZERO, 1.0);
        falling.vel.y = 1.0;
        step_platformer(&mut falling, &tuning, 1.0, true, &limits);
        assert!((falling.vel.y - (1.0 + 5.0 * g)).abs() < 1e-5);
    }

    #[test]
    fn test_vertical_block_zeroes_velocity() {
        let tuning = PlatformerTuning::default();
        let limit = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut body = Body::circle(Vec2::new(50.0, 95.0), 4.0);
        body.vel.y = 3.0;
        step_platformer(&mut body, &tuning, 1.0, false, &[limit]);
        assert_eq!(body.pos.y, 95.0);
        // zeroed, then gravity applied once
        assert!((body.vel.y - tuning.gravity()).abs() < 1e-6);
    }
}
