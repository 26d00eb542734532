//! Data-driven movement balance
//!
//! Jump parameters are expressed the way a level designer thinks about them
//! (apex height and horizontal distance to the apex) and converted to
//! gravity and launch velocity with the closed-form projectile equations.

use serde::{Deserialize, Serialize};

/// Platformer jump/gravity tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerTuning {
    /// Desired apex height
    pub jump_height: f32,
    /// Horizontal distance covered while rising to the apex
    pub jump_length: f32,
    /// Horizontal speed (units per tick)
    pub speed: f32,
    /// Gravity multiplier while fast-falling
    pub fast_fall_multiplier: f32,
    /// Downward speed above which fast-fall kicks in
    pub fall_threshold: f32,
    /// Scale applied to velocity when integrating vertical position
    pub velocity_scale: f32,
}

impl Default for PlatformerTuning {
    fn default() -> Self {
        Self {
            jump_height: 5.0,
            jump_length: 6.0,
            speed: 2.0,
            fast_fall_multiplier: 5.0,
            fall_threshold: 0.5,
            velocity_scale: 1.0,
        }
    }
}

impl PlatformerTuning {
    /// Gravity that makes a jump peak at `jump_height` after `jump_length`
    #[inline]
    pub fn gravity(&self) -> f32 {
        2.0 * self.jump_height * self.speed * self.speed / (self.jump_length * self.jump_length)
    }

    /// Initial vertical velocity of a jump (negative = up)
    #[inline]
    pub fn jump_velocity(&self) -> f32 {
        -2.0 * self.jump_height * self.speed / self.jump_length
    }

    /// Ticks from take-off to apex
    #[inline]
    pub fn ticks_to_apex(&self) -> f32 {
        self.jump_length / self.speed
    }

    pub fn adjust_jump_height(&mut self, delta: f32) {
        self.jump_height = (self.jump_height + delta).max(1.0);
        log::info!(
            "Jump height {:.1} (gravity {:.3}, v0 {:.3})",
            self.jump_height,
            self.gravity(),
            self.jump_velocity()
        );
    }

    pub fn adjust_jump_length(&mut self, delta: f32) {
        self.jump_length = (self.jump_length + delta).max(1.0);
        log::info!(
            "Jump length {:.1} (gravity {:.3}, v0 {:.3})",
            self.jump_length,
            self.gravity(),
            self.jump_velocity()
        );
    }
}

/// Per-scene movement speeds and the platformer parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub platformer: PlatformerTuning,
    /// Player speed in the camera-follow scene (units per tick)
    pub camera_speed: f32,
    /// Player speed in the race (units per tick)
    pub race_speed: f32,
    /// Default parallax background layer speeds (front layer is always 1.0)
    pub parallax_speeds: [f32; 3],
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            platformer: PlatformerTuning::default(),
            camera_speed: 1.0,
            race_speed: 0.6,
            parallax_speeds: [1.2, 0.4, 0.1],
        }
    }
}
