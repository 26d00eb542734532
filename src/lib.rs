//! Playfield - fixed-timestep 2D simulation playground
//!
//! Core modules:
//! - `sim`: Deterministic simulation (clock, bodies, collisions, camera, race state)
//! - `platform`: Input abstraction (keyboard/gamepad/scripted intent sources)
//! - `settings`: Runtime configuration loaded from JSON
//! - `tuning`: Data-driven movement and jump balance

pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use settings::{Settings, SettingsError};
pub use tuning::{PlatformerTuning, Tuning};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f64 = 1.0 / 60.0;
    /// Maximum catch-up ticks per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// Default viewport (window) size in pixels
    pub const VIEWPORT_WIDTH: f32 = 1280.0;
    pub const VIEWPORT_HEIGHT: f32 = 720.0;
    /// Tiles visible across the viewport; tile size = viewport width / this
    pub const TILES_ACROSS: u32 = 10;
    /// Player diameter/side as a fraction of tile size
    pub const PLAYER_SIZE_FACTOR: f32 = 0.5;

    /// Jump charges restored on landing (double jump)
    pub const JUMP_CHARGES: u8 = 2;

    /// Circle-bounce field
    pub const BOUNCE_FIELD_SIZE: f32 = 800.0;
    pub const BOUNCE_RADIUS: f32 = 20.0;
    pub const BOUNCE_SPEED: f32 = 0.2;
    pub const BOUNCE_ROWS: usize = 5;
    pub const BOUNCE_COLS: usize = 7;

    /// Below this, two circle centers count as coincident
    pub const COINCIDENT_EPSILON: f32 = 1e-4;

    /// Race transition pauses (ticks at 60 Hz)
    pub const SCORE_FLASH_TICKS: u32 = 60;
    pub const WINNER_BANNER_TICKS: u32 = 5 * 60;
    /// Number of maps in the race rotation
    pub const RACE_MAP_COUNT: usize = 3;
}

/// Midpoint of a set of points (zero for an empty set)
#[inline]
pub fn centroid(points: &[Vec2]) -> Vec2 {
    if points.is_empty() {
        return Vec2::ZERO;
    }
    points.iter().copied().sum::<Vec2>() / points.len() as f32
}

/// Angle in degrees of a direction vector, measured like `atan2(y, x)`
#[inline]
pub fn heading_degrees(dir: Vec2) -> f32 {
    dir.y.atan2(dir.x).to_degrees()
}
