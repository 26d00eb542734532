//! Deterministic simulation module
//!
//! All scene logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by player/ball id, grid cells row-major)
//! - No rendering or platform dependencies

pub mod body;
pub mod camera;
pub mod clock;
pub mod collision;
pub mod grid;
pub mod race;
pub mod rect;
pub mod state;
pub mod tick;

pub use body::{Body, JumpCharges, Shape, step_platformer};
pub use camera::{Camera, FollowMode, ParallaxLayer, target_indicator};
pub use clock::SimulationClock;
pub use collision::{
    BoxSide, CircleBoxContact, circle_box_contact, circles_overlap, reflect_velocity,
    resolve_box_box, resolve_circle_pairs, separate_circles,
};
pub use grid::{Cell, GridError, Legend, SolidCell, Sprite, TileGrid, TileShape};
pub use race::{LevelEvent, LevelStateMachine, RacePhase, Score};
pub use rect::Rect;
pub use state::{Player, SceneKind, SimEvent, SimulationContext, Toggles};
pub use tick::{Command, Intent, Pointer, TickInput, tick};
