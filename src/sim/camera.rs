//! Camera follow and clamp
//!
//! The camera is recomputed every tick from the tracked players' centers; it
//! carries no state of its own beyond the last offset.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::grid::TileGrid;
use super::rect::Rect;
use crate::{centroid, heading_degrees};

/// Which player(s) the camera tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FollowMode {
    #[default]
    First,
    Second,
    /// Midpoint of both players
    Shared,
}

impl FollowMode {
    /// Next mode in the First -> Second -> Shared cycle
    pub fn next(self) -> Self {
        match self {
            FollowMode::First => FollowMode::Second,
            FollowMode::Second => FollowMode::Shared,
            FollowMode::Shared => FollowMode::First,
        }
    }

    /// Point to track. With a single player every mode tracks that player.
    pub fn tracked_center(self, centers: &[Vec2]) -> Vec2 {
        match (self, centers) {
            (_, []) => Vec2::ZERO,
            (_, [only]) => *only,
            (FollowMode::First, [first, ..]) => *first,
            (FollowMode::Second, [_, second, ..]) => *second,
            (FollowMode::Shared, all) => centroid(all),
        }
    }
}

/// Viewport offset into the world
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Camera {
    /// World position of the viewport's top-left corner
    pub offset: Vec2,
}

impl Camera {
    /// Center `tracked` in the viewport, clamped per axis to
    /// `[0, max(0, world - viewport)]`.
    pub fn follow(&mut self, tracked: Vec2, viewport: Vec2, world: Vec2) {
        let upper = (world - viewport).max(Vec2::ZERO);
        self.offset = (tracked - viewport * 0.5).clamp(Vec2::ZERO, upper);
    }

    /// Back to the world origin (level switch)
    pub fn reset(&mut self) {
        self.offset = Vec2::ZERO;
    }

    /// Visible world rectangle
    pub fn view_rect(&self, viewport: Vec2) -> Rect {
        Rect::from_min_size(self.offset, viewport)
    }
}

/// A background (or the gameplay) layer scrolled at its own rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParallaxLayer {
    pub grid: TileGrid,
    /// Horizontal scroll factor relative to the camera
    pub speed: f32,
}

impl ParallaxLayer {
    pub fn new(grid: TileGrid, speed: f32) -> Self {
        Self { grid, speed }
    }

    /// Horizontal scroll is scaled; vertical follows the camera 1:1
    pub fn draw_offset(&self, camera: &Camera) -> Vec2 {
        Vec2::new(camera.offset.x * self.speed, camera.offset.y)
    }

    pub fn adjust_speed(&mut self, delta: f32) {
        self.speed = (self.speed + delta).max(0.0);
        log::info!("Parallax layer speed {:.1}", self.speed);
    }
}

/// Heading in degrees from `from` to the target when the target rectangle is
/// completely off screen, `None` while any part of it is visible.
pub fn target_indicator(target: &Rect, view: &Rect, from: Vec2) -> Option<f32> {
    if target.overlaps(view) {
        return None;
    }
    Some(heading_degrees(target.center() - from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::grid::Legend;
    use proptest::prelude::*;

    const VIEWPORT: Vec2 = Vec2::new(1280.0, 720.0);

    #[test]
    fn test_follow_centers_player() {
        let mut camera = Camera::default();
        camera.follow(Vec2::new(1000.0, 800.0), VIEWPORT, Vec2::new(3000.0, 2000.0));
        assert_eq!(camera.offset, Vec2::new(360.0, 440.0));
    }

    #[test]
    fn test_follow_clamps_at_edges() {
        let world = Vec2::new(3000.0, 2000.0);
        let mut camera = Camera::default();
        camera.follow(Vec2::new(10.0, 10.0), VIEWPORT, world);
        assert_eq!(camera.offset, Vec2::ZERO);
        camera.follow(Vec2::new(2990.0, 1990.0), VIEWPORT, world);
        assert_eq!(camera.offset, Vec2::new(1720.0, 1280.0));
    }

    #[test]
    fn test_world_smaller_than_viewport_pins_to_origin() {
        let mut camera = Camera::default();
        camera.follow(Vec2::new(600.0, 300.0), VIEWPORT, Vec2::new(640.0, 320.0));
        assert_eq!(camera.offset, Vec2::ZERO);
    }

    #[test]
    fn test_follow_mode_cycle() {
        let mode = FollowMode::First;
        assert_eq!(mode.next(), FollowMode::Second);
        assert_eq!(mode.next().next(), FollowMode::Shared);
        assert_eq!(mode.next().next().next(), FollowMode::First);
    }

    #[test]
    fn test_tracked_center() {
        let a = Vec2::new(0.0, 0.0);
        let b = Vec2::new(100.0, 50.0);
        assert_eq!(FollowMode::First.tracked_center(&[a, b]), a);
        assert_eq!(FollowMode::Second.tracked_center(&[a, b]), b);
        assert_eq!(FollowMode::Shared.tracked_center(&[a, b]), Vec2::new(50.0, 25.0));
        assert_eq!(FollowMode::Second.tracked_center(&[b]), b);
    }

    #[test]
    fn test_parallax_offset() {
        let grid = TileGrid::parse("#\n", Legend::Parallax, 10.0).unwrap();
        let mut layer = ParallaxLayer::new(grid, 0.4);
        let camera = Camera {
            offset: Vec2::new(100.0, 30.0),
        };
        assert_eq!(layer.draw_offset(&camera), Vec2::new(40.0, 30.0));
        layer.adjust_speed(-1.0);
        assert_eq!(layer.speed, 0.0);
    }

    #[test]
    fn test_target_indicator() {
        let view = Rect::new(0.0, 0.0, 100.0, 100.0);
        let visible = Rect::new(90.0, 40.0, 20.0, 20.0);
        assert_eq!(target_indicator(&visible, &view, Vec2::new(50.0, 50.0)), None);

        let right = Rect::new(200.0, 40.0, 20.0, 20.0);
        let angle = target_indicator(&right, &view, Vec2::new(50.0, 50.0)).unwrap();
        assert!(angle.abs() < 1e-4);

        let below = Rect::new(40.0, 300.0, 20.0, 20.0);
        let angle = target_indicator(&below, &view, Vec2::new(50.0, 50.0)).unwrap();
        assert!((angle - 90.0).abs() < 1e-4);
    }

    proptest! {
        #[test]
        fn prop_offset_within_clamp_bounds(
            x in -5000.0f32..5000.0,
            y in -5000.0f32..5000.0,
            world_w in 100.0f32..4000.0,
            world_h in 100.0f32..4000.0,
        ) {
            let world = Vec2::new(world_w, world_h);
            let mut camera = Camera::default();
            camera.follow(Vec2::new(x, y), VIEWPORT, world);
            prop_assert!(camera.offset.x >= 0.0);
            prop_assert!(camera.offset.y >= 0.0);
            prop_assert!(camera.offset.x <= (world_w - VIEWPORT.x).max(0.0));
            prop_assert!(camera.offset.y <= (world_h - VIEWPORT.y).max(0.0));
        }
    }
}
