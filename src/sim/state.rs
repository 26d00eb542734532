//! Simulation context and scene construction
//!
//! Everything a tick reads or writes lives in `SimulationContext`; there is
//! no ambient state. Each demo scene has its own constructor.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::body::{Body, JumpCharges};
use super::camera::{Camera, FollowMode, ParallaxLayer};
use super::grid::{GridError, TileGrid};
use super::race::{LevelEvent, LevelStateMachine, pick_spawn_cell, spawn_corner};
use super::rect::Rect;
use crate::consts::*;
use crate::settings::Settings;
use crate::tuning::Tuning;

/// Which demo is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SceneKind {
    /// Free circles on a field, pairwise separation and bounce
    Bouncing,
    /// One or two players on a tile map, camera follow modes and zoom
    CameraFollow,
    /// Gravity and jumping against solid tiles
    Platformer,
    /// Platformer with scrolling background layers
    Parallax,
    /// Two players racing to the target across a map rotation
    Race,
}

/// Runtime toggles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Toggles {
    pub separation: bool,
    pub bounce: bool,
    pub fast_fall: bool,
}

/// A controlled agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: usize,
    pub body: Body,
    pub jump: JumpCharges,
    /// Max speed per tick
    pub speed: f32,
}

impl Player {
    pub fn new(id: usize, body: Body, speed: f32) -> Self {
        Self {
            id,
            body,
            jump: JumpCharges::default(),
            speed,
        }
    }
}

/// Something that happened during a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimEvent {
    /// Overlapping circle pairs found this tick
    CirclesTouched(usize),
    /// Player came down on a top (or bottom) face
    Landed(usize),
    TargetReached(usize),
    Level(LevelEvent),
}

/// Complete simulation state
#[derive(Debug, Clone)]
pub struct SimulationContext {
    pub scene: SceneKind,
    /// Seed for reproducibility
    pub seed: u64,
    pub rng: Pcg32,
    pub viewport: Vec2,
    /// Gameplay grid (absent on the open field)
    pub grid: Option<TileGrid>,
    /// Race rotation, indexed by map
    pub maps: Vec<TileGrid>,
    /// Background layers, front to back
    pub layers: Vec<ParallaxLayer>,
    /// World bounds when there is no grid
    pub field: Rect,
    pub camera: Camera,
    pub follow_mode: FollowMode,
    pub toggles: Toggles,
    pub tuning: Tuning,
    pub players: Vec<Player>,
    /// Free circles (bouncing scene), in id order
    pub balls: Vec<Body>,
    /// Ball currently held by the pointer
    pub grabbed: Option<usize>,
    pub race: Option<LevelStateMachine>,
    /// Simulation tick counter
    pub time_ticks: u64,
    /// Events from the last tick
    pub events: Vec<SimEvent>,
}

impl SimulationContext {
    fn empty(scene: SceneKind, settings: &Settings, seed: u64) -> Self {
        Self {
            scene,
            seed,
            rng: Pcg32::seed_from_u64(seed),
            viewport: settings.viewport(),
            grid: None,
            maps: Vec::new(),
            layers: Vec::new(),
            field: Rect::from_min_size(Vec2::ZERO, settings.viewport()),
            camera: Camera::default(),
            follow_mode: settings.follow_mode,
            toggles: Toggles {
                separation: settings.separation,
                bounce: settings.bounce,
                fast_fall: settings.fast_fall,
            },
            tuning: settings.tuning,
            players: Vec::new(),
            balls: Vec::new(),
            grabbed: None,
            race: None,
            time_ticks: 0,
            events: Vec::new(),
        }
    }

    /// 5x7 circles on an 800x800 field, each heading off in a random direction
    pub fn bouncing(settings: &Settings, seed: u64) -> Self {
        let mut ctx = Self::empty(SceneKind::Bouncing, settings, seed);
        ctx.field = Rect::new(0.0, 0.0, BOUNCE_FIELD_SIZE, BOUNCE_FIELD_SIZE);

        let cell = Vec2::new(
            BOUNCE_FIELD_SIZE / BOUNCE_COLS as f32,
            BOUNCE_FIELD_SIZE / BOUNCE_ROWS as f32,
        );
        for row in 0..BOUNCE_ROWS {
            for col in 0..BOUNCE_COLS {
                let center = Vec2::new(col as f32 + 0.5, row as f32 + 0.5) * cell;
                let angle = ctx.rng.random_range(0.0..TAU);
                let mut ball = Body::circle(center, BOUNCE_RADIUS);
                ball.vel = Vec2::from_angle(angle) * BOUNCE_SPEED;
                ctx.balls.push(ball);
            }
        }

        log::info!("Bouncing scene: {} circles (seed {})", ctx.balls.len(), seed);
        ctx
    }

    /// Box players walking a tile map; `player_count` is 1 or 2
    pub fn camera_follow(
        settings: &Settings,
        grid: TileGrid,
        player_count: usize,
        seed: u64,
    ) -> Self {
        let mut ctx = Self::empty(SceneKind::CameraFollow, settings, seed);
        let half = Vec2::splat(grid.tile_size() * PLAYER_SIZE_FACTOR * 0.5);
        let speed = ctx.tuning.camera_speed;
        ctx.players = (0..player_count.clamp(1, 2))
            .map(|id| Player::new(id, Body::boxed(Vec2::ZERO, half), speed))
            .collect();
        ctx.grid = Some(grid);
        ctx.respawn_players();

        log::info!(
            "Camera scene: {} player(s), follow {:?}",
            ctx.players.len(),
            ctx.follow_mode
        );
        ctx
    }

    /// Single circular player under gravity
    pub fn platformer(settings: &Settings, grid: TileGrid, seed: u64) -> Self {
        let mut ctx = Self::empty(SceneKind::Platformer, settings, seed);
        ctx.follow_mode = FollowMode::First;
        let radius = grid.tile_size() * PLAYER_SIZE_FACTOR * 0.5;
        let speed = ctx.tuning.platformer.speed;
        ctx.players = vec![Player::new(0, Body::circle(Vec2::ZERO, radius), speed)];
        ctx.grid = Some(grid);
        ctx.respawn_players();

        log::info!(
            "Platformer scene: jump height {} length {}",
            ctx.tuning.platformer.jump_height,
            ctx.tuning.platformer.jump_length
        );
        ctx
    }

    /// Platformer on `front` with background layers behind it
    pub fn parallax(
        settings: &Settings,
        front: TileGrid,
        backgrounds: Vec<TileGrid>,
        seed: u64,
    ) -> Self {
        let mut ctx = Self::platformer(settings, front, seed);
        ctx.scene = SceneKind::Parallax;
        let speeds = ctx.tuning.parallax_speeds;
        ctx.layers = backgrounds
            .into_iter()
            .enumerate()
            .map(|(i, grid)| {
                let speed = speeds.get(i).or(speeds.last()).copied().unwrap_or(1.0);
                ParallaxLayer::new(grid, speed)
            })
            .collect();

        log::info!("Parallax scene: {} background layer(s)", ctx.layers.len());
        ctx
    }

    /// Two-player race over a map rotation. Player one is a box, player two
    /// a circle.
    pub fn race(settings: &Settings, maps: Vec<TileGrid>, seed: u64) -> Result<Self, GridError> {
        let first = maps.first().cloned().ok_or(GridError::Empty)?;
        let mut ctx = Self::empty(SceneKind::Race, settings, seed);
        ctx.follow_mode = FollowMode::Shared;

        let half = first.tile_size() * PLAYER_SIZE_FACTOR * 0.5;
        let speed = ctx.tuning.race_speed;
        ctx.players = vec![
            Player::new(0, Body::boxed(Vec2::ZERO, Vec2::splat(half)), speed),
            Player::new(1, Body::circle(Vec2::ZERO, half), speed),
        ];
        ctx.race = Some(LevelStateMachine::new(ctx.players.len(), maps.len()));
        ctx.maps = maps;
        ctx.grid = Some(first);
        ctx.respawn_players();

        log::info!("Race scene: {} maps (seed {})", ctx.maps.len(), seed);
        Ok(ctx)
    }

    /// World bounds: the grid's extent, or the open field
    pub fn world_rect(&self) -> Rect {
        self.grid.as_ref().map_or(self.field, TileGrid::world_rect)
    }

    /// Centers of all players, in id order
    pub fn player_centers(&self) -> Vec<Vec2> {
        self.players.iter().map(|p| p.body.pos).collect()
    }

    /// Point the camera is currently tracking
    pub fn tracked_center(&self) -> Vec2 {
        self.follow_mode.tracked_center(&self.player_centers())
    }

    /// Recompute the camera offset from the players
    pub fn update_camera(&mut self) {
        let tracked = self.tracked_center();
        let world = self.world_rect().size;
        self.camera.follow(tracked, self.viewport, world);
    }

    /// Place every player on a free cell of the current grid, one cell each,
    /// sized relative to that grid's tiles
    pub fn respawn_players(&mut self) {
        let Some(grid) = self.grid.as_ref() else {
            return;
        };

        let half = Vec2::splat(grid.tile_size() * PLAYER_SIZE_FACTOR * 0.5);
        let mut available = grid.availability();
        for player in &mut self.players {
            player.body.half = half;
            let corner = match pick_spawn_cell(&mut available, &mut self.rng) {
                Some((row, col)) => spawn_corner(grid, row, col),
                None => {
                    log::warn!("No free cell for player {}, spawning at origin", player.id + 1);
                    Vec2::ZERO
                }
            };
            player.body.set_min(corner);
            player.body.vel = Vec2::ZERO;
            player.jump.refill();
        }
    }

    /// Switch to map `index` of the rotation: new grid, fresh spawns, camera
    /// back at the origin
    pub fn load_map(&mut self, index: usize) {
        let Some(grid) = self.maps.get(index).cloned() else {
            log::warn!("Map {} not loaded, keeping the current one", index);
            return;
        };
        log::info!("Loading map {} ({}x{})", index, grid.width(), grid.height());
        self.grid = Some(grid);
        self.respawn_players();
        self.camera.reset();
    }

    /// Change the gameplay tile size (zoom), keeping players on the same
    /// relative spot and at the same size relative to a tile
    pub fn set_tile_size(&mut self, tile_size: f32) {
        let viewport = self.viewport;
        let Some(grid) = self.grid.as_mut() else {
            return;
        };

        let old = grid.tile_size();
        grid.set_tile_size(tile_size, viewport);
        let new = grid.tile_size();
        if new == old {
            return;
        }

        let ratio = new / old;
        for player in &mut self.players {
            player.body.pos *= ratio;
            player.body.half *= ratio;
        }
        log::info!("Tile size {} -> {}", old, new);
    }
}
