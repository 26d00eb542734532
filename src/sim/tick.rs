//! Fixed timestep simulation tick
//!
//! Order within a tick: commands, intents and gravity, collision against the
//! grid and other bodies, camera, then level state.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::body::{Shape, step_platformer};
use super::collision::{circle_box_contact, resolve_box_box, resolve_circle_pairs};
use super::race::LevelEvent;
use super::rect::Rect;
use super::state::{SceneKind, SimEvent, SimulationContext};
use crate::consts::BOUNCE_RADIUS;

/// What one player wants this tick, independent of the input device
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Intent {
    /// Movement axes, each in [-1, 1] (+y is down)
    pub axis: Vec2,
    /// Jump was triggered this tick
    pub jump: bool,
}

/// Runtime tuning hotkeys
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    ToggleSeparation,
    ToggleBounce,
    ToggleFastFall,
    CycleFollowMode,
    AdjustJumpHeight(f32),
    AdjustJumpLength(f32),
    /// Change a background layer's scroll speed
    AdjustLayerSpeed { layer: usize, delta: f32 },
    /// Change the tile size by this many units
    Zoom(f32),
}

/// Pointer (mouse) state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pointer {
    pub pos: Vec2,
    pub pressed: bool,
}

/// Input for a single tick (deterministic)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TickInput {
    /// One intent per player, by player id
    pub intents: Vec<Intent>,
    pub commands: Vec<Command>,
    pub pointer: Option<Pointer>,
}

impl TickInput {
    fn intent(&self, player: usize) -> Intent {
        self.intents.get(player).copied().unwrap_or_default()
    }
}

/// Advance the simulation by one fixed timestep
pub fn tick(ctx: &mut SimulationContext, input: &TickInput) {
    ctx.events.clear();

    for command in &input.commands {
        apply_command(ctx, *command);
    }

    match ctx.scene {
        SceneKind::Bouncing => tick_bouncing(ctx, input.pointer),
        SceneKind::CameraFollow => tick_camera_follow(ctx, input),
        SceneKind::Platformer | SceneKind::Parallax => tick_platformer(ctx, input),
        SceneKind::Race => tick_race(ctx, input),
    }

    ctx.time_ticks += 1;
}

fn apply_command(ctx: &mut SimulationContext, command: Command) {
    match command {
        Command::ToggleSeparation => {
            ctx.toggles.separation = !ctx.toggles.separation;
            log::info!("Separation {}", on_off(ctx.toggles.separation));
        }
        Command::ToggleBounce => {
            ctx.toggles.bounce = !ctx.toggles.bounce;
            log::info!("Bounce {}", on_off(ctx.toggles.bounce));
        }
        Command::ToggleFastFall => {
            ctx.toggles.fast_fall = !ctx.toggles.fast_fall;
            log::info!("Fast fall {}", on_off(ctx.toggles.fast_fall));
        }
        Command::CycleFollowMode => {
            ctx.follow_mode = ctx.follow_mode.next();
            log::info!("Camera follows {:?}", ctx.follow_mode);
        }
        Command::AdjustJumpHeight(delta) => ctx.tuning.platformer.adjust_jump_height(delta),
        Command::AdjustJumpLength(delta) => ctx.tuning.platformer.adjust_jump_length(delta),
        Command::AdjustLayerSpeed { layer, delta } => match ctx.layers.get_mut(layer) {
            Some(layer) => layer.adjust_speed(delta),
            None => log::warn!("No background layer {}", layer),
        },
        Command::Zoom(_) if ctx.scene != SceneKind::CameraFollow => {
            log::debug!("Zoom ignored in the {:?} scene", ctx.scene);
        }
        Command::Zoom(delta) => {
            if let Some(tile_size) = ctx.grid.as_ref().map(|g| g.tile_size()) {
                ctx.set_tile_size(tile_size + delta);
            }
        }
    }
}

fn on_off(flag: bool) -> &'static str {
    if flag { "on" } else { "off" }
}

/// Drag, integrate, pairwise circle response, then the field edges
fn tick_bouncing(ctx: &mut SimulationContext, pointer: Option<Pointer>) {
    match pointer {
        Some(Pointer { pos, pressed: true }) => {
            if ctx.grabbed.is_none() {
                ctx.grabbed = ctx
                    .balls
                    .iter()
                    .position(|ball| ball.pos.distance(pos) < ball.radius());
            }
            if let Some(ball) = ctx.grabbed.and_then(|id| ctx.balls.get_mut(id)) {
                ball.pos = pos;
            }
        }
        _ => ctx.grabbed = None,
    }

    for (id, ball) in ctx.balls.iter_mut().enumerate() {
        if ctx.grabbed != Some(id) {
            ball.pos += ball.vel;
        }
    }

    let pairs = resolve_circle_pairs(
        &mut ctx.balls,
        BOUNCE_RADIUS,
        ctx.toggles.separation,
        ctx.toggles.bounce,
    );
    if !pairs.is_empty() {
        log::trace!("{} circle pair(s) touching", pairs.len());
        ctx.events.push(SimEvent::CirclesTouched(pairs.len()));
    }

    let field = ctx.field;
    for ball in &mut ctx.balls {
        ball.bounce_within(&field);
    }
}

/// Race limits: the world and the current view
fn movement_limits(ctx: &SimulationContext) -> [Rect; 2] {
    [ctx.world_rect(), ctx.camera.view_rect(ctx.viewport)]
}

/// Players roam the whole world; an untracked player may leave the view
fn tick_camera_follow(ctx: &mut SimulationContext, input: &TickInput) {
    let limits = [ctx.world_rect()];
    for player in &mut ctx.players {
        let intent = input.intent(player.id);
        player.body.apply_intent(intent.axis, player.speed);
        player.body.advance_bounded(&limits);
    }
    ctx.update_camera();
}

fn tick_platformer(ctx: &mut SimulationContext, input: &TickInput) {
    let Some(grid) = ctx.grid.as_ref() else {
        return;
    };
    let world = grid.world_rect();
    let tuning = ctx.tuning.platformer;
    let fast_fall = ctx.toggles.fast_fall;

    for player in &mut ctx.players {
        let intent = input.intent(player.id);
        player.speed = tuning.speed;
        player.body.apply_horizontal_intent(intent.axis.x, player.speed);
        if intent.jump && player.jump.try_jump(&mut player.body, &tuning) {
            log::debug!("Player {} jumps ({} left)", player.id + 1, player.jump.0);
        }
        step_platformer(&mut player.body, &tuning, 1.0, fast_fall, &[world]);
    }

    ctx.update_camera();

    let Some(grid) = ctx.grid.as_ref() else {
        return;
    };
    for player in &mut ctx.players {
        for solid in grid.solid_cells() {
            let Some(contact) = circle_box_contact(player.body.pos, player.body.radius(), &solid.rect)
            else {
                continue;
            };
            player.body.pos = contact.push_out(player.speed);
            if contact.landing {
                player.body.vel.y = 0.0;
                player.jump.refill();
                ctx.events.push(SimEvent::Landed(player.id));
            }
        }
    }
}

fn tick_race(ctx: &mut SimulationContext, input: &TickInput) {
    let pending = ctx.race.as_ref().is_some_and(|race| race.pending_transition());
    if pending {
        advance_race(ctx);
        return;
    }

    let limits = movement_limits(ctx);
    let mut reached = None;
    if let Some(grid) = ctx.grid.as_ref() {
        for player in &mut ctx.players {
            let intent = input.intent(player.id);
            player.body.apply_intent(intent.axis, player.speed);
            player.body.advance_bounded(&limits);

            for solid in grid.solid_cells() {
                let hit = match player.body.shape {
                    Shape::Box => {
                        let (rect, touched) = resolve_box_box(&player.body.rect(), &solid.rect);
                        if touched && !solid.is_target {
                            player.body.set_min(rect.min);
                        }
                        touched || player.body.rect().overlaps(&solid.rect)
                    }
                    Shape::Circle => {
                        match circle_box_contact(player.body.pos, player.body.radius(), &solid.rect)
                        {
                            Some(contact) => {
                                if !solid.is_target {
                                    player.body.pos = contact.push_out(player.speed);
                                }
                                true
                            }
                            None => false,
                        }
                    }
                };
                if hit && solid.is_target && reached.is_none() {
                    reached = Some(player.id);
                }
            }
        }
    }

    ctx.update_camera();

    if let Some(player) = reached {
        log::debug!("Player {} touched the target", player + 1);
        if let Some(race) = ctx.race.as_mut()
            && race.on_target_reached(player)
        {
            ctx.events.push(SimEvent::TargetReached(player));
        }
    }
}

fn advance_race(ctx: &mut SimulationContext) {
    let Some(event) = ctx.race.as_mut().map(|race| race.update()) else {
        return;
    };
    match event {
        LevelEvent::Idle => {}
        LevelEvent::LoadMap(index) => {
            ctx.load_map(index);
            ctx.events.push(SimEvent::Level(event));
        }
        LevelEvent::NewScoreShown | LevelEvent::WinnerDeclared(_) => {
            ctx.events.push(SimEvent::Level(event));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Settings;
    use crate::consts::SCORE_FLASH_TICKS;
    use crate::sim::camera::FollowMode;
    use crate::sim::grid::{Legend, TileGrid};

    const ARENA: &str = "\
##########
#........#
#........#
#........#
#......o.#
##########
";

    fn arena() -> TileGrid {
        TileGrid::parse(ARENA, Legend::Simple, 128.0).unwrap()
    }

    fn idle(ctx: &mut SimulationContext, ticks: u32) {
        for _ in 0..ticks {
            tick(ctx, &TickInput::default());
        }
    }

    #[test]
    fn test_commands_toggle_state() {
        let mut ctx = SimulationContext::bouncing(&Settings::default(), 1);
        let input = TickInput {
            commands: vec![
                Command::ToggleSeparation,
                Command::ToggleBounce,
                Command::CycleFollowMode,
                Command::AdjustJumpHeight(1.0),
            ],
            ..Default::default()
        };
        tick(&mut ctx, &input);
        assert!(!ctx.toggles.separation);
        assert!(!ctx.toggles.bounce);
        assert_eq!(ctx.follow_mode, FollowMode::Second);
        assert_eq!(ctx.tuning.platformer.jump_height, 6.0);
        assert_eq!(ctx.time_ticks, 1);
    }

    #[test]
    fn test_layer_speed_command() {
        let backgrounds = vec![arena(), arena(), arena()];
        let mut ctx = SimulationContext::parallax(&Settings::default(), arena(), backgrounds, 1);
        let input = TickInput {
            commands: vec![
                Command::AdjustLayerSpeed {
                    layer: 1,
                    delta: 0.1,
                },
                Command::AdjustLayerSpeed {
                    layer: 7,
                    delta: 0.1,
                },
            ],
            ..Default::default()
        };
        tick(&mut ctx, &input);
        assert!((ctx.layers[1].speed - 0.5).abs() < 1e-6);
        assert_eq!(ctx.layers[0].speed, 1.2);
    }

    #[test]
    fn test_bouncing_stays_in_field() {
        let mut ctx = SimulationContext::bouncing(&Settings::default(), 5);
        idle(&mut ctx, 2000);
        for ball in &ctx.balls {
            assert!(ctx.field.contains_rect(&ball.rect()));
            assert!((ball.vel.length() - crate::consts::BOUNCE_SPEED).abs() < 1e-3);
        }
    }

    #[test]
    fn test_drag_moves_grabbed_ball() {
        let mut ctx = SimulationContext::bouncing(&Settings::default(), 5);
        let start = ctx.balls[3].pos;
        let press = |pos| TickInput {
            pointer: Some(Pointer { pos, pressed: true }),
            ..Default::default()
        };

        tick(&mut ctx, &press(start));
        assert_eq!(ctx.grabbed, Some(3));
        tick(&mut ctx, &press(Vec2::new(400.0, 400.0)));
        assert_eq!(ctx.grabbed, Some(3));

        tick(&mut ctx, &TickInput::default());
        assert_eq!(ctx.grabbed, None);
    }

    #[test]
    fn test_camera_follow_moves_player_and_camera() {
        let mut ctx = SimulationContext::camera_follow(&Settings::default(), arena(), 1, 9);
        let start = ctx.players[0].body.pos;
        let input = TickInput {
            intents: vec![Intent {
                axis: Vec2::new(1.0, 0.0),
                jump: false,
            }],
            ..Default::default()
        };
        for _ in 0..10 {
            tick(&mut ctx, &input);
        }
        assert_eq!(ctx.players[0].body.pos, start + Vec2::new(10.0, 0.0));

        let world = ctx.world_rect().size;
        assert!(ctx.camera.offset.x <= (world.x - ctx.viewport.x).max(0.0));
    }

    #[test]
    fn test_untracked_player_leaves_the_view() {
        let open = ".".repeat(40) + "\n";
        let grid = TileGrid::parse(&open.repeat(12), Legend::Simple, 128.0).unwrap();
        let mut ctx = SimulationContext::camera_follow(&Settings::default(), grid, 2, 9);
        ctx.follow_mode = FollowMode::First;
        ctx.update_camera();
        let camera = ctx.camera.offset;

        let input = TickInput {
            intents: vec![
                Intent::default(),
                Intent {
                    axis: Vec2::new(1.0, 0.0),
                    jump: false,
                },
            ],
            ..Default::default()
        };
        for _ in 0..3000 {
            tick(&mut ctx, &input);
        }

        // camera stays on player one while player two walks off screen
        assert_eq!(ctx.camera.offset, camera);
        let view = ctx.camera.view_rect(ctx.viewport);
        let second = ctx.players[1].body.rect();
        assert!(second.right() > view.right());
        assert!(ctx.world_rect().contains_rect(&second));
    }

    #[test]
    fn test_zoom_only_in_camera_scene() {
        let maps = vec![arena(), arena()];
        let mut ctx = SimulationContext::race(&Settings::default(), maps, 4).unwrap();
        let input = TickInput {
            commands: vec![Command::Zoom(128.0)],
            ..Default::default()
        };
        tick(&mut ctx, &input);
        assert_eq!(ctx.grid.as_ref().unwrap().tile_size(), 128.0);
        assert_eq!(ctx.players[0].body.half, Vec2::splat(32.0));

        let mut ctx = SimulationContext::camera_follow(&Settings::default(), arena(), 1, 4);
        tick(&mut ctx, &input);
        assert_eq!(ctx.grid.as_ref().unwrap().tile_size(), 256.0);
        assert_eq!(ctx.players[0].body.half, Vec2::splat(64.0));
    }

    #[test]
    fn test_platformer_lands_on_floor() {
        let mut ctx = SimulationContext::platformer(&Settings::default(), arena(), 2);
        idle(&mut ctx, 600);

        let player = &ctx.players[0];
        let floor = 5.0 * 128.0;
        let bottom = player.body.pos.y + player.body.radius();
        // resting on the floor row, pushed clear by the small clearance
        assert!(bottom <= floor);
        assert!(floor - bottom < 10.0);
        assert_eq!(player.jump.0, 2);
    }

    #[test]
    fn test_platformer_jump_spends_charge() {
        let mut ctx = SimulationContext::platformer(&Settings::default(), arena(), 2);
        idle(&mut ctx, 600);
        let jump = TickInput {
            intents: vec![Intent {
                axis: Vec2::ZERO,
                jump: true,
            }],
            ..Default::default()
        };
        tick(&mut ctx, &jump);
        assert_eq!(ctx.players[0].jump.0, 1);
        assert!(ctx.players[0].body.vel.y < 0.0);
    }

    #[test]
    fn test_race_target_hit_starts_transition() {
        let maps = vec![arena(), arena(), arena()];
        let mut ctx = SimulationContext::race(&Settings::default(), maps, 4).unwrap();

        // drop player one right next to the target at (4, 7)
        let target = ctx.grid.as_ref().unwrap().target_cell().unwrap().rect;
        ctx.players[0].body.set_min(target.min - Vec2::new(64.5, 0.0));
        let input = TickInput {
            intents: vec![Intent {
                axis: Vec2::new(1.0, 0.0),
                jump: false,
            }],
            ..Default::default()
        };
        tick(&mut ctx, &input);
        assert_eq!(ctx.events, vec![SimEvent::TargetReached(0)]);

        let race = ctx.race.as_ref().unwrap();
        assert!(race.pending_transition());
        assert_eq!(race.scores()[0].active, 1);

        // frozen while scores are shown
        let frozen = ctx.players[0].body.pos;
        tick(&mut ctx, &input);
        assert_eq!(ctx.players[0].body.pos, frozen);

        // one update already ran on the frozen tick
        idle(&mut ctx, 2 * SCORE_FLASH_TICKS - 1);
        assert_eq!(ctx.events, vec![SimEvent::Level(LevelEvent::LoadMap(1))]);
        let race = ctx.race.as_ref().unwrap();
        assert!(!race.pending_transition());
        assert_eq!(race.map_index(), 1);
        assert_eq!(ctx.camera.offset, Vec2::ZERO);
    }

    #[test]
    fn test_race_box_stops_one_unit_short_of_wall() {
        let mut ctx = SimulationContext::race(&Settings::default(), vec![arena()], 4).unwrap();

        // row 2, just left of the right-hand wall column
        let wall = ctx.grid.as_ref().unwrap().cell_rect(2, 9);
        ctx.players[0]
            .body
            .set_min(Vec2::new(wall.left() - 64.5, wall.top() + 32.0));
        let input = TickInput {
            intents: vec![Intent {
                axis: Vec2::new(1.0, 0.0),
                jump: false,
            }],
            ..Default::default()
        };
        tick(&mut ctx, &input);

        let rect = ctx.players[0].body.rect();
        assert_eq!(rect.right(), wall.left() - 1.0);
        assert_eq!(rect.top(), wall.top() + 32.0);
        assert!(ctx.events.is_empty());
        assert!(!ctx.race.as_ref().unwrap().pending_transition());
    }

    #[test]
    fn test_race_circle_player_scores() {
        let maps = vec![arena(), arena()];
        let mut ctx = SimulationContext::race(&Settings::default(), maps, 4).unwrap();

        let target = ctx.grid.as_ref().unwrap().target_cell().unwrap().rect;
        ctx.players[0].body.set_min(Vec2::new(160.0, 160.0));
        ctx.players[1].body.pos = Vec2::new(target.left() - 32.5, target.center().y);
        let input = TickInput {
            intents: vec![
                Intent::default(),
                Intent {
                    axis: Vec2::new(1.0, 0.0),
                    jump: false,
                },
            ],
            ..Default::default()
        };
        tick(&mut ctx, &input);

        assert_eq!(ctx.events, vec![SimEvent::TargetReached(1)]);
        let race = ctx.race.as_ref().unwrap();
        assert!(race.pending_transition());
        assert_eq!(race.scores()[0].active, 0);
        assert_eq!(race.scores()[1].active, 1);
    }

    #[test]
    fn test_determinism() {
        // Two contexts with same seed should produce identical results
        let mut ctx1 = SimulationContext::bouncing(&Settings::default(), 99999);
        let mut ctx2 = SimulationContext::bouncing(&Settings::default(), 99999);

        let inputs = [
            TickInput::default(),
            TickInput {
                commands: vec![Command::ToggleBounce],
                ..Default::default()
            },
            TickInput {
                pointer: Some(Pointer {
                    pos: Vec2::new(400.0, 400.0),
                    pressed: true,
                }),
                ..Default::default()
            },
            TickInput::default(),
        ];

        for _ in 0..50 {
            for input in &inputs {
                tick(&mut ctx1, input);
                tick(&mut ctx2, input);
            }
        }

        assert_eq!(ctx1.time_ticks, ctx2.time_ticks);
        assert_eq!(ctx1.balls, ctx2.balls);
    }
}
