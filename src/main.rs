//! Playfield - headless scene runner
//!
//! Builds one demo scene, drives it with scripted input through the fixed
//! timestep clock and logs what happens. Rendering is left to a frontend.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use glam::Vec2;
use log::{LevelFilter, info};
use thiserror::Error;

use playfield::consts::SIM_DT;
use playfield::platform::{InputSource, ScriptStep, ScriptedSource};
use playfield::sim::{
    GridError, Legend, SceneKind, SimEvent, SimulationClock, SimulationContext, TickInput,
    TileGrid, target_indicator, tick,
};
use playfield::{Settings, SettingsError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Scene {
    Bouncing,
    Camera,
    Platformer,
    Parallax,
    Race,
}

// --- Command Line Arguments ---
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Demo scene to run
    #[arg(long, value_enum, default_value_t = Scene::Bouncing)]
    scene: Scene,

    /// Map file(s). Parallax takes the gameplay map first, then background
    /// layers; race takes its whole rotation.
    #[arg(long, num_args = 1..)]
    maps: Vec<PathBuf>,

    /// Players in the camera scene (1 or 2)
    #[arg(long, default_value_t = 2)]
    players: usize,

    /// Frames to run
    #[arg(long, default_value_t = 600)]
    frames: u32,

    /// Simulated frame rate (need not match the tick rate)
    #[arg(long, default_value_t = 60.0)]
    fps: f64,

    /// RNG seed
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Settings JSON file
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[derive(Error, Debug)]
enum RunError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Map(#[from] GridError),
    #[error("{scene:?} needs at least {needed} map(s), got {got}")]
    MissingMaps {
        scene: Scene,
        needed: usize,
        got: usize,
    },
}

fn default_maps(scene: Scene) -> Vec<PathBuf> {
    let names: &[&str] = match scene {
        Scene::Bouncing => &[],
        Scene::Camera => &["tiles.txt"],
        Scene::Platformer => &["platformer.txt"],
        Scene::Parallax => &[
            "parallax_front.txt",
            "parallax_near.txt",
            "parallax_mid.txt",
            "parallax_far.txt",
        ],
        Scene::Race => &["race_1.txt", "race_2.txt", "race_3.txt"],
    };
    names
        .iter()
        .map(|name| PathBuf::from("assets/maps").join(name))
        .collect()
}

fn load_maps(
    scene: Scene,
    paths: &[PathBuf],
    needed: usize,
    legend: Legend,
    tile_size: f32,
) -> Result<Vec<TileGrid>, RunError> {
    if paths.len() < needed {
        return Err(RunError::MissingMaps {
            scene,
            needed,
            got: paths.len(),
        });
    }
    paths
        .iter()
        .map(|path| TileGrid::load(path, legend, tile_size).map_err(RunError::from))
        .collect()
}

fn build_context(args: &Args, settings: &Settings) -> Result<SimulationContext, RunError> {
    let paths = if args.maps.is_empty() {
        default_maps(args.scene)
    } else {
        args.maps.clone()
    };
    let tile = settings.tile_size();

    let ctx = match args.scene {
        Scene::Bouncing => SimulationContext::bouncing(settings, args.seed),
        Scene::Camera => {
            let mut maps = load_maps(args.scene, &paths, 1, Legend::Tiles, tile)?;
            SimulationContext::camera_follow(settings, maps.remove(0), args.players, args.seed)
        }
        Scene::Platformer => {
            let mut maps = load_maps(args.scene, &paths, 1, Legend::Simple, tile)?;
            SimulationContext::platformer(settings, maps.remove(0), args.seed)
        }
        Scene::Parallax => {
            let mut maps = load_maps(args.scene, &paths, 1, Legend::Parallax, tile)?;
            let front = maps.remove(0);
            SimulationContext::parallax(settings, front, maps, args.seed)
        }
        Scene::Race => {
            let maps = load_maps(args.scene, &paths, 1, Legend::Simple, tile)?;
            SimulationContext::race(settings, maps, args.seed)?
        }
    };
    Ok(ctx)
}

/// A looping walk for each player
fn scripts(scene: SceneKind, players: usize) -> Vec<ScriptedSource> {
    let step = ScriptStep::new;
    let walk = |first: Vec2, second: Vec2| {
        vec![
            step(180, first, false),
            step(120, second, false),
            step(180, -first, false),
            step(120, -second, false),
        ]
    };

    (0..players)
        .map(|id| {
            let steps = match scene {
                SceneKind::Bouncing => Vec::new(),
                SceneKind::Platformer | SceneKind::Parallax => vec![
                    step(90, Vec2::X, true),
                    step(30, Vec2::X, true),
                    step(90, Vec2::NEG_X, true),
                    step(60, Vec2::ZERO, false),
                ],
                SceneKind::CameraFollow | SceneKind::Race if id % 2 == 0 => walk(Vec2::X, Vec2::Y),
                SceneKind::CameraFollow | SceneKind::Race => walk(Vec2::Y, Vec2::X),
            };
            ScriptedSource::new(steps, true)
        })
        .collect()
}

fn log_summary(ctx: &SimulationContext) {
    let positions: Vec<String> = ctx
        .players
        .iter()
        .map(|p| format!("P{} ({:.1}, {:.1})", p.id + 1, p.body.pos.x, p.body.pos.y))
        .collect();
    info!(
        "tick {} camera ({:.1}, {:.1}) {}",
        ctx.time_ticks,
        ctx.camera.offset.x,
        ctx.camera.offset.y,
        positions.join(" ")
    );

    match ctx.scene {
        SceneKind::Bouncing => {
            let energy: f32 = ctx.balls.iter().map(|b| b.vel.length_squared()).sum();
            info!(
                "  {} circles, separation {}, bounce {}, speed^2 sum {:.3}",
                ctx.balls.len(),
                ctx.toggles.separation,
                ctx.toggles.bounce,
                energy
            );
        }
        SceneKind::Parallax => {
            for (i, layer) in ctx.layers.iter().enumerate() {
                let offset = layer.draw_offset(&ctx.camera);
                info!("  layer {} speed {:.1} offset ({:.1}, {:.1})", i, layer.speed, offset.x, offset.y);
            }
        }
        SceneKind::Race => {
            if let Some(race) = ctx.race.as_ref() {
                let scores: Vec<u32> = (0..ctx.players.len())
                    .map(|id| race.displayed_score(id))
                    .collect();
                info!("  map {} {:?} scores {:?}", race.map_index(), race.phase(), scores);
            }
            let view = ctx.camera.view_rect(ctx.viewport);
            let target = ctx.grid.as_ref().and_then(TileGrid::target_cell);
            if let Some(angle) = target
                .and_then(|cell| target_indicator(&cell.rect, &view, ctx.tracked_center()))
            {
                info!("  target off screen at {:.0} degrees", angle);
            }
        }
        SceneKind::CameraFollow | SceneKind::Platformer => {}
    }
}

fn run(args: &Args) -> Result<(), RunError> {
    let settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };

    let mut ctx = build_context(args, &settings)?;
    let mut sources = scripts(ctx.scene, ctx.players.len());
    let mut clock = SimulationClock::new(SIM_DT, settings.max_substeps);
    let frame_dt = 1.0 / args.fps.max(1.0);
    let summary_every = (args.fps.round() as u32).max(1);

    info!(
        "Running {:?} for {} frames at {} fps (seed {})",
        args.scene, args.frames, args.fps, args.seed
    );

    for frame in 0..args.frames {
        for _ in 0..clock.accumulate(frame_dt) {
            let input = TickInput {
                intents: sources.iter_mut().map(|s| s.intent()).collect(),
                commands: sources.iter_mut().flat_map(|s| s.take_commands()).collect(),
                pointer: None,
            };
            tick(&mut ctx, &input);

            for event in &ctx.events {
                match event {
                    SimEvent::TargetReached(_) | SimEvent::Level(_) => info!("{:?}", event),
                    _ => log::trace!("{:?}", event),
                }
            }
        }

        if frame % summary_every == 0 {
            log_summary(&ctx);
        }
    }

    log_summary(&ctx);
    info!("Done after {} ticks", clock.ticks());
    Ok(())
}

fn main() {
    // Parse command line arguments
    let args = Args::parse();

    let log_level = match args.log_level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    };
    env_logger::Builder::new()
        .filter_level(log_level)
        .parse_default_env()
        .init();

    info!("Playfield starting...");

    // load failures end the session; the exit code stays 0
    if let Err(e) = run(&args) {
        log::error!("{}", e);
    }
}
